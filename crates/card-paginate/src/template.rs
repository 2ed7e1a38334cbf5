//! Component templates and the arena that owns them

use crate::types::{PaginateError, Result, TemplateId};

/// Where a template's instances come from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataBinding {
    /// Repeat the same content `copies` times (at least once)
    Static { copies: usize },
    /// One instance per row of the template's data file. When the file
    /// cannot be used the template is not placed at all, unless
    /// `fallback_copies` asks for static copies instead.
    Merge { fallback_copies: Option<usize> },
}

impl Default for DataBinding {
    fn default() -> Self {
        DataBinding::Static { copies: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTemplate {
    pub name: String,
    pub binding: DataBinding,
    /// `@` field names the template renders
    pub fields: Vec<String>,
}

impl ComponentTemplate {
    pub fn new_static(name: impl Into<String>, copies: usize) -> Self {
        Self {
            name: name.into(),
            binding: DataBinding::Static { copies },
            fields: Vec::new(),
        }
    }

    pub fn new_merge(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: DataBinding::Merge {
                fallback_copies: None,
            },
            fields: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Flat store of templates keyed by [`TemplateId`]
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<ComponentTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. Names must be unique.
    pub fn register(&mut self, template: ComponentTemplate) -> Result<TemplateId> {
        if template.name.trim().is_empty() {
            return Err(PaginateError::Configuration(
                "Template name must not be empty".to_string(),
            ));
        }
        if self.find(&template.name).is_some() {
            return Err(PaginateError::Configuration(format!(
                "Duplicate template name '{}'",
                template.name
            )));
        }
        let id = TemplateId(self.templates.len());
        self.templates.push(template);
        Ok(id)
    }

    pub fn get(&self, id: TemplateId) -> Option<&ComponentTemplate> {
        self.templates.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.templates
            .iter()
            .position(|t| t.name == name)
            .map(TemplateId)
    }

    pub fn lookup(&self, name: &str) -> Result<TemplateId> {
        self.find(name)
            .ok_or_else(|| PaginateError::UnknownTemplate(name.to_string()))
    }

    /// Display name for an id, falling back to the raw index
    pub fn name_of(&self, id: TemplateId) -> String {
        self.get(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &ComponentTemplate)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(idx, t)| (TemplateId(idx), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = TemplateRegistry::new();
        let a = registry.register(ComponentTemplate::new_static("a", 2)).unwrap();
        let b = registry.register(ComponentTemplate::new_merge("b")).unwrap();

        assert_eq!(a, TemplateId(0));
        assert_eq!(b, TemplateId(1));
        assert_eq!(registry.find("b"), Some(b));
        assert_eq!(registry.name_of(a), "a");
        assert_eq!(registry.name_of(TemplateId(9)), "#9");
    }

    #[test]
    fn test_duplicate_and_blank_names_rejected() {
        let mut registry = TemplateRegistry::new();
        registry.register(ComponentTemplate::new_static("card", 1)).unwrap();

        assert!(matches!(
            registry.register(ComponentTemplate::new_static("card", 3)),
            Err(PaginateError::Configuration(_))
        ));
        assert!(matches!(
            registry.register(ComponentTemplate::new_static("  ", 3)),
            Err(PaginateError::Configuration(_))
        ));
        assert!(matches!(
            registry.lookup("missing"),
            Err(PaginateError::UnknownTemplate(_))
        ));
    }
}
