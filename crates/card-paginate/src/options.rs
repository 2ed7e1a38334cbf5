use crate::allocator::{DefaultFactory, PageAllocator};
use crate::grid::GridTemplate;
use crate::merge::MergeManager;
use crate::template::{ComponentTemplate, DataBinding, TemplateRegistry};
use crate::types::*;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Explicit owner for one grid cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotAssignment {
    pub row: usize,
    pub column: usize,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    pub rows: usize,
    pub columns: usize,
    /// Template given to every slot not listed in `slots`
    pub fill: Option<String>,
    pub slots: Vec<SlotAssignment>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 3,
            fill: None,
            slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TemplateOptions {
    pub name: String,
    /// Static copy count; ignored when `data` is set
    pub copies: Option<usize>,
    /// CSV file, relative to the project file
    pub data: Option<PathBuf>,
    /// `@` fields the template renders
    pub fields: Vec<String>,
    /// Copies to print when `data` turns out unusable
    pub fallback_copies: Option<usize>,
}

impl TemplateOptions {
    fn to_template(&self) -> ComponentTemplate {
        let binding = match self.data {
            Some(_) => DataBinding::Merge {
                fallback_copies: self.fallback_copies,
            },
            None => DataBinding::Static {
                copies: self.copies.unwrap_or(1),
            },
        };
        ComponentTemplate {
            name: self.name.clone(),
            binding,
            fields: self.fields.clone(),
        }
    }
}

/// Project file: one layout plus the templates it places
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProjectOptions {
    pub layout: LayoutOptions,
    pub templates: Vec<TemplateOptions>,
}

impl ProjectOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| PaginateError::Configuration(format!("Failed to parse project: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            PaginateError::Configuration(format!("Failed to serialize project: {}", e))
        })?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.layout.rows == 0 || self.layout.columns == 0 {
            return Err(PaginateError::Configuration(
                "Layout must have at least one row and one column".to_string(),
            ));
        }

        if self.templates.is_empty() {
            return Err(PaginateError::Configuration(
                "No templates specified".to_string(),
            ));
        }

        for (idx, template) in self.templates.iter().enumerate() {
            if template.name.trim().is_empty() {
                return Err(PaginateError::Configuration(format!(
                    "Template {} has no name",
                    idx + 1
                )));
            }
            if self.templates[..idx].iter().any(|t| t.name == template.name) {
                return Err(PaginateError::Configuration(format!(
                    "Duplicate template name '{}'",
                    template.name
                )));
            }
        }

        let known = |name: &str| self.templates.iter().any(|t| t.name == name);
        if let Some(fill) = &self.layout.fill {
            if !known(fill) {
                return Err(PaginateError::UnknownTemplate(fill.clone()));
            }
        }
        for slot in &self.layout.slots {
            if slot.row >= self.layout.rows || slot.column >= self.layout.columns {
                return Err(PaginateError::Configuration(format!(
                    "Slot ({}, {}) is outside the {}x{} layout",
                    slot.row, slot.column, self.layout.rows, self.layout.columns
                )));
            }
            if !known(&slot.template) {
                return Err(PaginateError::UnknownTemplate(slot.template.clone()));
            }
        }

        Ok(())
    }

    /// Build the grid, templates and data sources.
    ///
    /// Relative data paths are resolved against `base_dir`. Data files that
    /// fail to load are recorded as warnings on the merge manager.
    pub fn build(&self, base_dir: impl AsRef<Path>) -> Result<Project> {
        self.validate()?;
        let base_dir = base_dir.as_ref();

        let mut registry = TemplateRegistry::new();
        let mut merge = MergeManager::new();
        for options in &self.templates {
            let id = registry.register(options.to_template())?;
            if let Some(data) = &options.data {
                merge.add_path(id, &options.name, base_dir.join(data));
            }
        }

        let mut grid = GridTemplate::new(self.layout.rows, self.layout.columns);
        for slot in &self.layout.slots {
            let id = registry.lookup(&slot.template)?;
            grid.assign(slot.row, slot.column, Some(id));
        }
        if let Some(fill) = &self.layout.fill {
            grid.fill_empty(registry.lookup(fill)?);
        }

        Ok(Project {
            grid,
            registry,
            merge,
        })
    }
}

/// Everything a pagination run needs
#[derive(Debug, Clone)]
pub struct Project {
    pub grid: GridTemplate,
    pub registry: TemplateRegistry,
    pub merge: MergeManager,
}

impl Project {
    /// Load a project file and everything it references
    #[cfg(feature = "serde")]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = ProjectOptions::load(path).await?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tokio::task::spawn_blocking(move || options.build(base_dir)).await?
    }

    /// Start a run. Each call gets fresh row cursors.
    pub fn allocator(&self) -> Result<PageAllocator<'_, DefaultFactory>> {
        let mut merge = self.merge.clone();
        merge.reset_all();
        PageAllocator::with_default_factory(&self.grid, &self.registry, merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ProjectOptions {
        ProjectOptions {
            layout: LayoutOptions {
                rows: 2,
                columns: 2,
                fill: Some("back".to_string()),
                slots: vec![SlotAssignment {
                    row: 0,
                    column: 0,
                    template: "rules".to_string(),
                }],
            },
            templates: vec![
                TemplateOptions {
                    name: "rules".to_string(),
                    copies: Some(2),
                    ..Default::default()
                },
                TemplateOptions {
                    name: "back".to_string(),
                    copies: Some(6),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_build_assigns_and_fills() {
        let project = options().build(".").unwrap();

        let rules = project.registry.find("rules").unwrap();
        let back = project.registry.find("back").unwrap();
        assert_eq!(project.grid.slot(0, 0).unwrap().content, Some(rules));
        assert_eq!(project.grid.slot(1, 1).unwrap().content, Some(back));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_slot() {
        let mut opts = options();
        opts.layout.slots[0].row = 5;
        assert!(matches!(opts.validate(), Err(PaginateError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_template() {
        let mut opts = options();
        opts.layout.fill = Some("nope".to_string());
        assert!(matches!(
            opts.validate(),
            Err(PaginateError::UnknownTemplate(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_layout() {
        let mut opts = options();
        opts.layout.columns = 0;
        assert!(opts.validate().is_err());
    }
}
