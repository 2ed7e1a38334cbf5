//! Merge manager: one row source per merge template
//!
//! Loading failures are absorbed here. A template whose data file cannot be
//! read simply has no rows; the failure is logged and kept as a
//! [`MergeWarning`] so the caller can show it without stopping pagination.

use crate::row_source::RowSource;
use crate::template::ComponentTemplate;
use crate::types::{MERGE_FIELD_PREFIX, PaginateError, Result, Row, TemplateId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// A data file that could not be used
#[derive(Debug, Clone, PartialEq)]
pub struct MergeWarning {
    pub template: TemplateId,
    pub template_name: String,
    pub path: PathBuf,
    pub message: String,
}

/// Result of comparing a template's fields with its data file's headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    /// Bound by the template and present in the file
    Ok,
    /// Bound by the template but absent from the file
    Missing,
    /// Present in the file but not used by the template
    Unused,
}

#[derive(Debug, Clone, Default)]
pub struct MergeManager {
    sources: HashMap<TemplateId, RowSource>,
    warnings: Vec<MergeWarning>,
}

impl MergeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` as the row source for `template`.
    ///
    /// Returns false, and records a warning, if the file cannot be used.
    pub fn add_path(
        &mut self,
        template: TemplateId,
        template_name: &str,
        path: impl AsRef<Path>,
    ) -> bool {
        let path = path.as_ref();
        match RowSource::from_path(path) {
            Ok(source) => {
                self.insert(template, source);
                true
            }
            Err(e) => {
                self.absorb(template, template_name, path, e);
                false
            }
        }
    }

    /// Async variant of [`MergeManager::add_path`]
    pub async fn load_path(
        &mut self,
        template: TemplateId,
        template_name: &str,
        path: impl AsRef<Path>,
    ) -> bool {
        let path = path.as_ref();
        match RowSource::load(path).await {
            Ok(source) => {
                self.insert(template, source);
                true
            }
            Err(e) => {
                self.absorb(template, template_name, path, e);
                false
            }
        }
    }

    fn absorb(&mut self, template: TemplateId, template_name: &str, path: &Path, err: PaginateError) {
        log::warn!(
            "Data for template '{}' unavailable ({}): {}",
            template_name,
            path.display(),
            err
        );
        self.sources.remove(&template);
        self.warnings.push(MergeWarning {
            template,
            template_name: template_name.to_string(),
            path: path.to_owned(),
            message: err.to_string(),
        });
    }

    /// Attach an already-parsed source, replacing any previous one
    pub fn insert(&mut self, template: TemplateId, source: RowSource) {
        self.sources.insert(template, source);
    }

    pub fn source(&self, template: TemplateId) -> Option<&RowSource> {
        self.sources.get(&template)
    }

    pub fn has_rows(&self, template: TemplateId) -> bool {
        self.row_count(template) > 0
    }

    pub fn row_count(&self, template: TemplateId) -> usize {
        self.sources.get(&template).map_or(0, RowSource::row_count)
    }

    pub fn remaining(&self, template: TemplateId) -> usize {
        self.sources.get(&template).map_or(0, RowSource::remaining)
    }

    /// Next row for `template`. A template without a source is treated as
    /// already exhausted.
    pub fn next_row(&mut self, template: TemplateId) -> Result<Row> {
        self.sources
            .get_mut(&template)
            .ok_or(PaginateError::Exhausted)?
            .next_row()
    }

    /// Rewind every source for an independent re-run
    pub fn reset_all(&mut self) {
        for source in self.sources.values_mut() {
            source.reset();
        }
    }

    pub fn warnings(&self) -> &[MergeWarning] {
        &self.warnings
    }

    /// Compare the `@` fields a template binds with its data file's headers
    pub fn validate_headers(
        &self,
        template: TemplateId,
        definition: &ComponentTemplate,
    ) -> BTreeMap<String, HeaderStatus> {
        let Some(source) = self.sources.get(&template) else {
            return BTreeMap::new();
        };

        let bound: BTreeSet<&str> = definition
            .fields
            .iter()
            .map(String::as_str)
            .filter(|f| f.starts_with(MERGE_FIELD_PREFIX))
            .collect();
        let offered: BTreeSet<&str> = source.merge_fields().iter().map(String::as_str).collect();

        bound
            .union(&offered)
            .map(|&key| {
                let status = match (bound.contains(key), offered.contains(key)) {
                    (true, true) => HeaderStatus::Ok,
                    (true, false) => HeaderStatus::Missing,
                    _ => HeaderStatus::Unused,
                };
                (key.to_string(), status)
            })
            .collect()
    }
}
