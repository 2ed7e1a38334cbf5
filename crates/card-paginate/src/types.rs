use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaginateError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Invalid data in {}: {reason}", path.display())]
    InvalidData { path: PathBuf, reason: String },
    #[error("Row source exhausted")]
    Exhausted,
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PaginateError>;

/// One data row keyed by column header
pub type Row = BTreeMap<String, String>;

/// Stable handle to a template stored in a [`TemplateRegistry`](crate::TemplateRegistry).
///
/// Ids are handed out in registration order, which is also the order used to
/// break ties when slots are rebalanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateId(pub usize);

/// How a template produces instances for one pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentMode {
    /// Fixed number of copies, one shared instance
    Static,
    /// One instance per data row
    Merge,
}

impl ComponentMode {
    pub fn name(self) -> &'static str {
        match self {
            ComponentMode::Static => "static",
            ComponentMode::Merge => "merge",
        }
    }
}

/// Prefix marking a CSV column as a bindable merge field
pub const MERGE_FIELD_PREFIX: char = '@';
