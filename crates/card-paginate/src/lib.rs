pub mod allocator;
mod grid;
mod helpers;
mod merge;
mod options;
mod row_source;
mod stats;
mod template;
mod types;

pub use allocator::{
    ComponentInstance, DefaultFactory, InstanceFactory, Page, PageAllocator, PageIter, Placement,
};
pub use grid::*;
pub use helpers::*;
pub use merge::*;
pub use options::*;
pub use row_source::*;
pub use stats::calculate_statistics;
pub use stats::{PaginationStatistics, TemplateUsage};
pub use template::*;
pub use types::*;
