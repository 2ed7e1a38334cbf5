use crate::allocator::{InstanceFactory, PageAllocator};
use crate::types::{ComponentMode, TemplateId};

/// How one template was spread over the pages
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateUsage {
    pub template: TemplateId,
    pub name: String,
    pub mode: ComponentMode,
    /// Instances the template had to produce
    pub required: usize,
    /// Instances actually placed
    pub emitted: usize,
    /// First page (0-based) showing the template, if any
    pub first_page: Option<usize>,
    /// Last page (0-based) showing the template, if any
    pub last_page: Option<usize>,
}

/// Statistics about a finished pagination run
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationStatistics {
    /// Output page count
    pub pages: usize,
    /// Slots on every page
    pub slots_per_page: usize,
    /// Slots holding an instance, over all pages
    pub filled_slots: usize,
    /// Slots left blank, over all pages
    pub empty_slots: usize,
    /// Per-template breakdown, in id order
    pub templates: Vec<TemplateUsage>,
}

impl PaginationStatistics {
    pub fn usage(&self, template: TemplateId) -> Option<&TemplateUsage> {
        self.templates.iter().find(|u| u.template == template)
    }

    /// Fraction of printed slots that carry content
    pub fn fill_ratio(&self) -> f32 {
        let total = self.filled_slots + self.empty_slots;
        if total == 0 {
            0.0
        } else {
            self.filled_slots as f32 / total as f32
        }
    }
}

/// Calculate statistics for the run, building any pages not built yet
pub fn calculate_statistics<F: InstanceFactory>(
    allocator: &mut PageAllocator<'_, F>,
) -> PaginationStatistics {
    allocator.generate();

    let pages = allocator.pages();
    let slots_per_page = allocator.grid().slot_count();
    let filled_slots: usize = pages.iter().map(|p| p.filled_count()).sum();
    let empty_slots = pages.len() * slots_per_page - filled_slots;

    let templates = allocator
        .templates()
        .map(|id| {
            let mut emitted = 0;
            let mut first_page = None;
            let mut last_page = None;
            for page in pages {
                let count = page.count_for(id);
                if count > 0 {
                    emitted += count;
                    first_page.get_or_insert(page.index);
                    last_page = Some(page.index);
                }
            }
            TemplateUsage {
                template: id,
                name: allocator.registry().name_of(id),
                mode: allocator.mode(id).unwrap_or(ComponentMode::Static),
                required: allocator.required(id),
                emitted,
                first_page,
                last_page,
            }
        })
        .collect();

    PaginationStatistics {
        pages: pages.len(),
        slots_per_page,
        filled_slots,
        empty_slots,
        templates,
    }
}
