//! Supply queries shared by the allocator and statistics

use crate::grid::GridTemplate;
use crate::merge::MergeManager;
use crate::template::{ComponentTemplate, DataBinding};
use crate::types::{ComponentMode, TemplateId};

/// Merge when the template has at least one data row, static otherwise
pub fn get_component_mode(template: TemplateId, merge: &MergeManager) -> ComponentMode {
    if merge.has_rows(template) {
        ComponentMode::Merge
    } else {
        ComponentMode::Static
    }
}

/// Total instances a template must produce over a whole run.
///
/// Merge templates need one per row. Static templates need `copies`, at
/// least one. A merge template whose data is unavailable needs nothing
/// unless it was given `fallback_copies`.
pub fn get_required_instances(
    template: TemplateId,
    definition: &ComponentTemplate,
    merge: &MergeManager,
) -> usize {
    if get_component_mode(template, merge) == ComponentMode::Merge {
        return merge.row_count(template);
    }

    match definition.binding {
        DataBinding::Static { copies } => copies.max(1),
        DataBinding::Merge {
            fallback_copies: Some(copies),
        } => copies.max(1),
        DataBinding::Merge {
            fallback_copies: None,
        } => 0,
    }
}

/// Slots whose initial assignment is `template`
pub fn count_slots(grid: &GridTemplate, template: TemplateId) -> usize {
    grid.slots()
        .iter()
        .filter(|slot| slot.content == Some(template))
        .count()
}

/// Pages needed for `required` instances spread over `slots` slots per page,
/// ignoring rebalancing
pub fn estimate_pages(required: usize, slots: usize) -> usize {
    if slots == 0 {
        0
    } else {
        required.div_ceil(slots)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateAnalysis {
    pub mode: ComponentMode,
    pub required_instances: usize,
    pub slots_per_page: usize,
    /// Pages the template would span if it kept only its initial slots
    pub estimated_pages: usize,
}

pub fn analyse_template(
    grid: &GridTemplate,
    template: TemplateId,
    definition: &ComponentTemplate,
    merge: &MergeManager,
) -> TemplateAnalysis {
    let required_instances = get_required_instances(template, definition, merge);
    let slots_per_page = count_slots(grid, template);
    TemplateAnalysis {
        mode: get_component_mode(template, merge),
        required_instances,
        slots_per_page,
        estimated_pages: estimate_pages(required_instances, slots_per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_source::RowSource;

    fn merge_with_rows(template: TemplateId, rows: usize) -> MergeManager {
        let mut text = String::from("@n\n");
        for i in 0..rows {
            text.push_str(&format!("{}\n", i));
        }
        let mut merge = MergeManager::new();
        merge.insert(template, RowSource::parse(&text, "rows.csv").unwrap());
        merge
    }

    #[test]
    fn test_static_requires_at_least_one() {
        let merge = MergeManager::new();
        let zero = ComponentTemplate::new_static("zero", 0);
        let five = ComponentTemplate::new_static("five", 5);

        assert_eq!(get_component_mode(TemplateId(0), &merge), ComponentMode::Static);
        assert_eq!(get_required_instances(TemplateId(0), &zero, &merge), 1);
        assert_eq!(get_required_instances(TemplateId(0), &five, &merge), 5);
    }

    #[test]
    fn test_merge_requires_row_count() {
        let merge = merge_with_rows(TemplateId(2), 7);
        let def = ComponentTemplate::new_merge("cards");

        assert_eq!(get_component_mode(TemplateId(2), &merge), ComponentMode::Merge);
        assert_eq!(get_required_instances(TemplateId(2), &def, &merge), 7);
    }

    #[test]
    fn test_merge_without_rows_degrades() {
        let merge = merge_with_rows(TemplateId(1), 0);
        let plain = ComponentTemplate::new_merge("cards");
        let fallback = ComponentTemplate {
            binding: DataBinding::Merge {
                fallback_copies: Some(0),
            },
            ..ComponentTemplate::new_merge("cards")
        };

        assert_eq!(get_component_mode(TemplateId(1), &merge), ComponentMode::Static);
        assert_eq!(get_required_instances(TemplateId(1), &plain, &merge), 0);
        assert_eq!(get_required_instances(TemplateId(1), &fallback, &merge), 1);
    }

    #[test]
    fn test_count_slots_and_estimate() {
        let mut grid = GridTemplate::new(3, 3);
        grid.assign(0, 0, Some(TemplateId(1)));
        grid.assign(2, 2, Some(TemplateId(1)));
        grid.fill_empty(TemplateId(0));

        assert_eq!(count_slots(&grid, TemplateId(1)), 2);
        assert_eq!(count_slots(&grid, TemplateId(0)), 7);
        assert_eq!(count_slots(&grid, TemplateId(5)), 0);

        assert_eq!(estimate_pages(45, 9), 5);
        assert_eq!(estimate_pages(46, 9), 6);
        assert_eq!(estimate_pages(3, 0), 0);
    }

    #[test]
    fn test_analyse_template() {
        let grid = GridTemplate::filled(2, 2, TemplateId(0));
        let merge = merge_with_rows(TemplateId(0), 10);
        let def = ComponentTemplate::new_merge("cards");

        let analysis = analyse_template(&grid, TemplateId(0), &def, &merge);
        assert_eq!(analysis.mode, ComponentMode::Merge);
        assert_eq!(analysis.required_instances, 10);
        assert_eq!(analysis.slots_per_page, 4);
        assert_eq!(analysis.estimated_pages, 3);
    }
}
