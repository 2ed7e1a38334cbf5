//! Page allocator: turns one grid into as many pages as the templates need
//!
//! The allocator keeps its own copy of the slot assignments and one
//! remaining-instance counter per template. Each page walks the slots in
//! row-major order, asking the owning template for an instance while it
//! still has supply. After every page, slots owned by exhausted templates
//! are handed to the template that needs the most placements:
//! 1. merge templates before static templates
//! 2. highest remaining count first
//! 3. on a tie, the template registered first (lowest [`TemplateId`])
//!
//! A slot with no candidate stays empty for the rest of the run.

use crate::grid::{GridPosition, GridTemplate};
use crate::helpers::{get_component_mode, get_required_instances};
use crate::merge::MergeManager;
use crate::template::{ComponentTemplate, TemplateRegistry};
use crate::types::{ComponentMode, PaginateError, Result, Row, TemplateId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// =============================================================================
// Instances
// =============================================================================

/// Builds the content placed in a slot.
///
/// Merge templates get one call per data row. Static templates get a single
/// call per run; the result is shared by every slot they fill.
pub trait InstanceFactory {
    type Instance;

    fn create(
        &mut self,
        template: TemplateId,
        definition: &ComponentTemplate,
        row: Option<Row>,
    ) -> Self::Instance;
}

/// Plain record of what a slot shows
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    pub template: TemplateId,
    pub name: String,
    /// Merge fields for merge templates, `None` for static ones
    pub row: Option<Row>,
    /// Creation order within the run
    pub serial: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DefaultFactory {
    created: usize,
}

impl InstanceFactory for DefaultFactory {
    type Instance = ComponentInstance;

    fn create(
        &mut self,
        template: TemplateId,
        definition: &ComponentTemplate,
        row: Option<Row>,
    ) -> ComponentInstance {
        let serial = self.created;
        self.created += 1;
        ComponentInstance {
            template,
            name: definition.name.clone(),
            row,
            serial,
        }
    }
}

// =============================================================================
// Pages
// =============================================================================

/// One slot of a built page
#[derive(Debug, PartialEq)]
pub struct Placement<I> {
    pub slot: GridPosition,
    /// Template that supplied the instance, `None` for an empty slot
    pub template: Option<TemplateId>,
    pub instance: Option<Arc<I>>,
}

impl<I> Clone for Placement<I> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            template: self.template,
            instance: self.instance.clone(),
        }
    }
}

impl<I> Placement<I> {
    pub fn is_filled(&self) -> bool {
        self.instance.is_some()
    }
}

/// A built page: one placement per slot, row-major
#[derive(Debug, PartialEq)]
pub struct Page<I> {
    pub index: usize,
    pub placements: Vec<Placement<I>>,
}

impl<I> Clone for Page<I> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            placements: self.placements.clone(),
        }
    }
}

impl<I> Page<I> {
    pub fn filled_count(&self) -> usize {
        self.placements.iter().filter(|p| p.is_filled()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.placements.len() - self.filled_count()
    }

    /// Instances this page took from `template`
    pub fn count_for(&self, template: TemplateId) -> usize {
        self.placements
            .iter()
            .filter(|p| p.template == Some(template))
            .count()
    }
}

// =============================================================================
// Allocator
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Supply {
    mode: ComponentMode,
    required: usize,
    remaining: usize,
}

pub struct PageAllocator<'a, F: InstanceFactory = DefaultFactory> {
    grid: &'a GridTemplate,
    registry: &'a TemplateRegistry,
    merge: MergeManager,
    factory: F,
    /// Current owner of each slot, row-major
    assignment: Vec<Option<TemplateId>>,
    supply: BTreeMap<TemplateId, Supply>,
    static_cache: HashMap<TemplateId, Arc<F::Instance>>,
    pages: Vec<Page<F::Instance>>,
    exhausted: bool,
}

impl<'a> PageAllocator<'a, DefaultFactory> {
    pub fn with_default_factory(
        grid: &'a GridTemplate,
        registry: &'a TemplateRegistry,
        merge: MergeManager,
    ) -> Result<Self> {
        Self::new(grid, registry, merge, DefaultFactory::default())
    }
}

impl<'a, F: InstanceFactory> PageAllocator<'a, F> {
    /// Prepare a pagination run.
    ///
    /// Fails if the grid has no slots or no referenced template needs any
    /// instance.
    pub fn new(
        grid: &'a GridTemplate,
        registry: &'a TemplateRegistry,
        merge: MergeManager,
        factory: F,
    ) -> Result<Self> {
        if grid.slot_count() == 0 {
            return Err(PaginateError::Configuration(
                "Layout has no slots".to_string(),
            ));
        }

        let mut supply = BTreeMap::new();
        for id in grid.templates() {
            let definition = registry
                .get(id)
                .ok_or_else(|| PaginateError::UnknownTemplate(format!("#{}", id.0)))?;
            let required = get_required_instances(id, definition, &merge);
            supply.insert(
                id,
                Supply {
                    mode: get_component_mode(id, &merge),
                    required,
                    remaining: required,
                },
            );
        }

        if supply.values().all(|s| s.required == 0) {
            return Err(PaginateError::Configuration(
                "Nothing to paginate: all components have zero instances required".to_string(),
            ));
        }

        Ok(Self {
            grid,
            registry,
            merge,
            factory,
            assignment: grid.slots().iter().map(|s| s.content).collect(),
            supply,
            static_cache: HashMap::new(),
            pages: Vec::new(),
            exhausted: false,
        })
    }

    /// Build every remaining page. Does nothing once exhausted.
    pub fn generate(&mut self) {
        while !self.exhausted {
            self.build_next_page();
        }
    }

    /// Pages built so far, building the first one if needed
    pub fn page_count(&mut self) -> usize {
        self.ensure_pages(1);
        self.pages.len()
    }

    /// Page `index`, building pages up to it. `None` past the last page.
    pub fn get_page(&mut self, index: usize) -> Option<&Page<F::Instance>> {
        self.ensure_pages(index.saturating_add(1));
        self.pages.get(index)
    }

    /// Lazily walk the pages from the first one. Pages already built are
    /// reused; new ones are built as the iterator advances.
    pub fn iter_pages(&mut self) -> PageIter<'_, 'a, F> {
        PageIter {
            allocator: self,
            next: 0,
        }
    }

    /// Pages built so far, without building more
    pub fn pages(&self) -> &[Page<F::Instance>] {
        &self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Instances `template` still has to emit. Zero for templates not in the run.
    pub fn remaining(&self, template: TemplateId) -> usize {
        self.supply.get(&template).map_or(0, |s| s.remaining)
    }

    /// Instances `template` had to emit when the run started
    pub fn required(&self, template: TemplateId) -> usize {
        self.supply.get(&template).map_or(0, |s| s.required)
    }

    pub fn mode(&self, template: TemplateId) -> Option<ComponentMode> {
        self.supply.get(&template).map(|s| s.mode)
    }

    /// Templates taking part in the run, in id order
    pub fn templates(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.supply.keys().copied()
    }

    /// Current slot owners, which decide the next page
    pub fn assignment(&self) -> &[Option<TemplateId>] {
        &self.assignment
    }

    pub fn grid(&self) -> &GridTemplate {
        self.grid
    }

    pub fn registry(&self) -> &TemplateRegistry {
        self.registry
    }

    pub fn merge_manager(&self) -> &MergeManager {
        &self.merge
    }

    pub fn into_merge_manager(self) -> MergeManager {
        self.merge
    }

    /// Build until at least `count` pages exist. False once no more can be built.
    fn ensure_pages(&mut self, count: usize) -> bool {
        while self.pages.len() < count && !self.exhausted {
            self.build_next_page();
        }
        self.pages.len() >= count
    }

    fn build_next_page(&mut self) {
        if self.supply.values().all(|s| s.remaining == 0) {
            self.exhausted = true;
            log::info!("Pagination complete: {} pages", self.pages.len());
            return;
        }

        let grid = self.grid;
        let index = self.pages.len();
        let mut placements = Vec::with_capacity(grid.slot_count());

        for (idx, slot) in grid.slots().iter().enumerate() {
            let instance = self.assignment[idx].and_then(|id| self.take_instance(id).map(|i| (id, i)));
            placements.push(Placement {
                slot: slot.position,
                template: instance.as_ref().map(|(id, _)| *id),
                instance: instance.map(|(_, i)| i),
            });
        }

        let page = Page { index, placements };
        log::debug!(
            "Built page {} ({} of {} slots filled)",
            index + 1,
            page.filled_count(),
            page.placements.len()
        );
        self.pages.push(page);

        self.rebalance();
    }

    /// Next instance from `template`, or `None` once its supply is spent
    fn take_instance(&mut self, template: TemplateId) -> Option<Arc<F::Instance>> {
        let registry = self.registry;
        let definition = registry.get(template)?;
        let supply = self.supply.get_mut(&template)?;
        if supply.remaining == 0 {
            return None;
        }

        let instance = match supply.mode {
            ComponentMode::Merge => match self.merge.next_row(template) {
                Ok(row) => Arc::new(self.factory.create(template, definition, Some(row))),
                Err(e) => {
                    log::warn!(
                        "Template '{}' ran out of rows early: {}",
                        definition.name,
                        e
                    );
                    supply.remaining = 0;
                    return None;
                }
            },
            ComponentMode::Static => {
                let factory = &mut self.factory;
                self.static_cache
                    .entry(template)
                    .or_insert_with(|| Arc::new(factory.create(template, definition, None)))
                    .clone()
            }
        };

        supply.remaining -= 1;
        Some(instance)
    }

    /// Hand slots of exhausted templates to the neediest template
    fn rebalance(&mut self) {
        let supply = &self.supply;
        let is_finished = |id: &TemplateId| supply.get(id).is_none_or(|s| s.remaining == 0);

        if !self.assignment.iter().flatten().any(is_finished) {
            return;
        }

        let replacement = self
            .best_candidate(ComponentMode::Merge)
            .or_else(|| self.best_candidate(ComponentMode::Static));

        for (idx, owner) in self.assignment.iter_mut().enumerate() {
            let Some(current) = *owner else { continue };
            if !is_finished(&current) {
                continue;
            }
            log::debug!(
                "Slot {} reassigned from {} to {}",
                idx,
                self.registry.name_of(current),
                replacement.map_or_else(|| "nothing".to_string(), |id| self.registry.name_of(id))
            );
            *owner = replacement;
        }
    }

    /// Template of `mode` with the most remaining instances; earliest id wins ties
    fn best_candidate(&self, mode: ComponentMode) -> Option<TemplateId> {
        let mut best: Option<(TemplateId, usize)> = None;
        for (&id, s) in &self.supply {
            if s.mode != mode || s.remaining == 0 {
                continue;
            }
            match best {
                Some((_, most)) if most >= s.remaining => {}
                _ => best = Some((id, s.remaining)),
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Iterator returned by [`PageAllocator::iter_pages`]
pub struct PageIter<'p, 'a, F: InstanceFactory> {
    allocator: &'p mut PageAllocator<'a, F>,
    next: usize,
}

impl<F: InstanceFactory> Iterator for PageIter<'_, '_, F> {
    type Item = Page<F::Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.allocator.ensure_pages(self.next.saturating_add(1)) {
            return None;
        }
        let page = self.allocator.pages[self.next].clone();
        self.next += 1;
        Some(page)
    }
}
