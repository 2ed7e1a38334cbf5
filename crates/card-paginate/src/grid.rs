//! Grid layout of a single printed sheet
//!
//! A grid is `rows x columns` slots stored in row-major order. Each slot may
//! name the template that initially owns it; the allocator copies these
//! assignments and never writes back to the grid.

use crate::types::TemplateId;

/// Position within the grid (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPosition {
    /// Row index (0 = top row)
    pub row: usize,
    /// Column index (0 = leftmost column)
    pub col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// One cell of the grid and the template it starts out with
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSlot {
    pub position: GridPosition,
    pub content: Option<TemplateId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridTemplate {
    rows: usize,
    columns: usize,
    slots: Vec<LayoutSlot>,
}

impl GridTemplate {
    /// Create a grid with every slot empty
    pub fn new(rows: usize, columns: usize) -> Self {
        let mut slots = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for col in 0..columns {
                slots.push(LayoutSlot {
                    position: GridPosition::new(row, col),
                    content: None,
                });
            }
        }
        Self {
            rows,
            columns,
            slots,
        }
    }

    /// Create a grid where every slot starts with `template`
    pub fn filled(rows: usize, columns: usize, template: TemplateId) -> Self {
        let mut grid = Self::new(rows, columns);
        grid.fill_empty(template);
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Slots per page
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slots in row-major order
    pub fn slots(&self) -> &[LayoutSlot] {
        &self.slots
    }

    pub fn slot(&self, row: usize, col: usize) -> Option<&LayoutSlot> {
        self.index_of(row, col).map(|idx| &self.slots[idx])
    }

    /// Flat row-major index of a position, if it lies inside the grid
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.columns {
            Some(row * self.columns + col)
        } else {
            None
        }
    }

    /// Set the template owning a slot. Returns false if the position is
    /// outside the grid.
    pub fn assign(&mut self, row: usize, col: usize, template: Option<TemplateId>) -> bool {
        match self.index_of(row, col) {
            Some(idx) => {
                self.slots[idx].content = template;
                true
            }
            None => false,
        }
    }

    /// Give every unassigned slot to `template`
    pub fn fill_empty(&mut self, template: TemplateId) {
        for slot in self.slots.iter_mut().filter(|s| s.content.is_none()) {
            slot.content = Some(template);
        }
    }

    /// Templates referenced by any slot, in ascending id order
    pub fn templates(&self) -> Vec<TemplateId> {
        let mut ids: Vec<TemplateId> = self.slots.iter().filter_map(|s| s.content).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
