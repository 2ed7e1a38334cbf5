use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sheet setup for proof output
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProofOptions {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    /// Printer-safe margin on every side of the sheet
    pub margin_mm: f32,
    /// Gap between neighbouring cells
    pub spacing_mm: f32,
    pub font_size_pt: f32,
    /// Write "(empty)" into slots without content
    pub label_empty: bool,
    /// Write "Page n / total" under the grid
    pub page_numbers: bool,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::Letter,
            orientation: Orientation::Portrait,
            margin_mm: 10.0,
            spacing_mm: 3.0,
            font_size_pt: 9.0,
            label_empty: false,
            page_numbers: true,
        }
    }
}

impl ProofOptions {
    /// Sheet size after orientation
    pub fn sheet_mm(&self) -> (f32, f32) {
        self.paper_size.dimensions_with_orientation(self.orientation)
    }

    /// Bounds of the cell at (`row`, `col`) in a `rows` x `columns` grid.
    ///
    /// Row 0 is the top row.
    pub fn cell_rect(&self, rows: usize, columns: usize, row: usize, col: usize) -> CellRect {
        let (width, height) = self.sheet_mm();
        let cell_width = cell_extent(width, self.margin_mm, self.spacing_mm, columns);
        let cell_height = cell_extent(height, self.margin_mm, self.spacing_mm, rows);

        let x = self.margin_mm + col as f32 * (cell_width + self.spacing_mm);
        let top = height - self.margin_mm - row as f32 * (cell_height + self.spacing_mm);

        CellRect {
            x,
            y: top - cell_height,
            width: cell_width,
            height: cell_height,
        }
    }

    /// Check that a `rows` x `columns` grid fits on the sheet
    pub fn validate(&self, rows: usize, columns: usize) -> Result<()> {
        if rows == 0 || columns == 0 {
            return Err(ProofError::Config("Grid has no cells".to_string()));
        }
        if self.font_size_pt <= 0.0 {
            return Err(ProofError::Config(
                "Font size must be positive".to_string(),
            ));
        }
        if self.margin_mm < 0.0 || self.spacing_mm < 0.0 {
            return Err(ProofError::Config(
                "Margins and spacing must not be negative".to_string(),
            ));
        }

        let cell = self.cell_rect(rows, columns, 0, 0);
        if cell.width <= 0.0 || cell.height <= 0.0 {
            let (width, height) = self.sheet_mm();
            return Err(ProofError::Config(format!(
                "A {}x{} grid does not fit on a {:.1}x{:.1} mm sheet",
                rows, columns, width, height
            )));
        }
        Ok(())
    }
}

fn cell_extent(total: f32, margin: f32, spacing: f32, count: usize) -> f32 {
    let usable = total - 2.0 * margin - count.saturating_sub(1) as f32 * spacing;
    usable / count.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ProofOptions {
        ProofOptions {
            paper_size: PaperSize::Custom {
                width_mm: 100.0,
                height_mm: 100.0,
            },
            margin_mm: 5.0,
            spacing_mm: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_cell_rect_top_left() {
        let rect = square().cell_rect(2, 2, 0, 0);
        assert_eq!(rect.x, 5.0);
        assert_eq!(rect.width, 45.0);
        assert_eq!(rect.height, 45.0);
        assert_eq!(rect.y, 50.0);
    }

    #[test]
    fn test_cell_rect_bottom_right() {
        let rect = square().cell_rect(2, 2, 1, 1);
        assert_eq!(rect.x, 50.0);
        assert_eq!(rect.y, 5.0);
    }

    #[test]
    fn test_landscape_swaps_sheet() {
        let options = ProofOptions {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(options.sheet_mm(), (279.4, 215.9));
    }

    #[test]
    fn test_validate_rejects_crowded_grid() {
        let options = ProofOptions {
            spacing_mm: 50.0,
            ..square()
        };
        assert!(options.validate(3, 3).is_err());
        assert!(square().validate(3, 3).is_ok());
        assert!(square().validate(0, 3).is_err());
    }
}
