use crate::options::ProofOptions;
use crate::types::{ProofError, Result};
use card_paginate::{ComponentInstance, GridTemplate, Page};
use printpdf::*;
use std::path::Path;

/// Render pages to a proof PDF, one sheet per page
pub async fn generate_proof(
    pages: &[Page<ComponentInstance>],
    grid: &GridTemplate,
    options: &ProofOptions,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let pages = pages.to_vec();
    let (rows, columns) = (grid.rows(), grid.columns());
    let options = options.clone();
    let output_path = output_path.as_ref().to_owned();

    let bytes =
        tokio::task::spawn_blocking(move || proof_pdf_bytes(&pages, rows, columns, &options))
            .await??;

    tokio::fs::write(&output_path, bytes).await?;
    log::info!("Wrote proof to {}", output_path.display());

    Ok(())
}

/// Text shown for a filled slot: the template name, plus the first non-empty
/// merge field (by field name) for merge instances
pub fn slot_label(instance: &ComponentInstance) -> String {
    let value = instance
        .row
        .as_ref()
        .and_then(|row| row.values().find(|v| !v.is_empty()));
    match value {
        Some(value) => format!("{}: {}", instance.name, value),
        None => instance.name.clone(),
    }
}

pub fn proof_pdf_bytes(
    pages: &[Page<ComponentInstance>],
    rows: usize,
    columns: usize,
    options: &ProofOptions,
) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(ProofError::NoPages);
    }
    options.validate(rows, columns)?;

    let mut doc = PdfDocument::new("Card Proof");
    let (page_width_mm, page_height_mm) = options.sheet_mm();
    let line_height_mm = options.font_size_pt * 25.4 / 72.0;
    let total = pages.len();

    let mut pdf_pages = Vec::with_capacity(total);
    for page in pages {
        let mut ops = Vec::new();

        for placement in &page.placements {
            let label = match &placement.instance {
                Some(instance) => slot_label(instance),
                None if options.label_empty => "(empty)".to_string(),
                None => continue,
            };

            let cell = options.cell_rect(rows, columns, placement.slot.row, placement.slot.col);
            let x = cell.x + 2.0;
            let y = cell.y + (cell.height - line_height_mm) / 2.0;
            push_text(&mut ops, x, y, options.font_size_pt, label);
        }

        if options.page_numbers {
            let footer = format!("Page {} / {}", page.index + 1, total);
            let y = (options.margin_mm - line_height_mm).max(0.0) / 2.0;
            push_text(&mut ops, options.margin_mm, y, options.font_size_pt, footer);
        }

        pdf_pages.push(PdfPage::new(Mm(page_width_mm), Mm(page_height_mm), ops));
    }

    doc.pages = pdf_pages;

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("PDF writer reported {} warnings", warnings.len());
    }

    Ok(bytes)
}

fn push_text(ops: &mut Vec<Op>, x_mm: f32, y_mm: f32, size_pt: f32, text: String) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Mm(x_mm).into_pt(),
            y: Mm(y_mm).into_pt(),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        font: BuiltinFont::Helvetica,
        size: Pt(size_pt),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text)],
        font: BuiltinFont::Helvetica,
    });
    ops.push(Op::EndTextSection);
}
