use card_paginate::*;
use card_proof::*;

fn sample_pages() -> (GridTemplate, Vec<Page<ComponentInstance>>) {
    let mut registry = TemplateRegistry::new();
    let cards = registry.register(ComponentTemplate::new_merge("cards")).unwrap();
    let back = registry
        .register(ComponentTemplate::new_static("back", 2))
        .unwrap();

    let mut merge = MergeManager::new();
    merge.insert(
        cards,
        RowSource::parse("@title,@cost\nFireball,3\nShield,1\nHaste,2\n", "spells.csv").unwrap(),
    );

    let mut grid = GridTemplate::new(2, 2);
    grid.assign(1, 1, Some(back));
    grid.fill_empty(cards);

    let mut allocator = PageAllocator::with_default_factory(&grid, &registry, merge).unwrap();
    allocator.generate();
    let pages = allocator.pages().to_vec();
    (grid, pages)
}

#[test]
fn test_slot_label() {
    let (_, pages) = sample_pages();
    let first = pages[0].placements[0].instance.as_ref().unwrap();
    assert_eq!(slot_label(first), "cards: 3");

    let back = pages[0].placements[3].instance.as_ref().unwrap();
    assert_eq!(slot_label(back), "back");
}

#[test]
fn test_proof_bytes_are_pdf() {
    let (grid, pages) = sample_pages();
    let options = ProofOptions {
        label_empty: true,
        ..Default::default()
    };

    let bytes = proof_pdf_bytes(&pages, grid.rows(), grid.columns(), &options).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_proof_requires_pages() {
    let result = proof_pdf_bytes(&[], 2, 2, &ProofOptions::default());
    assert!(matches!(result, Err(ProofError::NoPages)));
}

#[test]
fn test_proof_rejects_grid_that_does_not_fit() {
    let (_, pages) = sample_pages();
    let options = ProofOptions {
        margin_mm: 200.0,
        ..Default::default()
    };
    let result = proof_pdf_bytes(&pages, 2, 2, &options);
    assert!(matches!(result, Err(ProofError::Config(_))));
}

#[tokio::test]
async fn test_generate_proof_writes_file() {
    let (grid, pages) = sample_pages();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("proof.pdf");

    generate_proof(&pages, &grid, &ProofOptions::default(), &output)
        .await
        .unwrap();

    let written = std::fs::read(&output).unwrap();
    assert!(written.starts_with(b"%PDF"));
}
