use card_paginate::*;
use std::path::PathBuf;

fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_empty_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "empty.csv", b"");

    match RowSource::from_path(&path) {
        Err(PaginateError::InvalidData { path: p, .. }) => assert_eq!(p, path),
        other => panic!("Expected InvalidData, got {:?}", other.map(|s| s.row_count())),
    }
}

#[test]
fn test_whitespace_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "blank.csv", b"  \n\n\t\n");
    assert!(matches!(
        RowSource::from_path(&path),
        Err(PaginateError::InvalidData { .. })
    ));
}

#[test]
fn test_missing_file_is_invalid() {
    assert!(matches!(
        RowSource::from_path("/no/such/dir/data.csv"),
        Err(PaginateError::InvalidData { .. })
    ));
}

#[test]
fn test_empty_header_is_invalid() {
    let result = RowSource::parse("@name,,@cost\na,b,c\n", "bad.csv");
    assert!(matches!(result, Err(PaginateError::InvalidData { .. })));

    let result = RowSource::parse("@name,   \na,b\n", "bad.csv");
    assert!(matches!(result, Err(PaginateError::InvalidData { .. })));
}

#[test]
fn test_header_only_file_has_no_rows() {
    let source = RowSource::parse("@name,@cost\n", "headers.csv").unwrap();
    assert_eq!(source.row_count(), 0);
    assert!(!source.has_next());
    assert_eq!(source.merge_fields().len(), 2);
}

#[test]
fn test_bom_is_stripped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "bom.csv", b"\xef\xbb\xbf@name,@cost\nImp,1\n");

    let mut source = RowSource::from_path(&path).unwrap();
    assert_eq!(source.headers()[0], "@name");
    assert_eq!(source.next_row().unwrap()["@name"], "Imp");
}

#[test]
fn test_semicolon_dialect() {
    let text = "@name;@text;notes\nGoblin;\"hits, then runs\";x\nOrc;smash;y\n";
    let mut source = RowSource::parse(text, "semi.csv").unwrap();

    assert_eq!(source.delimiter(), b';');
    assert_eq!(source.row_count(), 2);
    let row = source.next_row().unwrap();
    assert_eq!(row["@text"], "hits, then runs");
    assert!(!row.contains_key("notes"));
}

#[test]
fn test_cursor_accounting() {
    let mut source = RowSource::parse("@n\n1\n2\n3\n", "n.csv").unwrap();

    assert_eq!(source.remaining(), 3);
    source.next_row().unwrap();
    source.next_row().unwrap();
    assert_eq!(source.cursor(), 2);
    assert_eq!(source.remaining(), 1);

    source.next_row().unwrap();
    assert_eq!(source.remaining(), 0);
    assert!(matches!(source.next_row(), Err(PaginateError::Exhausted)));
    assert_eq!(source.cursor(), 3);

    source.reset();
    assert_eq!(source.remaining(), 3);
    assert_eq!(source.next_row().unwrap()["@n"], "1");
}

#[test]
fn test_iteration_does_not_touch_cursor() {
    let mut source = RowSource::parse("@n,plain\n1,a\n2,b\n", "n.csv").unwrap();
    source.next_row().unwrap();

    let merged: Vec<Row> = source.iter_rows().collect();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].len(), 1);

    // Restartable
    assert_eq!(source.iter_rows().count(), 2);

    let full: Vec<&Row> = source.iter_full_rows().collect();
    assert_eq!(full[1]["plain"], "b");
    assert_eq!(source.cursor(), 1);
}

#[test]
fn test_no_merge_fields_means_no_rows() {
    let mut source = RowSource::parse("name,cost\nImp,1\nOrc,2\n", "plain.csv").unwrap();
    assert!(source.merge_fields().is_empty());
    assert_eq!(source.row_count(), 0);
    assert_eq!(source.remaining(), 0);
    assert!(!source.has_next());
    assert!(matches!(source.next_row(), Err(PaginateError::Exhausted)));
    assert_eq!(source.iter_rows().count(), 0);
    assert_eq!(source.iter_full_rows().count(), 2);

    let mut merge = MergeManager::new();
    merge.insert(TemplateId(0), source);
    assert!(!merge.has_rows(TemplateId(0)));
}

#[tokio::test]
async fn test_async_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "cards.csv", b"@title\tnotes\nFirst\tx\nSecond\ty\n");

    let source = RowSource::load(&path).await.unwrap();
    assert_eq!(source.delimiter(), b'\t');
    assert_eq!(source.row_count(), 2);
    assert_eq!(source.origin(), path.as_path());
}

#[tokio::test]
async fn test_async_load_via_merge_manager() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_temp(&dir, "good.csv", b"@a\n1\n2\n");
    let bad = write_temp(&dir, "bad.csv", b"\n");

    let mut merge = MergeManager::new();
    assert!(merge.load_path(TemplateId(0), "good", &good).await);
    assert!(!merge.load_path(TemplateId(1), "bad", &bad).await);

    assert_eq!(merge.row_count(TemplateId(0)), 2);
    assert_eq!(merge.row_count(TemplateId(1)), 0);
    assert_eq!(merge.warnings()[0].path, bad);
}
