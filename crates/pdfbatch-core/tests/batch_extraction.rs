//! End-to-end runs of the [`BatchExtractor`] against the mock backend.
//!
//! Every test writes into its own temp directory and reads the batch files
//! back from disk, so these check the persisted format and not just the
//! in-memory summary.

use std::path::{Path, PathBuf};

use pdfbatch_core::mock::{MockBackend, MockPage};
use pdfbatch_core::record::batch_count;
use pdfbatch_core::{
    BatchExtractor, BatchRecord, ExtractConfig, ExtractError, ProgressEvent, RunStamp, read_batch,
};

fn config(dir: &Path, batch_size: u32) -> ExtractConfig {
    ExtractConfig {
        batch_size,
        output_dir: dir.to_path_buf(),
        ..ExtractConfig::default()
    }
}

/// Run with a pinned stamp and return (records in batch order, events).
fn run(
    backend: &MockBackend,
    cfg: ExtractConfig,
) -> (Vec<BatchRecord>, Vec<ProgressEvent>, Vec<PathBuf>) {
    let mut events = Vec::new();
    let summary = BatchExtractor::new(backend, cfg)
        .with_run_stamp(RunStamp::fixed("20250101_120000"))
        .run(Path::new("book.pdf"), |e| events.push(e))
        .expect("run should succeed");
    let records = summary
        .batch_files
        .iter()
        .map(|p| read_batch(p).expect("batch file should parse"))
        .collect();
    (records, events, summary.batch_files)
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn five_pages_in_batches_of_two() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::numbered(5);
    let (records, _, paths) = run(&backend, config(dir.path(), 2));

    let ranges: Vec<(u32, u32, u32)> = records
        .iter()
        .map(|r| (r.batch_number, r.start_page, r.end_page))
        .collect();
    assert_eq!(ranges, vec![(1, 1, 2), (2, 3, 4), (3, 5, 5)]);
    assert_eq!(records[2].text, vec!["page 5"]);

    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "batch_1_20250101_120000.json",
            "batch_2_20250101_120000.json",
            "batch_3_20250101_120000.json",
        ]
    );
    assert_eq!(files_in(dir.path()).len(), 3);
    assert_eq!(backend.open_count(), 1);
    assert_eq!(backend.page_calls(), 5);
}

#[test]
fn failed_middle_page_is_omitted_from_text() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(vec![
        MockPage::text("first"),
        MockPage::fail("corrupt content stream"),
        MockPage::text("third"),
    ]);
    let (records, events, _) = run(&backend, config(dir.path(), 500));

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!((record.start_page, record.end_page), (1, 3));
    assert_eq!(record.text, vec!["first", "third"]);
    assert_eq!(record.failed_pages(), vec![2]);
    assert_eq!(record.pages.as_ref().unwrap().len(), 3);

    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::PageFailed { page: 2, reason } if reason.contains("corrupt content stream")
    )));
}

#[test]
fn empty_document_succeeds_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(Vec::new());
    let (records, events, _) = run(&backend, config(dir.path(), 10));

    assert!(records.is_empty());
    assert!(files_in(dir.path()).is_empty());
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Completed {
            total_pages: 0,
            batches_written: 0,
            ..
        })
    ));
}

#[test]
fn unopenable_pdf_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let backend = MockBackend::failing_open("file not found");

    let mut events = Vec::new();
    let err = BatchExtractor::new(&backend, config(&out, 2))
        .run(Path::new("missing.pdf"), |e| events.push(e))
        .unwrap_err();

    assert!(matches!(err, ExtractError::Open(_)));
    assert!(err.to_string().contains("file not found"));
    assert!(events.is_empty());
    assert_eq!(backend.opened_paths(), vec![PathBuf::from("missing.pdf")]);
    assert_eq!(backend.page_calls(), 0);
    // The output directory is still created, but it stays empty.
    assert!(files_in(&out).is_empty());
}

#[test]
fn batch_count_and_ranges_tile_the_document() {
    for (total, batch_size) in [(1u32, 1u32), (7, 3), (10, 5), (11, 5), (4, 100), (1001, 500)] {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::numbered(total as usize);
        let (records, _, _) = run(&backend, config(dir.path(), batch_size));

        assert_eq!(
            records.len() as u32,
            batch_count(total, batch_size),
            "total={total} batch_size={batch_size}"
        );

        let numbers: Vec<u32> = records.iter().map(|r| r.batch_number).collect();
        let expected: Vec<u32> = (1..=records.len() as u32).collect();
        assert_eq!(numbers, expected);

        let mut next_start = 1;
        for r in &records {
            assert_eq!(r.start_page, next_start);
            assert!(r.page_span() <= batch_size);
            next_start = r.end_page + 1;
        }
        let covered: u32 = records.iter().map(|r| r.page_span()).sum();
        assert_eq!(covered, total);
    }
}

#[test]
fn batch_of_only_failures_is_still_written() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(vec![
        MockPage::text("one"),
        MockPage::text("two"),
        MockPage::fail("x"),
        MockPage::Panic,
        MockPage::text("five"),
    ]);
    let (records, _, _) = run(&backend, config(dir.path(), 2));

    assert_eq!(records.len(), 3);
    assert_eq!((records[1].start_page, records[1].end_page), (3, 4));
    assert!(records[1].text.is_empty());
    assert_eq!(records[1].failed_pages(), vec![3, 4]);
    assert_eq!(records[2].text, vec!["five"]);
}

#[test]
fn last_page_failure_still_flushes_final_batch() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new(vec![MockPage::text("one"), MockPage::fail("bad")]);
    let (records, _, _) = run(&backend, config(dir.path(), 10));

    assert_eq!(records.len(), 1);
    assert_eq!((records[0].start_page, records[0].end_page), (1, 2));
    assert_eq!(records[0].text, vec!["one"]);
}

#[test]
fn progress_lines_every_interval_pages() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::numbered(1200);
    let (_, events, _) = run(&backend, config(dir.path(), 500));

    let processed: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::PagesProcessed { processed, total } => {
                assert_eq!(*total, 1200);
                Some(*processed)
            }
            _ => None,
        })
        .collect();
    assert_eq!(processed, vec![500, 1000]);

    assert!(matches!(
        events.first(),
        Some(ProgressEvent::Started { total_pages: 1200 })
    ));
}

#[test]
fn rerun_in_same_second_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let first_backend = MockBackend::numbered(3);
    let second_backend = MockBackend::new(vec![
        MockPage::text("other 1"),
        MockPage::text("other 2"),
        MockPage::text("other 3"),
    ]);

    let (first, _, first_paths) = run(&first_backend, config(dir.path(), 2));
    let (second, _, second_paths) = run(&second_backend, config(dir.path(), 2));

    assert_eq!(files_in(dir.path()).len(), 4);
    for p in &second_paths {
        assert!(!first_paths.contains(p));
    }
    // First run's files still hold the first run's text.
    assert_eq!(read_batch(&first_paths[0]).unwrap(), first[0]);
    assert_eq!(second[0].text, vec!["other 1", "other 2"]);
}

#[test]
fn flushes_within_one_run_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::numbered(50);
    let summary = BatchExtractor::new(&backend, config(dir.path(), 1))
        .run(Path::new("tiny-batches.pdf"), |_| {})
        .unwrap();

    assert_eq!(summary.batches_written(), 50);
    assert_eq!(files_in(dir.path()).len(), 50);
}

#[test]
fn output_directory_is_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let backend = MockBackend::numbered(1);
    let (records, _, paths) = run(&backend, config(&nested, 5));

    assert_eq!(records.len(), 1);
    assert!(paths[0].starts_with(&nested));
}
