//! Orchestrator behavior against a scripted recognizer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use expensor_batch::{
    process_batch, BatchError, BatchFile, BatchOptions, BatchPhase, FileState,
};
use expensor_recognize::{
    PageImage, RecognitionConfig, RecognitionError, RecognizedDocument, Recognizer,
};
use expensor_recon::{Category, Document, InvoiceDetails, ProcessingStatus, TripSheetDetails};

// ============================================================================
// Scripted recognizer
// ============================================================================

#[derive(Clone)]
enum Script {
    Ok(RecognizedDocument),
    /// Fail with a retryable error `n` times, then succeed.
    Flaky(u32, RecognizedDocument),
    Fail(RecognitionError),
    Slow(u64, RecognizedDocument),
}

/// Pages are keyed by their bytes, so each test page carries a label.
#[derive(Default)]
struct FakeRecognizer {
    scripts: HashMap<Vec<u8>, Script>,
    calls: Mutex<HashMap<Vec<u8>, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRecognizer {
    fn with(mut self, label: &str, script: Script) -> Self {
        self.scripts.insert(label.as_bytes().to_vec(), script);
        self
    }

    fn calls(&self, label: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(label.as_bytes())
            .copied()
            .unwrap_or(0)
    }
}

impl Recognizer for FakeRecognizer {
    fn recognize(
        &self,
        page: &PageImage,
        _config: &RecognitionConfig,
        _timeout: Duration,
    ) -> Result<RecognizedDocument, RecognitionError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let call = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(page.bytes.clone()).or_insert(0);
            *n += 1;
            *n
        };

        let result = match self.scripts.get(&page.bytes) {
            Some(Script::Ok(doc)) => Ok(doc.clone()),
            Some(Script::Flaky(failures, doc)) => {
                if call <= *failures {
                    Err(RecognitionError::RateLimited("429".into()))
                } else {
                    Ok(doc.clone())
                }
            }
            Some(Script::Fail(err)) => Err(err.clone()),
            Some(Script::Slow(ms, doc)) => {
                thread::sleep(Duration::from_millis(*ms));
                Ok(doc.clone())
            }
            None => Err(RecognitionError::Malformed("unscripted page".into())),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn config() -> RecognitionConfig {
    RecognitionConfig {
        endpoint: "http://localhost/v1".into(),
        api_key: "test".into(),
        model: "vision".into(),
    }
}

fn options(concurrency: usize) -> BatchOptions {
    BatchOptions {
        max_concurrency: concurrency,
        timeout: Duration::from_secs(5),
        max_retries: 3,
        retry_base_delay: Duration::from_millis(1),
    }
}

fn page(label: &str) -> PageImage {
    PageImage::new(label.as_bytes().to_vec(), "image/png")
}

fn invoice(category: Category, amount_cents: i64, date: &str, desc: &str) -> RecognizedDocument {
    RecognizedDocument {
        date: date.into(),
        amount_cents,
        description: desc.into(),
        confidence: 95,
        document: Document::Invoice(InvoiceDetails {
            category,
            invoice_number: format!("NO-{}", desc),
            vendor: "如祺出行".into(),
            tax_cents: None,
        }),
    }
}

fn trip(amount_cents: i64, date: &str, desc: &str) -> RecognizedDocument {
    RecognizedDocument {
        date: date.into(),
        amount_cents,
        description: desc.into(),
        confidence: 90,
        document: Document::TripSheet(TripSheetDetails {
            platform: "如祺出行".into(),
            origin: "A".into(),
            destination: "B".into(),
            departure_time: "09:00".into(),
            distance_km: 12.0,
        }),
    }
}

fn descriptions(records: &[expensor_recon::Record]) -> Vec<String> {
    records.iter().map(|r| r.description.clone()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_one_permanent_failure_does_not_abort_batch() {
    let fake = FakeRecognizer::default()
        .with("f1", Script::Ok(invoice(Category::Taxi, 21967, "2024-03-11", "taxi")))
        .with("f2", Script::Fail(RecognitionError::InvalidCredential("bad key".into())))
        .with("f3", Script::Ok(trip(21967, "2024-03-11", "trip")));
    let files = vec![
        BatchFile::image("f1.png", page("f1")),
        BatchFile::image("f2.png", page("f2")),
        BatchFile::image("f3.png", page("f3")),
    ];

    let phases = Mutex::new(Vec::new());
    let on_phase = |p: BatchPhase| phases.lock().unwrap().push(p);
    let out = process_batch(&files, &fake, &config(), &options(2), Some(&on_phase)).unwrap();

    assert_eq!(out.records.len(), 3);
    assert_eq!(out.records[1].status, ProcessingStatus::Error);
    assert!(out.records[1].error.as_deref().unwrap().starts_with("f2.png: invalid credential"));
    assert_eq!(fake.calls("f2"), 1);
    assert_eq!(out.per_file_errors.len(), 1);
    assert_eq!(out.per_file_errors[0].category, "invalid_credential");
    assert_eq!(out.files[1].state, FileState::Failed);
    assert_eq!(out.files[0].state, FileState::Completed);

    assert_eq!(out.pairing.pairs.len(), 1);
    assert_eq!(out.sequence.suggested_order.len(), 3);

    let phases = phases.into_inner().unwrap();
    let tail: Vec<_> = phases
        .iter()
        .filter(|p| !matches!(p, BatchPhase::Recognizing { .. }))
        .copied()
        .collect();
    assert_eq!(
        tail,
        vec![
            BatchPhase::Pairing,
            BatchPhase::Sorting,
            BatchPhase::Detecting,
            BatchPhase::Completed
        ]
    );
    assert_eq!(
        phases.first(),
        Some(&BatchPhase::Recognizing { completed: 0, total: 3 })
    );
    assert!(phases.contains(&BatchPhase::Recognizing { completed: 3, total: 3 }));
}

#[test]
fn test_transient_failures_are_retried() {
    let fake = FakeRecognizer::default()
        .with("flaky", Script::Flaky(2, invoice(Category::Hotel, 40000, "2024-05-01", "hotel")));
    let files = vec![BatchFile::image("flaky.png", page("flaky"))];

    let out = process_batch(&files, &fake, &config(), &options(1), None).unwrap();

    assert_eq!(fake.calls("flaky"), 3);
    assert_eq!(out.records[0].status, ProcessingStatus::Completed);
    assert!(out.per_file_errors.is_empty());
}

#[test]
fn test_retries_exhausted_become_placeholder() {
    let fake = FakeRecognizer::default()
        .with("ok", Script::Ok(invoice(Category::Train, 5530, "2024-05-01", "train")))
        .with("down", Script::Flaky(10, invoice(Category::Train, 1, "2024-05-01", "never")));
    let files = vec![
        BatchFile::image("ok.png", page("ok")),
        BatchFile::image("down.png", page("down")),
    ];

    let out = process_batch(&files, &fake, &config(), &options(2), None).unwrap();

    // 1 attempt + 3 retries
    assert_eq!(fake.calls("down"), 4);
    assert_eq!(out.per_file_errors[0].attempts, 4);
    assert!(out.records[1].is_error());
    assert_eq!(out.records[1].amount_cents, 0);
}

#[test]
fn test_every_file_failing_aborts() {
    let fake = FakeRecognizer::default()
        .with("a", Script::Fail(RecognitionError::Malformed("garbage".into())))
        .with("b", Script::Fail(RecognitionError::InvalidCredential("nope".into())));
    let files = vec![
        BatchFile::image("a.png", page("a")),
        BatchFile::image("b.png", page("b")),
    ];

    let phases = Mutex::new(Vec::new());
    let on_phase = |p: BatchPhase| phases.lock().unwrap().push(p);
    let err = process_batch(&files, &fake, &config(), &options(2), Some(&on_phase)).unwrap_err();

    match err {
        BatchError::AllFailed { failures } => assert_eq!(failures.len(), 2),
        other => panic!("expected AllFailed, got {:?}", other),
    }
    let phases = phases.into_inner().unwrap();
    assert_eq!(phases.last(), Some(&BatchPhase::Error));
    assert!(!phases.contains(&BatchPhase::Pairing));
}

#[test]
fn test_validation_errors_before_recognition() {
    let fake = FakeRecognizer::default();

    assert_eq!(
        process_batch(&[], &fake, &config(), &options(2), None).unwrap_err(),
        BatchError::EmptyBatch
    );

    let files = vec![BatchFile::image("x.png", page("x"))];
    assert!(matches!(
        process_batch(&files, &fake, &config(), &options(0), None),
        Err(BatchError::InvalidOptions(_))
    ));

    let mut bad = config();
    bad.endpoint.clear();
    assert!(matches!(
        process_batch(&files, &fake, &bad, &options(2), None),
        Err(BatchError::InvalidOptions(_))
    ));

    let files = vec![
        BatchFile::image("x.png", page("x")),
        BatchFile::document("scan.pdf", vec![]),
    ];
    assert_eq!(
        process_batch(&files, &fake, &config(), &options(2), None).unwrap_err(),
        BatchError::EmptyDocument { file: "scan.pdf".into() }
    );
    assert_eq!(fake.calls("x"), 0);
}

#[test]
fn test_concurrency_bound_is_respected() {
    let mut fake = FakeRecognizer::default();
    let mut files = Vec::new();
    for i in 0..8 {
        let label = format!("slow{}", i);
        fake = fake.with(
            &label,
            Script::Slow(30, invoice(Category::Toll, 1000 + i, "2024-06-01", &label)),
        );
        files.push(BatchFile::image(format!("{}.png", label), page(&label)));
    }

    let out = process_batch(&files, &fake, &config(), &options(3), None).unwrap();

    assert_eq!(out.records.len(), 8);
    let max = fake.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "max in flight {}", max);
    assert!(max >= 2, "expected parallel calls, saw {}", max);
}

#[test]
fn test_completion_order_does_not_leak_into_results() {
    // Earlier files finish last.
    let fake = FakeRecognizer::default()
        .with("p1", Script::Slow(60, invoice(Category::Taxi, 3000, "2024-07-01", "first")))
        .with("p2", Script::Slow(30, trip(3000, "2024-07-01", "second")))
        .with("p3", Script::Ok(invoice(Category::Hotel, 50000, "2024-07-01", "third")));
    let files = vec![
        BatchFile::image("p1.png", page("p1")),
        BatchFile::image("p2.png", page("p2")),
        BatchFile::image("p3.png", page("p3")),
    ];

    let parallel = process_batch(&files, &fake, &config(), &options(3), None).unwrap();
    let serial = process_batch(&files, &fake, &config(), &options(1), None).unwrap();

    assert_eq!(descriptions(&parallel.records), vec!["first", "second", "third"]);
    assert_eq!(descriptions(&parallel.records), descriptions(&serial.records));

    // Same shape of derivations; ids differ between runs.
    let order_desc = |out: &expensor_batch::BatchOutput| -> Vec<String> {
        out.sequence
            .suggested_order
            .iter()
            .map(|id| {
                out.records
                    .iter()
                    .find(|r| &r.id == id)
                    .map(|r| r.description.clone())
                    .unwrap()
            })
            .collect()
    };
    assert_eq!(order_desc(&parallel), order_desc(&serial));
    assert_eq!(order_desc(&parallel), vec!["third", "first", "second"]);
}

#[test]
fn test_multi_page_document_yields_record_per_page() {
    let fake = FakeRecognizer::default()
        .with("d-1", Script::Ok(invoice(Category::Shipping, 1200, "2024-08-01", "page1")))
        .with("d-2", Script::Fail(RecognitionError::Malformed("blank page".into())))
        .with("d-3", Script::Ok(invoice(Category::Shipping, 1800, "2024-08-02", "page3")))
        .with("img", Script::Ok(invoice(Category::Consumables, 990, "2024-08-01", "pens")));
    let files = vec![
        BatchFile::document("waybills", vec![page("d-1"), page("d-2"), page("d-3")]),
        BatchFile::image("pens.jpg", page("img")),
    ];

    let out = process_batch(&files, &fake, &config(), &options(2), None).unwrap();

    assert_eq!(out.records.len(), 4);
    assert_eq!(descriptions(&out.records)[0], "page1");
    assert!(out.records[1].is_error());
    assert_eq!(
        out.records[1].error.as_deref(),
        Some("waybills page 2: malformed response: blank page")
    );
    assert_eq!(descriptions(&out.records)[2], "page3");
    assert_eq!(out.files[0].pages, 3);
    assert_eq!(out.files[0].state, FileState::Failed);
    assert_eq!(out.files[1].state, FileState::Completed);
    assert_eq!(out.summary.failed_records, 1);
}
