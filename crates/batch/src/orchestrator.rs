use std::collections::VecDeque;
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;
use serde::Serialize;

use expensor_recognize::{RecognitionConfig, RecognizedDocument, Recognizer};
use expensor_recon::{
    reconcile_with, summarize, PairingOutput, ReconSummary, Record, SequenceResult, Warning,
};

use crate::context::{BatchContext, FileError, FileOutcome};
use crate::error::BatchError;
use crate::input::BatchFile;
use crate::options::BatchOptions;
use crate::progress::BatchPhase;
use crate::retry::{with_retry, RetryFailure};

/// Result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// Input order: file index, then page index.
    pub records: Vec<Record>,
    pub pairing: PairingOutput,
    pub sequence: SequenceResult,
    pub warnings: Vec<Warning>,
    pub summary: ReconSummary,
    pub files: Vec<FileOutcome>,
    pub per_file_errors: Vec<FileError>,
}

#[derive(Debug, Clone, Copy)]
struct PageJob {
    file: usize,
    page: usize,
}

enum WorkerEvent {
    Started(PageJob),
    Finished(PageJob, Result<RecognizedDocument, RetryFailure>),
}

/// Recognize every page of every file, then reconcile the full set.
///
/// At most `options.max_concurrency` recognition calls run at once; the
/// rest queue. Progress callbacks run on the calling thread.
pub fn process_batch(
    files: &[BatchFile],
    recognizer: &dyn Recognizer,
    config: &RecognitionConfig,
    options: &BatchOptions,
    progress: Option<&dyn Fn(BatchPhase)>,
) -> Result<BatchOutput, BatchError> {
    validate(files, config, options)?;

    let report = |phase: BatchPhase| {
        log::info!("batch: {}", phase);
        if let Some(cb) = progress {
            cb(phase);
        }
    };

    let total = files.len();
    let mut ctx = BatchContext::new(files);
    let jobs: VecDeque<PageJob> = files
        .iter()
        .enumerate()
        .flat_map(|(file, f)| (0..f.page_count()).map(move |page| PageJob { file, page }))
        .collect();
    let workers = options.max_concurrency.min(jobs.len());
    log::info!(
        "batch: {} file(s), {} page(s), {} worker(s)",
        total,
        jobs.len(),
        workers
    );

    report(BatchPhase::Recognizing {
        completed: 0,
        total,
    });

    let queue = Mutex::new(jobs);
    let (tx, rx) = mpsc::channel::<WorkerEvent>();

    thread::scope(|s| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            s.spawn(move || loop {
                let Some(job) = queue.lock().pop_front() else {
                    break;
                };
                if tx.send(WorkerEvent::Started(job)).is_err() {
                    break;
                }
                let file = &files[job.file];
                let page = &file.pages()[job.page];
                let result = with_retry(
                    options.max_retries,
                    options.retry_base_delay,
                    thread::sleep,
                    |attempt| {
                        log::debug!(
                            "recognize {} page {} (attempt {})",
                            file.name,
                            job.page + 1,
                            attempt
                        );
                        recognizer.recognize(page, config, options.timeout)
                    },
                );
                if tx.send(WorkerEvent::Finished(job, result)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for event in rx {
            match event {
                WorkerEvent::Started(job) => ctx.mark_recognizing(job.file),
                WorkerEvent::Finished(job, result) => {
                    if ctx.resolve_page(job.file, job.page, result) {
                        report(BatchPhase::Recognizing {
                            completed: ctx.finished_files(),
                            total,
                        });
                    }
                }
            }
        }
    });

    if ctx.recognized_pages() == 0 {
        report(BatchPhase::Error);
        return Err(BatchError::AllFailed {
            failures: ctx.errors(),
        });
    }

    let records = ctx.records();
    let recon = reconcile_with(&records, |stage| report(stage.into()));
    let summary = summarize(&records, &recon);
    report(BatchPhase::Completed);

    Ok(BatchOutput {
        records,
        pairing: recon.pairing,
        sequence: recon.sequence,
        warnings: recon.warnings,
        summary,
        files: ctx.outcomes(),
        per_file_errors: ctx.errors(),
    })
}

fn validate(
    files: &[BatchFile],
    config: &RecognitionConfig,
    options: &BatchOptions,
) -> Result<(), BatchError> {
    if files.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    options.validate()?;
    config.validate().map_err(BatchError::InvalidOptions)?;
    if let Some(empty) = files.iter().find(|f| f.page_count() == 0) {
        return Err(BatchError::EmptyDocument {
            file: empty.name.clone(),
        });
    }
    Ok(())
}
