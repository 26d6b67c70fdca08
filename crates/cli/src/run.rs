//! `expensor run`: recognize files, then reconcile.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use expensor_batch::{process_batch, BatchError, BatchFile, BatchOptions, BatchPhase};
use expensor_config::{get_api_key, Settings};
use expensor_recognize::{PageImage, RecognitionConfig, VisionClient};

use crate::exit_codes::{
    EXIT_BATCH_ALL_FAILED, EXIT_BATCH_INVALID, EXIT_BATCH_PARTIAL, EXIT_ERROR, EXIT_MISSING_KEY,
};
use crate::report::{emit_json, print_summary};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Image files (one page each) or directories (one multi-page document each)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Maximum recognition calls in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries for rate-limit, network and timeout failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Recognition endpoint (OpenAI-compatible base URL)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Recognition model name
    #[arg(long)]
    pub model: Option<String>,

    /// Suppress progress lines
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

pub fn cmd_run(args: RunArgs, settings: &Settings) -> Result<(), CliError> {
    let files = collect_files(&args.paths)?;
    let options = batch_options(&args, settings);
    let config = recognition_config(&args, settings)?;

    let client = VisionClient::new().map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;

    let quiet = args.quiet;
    let on_phase = move |phase: BatchPhase| {
        if !quiet {
            eprintln!("{}", phase);
        }
    };

    let out = process_batch(&files, &client, &config, &options, Some(&on_phase))
        .map_err(batch_error)?;

    emit_json(&out, args.json, args.output.as_deref())?;
    if !args.json {
        print_summary(&out.records, &out.sequence, &out.warnings, &out.summary);
    }

    if !out.per_file_errors.is_empty() {
        for err in &out.per_file_errors {
            eprintln!("failed: {} (after {} attempt(s))", err, err.attempts);
        }
        return Err(CliError::new(
            EXIT_BATCH_PARTIAL,
            format!("{} page(s) could not be recognized", out.per_file_errors.len()),
        ));
    }
    Ok(())
}

fn batch_options(args: &RunArgs, settings: &Settings) -> BatchOptions {
    BatchOptions {
        max_concurrency: args.concurrency.unwrap_or(settings.max_concurrency),
        timeout: Duration::from_secs(args.timeout.unwrap_or(settings.timeout_secs)),
        max_retries: args.retries.unwrap_or(settings.max_retries),
        retry_base_delay: Duration::from_millis(settings.retry_base_delay_ms),
    }
}

fn recognition_config(args: &RunArgs, settings: &Settings) -> Result<RecognitionConfig, CliError> {
    let lookup = get_api_key();
    let api_key = lookup.key.ok_or_else(|| {
        CliError::new(EXIT_MISSING_KEY, "no recognition API key configured")
            .with_hint("run `expensor key set` or set EXPENSOR_API_KEY")
    })?;
    log::debug!("api key from {}", lookup.source.as_str());

    Ok(RecognitionConfig {
        endpoint: args.endpoint.clone().unwrap_or_else(|| settings.endpoint.clone()),
        api_key,
        model: args.model.clone().unwrap_or_else(|| settings.model.clone()),
    })
}

fn batch_error(err: BatchError) -> CliError {
    match &err {
        BatchError::AllFailed { failures } => {
            let hint = failures
                .iter()
                .any(|f| f.category == "invalid_credential")
                .then(|| "check the API key with `expensor key status`".to_string());
            CliError {
                code: EXIT_BATCH_ALL_FAILED,
                message: err.to_string(),
                hint,
            }
        }
        BatchError::EmptyBatch => CliError::usage(err.to_string()),
        BatchError::InvalidOptions(_) | BatchError::EmptyDocument { .. } => {
            CliError::new(EXIT_BATCH_INVALID, err.to_string())
        }
    }
}

// ============================================================================
// Input collection
// ============================================================================

fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn read_page(path: &Path, media_type: &str) -> Result<PageImage, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    Ok(PageImage::new(bytes, media_type))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files become single-page images; directories become multi-page
/// documents of their images, sorted by file name. Empty directories are
/// passed through so the batch rejects them.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<BatchFile>, CliError> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            let mut pages: Vec<(PathBuf, &'static str)> = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| CliError::io(e.to_string()))?;
                let page_path = entry.path();
                if !page_path.is_file() {
                    continue;
                }
                match media_type(&page_path) {
                    Some(mt) => pages.push((page_path, mt)),
                    None => log::debug!("skipping non-image {}", page_path.display()),
                }
            }
            pages.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

            let images = pages
                .iter()
                .map(|(p, mt)| read_page(p, mt))
                .collect::<Result<Vec<_>, _>>()?;
            files.push(BatchFile::document(display_name(path), images));
        } else if path.is_file() {
            let mt = media_type(path).ok_or_else(|| {
                CliError::usage(format!("unsupported file type: {}", path.display()))
                    .with_hint("supported: png, jpg, jpeg, webp, gif, bmp (convert PDFs to page images first)")
            })?;
            files.push(BatchFile::image(display_name(path), read_page(path, mt)?));
        } else {
            return Err(CliError::usage(format!("no such file or directory: {}", path.display())));
        }
    }
    Ok(files)
}
