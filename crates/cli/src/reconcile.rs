//! `expensor reconcile`: recompute derivations from an edited record set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use expensor_recon::{reconcile, summarize, PairingOutput, ReconSummary, Record, SequenceResult, Warning};

use crate::report::{emit_json, print_summary};
use crate::CliError;

/// Accepts a bare array or any object with a `records` array (such as
/// `run --json` output).
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Bare(Vec<Record>),
    Wrapped { records: Vec<Record> },
}

#[derive(Serialize)]
struct ReconcileOutput<'a> {
    records: &'a [Record],
    pairing: PairingOutput,
    sequence: SequenceResult,
    warnings: Vec<Warning>,
    summary: ReconSummary,
}

pub fn cmd_reconcile(path: PathBuf, json: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let records = load_records(&path)?;
    log::info!("reconcile: {} records from {}", records.len(), path.display());

    let recon = reconcile(&records);
    let summary = summarize(&records, &recon);

    let out = ReconcileOutput {
        records: &records,
        pairing: recon.pairing,
        sequence: recon.sequence,
        warnings: recon.warnings,
        summary,
    };
    emit_json(&out, json, output.as_deref())?;
    print_summary(&records, &out.sequence, &out.warnings, &out.summary);
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<Record>, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    let file: RecordsFile = serde_json::from_str(&contents).map_err(|e| {
        CliError::parse(format!("{}: {e}", path.display()))
            .with_hint("expected a JSON array of records or an object with a \"records\" array")
    })?;
    let records = match file {
        RecordsFile::Bare(records) | RecordsFile::Wrapped { records } => records,
    };

    let mut seen = HashSet::new();
    if let Some(dup) = records.iter().find(|r| !seen.insert(&r.id)) {
        return Err(
            CliError::parse(format!("{}: duplicate record id", path.display())).with_hint(format!(
                "record id \"{}\" appears more than once; ids must be unique",
                dup.id.as_str()
            )),
        );
    }
    Ok(records)
}
