//! Output shared by `run` and `reconcile`: JSON to stdout/file, human
//! summary to stderr.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use expensor_recon::money::format_cents;
use expensor_recon::{Document, ReconSummary, Record, RecordId, SequenceResult, Warning};

use crate::CliError;

pub fn emit_json<T: Serialize>(value: &T, json: bool, output: Option<&Path>) -> Result<(), CliError> {
    if !json && output.is_none() {
        return Ok(());
    }

    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{json_str}");
    }
    Ok(())
}

pub fn print_summary(
    records: &[Record],
    sequence: &SequenceResult,
    warnings: &[Warning],
    summary: &ReconSummary,
) {
    let by_id: HashMap<&RecordId, &Record> = records.iter().map(|r| (&r.id, r)).collect();

    eprintln!(
        "{} records ({} invoices, {} trip sheets, {} failed), {} pairs, {} warnings",
        summary.total_records,
        summary.invoices,
        summary.trip_sheets,
        summary.failed_records,
        summary.pairs,
        warnings.len(),
    );

    for (category, ids) in &sequence.grouping {
        let total = summary.category_totals.get(category).copied().unwrap_or(0);
        eprintln!("{} ({}):", category, format_cents(total));
        for id in ids {
            if let Some(record) = by_id.get(id) {
                eprintln!("  {}", record_line(record));
            }
        }
    }

    for warning in warnings {
        eprintln!("warning [{}] {}: {}", warning.severity, warning.kind, warning.message);
    }
}

fn record_line(record: &Record) -> String {
    if record.is_error() {
        return format!(
            "!! {}",
            record.error.as_deref().unwrap_or("recognition failed")
        );
    }
    let date = if record.date.is_empty() { "-" } else { record.date.as_str() };
    let who = match &record.document {
        Document::Invoice(inv) => inv.vendor.as_str(),
        Document::TripSheet(trip) => trip.platform.as_str(),
    };
    let marker = match record.document {
        Document::Invoice(_) => "inv ",
        Document::TripSheet(_) => "trip",
    };
    format!(
        "{} {:<10} {:>10}  {} {}",
        marker,
        date,
        format_cents(record.amount_cents),
        who,
        record.description
    )
    .trim_end()
    .to_string()
}
