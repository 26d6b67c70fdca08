use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::Reconciliation;
use crate::model::{Category, DocumentKind, ProcessingStatus, Record, Severity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_records: usize,
    pub invoices: usize,
    pub trip_sheets: usize,
    pub failed_records: usize,
    pub pairs: usize,
    pub unmatched_invoices: usize,
    pub unmatched_trip_sheets: usize,
    pub warnings_high: usize,
    pub warnings_medium: usize,
    pub warnings_low: usize,
    /// Invoice totals per category in cents, placeholders excluded.
    /// Totals saturate at the `i64` bounds.
    pub category_totals: BTreeMap<Category, i64>,
    pub invoice_total_cents: i64,
}

/// Compute summary statistics from a reconciliation and its record set.
pub fn summarize(records: &[Record], recon: &Reconciliation) -> ReconSummary {
    let mut summary = ReconSummary {
        total_records: records.len(),
        pairs: recon.pairing.pairs.len(),
        unmatched_invoices: recon.pairing.unmatched_invoices.len(),
        unmatched_trip_sheets: recon.pairing.unmatched_trip_sheets.len(),
        ..Default::default()
    };

    for r in records {
        match r.kind() {
            DocumentKind::Invoice => summary.invoices += 1,
            DocumentKind::TripSheet => summary.trip_sheets += 1,
        }
        if r.status == ProcessingStatus::Error {
            summary.failed_records += 1;
            continue;
        }
        if let Some(category) = r.category() {
            let total = summary.category_totals.entry(category).or_insert(0);
            *total = total.saturating_add(r.amount_cents);
            summary.invoice_total_cents = summary.invoice_total_cents.saturating_add(r.amount_cents);
        }
    }

    for w in &recon.warnings {
        match w.severity {
            Severity::High => summary.warnings_high += 1,
            Severity::Medium => summary.warnings_medium += 1,
            Severity::Low => summary.warnings_low += 1,
        }
    }

    summary
}
