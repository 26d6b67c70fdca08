//! Anomaly detection over a record set.
//!
//! Four independent detectors, concatenated in a fixed order: duplicates,
//! amount outliers, date gaps, missing pairs. Pure and infallible; degenerate
//! input yields fewer warnings, never an error.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::dates::{current_year, days_between, parse_document_date_in};
use crate::model::{
    Category, InvoiceDetails, Pair, Record, RecordId, Severity, Warning, WarningKind,
};
use crate::money::format_cents;

/// Tukey fence multipliers.
const MILD_FENCE: f64 = 1.5;
const FAR_FENCE: f64 = 3.0;

/// Consecutive-date gap thresholds in days (exclusive).
const GAP_LOW_DAYS: i64 = 7;
const GAP_MEDIUM_DAYS: i64 = 14;
const GAP_HIGH_DAYS: i64 = 30;

/// Run every detector. `pairs` enables the missing-pair detector.
pub fn detect_anomalies(records: &[Record], pairs: Option<&[Pair]>) -> Vec<Warning> {
    let mut warnings = detect_duplicates(records);
    warnings.extend(detect_amount_anomalies(records));
    warnings.extend(detect_date_gaps(records));
    if let Some(pairs) = pairs {
        warnings.extend(detect_missing_pairs(records, pairs));
    }
    warnings
}

fn invoices(records: &[Record]) -> impl Iterator<Item = (&Record, &InvoiceDetails)> {
    records.iter().filter_map(|r| r.as_invoice().map(|inv| (r, inv)))
}

/// Group items by key, preserving first-appearance order of keys.
fn group_in_order<K, T>(items: impl IntoIterator<Item = (K, T)>) -> Vec<(K, Vec<T>)>
where
    K: std::hash::Hash + Eq + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for (key, item) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![item]));
            }
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

/// Same invoice number → high. Otherwise same (amount, date) → medium.
///
/// Placeholder records carry no recognized values and never take part in the
/// amount/date comparison.
pub fn detect_duplicates(records: &[Record]) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let by_number = group_in_order(
        invoices(records)
            .filter(|(_, inv)| !inv.invoice_number.trim().is_empty())
            .map(|(r, inv)| (inv.invoice_number.trim().to_string(), &r.id)),
    );

    let mut covered: HashSet<&RecordId> = HashSet::new();
    for (number, ids) in by_number {
        if ids.len() < 2 {
            continue;
        }
        covered.extend(ids.iter().copied());
        warnings.push(Warning {
            kind: WarningKind::Duplicate,
            message: format!("Invoice number {number} appears {} times", ids.len()),
            record_ids: ids.into_iter().cloned().collect(),
            severity: Severity::High,
        });
    }

    let by_amount_date = group_in_order(
        invoices(records)
            .filter(|(r, _)| !r.is_error() && !covered.contains(&r.id))
            .map(|(r, _)| ((r.amount_cents, r.date.trim().to_string()), &r.id)),
    );

    for ((cents, date), ids) in by_amount_date {
        if ids.len() < 2 {
            continue;
        }
        let on = if date.is_empty() { "no date".to_string() } else { date };
        warnings.push(Warning {
            kind: WarningKind::Duplicate,
            message: format!(
                "{} invoices share amount {} on {on}; possible duplicate",
                ids.len(),
                format_cents(cents)
            ),
            record_ids: ids.into_iter().cloned().collect(),
            severity: Severity::Medium,
        });
    }

    warnings
}

// ---------------------------------------------------------------------------
// Amount outliers
// ---------------------------------------------------------------------------

/// Quartile summary of one category's amounts, in cents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    /// `sorted` must be ascending and non-empty.
    ///
    /// Q1/Q3 are nearest-rank values at positions `round((n - 1) * p)`; the
    /// median averages the two middle values.
    pub fn from_sorted(sorted: &[i64]) -> Option<Self> {
        let n = sorted.len();
        if n == 0 {
            return None;
        }
        let at = |p: f64| sorted[((n - 1) as f64 * p).round() as usize] as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
        };
        Some(Self {
            q1: at(0.25),
            median,
            q3: at(0.75),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Per-category IQR outliers. Categories with fewer than two invoices have
/// no statistical basis and are skipped.
pub fn detect_amount_anomalies(records: &[Record]) -> Vec<Warning> {
    let mut by_category: BTreeMap<Category, Vec<&Record>> = BTreeMap::new();
    for (record, inv) in invoices(records) {
        if record.is_error() {
            continue;
        }
        by_category.entry(inv.category).or_default().push(record);
    }

    let mut warnings = Vec::new();
    for (category, members) in by_category {
        if members.len() < 2 {
            continue;
        }
        let mut amounts: Vec<i64> = members.iter().map(|r| r.amount_cents).collect();
        amounts.sort_unstable();
        let Some(q) = Quartiles::from_sorted(&amounts) else {
            continue;
        };
        let iqr = q.iqr();

        for record in members {
            let amount = record.amount_cents as f64;
            let severity = if amount < q.q1 - FAR_FENCE * iqr || amount > q.q3 + FAR_FENCE * iqr {
                Severity::High
            } else if amount < q.q1 - MILD_FENCE * iqr || amount > q.q3 + MILD_FENCE * iqr {
                Severity::Medium
            } else {
                continue;
            };
            let direction = if amount > q.q3 { "too high" } else { "too low" };
            warnings.push(Warning {
                kind: WarningKind::AmountAnomaly,
                message: format!(
                    "{category} amount {} looks {direction} (category median {})",
                    format_cents(record.amount_cents),
                    format_cents(q.median.round() as i64),
                ),
                record_ids: vec![record.id.clone()],
                severity,
            });
        }
    }
    warnings
}

// ---------------------------------------------------------------------------
// Date gaps
// ---------------------------------------------------------------------------

/// Gaps between consecutive dated records (both kinds), oldest first.
pub fn detect_date_gaps(records: &[Record]) -> Vec<Warning> {
    let year = current_year();
    let mut dated: Vec<(NaiveDate, &RecordId)> = records
        .iter()
        .filter_map(|r| parse_document_date_in(&r.date, year).map(|d| (d, &r.id)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    dated
        .windows(2)
        .filter_map(|w| {
            let (from, from_id) = w[0];
            let (to, to_id) = w[1];
            let gap = days_between(from, to);
            let severity = gap_severity(gap)?;
            Some(Warning {
                kind: WarningKind::DateGap,
                message: format!("{gap}-day gap between {from} and {to}"),
                record_ids: vec![from_id.clone(), to_id.clone()],
                severity,
            })
        })
        .collect()
}

fn gap_severity(days: i64) -> Option<Severity> {
    if days > GAP_HIGH_DAYS {
        Some(Severity::High)
    } else if days > GAP_MEDIUM_DAYS {
        Some(Severity::Medium)
    } else if days > GAP_LOW_DAYS {
        Some(Severity::Low)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Missing pairs
// ---------------------------------------------------------------------------

/// Taxi invoices without a trip sheet, and trip sheets without an invoice.
pub fn detect_missing_pairs(records: &[Record], pairs: &[Pair]) -> Vec<Warning> {
    let paired_invoices: HashSet<&RecordId> = pairs.iter().map(|p| &p.invoice_id).collect();
    let paired_trips: HashSet<&RecordId> = pairs.iter().map(|p| &p.trip_sheet_id).collect();

    let mut warnings = Vec::new();
    for record in records {
        if paired_invoices.contains(&record.id) || paired_trips.contains(&record.id) {
            continue;
        }
        let message = match record.category() {
            Some(Category::Taxi) => format!(
                "Taxi invoice {} has no matching trip sheet",
                format_cents(record.amount_cents)
            ),
            Some(_) => continue,
            None => format!(
                "Trip sheet {} has no matching invoice",
                format_cents(record.amount_cents)
            ),
        };
        warnings.push(Warning {
            kind: WarningKind::MissingPair,
            message,
            record_ids: vec![record.id.clone()],
            severity: Severity::Medium,
        });
    }
    warnings
}
