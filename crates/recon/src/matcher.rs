//! Invoice ↔ trip sheet pairing.
//!
//! Deterministic greedy heuristic: invoices claim trip sheets in input
//! order, each taking the best-scoring unclaimed candidate. Not a global
//! assignment; on score ties the earliest-scanned trip sheet wins.

use chrono::NaiveDate;

use crate::dates::{current_year, days_between, parse_document_date_in};
use crate::model::{Category, InvoiceDetails, Pair, PairingOutput, Record, TripSheetDetails};

/// Minimum composite score for a candidate to count as a match.
pub const MATCH_THRESHOLD: u32 = 50;

/// Amounts within one cent are treated as equal.
pub const AMOUNT_TOLERANCE_CENTS: u64 = 1;

const AMOUNT_SCORE: u32 = 50;
const PLATFORM_SCORE: u32 = 20;

/// Ride-hailing platforms and the keywords that identify them on invoices.
///
/// Invoices are often issued by the operating company rather than the
/// consumer brand (滴滴 invoices come from 小桔科技), so each platform maps
/// to every keyword that may appear in the vendor or description.
const PLATFORM_ALIASES: &[(&str, &[&str])] = &[
    ("滴滴", &["滴滴", "小桔", "didi"]),
    ("高德", &["高德", "amap"]),
    ("如祺", &["如祺", "宸祺"]),
    ("曹操", &["曹操", "吉利优行"]),
    ("t3", &["t3出行", "龙腾出行"]),
    ("美团", &["美团", "三快"]),
    ("首汽", &["首汽"]),
    ("花小猪", &["花小猪"]),
    ("享道", &["享道"]),
    ("uber", &["uber"]),
];

/// Pair invoices with trip sheets. Never fails; empty input yields empty
/// output.
pub fn pair_documents(records: &[Record]) -> PairingOutput {
    let year = current_year();

    let trips: Vec<(&Record, &TripSheetDetails, Option<NaiveDate>)> = records
        .iter()
        .filter_map(|r| {
            r.as_trip_sheet()
                .map(|t| (r, t, parse_document_date_in(&r.date, year)))
        })
        .collect();
    let mut claimed = vec![false; trips.len()];

    let mut out = PairingOutput::default();

    for invoice in records {
        let Some(details) = invoice.as_invoice() else {
            continue;
        };
        let invoice_date = parse_document_date_in(&invoice.date, year);

        let mut best: Option<(usize, MatchScore)> = None;
        for (ti, (trip, trip_details, trip_date)) in trips.iter().enumerate() {
            if claimed[ti] {
                continue;
            }
            let score = score_candidate(
                invoice,
                details,
                invoice_date,
                trip,
                trip_details,
                *trip_date,
            );
            if score.total < MATCH_THRESHOLD {
                continue;
            }
            // Strict comparison keeps the earliest-scanned candidate on ties.
            if best.as_ref().map_or(true, |(_, b)| score.total > b.total) {
                best = Some((ti, score));
            }
        }

        match best {
            Some((ti, score)) => {
                claimed[ti] = true;
                out.pairs.push(Pair {
                    invoice_id: invoice.id.clone(),
                    trip_sheet_id: trips[ti].0.id.clone(),
                    confidence: score.total,
                    reason: score.reasons.join(", "),
                });
            }
            None => out.unmatched_invoices.push(invoice.id.clone()),
        }
    }

    out.unmatched_trip_sheets = trips
        .iter()
        .zip(&claimed)
        .filter(|(_, used)| !**used)
        .map(|((trip, _, _), _)| trip.id.clone())
        .collect();

    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    pub total: u32,
    pub reasons: Vec<&'static str>,
}

/// Composite score of one invoice against one trip sheet.
pub fn score_candidate(
    invoice: &Record,
    details: &InvoiceDetails,
    invoice_date: Option<NaiveDate>,
    trip: &Record,
    trip_details: &TripSheetDetails,
    trip_date: Option<NaiveDate>,
) -> MatchScore {
    let mut total = 0;
    let mut reasons = Vec::new();

    if invoice.amount_cents.abs_diff(trip.amount_cents) <= AMOUNT_TOLERANCE_CENTS {
        total += AMOUNT_SCORE;
        reasons.push("amount matches");
    }

    if let (Some(a), Some(b)) = (invoice_date, trip_date) {
        if let Some((points, phrase)) = date_proximity(days_between(a, b).abs()) {
            total += points;
            reasons.push(phrase);
        }
    }

    if details.category == Category::Taxi
        && platform_mentioned(&trip_details.platform, &details.vendor, &invoice.description)
    {
        total += PLATFORM_SCORE;
        reasons.push("platform matches vendor");
    }

    MatchScore { total, reasons }
}

fn date_proximity(days: i64) -> Option<(u32, &'static str)> {
    match days {
        0 => Some((30, "same day")),
        1 => Some((25, "1 day apart")),
        2..=3 => Some((20, "within 3 days")),
        4..=7 => Some((10, "within 7 days")),
        _ => None,
    }
}

/// True when the platform name, or a known alias of it, appears in the
/// invoice vendor or description.
fn platform_mentioned(platform: &str, vendor: &str, description: &str) -> bool {
    let platform = platform.trim().to_lowercase();
    if platform.is_empty() {
        return false;
    }
    let haystacks = [vendor.to_lowercase(), description.to_lowercase()];
    let mentions = |needle: &str| haystacks.iter().any(|h| h.contains(needle));

    if mentions(&platform) {
        return true;
    }
    PLATFORM_ALIASES
        .iter()
        .filter(|(key, _)| platform.contains(*key))
        .flat_map(|(_, aliases)| aliases.iter())
        .any(|alias| mentions(*alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, ProcessingStatus, RecordId};

    fn invoice(id: &str, cents: i64, date: &str, category: Category, vendor: &str) -> Record {
        Record {
            id: id.into(),
            date: date.into(),
            amount_cents: cents,
            description: String::new(),
            confidence: 90,
            status: ProcessingStatus::Completed,
            error: None,
            document: Document::Invoice(InvoiceDetails {
                category,
                invoice_number: format!("N-{id}"),
                vendor: vendor.into(),
                tax_cents: None,
            }),
        }
    }

    fn trip(id: &str, cents: i64, date: &str, platform: &str) -> Record {
        Record {
            id: id.into(),
            date: date.into(),
            amount_cents: cents,
            description: String::new(),
            confidence: 90,
            status: ProcessingStatus::Completed,
            error: None,
            document: Document::TripSheet(TripSheetDetails {
                platform: platform.into(),
                ..Default::default()
            }),
        }
    }

    fn ids(v: &[RecordId]) -> Vec<&str> {
        v.iter().map(|i| i.as_str()).collect()
    }

    #[test]
    fn full_score_pair() {
        let records = vec![
            invoice("i1", 21967, "11/03", Category::Taxi, "如祺出行"),
            trip("t1", 21967, "11/03", "如祺出行"),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].confidence, 100);
        assert_eq!(out.pairs[0].reason, "amount matches, same day, platform matches vendor");
        assert!(out.unmatched_invoices.is_empty());
        assert!(out.unmatched_trip_sheets.is_empty());
    }

    #[test]
    fn amount_alone_reaches_threshold() {
        let records = vec![
            invoice("i1", 5000, "", Category::Hotel, "Hilton"),
            trip("t1", 5000, "garbled", "滴滴出行"),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].confidence, 50);
        assert_eq!(out.pairs[0].reason, "amount matches");
    }

    #[test]
    fn date_and_platform_reach_threshold_without_amount() {
        // 30 + 20 = 50 reaches the threshold even without an amount match
        let records = vec![
            invoice("i1", 5000, "2024-05-01", Category::Taxi, "滴滴出行"),
            trip("t1", 4000, "2024-05-01", "滴滴出行"),
            invoice("i2", 5000, "2024-05-01", Category::Hotel, "Hilton"),
            trip("t2", 4000, "2024-05-02", "Hilton"),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].invoice_id.as_str(), "i1");
        assert_eq!(out.pairs[0].confidence, 50);
        assert_eq!(ids(&out.unmatched_invoices), vec!["i2"]);
        assert_eq!(ids(&out.unmatched_trip_sheets), vec!["t2"]);
    }

    #[test]
    fn alias_matches_operating_company() {
        let records = vec![
            invoice("i1", 3300, "2024-05-01", Category::Taxi, "北京小桔科技有限公司"),
            trip("t1", 3300, "2024-05-04", "滴滴出行"),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs[0].confidence, 50 + 20 + 20);
    }

    #[test]
    fn platform_bonus_only_for_taxi() {
        let records = vec![
            invoice("i1", 3300, "2024-05-01", Category::Train, "滴滴出行"),
            trip("t1", 3300, "2024-05-01", "滴滴出行"),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs[0].confidence, 80);
    }

    #[test]
    fn date_proximity_tiers() {
        assert_eq!(date_proximity(0).unwrap().0, 30);
        assert_eq!(date_proximity(1).unwrap().0, 25);
        assert_eq!(date_proximity(3).unwrap().0, 20);
        assert_eq!(date_proximity(7).unwrap().0, 10);
        assert!(date_proximity(8).is_none());
    }

    #[test]
    fn greedy_claims_in_invoice_order() {
        // i1 scans first and takes t1 (same day); i2 would have preferred t1
        // too but only t2 remains.
        let records = vec![
            invoice("i1", 1000, "2024-05-01", Category::Taxi, ""),
            invoice("i2", 1000, "2024-05-01", Category::Taxi, ""),
            trip("t1", 1000, "2024-05-01", ""),
            trip("t2", 1000, "2024-05-20", ""),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].trip_sheet_id.as_str(), "t1");
        assert_eq!(out.pairs[1].trip_sheet_id.as_str(), "t2");
        assert_eq!(out.pairs[1].confidence, 50);
    }

    #[test]
    fn ties_go_to_earliest_scanned() {
        let records = vec![
            trip("t1", 1000, "2024-05-02", ""),
            trip("t2", 1000, "2024-04-30", ""),
            invoice("i1", 1000, "2024-05-01", Category::Other, ""),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs[0].trip_sheet_id.as_str(), "t1");
        assert_eq!(ids(&out.unmatched_trip_sheets), vec!["t2"]);
    }

    #[test]
    fn one_cent_difference_still_matches() {
        let records = vec![
            invoice("i1", 21967, "", Category::Other, ""),
            trip("t1", 21968, "", ""),
        ];
        assert_eq!(pair_documents(&records).pairs.len(), 1);
    }

    #[test]
    fn extreme_amounts_do_not_overflow() {
        let records = vec![
            invoice("i1", i64::MAX, "2024-05-01", Category::Other, ""),
            trip("t1", -500, "2024-05-01", ""),
            invoice("i2", i64::MIN, "2024-05-01", Category::Other, ""),
            trip("t2", i64::MAX, "2024-06-30", ""),
        ];
        let out = pair_documents(&records);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].invoice_id.as_str(), "i1");
        assert_eq!(out.pairs[0].trip_sheet_id.as_str(), "t2");
        assert_eq!(ids(&out.unmatched_invoices), vec!["i2"]);
        assert_eq!(ids(&out.unmatched_trip_sheets), vec!["t1"]);
    }

    #[test]
    fn max_score_is_100() {
        let inv = invoice("i1", 100, "2024-05-01", Category::Taxi, "滴滴出行");
        let t = trip("t1", 100, "2024-05-01", "滴滴出行");
        let (Some(d), Some(td)) = (inv.as_invoice(), t.as_trip_sheet()) else {
            panic!("wrong kinds");
        };
        let date = NaiveDate::from_ymd_opt(2024, 5, 1);
        let score = score_candidate(&inv, d, date, &t, td, date);
        assert_eq!(score.total, AMOUNT_SCORE + 30 + PLATFORM_SCORE);
        assert_eq!(score.total, 100);
    }

    #[test]
    fn empty_input() {
        let out = pair_documents(&[]);
        assert!(out.pairs.is_empty());
        assert!(out.unmatched_invoices.is_empty());
        assert!(out.unmatched_trip_sheets.is_empty());
    }

    #[test]
    fn empty_platform_never_matches() {
        assert!(!platform_mentioned("", "滴滴", "滴滴"));
        assert!(platform_mentioned("Uber", "UBER B.V.", ""));
        assert!(platform_mentioned("T3出行", "南京龙腾出行科技", ""));
    }
}
