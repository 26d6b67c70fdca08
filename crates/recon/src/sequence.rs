//! Output ordering for reimbursement.
//!
//! Documents are bucketed by invoice category, each paired trip sheet rides
//! directly behind its invoice, units are ordered by date inside a bucket,
//! and buckets are concatenated in [`Category::SEQUENCE_ORDER`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::dates::{current_year, parse_document_date_in};
use crate::model::{Category, DocumentKind, Pair, Record, RecordId, SequenceResult};

/// An invoice with its paired trip sheet, or a lone document.
struct Unit {
    date: Option<NaiveDate>,
    ids: Vec<RecordId>,
}

pub fn sort_documents(records: &[Record], pairs: &[Pair]) -> SequenceResult {
    let year = current_year();

    let kinds: HashMap<&RecordId, DocumentKind> =
        records.iter().map(|r| (&r.id, r.kind())).collect();

    // invoice → trip sheet, keeping only pairs whose ids are present with the
    // right kinds and whose trip sheet has not been attached already.
    let mut partner: HashMap<&RecordId, &RecordId> = HashMap::new();
    let mut attached: HashSet<&RecordId> = HashSet::new();
    for pair in pairs {
        let valid = kinds.get(&pair.invoice_id) == Some(&DocumentKind::Invoice)
            && kinds.get(&pair.trip_sheet_id) == Some(&DocumentKind::TripSheet);
        if !valid || partner.contains_key(&pair.invoice_id) || attached.contains(&pair.trip_sheet_id)
        {
            continue;
        }
        partner.insert(&pair.invoice_id, &pair.trip_sheet_id);
        attached.insert(&pair.trip_sheet_id);
    }

    let mut buckets: BTreeMap<Category, Vec<Unit>> = BTreeMap::new();
    for record in records {
        let (category, ids) = match record.category() {
            Some(category) => {
                let mut ids = vec![record.id.clone()];
                if let Some(trip_id) = partner.get(&record.id) {
                    ids.push((*trip_id).clone());
                }
                (category, ids)
            }
            None if attached.contains(&record.id) => continue,
            None => (Category::Other, vec![record.id.clone()]),
        };
        buckets.entry(category).or_default().push(Unit {
            date: parse_document_date_in(&record.date, year),
            ids,
        });
    }

    let mut result = SequenceResult::default();
    // BTreeMap iterates in declaration order of `Category`, which is the
    // reimbursement order.
    for (category, mut units) in buckets {
        // Stable: equal dates keep input order, undated units sink.
        units.sort_by_key(|u| (u.date.is_none(), u.date));
        let ids: Vec<RecordId> = units.into_iter().flat_map(|u| u.ids).collect();
        if ids.is_empty() {
            continue;
        }
        result.suggested_order.extend(ids.iter().cloned());
        result.grouping.insert(category, ids);
    }
    result
}
