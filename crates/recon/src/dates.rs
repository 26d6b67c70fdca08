//! Document date parsing.
//!
//! Recognized dates are free-form text. Three layouts are understood:
//! `MM/DD` (current year), `YYYY-MM-DD` and `YYYY/MM/DD`. Anything else is
//! unparseable and callers treat it as "no date" rather than an error.

use chrono::{Datelike, Local, NaiveDate};

/// Parse a document date, resolving `MM/DD` against the current local year.
pub fn parse_document_date(raw: &str) -> Option<NaiveDate> {
    parse_document_date_in(raw, current_year())
}

/// Parse a document date, resolving `MM/DD` against `year`.
pub fn parse_document_date_in(raw: &str, year: i32) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = parse_full(s, '-') {
        return Some(d);
    }

    let parts: Vec<&str> = s.split('/').collect();
    match parts.as_slice() {
        [_, _, _] => parse_full(s, '/'),
        [month, day] => {
            let month = parse_component(month, 2)?;
            let day = parse_component(day, 2)?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        _ => None,
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Whole days from `a` to `b` (positive when `b` is later).
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

fn parse_full(s: &str, sep: char) -> Option<NaiveDate> {
    let mut it = s.split(sep);
    let (year, month, day) = (it.next()?, it.next()?, it.next()?);
    if it.next().is_some() || year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month = parse_component(month, 2)?;
    let day = parse_component(day, 2)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_component(s: &str, max_len: usize) -> Option<u32> {
    if s.is_empty() || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
