//! Recognizer JSON → [`RecognizedDocument`].
//!
//! Models return loosely-typed JSON: numbers as strings, amounts with
//! currency marks, the whole object wrapped in a ```json fence. This module
//! accepts those shapes and rejects only output with no usable kind.

use serde_json::Value;

use expensor_recon::money::{cents_from_f64, parse_amount};
use expensor_recon::{Category, Document, InvoiceDetails, TripSheetDetails};

use crate::error::RecognitionError;
use crate::recognizer::RecognizedDocument;

/// Parse model output text, tolerating code fences and surrounding prose.
pub fn document_from_text(text: &str) -> Result<RecognizedDocument, RecognitionError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(RecognitionError::Malformed(format!(
                "no JSON object in output: {}",
                preview(text)
            )))
        }
    };
    let value: Value = serde_json::from_str(body)
        .map_err(|e| RecognitionError::Malformed(format!("{} (output: {})", e, preview(text))))?;
    document_from_json(&value)
}

pub fn document_from_json(value: &Value) -> Result<RecognizedDocument, RecognitionError> {
    if !value.is_object() {
        return Err(RecognitionError::Malformed("expected a JSON object".into()));
    }

    let kind = text_field(value, &["type", "kind", "document_type"]).to_lowercase();
    let document = match kind.as_str() {
        "invoice" => Document::Invoice(InvoiceDetails {
            category: Category::from_label(&text_field(value, &["category"])),
            invoice_number: text_field(value, &["invoice_number", "invoiceNumber", "number"]),
            vendor: text_field(value, &["vendor", "seller"]),
            tax_cents: optional_amount(value, &["tax", "tax_amount"])?,
        }),
        "trip_sheet" | "tripsheet" | "trip" | "itinerary" => Document::TripSheet(TripSheetDetails {
            platform: text_field(value, &["platform"]),
            origin: text_field(value, &["origin", "from"]),
            destination: text_field(value, &["destination", "to"]),
            departure_time: text_field(value, &["departure_time", "departureTime"]),
            distance_km: distance(value),
        }),
        "" => return Err(RecognitionError::Malformed("document type missing".into())),
        other => {
            return Err(RecognitionError::Malformed(format!(
                "unknown document type '{}'",
                other
            )))
        }
    };

    Ok(RecognizedDocument {
        date: text_field(value, &["date"]),
        amount_cents: optional_amount(value, &["amount", "total"])?.unwrap_or(0),
        description: text_field(value, &["description", "remark"]),
        confidence: confidence(value),
        document,
    })
}

/// First present key rendered as text. Numbers are stringified, nulls skipped.
fn text_field(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| match value.get(*k)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn optional_amount(value: &Value, keys: &[&str]) -> Result<Option<i64>, RecognitionError> {
    for key in keys {
        match value.get(*key) {
            Some(Value::Number(n)) => {
                let cents = n.as_f64().and_then(cents_from_f64).ok_or_else(|| {
                    RecognitionError::Malformed(format!("{} out of range: {}", key, n))
                })?;
                return Ok(Some(cents));
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                let cents =
                    parse_amount(s).map_err(|e| RecognitionError::Malformed(e.to_string()))?;
                return Ok(Some(cents));
            }
            _ => continue,
        }
    }
    Ok(None)
}

fn confidence(value: &Value) -> u8 {
    let raw = match value.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    // Some models report 0..1 instead of 0..100.
    let scaled = if raw > 0.0 && raw <= 1.0 { raw * 100.0 } else { raw };
    scaled.round().clamp(0.0, 100.0) as u8
}

/// Distance in km; accepts `12.5` or `"12.5km"`.
fn distance(value: &Value) -> f64 {
    match value.get("distance") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let numeric: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            numeric.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
