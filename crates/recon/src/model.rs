use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

// ---------------------------------------------------------------------------
// Identity + status
// ---------------------------------------------------------------------------

/// Opaque record identifier, unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Completed,
    Error,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Expense category of an invoice.
///
/// Variants are declared in reimbursement order, so `Ord` (and any
/// `BTreeMap` keyed by category) follows the output convention:
/// consumables, hotel, taxi, shipping, toll, train, other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Consumables,
    Hotel,
    Taxi,
    Shipping,
    Toll,
    Train,
    #[default]
    Other,
}

impl Category {
    /// Fixed bucket order used when sequencing documents.
    pub const SEQUENCE_ORDER: [Category; 7] = [
        Category::Consumables,
        Category::Hotel,
        Category::Taxi,
        Category::Shipping,
        Category::Toll,
        Category::Train,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumables => "consumables",
            Self::Hotel => "hotel",
            Self::Taxi => "taxi",
            Self::Shipping => "shipping",
            Self::Toll => "toll",
            Self::Train => "train",
            Self::Other => "other",
        }
    }

    /// Lenient label lookup. Unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "consumables" => Self::Consumables,
            "hotel" => Self::Hotel,
            "taxi" => Self::Taxi,
            "shipping" => Self::Shipping,
            "toll" => Self::Toll,
            "train" => Self::Train,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceDetails {
    #[serde(default)]
    pub category: Category,
    /// External reference number printed on the invoice.
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripSheetDetails {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub departure_time: String,
    #[serde(default)]
    pub distance_km: f64,
}

/// Kind-specific payload. The variant is the document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Invoice(InvoiceDetails),
    TripSheet(TripSheetDetails),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    TripSheet,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Invoice(_) => DocumentKind::Invoice,
            Self::TripSheet(_) => DocumentKind::TripSheet,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoice => write!(f, "invoice"),
            Self::TripSheet => write!(f, "trip_sheet"),
        }
    }
}

/// A recognized expense document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Date as printed on the document. See [`dates`] for accepted formats.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    /// Recognition confidence, 0–100.
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub document: Document,
}

impl Record {
    pub fn kind(&self) -> DocumentKind {
        self.document.kind()
    }

    pub fn as_invoice(&self) -> Option<&InvoiceDetails> {
        match &self.document {
            Document::Invoice(inv) => Some(inv),
            Document::TripSheet(_) => None,
        }
    }

    pub fn as_trip_sheet(&self) -> Option<&TripSheetDetails> {
        match &self.document {
            Document::TripSheet(trip) => Some(trip),
            Document::Invoice(_) => None,
        }
    }

    /// Invoice category, or `None` for trip sheets.
    pub fn category(&self) -> Option<Category> {
        self.as_invoice().map(|inv| inv.category)
    }

    pub fn is_error(&self) -> bool {
        self.status == ProcessingStatus::Error
    }

    /// Date parsed against the current year for `MM/DD` dates.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        dates::parse_document_date(&self.date)
    }

    /// Editable placeholder for a document that could not be recognized.
    ///
    /// Numeric fields are zero, text fields blank. Kind defaults to an
    /// `other` invoice so the user can complete it by hand.
    pub fn placeholder(id: RecordId, message: impl Into<String>) -> Self {
        Self {
            id,
            date: String::new(),
            amount_cents: 0,
            description: String::new(),
            confidence: 0,
            status: ProcessingStatus::Error,
            error: Some(message.into()),
            document: Document::Invoice(InvoiceDetails::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// One invoice associated with one trip sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub invoice_id: RecordId,
    pub trip_sheet_id: RecordId,
    /// Composite match score, 0–100.
    pub confidence: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingOutput {
    pub pairs: Vec<Pair>,
    pub unmatched_invoices: Vec<RecordId>,
    pub unmatched_trip_sheets: Vec<RecordId>,
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Duplicate,
    AmountAnomaly,
    DateGap,
    MissingPair,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::AmountAnomaly => write!(f, "amount_anomaly"),
            Self::DateGap => write!(f, "date_gap"),
            Self::MissingPair => write!(f, "missing_pair"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    pub record_ids: Vec<RecordId>,
    pub severity: Severity,
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceResult {
    /// Every input record id exactly once.
    pub suggested_order: Vec<RecordId>,
    /// Category → member ids, in sequence order. Empty categories omitted.
    pub grouping: BTreeMap<Category, Vec<RecordId>>,
}
