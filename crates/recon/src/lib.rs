//! `expensor-recon`: expense document reconciliation engine.
//!
//! Pure engine crate: receives recognized records, returns pairs, a
//! suggested output order and anomaly warnings. No IO, no recognition.

pub mod anomaly;
pub mod dates;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod money;
pub mod sequence;
pub mod summary;

pub use anomaly::detect_anomalies;
pub use engine::{reconcile, reconcile_with, Reconciliation, Stage};
pub use error::ReconError;
pub use matcher::pair_documents;
pub use model::{
    Category, Document, DocumentKind, InvoiceDetails, Pair, PairingOutput, ProcessingStatus,
    Record, RecordId, SequenceResult, Severity, TripSheetDetails, Warning, WarningKind,
};
pub use sequence::sort_documents;
pub use summary::{summarize, ReconSummary};
