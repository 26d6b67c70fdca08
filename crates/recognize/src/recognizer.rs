use std::time::Duration;

use expensor_recon::{Document, ProcessingStatus, Record, RecordId};

use crate::error::RecognitionError;

/// One page image, as submitted for recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub media_type: String,
}

impl PageImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }
}

/// Endpoint, credential and model for recognition calls.
#[derive(Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("recognition endpoint is empty".into());
        }
        if self.model.trim().is_empty() {
            return Err("recognition model is empty".into());
        }
        if self.api_key.trim().is_empty() {
            return Err("recognition API key is empty".into());
        }
        Ok(())
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for RecognitionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Recognized fields of one page, before it becomes a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedDocument {
    pub date: String,
    pub amount_cents: i64,
    pub description: String,
    pub confidence: u8,
    pub document: Document,
}

impl RecognizedDocument {
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            date: self.date,
            amount_cents: self.amount_cents,
            description: self.description,
            confidence: self.confidence,
            status: ProcessingStatus::Completed,
            error: None,
            document: self.document,
        }
    }
}

/// Converts one page image into one recognized document.
///
/// Implementations classify their failures; they do not retry.
pub trait Recognizer: Send + Sync {
    fn recognize(
        &self,
        page: &PageImage,
        config: &RecognitionConfig,
        timeout: Duration,
    ) -> Result<RecognizedDocument, RecognitionError>;
}
