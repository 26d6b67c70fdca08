//! Recognition collaborator, shared by the batch orchestrator and the CLI.
//!
//! Turns one page image into one recognized document. The orchestrator only
//! sees the [`Recognizer`] trait; [`VisionClient`] is the HTTP implementation
//! against an OpenAI-compatible chat-completions endpoint.
//!
//! No retries here. Errors are categorized and the caller decides.

mod client;
mod error;
mod normalize;
mod recognizer;

pub use client::VisionClient;
pub use error::RecognitionError;
pub use normalize::{document_from_json, document_from_text};
pub use recognizer::{PageImage, RecognitionConfig, RecognizedDocument, Recognizer};
