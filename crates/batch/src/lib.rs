//! `expensor-batch`: drives recognition for a batch of files, then
//! reconciles the complete result set.
//!
//! Per-file failures become placeholder error records and never abort the
//! batch. Only validation errors (before recognition) and total failure
//! (after recognition) surface as [`BatchError`].

mod context;
mod error;
mod input;
mod options;
mod orchestrator;
mod progress;
pub mod retry;

pub use context::{BatchContext, FileError, FileOutcome, FileState};
pub use error::BatchError;
pub use input::{BatchFile, Media};
pub use options::BatchOptions;
pub use orchestrator::{process_batch, BatchOutput};
pub use progress::BatchPhase;
