use crate::context::FileError;

/// Batch-level failure. Per-file recognition errors are not here: they
/// become placeholder records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// No files were submitted
    EmptyBatch,
    /// Options or recognition configuration rejected before any call
    InvalidOptions(String),
    /// A multi-page document with no pages
    EmptyDocument { file: String },
    /// Every file failed recognition; nothing to reconcile
    AllFailed { failures: Vec<FileError> },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::EmptyBatch => write!(f, "no files to process"),
            BatchError::InvalidOptions(msg) => write!(f, "invalid configuration: {}", msg),
            BatchError::EmptyDocument { file } => write!(f, "{}: document has no pages", file),
            BatchError::AllFailed { failures } => {
                write!(f, "all files failed recognition ({} errors)", failures.len())?;
                if let Some(first) = failures.first() {
                    write!(f, "; first: {}", first)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BatchError {}
