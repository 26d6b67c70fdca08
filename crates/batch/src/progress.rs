use serde::Serialize;

use expensor_recon::Stage;

/// Batch progress, in the order phases occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BatchPhase {
    /// `completed` counts files whose pages have all resolved.
    Recognizing { completed: usize, total: usize },
    Pairing,
    Sorting,
    Detecting,
    Completed,
    Error,
}

impl From<Stage> for BatchPhase {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Pairing => BatchPhase::Pairing,
            Stage::Sorting => BatchPhase::Sorting,
            Stage::Detecting => BatchPhase::Detecting,
        }
    }
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Recognizing { completed, total } => {
                write!(f, "recognizing ({}/{})", completed, total)
            }
            BatchPhase::Pairing => write!(f, "pairing"),
            BatchPhase::Sorting => write!(f, "sorting"),
            BatchPhase::Detecting => write!(f, "detecting"),
            BatchPhase::Completed => write!(f, "completed"),
            BatchPhase::Error => write!(f, "error"),
        }
    }
}
