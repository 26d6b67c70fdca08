use serde::Serialize;
use uuid::Uuid;

use expensor_recognize::RecognizedDocument;
use expensor_recon::{ProcessingStatus, Record, RecordId};

use crate::input::BatchFile;
use crate::retry::RetryFailure;

/// Per-file state machine: `Pending → Recognizing → {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Pending,
    Recognizing,
    Completed,
    /// At least one page ended as a placeholder.
    Failed,
}

/// One page that could not be recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    /// 1-based page number; `None` for single-image files.
    pub page: Option<usize>,
    /// [`expensor_recognize::RecognitionError::category`] label.
    pub category: String,
    pub attempts: u32,
    pub message: String,
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} page {}: {}", self.file, page, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub pages: usize,
    pub state: FileState,
    pub errors: Vec<String>,
}

struct FileSlot {
    name: String,
    multi_page: bool,
    state: FileState,
    pages: Vec<Option<Record>>,
    errors: Vec<FileError>,
}

impl FileSlot {
    fn resolved(&self) -> bool {
        self.pages.iter().all(Option::is_some)
    }
}

/// Records and file states for one batch run.
///
/// Owned by the orchestrator thread; workers report through a channel and
/// never touch it.
pub struct BatchContext {
    files: Vec<FileSlot>,
}

impl BatchContext {
    pub fn new(files: &[BatchFile]) -> Self {
        let files = files
            .iter()
            .map(|f| FileSlot {
                name: f.name.clone(),
                multi_page: matches!(f.media, crate::input::Media::Document { .. }),
                state: FileState::Pending,
                pages: vec![None; f.page_count()],
                errors: Vec::new(),
            })
            .collect();
        Self { files }
    }

    pub fn file_state(&self, file: usize) -> Option<FileState> {
        self.files.get(file).map(|slot| slot.state)
    }

    /// First page of a file picked up by a worker.
    pub fn mark_recognizing(&mut self, file: usize) {
        if let Some(slot) = self.files.get_mut(file) {
            if slot.state == FileState::Pending {
                slot.state = FileState::Recognizing;
            }
        }
    }

    /// Store the outcome of one page. Returns true when this resolves the
    /// last outstanding page of the file.
    pub fn resolve_page(
        &mut self,
        file: usize,
        page: usize,
        result: Result<RecognizedDocument, RetryFailure>,
    ) -> bool {
        let Some(slot) = self.files.get_mut(file) else {
            return false;
        };
        if page >= slot.pages.len() || slot.pages[page].is_some() {
            return false;
        }

        let id = RecordId::new(Uuid::new_v4().to_string());
        let record = match result {
            Ok(doc) => doc.into_record(id),
            Err(failure) => {
                let error = FileError {
                    file: slot.name.clone(),
                    page: slot.multi_page.then_some(page + 1),
                    category: failure.error.category().to_string(),
                    attempts: failure.attempts,
                    message: failure.error.to_string(),
                };
                log::warn!(
                    "recognition failed after {} attempt(s): {}",
                    failure.attempts,
                    error
                );
                let record = Record::placeholder(id, error.to_string());
                slot.errors.push(error);
                record
            }
        };
        slot.pages[page] = Some(record);

        if slot.resolved() {
            slot.state = if slot.errors.is_empty() {
                FileState::Completed
            } else {
                FileState::Failed
            };
            true
        } else {
            false
        }
    }

    /// Files whose pages have all resolved.
    pub fn finished_files(&self) -> usize {
        self.files
            .iter()
            .filter(|s| matches!(s.state, FileState::Completed | FileState::Failed))
            .count()
    }

    /// Number of successfully recognized pages.
    pub fn recognized_pages(&self) -> usize {
        self.files
            .iter()
            .flat_map(|s| s.pages.iter().flatten())
            .filter(|r| r.status == ProcessingStatus::Completed)
            .count()
    }

    /// Records in input order: file index, then page index.
    pub fn records(&self) -> Vec<Record> {
        self.files
            .iter()
            .flat_map(|s| s.pages.iter().flatten().cloned())
            .collect()
    }

    pub fn errors(&self) -> Vec<FileError> {
        self.files.iter().flat_map(|s| s.errors.iter().cloned()).collect()
    }

    pub fn outcomes(&self) -> Vec<FileOutcome> {
        self.files
            .iter()
            .map(|s| FileOutcome {
                file: s.name.clone(),
                pages: s.pages.len(),
                state: s.state,
                errors: s.errors.iter().map(|e| e.message.clone()).collect(),
            })
            .collect()
    }
}
