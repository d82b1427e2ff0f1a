use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::domain::DocumentStatus;

use crate::error::ValidationError;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A document the user picked locally; its bytes are captured at selection time.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    path: Option<PathBuf>,
    contents: Arc<[u8]>,
}

impl FileHandle {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ValidationError::Unreadable {
                path: path.display().to_string(),
                reason: "path has no file name".into(),
            })?;
        ensure_pdf_name(&name)?;

        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| ValidationError::Unreadable {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            contents: contents.into(),
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        ensure_pdf_name(&name)?;
        let contents: Vec<u8> = contents.into();
        Ok(Self {
            name,
            path: None,
            contents: contents.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("len", &self.contents.len())
            .finish()
    }
}

fn ensure_pdf_name(name: &str) -> Result<(), ValidationError> {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(ValidationError::NotPdf(name.to_string()))
    }
}

/// Everything the presentation layer renders. Only the controller writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub document_ready: bool,
    /// Number of indexed chunks; only meaningful while `document_ready`.
    pub index_size: u64,
    pub pending_upload: bool,
    pub pending_query: bool,
    pub selected_file: Option<FileHandle>,
    pub last_query_text: String,
    pub last_answer: Option<String>,
    pub last_context: Option<Vec<String>>,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn document_status(&self) -> DocumentStatus {
        DocumentStatus {
            ready: self.document_ready,
            index_size: self.index_size,
        }
    }

    pub(crate) fn apply_status(&mut self, status: DocumentStatus) {
        self.document_ready = status.ready;
        self.index_size = status.index_size;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Char(char),
}

impl Key {
    pub fn is_commit(self) -> bool {
        matches!(self, Key::Enter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Blocking notice for the user, e.g. the server's upload confirmation.
    Notice(String),
    ValidationFailed(String),
    UploadFailed(String),
    StatusChanged(DocumentStatus),
    AnswerReady,
    QueryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded {
        message: String,
        chunks_processed: Option<u64>,
    },
    AlreadyPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered {
        answer: String,
        context: Vec<String>,
    },
    AlreadyPending,
    /// The key was not the commit key.
    Ignored,
}
