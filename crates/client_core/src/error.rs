use thiserror::Error;

/// Input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a PDF file first!")]
    NoFileSelected,
    #[error("Please enter a question!")]
    EmptyQuestion,
    #[error("only PDF files can be uploaded (got {0})")]
    NotPdf(String),
    #[error("could not read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Failure of a request that was actually issued to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned HTTP {status}{}", detail_suffix(.detail))]
    Http { status: u16, detail: Option<String> },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

impl RequestError {
    /// Server-provided explanation, when the backend answered with one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } => detail.as_deref(),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Request(#[from] RequestError),
}
