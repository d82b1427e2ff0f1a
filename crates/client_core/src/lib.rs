use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::{split_context, DocumentStatus};
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

pub mod error;
pub mod transport;
pub mod types;

pub use error::{RequestError, SessionError, ValidationError};
pub use transport::{DocumentBackend, HttpBackend, DEFAULT_API_BASE};
pub use types::{FileHandle, Key, QueryOutcome, SessionEvent, SessionState, UploadOutcome};

const UPLOAD_FAILED_MESSAGE: &str = "Error uploading PDF";
const QUERY_FAILED_MESSAGE: &str = "Error getting answer";
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Upload,
    Query,
}

/// Owns the session state and serializes uploads and queries against the backend.
///
/// Clones share the same session, so a presentation layer can run an upload on
/// a background task and keep issuing other operations meanwhile. At most one
/// upload and one query are in flight at any time.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    backend: Arc<dyn DocumentBackend>,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// Clears the matching pending flag when the request it guards finishes,
/// including when the owning future is dropped mid-flight.
struct InFlight<'a> {
    controller: &'a SessionController,
    kind: RequestKind,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.controller.lock_state();
        match self.kind {
            RequestKind::Upload => state.pending_upload = false,
            RequestKind::Query => state.pending_query = false,
        }
    }
}

impl SessionController {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                backend,
                state: Mutex::new(SessionState::default()),
                events,
            }),
        }
    }

    pub fn with_http(base_url: Url) -> Self {
        Self::new(Arc::new(HttpBackend::new(base_url)))
    }

    pub fn backend(&self) -> &Arc<dyn DocumentBackend> {
        &self.inner.backend
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the state snapshot stays authoritative.
        let _ = self.inner.events.send(event);
    }

    /// Sets the pending flag for `kind` unless a request of that kind is
    /// already outstanding. The check and the set share one critical section,
    /// as does recording the question a query is about to send.
    fn begin(&self, kind: RequestKind, query_text: Option<&str>) -> Option<InFlight<'_>> {
        let mut state = self.lock_state();
        let pending = match kind {
            RequestKind::Upload => &mut state.pending_upload,
            RequestKind::Query => &mut state.pending_query,
        };
        if *pending {
            return None;
        }
        *pending = true;
        if kind == RequestKind::Upload {
            state.last_error = None;
        }
        if let Some(text) = query_text {
            state.last_query_text = text.to_string();
        }
        Some(InFlight {
            controller: self,
            kind,
        })
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Session-start reconciliation. A failed status check only gets logged.
    pub async fn start(&self) {
        if let Err(err) = self.refresh_status().await {
            warn!(error = %err, "initial status check failed");
        }
    }

    pub async fn refresh_status(&self) -> Result<DocumentStatus, RequestError> {
        match self.inner.backend.status().await {
            Ok(response) => {
                let status = DocumentStatus::from(response);
                self.lock_state().apply_status(status);
                info!(
                    ready = status.ready,
                    index_size = status.index_size,
                    "document status refreshed"
                );
                self.emit(SessionEvent::StatusChanged(status));
                Ok(status)
            }
            Err(err) => {
                warn!(error = %err, "status check failed");
                Err(err)
            }
        }
    }

    pub fn select_file(&self, file: FileHandle) {
        info!(file = file.name(), size_bytes = file.len(), "file selected");
        self.lock_state().selected_file = Some(file);
    }

    pub async fn select_file_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<FileHandle, SessionError> {
        match FileHandle::open(path).await {
            Ok(file) => {
                self.select_file(file.clone());
                Ok(file)
            }
            Err(err) => {
                self.emit(SessionEvent::ValidationFailed(err.to_string()));
                Err(err.into())
            }
        }
    }

    pub async fn upload_selected(&self) -> Result<UploadOutcome, SessionError> {
        let file = self.lock_state().selected_file.clone();
        self.upload_document(file).await
    }

    pub async fn upload_document(
        &self,
        file: Option<FileHandle>,
    ) -> Result<UploadOutcome, SessionError> {
        let Some(file) = file else {
            let err = ValidationError::NoFileSelected;
            self.emit(SessionEvent::ValidationFailed(err.to_string()));
            return Err(err.into());
        };
        let Some(_in_flight) = self.begin(RequestKind::Upload, None) else {
            info!(file = file.name(), "upload already in progress; ignoring");
            return Ok(UploadOutcome::AlreadyPending);
        };

        info!(file = file.name(), size_bytes = file.len(), "uploading document");
        match self.inner.backend.upload_pdf(&file).await {
            Ok(response) => {
                info!(
                    message = %response.message,
                    chunks_processed = ?response.chunks_processed,
                    "document uploaded"
                );
                self.emit(SessionEvent::Notice(response.message.clone()));
                // The index size only changes server-side; ask for it.
                let _ = self.refresh_status().await;
                Ok(UploadOutcome::Uploaded {
                    message: response.message,
                    chunks_processed: response.chunks_processed,
                })
            }
            Err(err) => {
                warn!(error = %err, file = file.name(), "document upload failed");
                let message = err.detail().unwrap_or(UPLOAD_FAILED_MESSAGE).to_string();
                self.lock_state().last_error = Some(message.clone());
                self.emit(SessionEvent::UploadFailed(message));
                Err(err.into())
            }
        }
    }

    /// Records what the question input currently holds.
    pub fn set_query_text(&self, text: impl Into<String>) {
        self.lock_state().last_query_text = text.into();
    }

    pub async fn submit_query(&self, text: &str) -> Result<QueryOutcome, SessionError> {
        if text.trim().is_empty() {
            let err = ValidationError::EmptyQuestion;
            self.emit(SessionEvent::ValidationFailed(err.to_string()));
            return Err(err.into());
        }
        let Some(_in_flight) = self.begin(RequestKind::Query, Some(text)) else {
            return Ok(QueryOutcome::AlreadyPending);
        };

        match self.inner.backend.chat(text).await {
            Ok(response) => {
                let context = split_context(&response.context);
                info!(
                    chunks = context.len(),
                    sources_count = ?response.sources_count,
                    "answer received"
                );
                {
                    let mut state = self.lock_state();
                    state.last_answer = Some(response.answer.clone());
                    state.last_context = Some(context.clone());
                    state.last_error = None;
                }
                self.emit(SessionEvent::AnswerReady);
                Ok(QueryOutcome::Answered {
                    answer: response.answer,
                    context,
                })
            }
            Err(err) => {
                warn!(error = %err, "question failed");
                let answer = format!("Error: {}", err.detail().unwrap_or(QUERY_FAILED_MESSAGE));
                {
                    let mut state = self.lock_state();
                    state.last_answer = Some(answer.clone());
                    state.last_context = None;
                }
                self.emit(SessionEvent::QueryFailed(answer));
                Err(err.into())
            }
        }
    }

    /// Submits the current question when `key` is the commit key and no
    /// question is already being answered.
    pub async fn handle_submit_shortcut(&self, key: Key) -> Result<QueryOutcome, SessionError> {
        if !key.is_commit() {
            return Ok(QueryOutcome::Ignored);
        }
        let text = {
            let state = self.lock_state();
            if state.pending_query {
                return Ok(QueryOutcome::AlreadyPending);
            }
            state.last_query_text.clone()
        };
        self.submit_query(&text).await
    }

    /// Commit-key handling for an input line that carries its own text.
    ///
    /// The text is submitted as given, so a later line can never replace it
    /// before it is sent. While a question is pending the line is refused and
    /// `last_query_text` keeps describing the question in flight.
    pub async fn commit_input(
        &self,
        key: Key,
        text: impl Into<String>,
    ) -> Result<QueryOutcome, SessionError> {
        if !key.is_commit() {
            return Ok(QueryOutcome::Ignored);
        }
        let text = text.into();
        {
            let mut state = self.lock_state();
            if state.pending_query {
                return Ok(QueryOutcome::AlreadyPending);
            }
            state.last_query_text = text.clone();
        }
        self.submit_query(&text).await
    }
}

#[cfg(test)]
#[path = "tests/fake_server.rs"]
mod fake_server;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
