//! Wire types for the document chat backend.

use serde::{Deserialize, Serialize};

pub const STATUS_PATH: &str = "status";
pub const UPLOAD_PATH: &str = "upload_pdf/";
pub const CHAT_PATH: &str = "chat/";
pub const HEALTH_PATH: &str = "";

/// Multipart field carrying the document bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";
/// Form field carrying the question text.
pub const CHAT_QUERY_FIELD: &str = "query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub pdf_loaded: bool,
    pub vectorstore_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_processed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
