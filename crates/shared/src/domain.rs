use serde::{Deserialize, Serialize};

use crate::protocol::StatusResponse;

/// Separator the backend places between retrieved passages.
pub const CONTEXT_CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub ready: bool,
    pub index_size: u64,
}

impl From<StatusResponse> for DocumentStatus {
    fn from(value: StatusResponse) -> Self {
        Self {
            ready: value.pdf_loaded,
            index_size: value.vectorstore_size,
        }
    }
}

/// Splits a wire `context` string into its ordered passages.
pub fn split_context(context: &str) -> Vec<String> {
    if context.is_empty() {
        return Vec::new();
    }
    context
        .split(CONTEXT_CHUNK_SEPARATOR)
        .map(str::to_string)
        .collect()
}
