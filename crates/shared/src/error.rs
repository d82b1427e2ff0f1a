use serde::{Deserialize, Serialize};

/// Body the backend attaches to non-success responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// Extracts a non-empty `detail` from a raw response body, if one is present.
    ///
    /// Bodies that are not JSON, or whose `detail` is not a string (e.g. a
    /// validation error list), yield `None`.
    pub fn detail_from_bytes(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .filter(|detail| !detail.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_string_detail() {
        assert_eq!(
            ErrorBody::detail_from_bytes(br#"{"detail":"index not ready"}"#),
            Some("index not ready".to_string())
        );
    }

    #[test]
    fn ignores_non_json_and_structured_detail() {
        assert_eq!(ErrorBody::detail_from_bytes(b"Internal Server Error"), None);
        assert_eq!(
            ErrorBody::detail_from_bytes(br#"{"detail":[{"loc":["body","query"]}]}"#),
            None
        );
        assert_eq!(ErrorBody::detail_from_bytes(br#"{"detail":"  "}"#), None);
        assert_eq!(ErrorBody::detail_from_bytes(b"{}"), None);
    }
}
