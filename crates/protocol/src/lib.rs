use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod codes {
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const SECURITY_VIOLATION: &str = "SECURITY_VIOLATION";
    pub const JMP_EXEC_FAILED: &str = "JMP_EXEC_FAILED";
    pub const JMP_TIMEOUT: &str = "JMP_TIMEOUT";
    pub const READ_FAILED: &str = "READ_FAILED";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Default size of captured stderr attached to external-run failures.
pub const STDERR_TAIL_BYTES: usize = 8192;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Wire shape of a failed tool call: `{"error": {code, message, details}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ErrorResponse {
    pub error: ErrorEnvelope,
}

impl From<ErrorEnvelope> for ErrorResponse {
    fn from(error: ErrorEnvelope) -> Self {
        Self { error }
    }
}

/// Keep the last `max_bytes` of `bytes` as text.
///
/// Invalid UTF-8 is replaced rather than rejected, and a cut that lands inside a multi-byte
/// sequence drops the orphaned continuation bytes.
pub fn tail_text(bytes: &[u8], max_bytes: usize) -> String {
    if bytes.len() <= max_bytes {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut start = bytes.len() - max_bytes;
    let limit = (start + 3).min(bytes.len());
    while start < limit && (bytes[start] & 0b1100_0000) == 0b1000_0000 {
        start += 1;
    }
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tail_text_keeps_short_input_whole() {
        assert_eq!(tail_text(b"boom", 8), "boom");
        assert_eq!(tail_text(b"", 8), "");
    }

    #[test]
    fn tail_text_keeps_only_the_end() {
        let text = "a".repeat(20) + "tail";
        assert_eq!(tail_text(text.as_bytes(), 4), "tail");
    }

    #[test]
    fn tail_text_skips_split_multibyte_prefix() {
        // "é" is two bytes; cutting after its first byte must not leave a replacement char.
        let bytes = "xé!".as_bytes();
        assert_eq!(tail_text(bytes, 2), "!");
        assert_eq!(tail_text(bytes, 3), "é!");
    }

    #[test]
    fn tail_text_replaces_invalid_sequences() {
        let bytes = [b'o', 0xff, b'k'];
        assert_eq!(tail_text(&bytes, 8), "o\u{fffd}k");
    }

    #[test]
    fn error_response_serializes_envelope_under_error_key() {
        let mut details = serde_json::Map::new();
        details.insert("path".to_string(), serde_json::json!("/data/a.csv"));
        let response = ErrorResponse::from(ErrorEnvelope {
            code: codes::NOT_FOUND.to_string(),
            message: "File not found".to_string(),
            details,
        });
        let raw = serde_json::to_string(&response).unwrap();
        assert_eq!(
            raw,
            r#"{"error":{"code":"NOT_FOUND","message":"File not found","details":{"path":"/data/a.csv"}}}"#
        );
    }
}
