//! Domain error carried by every table operation.
//!
//! Errors are raised as soon as a failure is recognized and keep their structured details all
//! the way to the tool boundary, where they become an [`ErrorEnvelope`].

use jmp_protocol::{codes, ErrorEnvelope};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_ARGUMENT, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, message)
    }

    pub fn security_violation(message: impl Into<String>) -> Self {
        Self::new(codes::SECURITY_VIOLATION, message)
    }

    pub fn jmp_exec_failed(message: impl Into<String>) -> Self {
        Self::new(codes::JMP_EXEC_FAILED, message)
    }

    pub fn jmp_timeout(message: impl Into<String>) -> Self {
        Self::new(codes::JMP_TIMEOUT, message)
    }

    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::new(codes::READ_FAILED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Merge `extra` into the details; keys already present are overwritten.
    pub fn with_details(mut self, extra: Map<String, Value>) -> Self {
        self.details.extend(extra);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_envelope(self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code,
            message: self.message,
            details: self.details,
        }
    }
}
