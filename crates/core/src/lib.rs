//! Shared primitives for all Rust crates in bundlesync.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across bundlesync crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input, configuration, or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure, timeout, or unexpected upstream status.
    #[error("network failure: {0}")]
    Network(String),

    /// Upstream response was not JSON or lacked an expected field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Source audit trail holds no completed promotion to replay.
    #[error("no completed promotion: {0}")]
    NoCompletedPromotion(String),

    /// The promotion action itself failed.
    #[error("external command failed: {message}")]
    ExternalCommand {
        /// Exit code reported by the external command, when one exists.
        exit_code: Option<i32>,
        /// Human-readable failure description.
        message: String,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the process exit code that represents this error.
    ///
    /// External command failures forward their own exit code when it is a
    /// usable non-zero process status; everything else maps to `1`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ExternalCommand {
                exit_code: Some(code),
                ..
            } => u8::try_from(*code)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}
