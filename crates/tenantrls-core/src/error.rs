//! Shared error type across tenantrls crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed input.
    BadRequest,
    /// Required fields missing from a request body.
    ValidationFailed,
    /// Policy, rule, or context lookup missed.
    NotFound,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::ValidationFailed => "VALIDATION_FAILED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TenantRlsError>;

/// Unified error type used by core and gateway.
///
/// An access denial is not represented here; the evaluator reports it as a
/// regular `AccessEvaluationResult` with `allowed = false`.
#[derive(Debug, Error)]
pub enum TenantRlsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("missing required fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl TenantRlsError {
    /// Shorthand for a missing-fields error.
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TenantRlsError::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TenantRlsError::BadRequest(_) => ClientCode::BadRequest,
            TenantRlsError::Validation { .. } => ClientCode::ValidationFailed,
            TenantRlsError::NotFound(_) => ClientCode::NotFound,
            TenantRlsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            TenantRlsError::Internal(_) => ClientCode::Internal,
        }
    }
}
