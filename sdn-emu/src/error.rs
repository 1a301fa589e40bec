//! Emulator error types.

use thiserror::Error;

/// Errors returned by control-plane operations.
///
/// Every operation either succeeds completely or fails with one of these and
/// leaves the stores untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdnError {
    /// Required payload keys are absent.
    #[error("missing field(s): {}", .0.join(", "))]
    MissingField(Vec<String>),

    /// Payload carries keys that are neither required nor optional.
    #[error("unexpected field(s): {}", .0.join(", "))]
    UnknownField(Vec<String>),

    /// Payload has the right keys but a value that cannot be stored.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Network, subnet, router or interface lookup failed.
    #[error("{kind} '{id}' not found")]
    ResourceNotFound { kind: &'static str, id: String },

    /// Port lookup failed. Kept apart from `ResourceNotFound` because callers
    /// treat a missing port differently.
    #[error("port '{0}' not found")]
    PortNotFound(String),

    /// Delete rejected because a dependent resource still exists.
    #[error("{kind} '{id}' is in use: {reason}")]
    ResourceInUse {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

impl SdnError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        SdnError::ResourceNotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn in_use(kind: &'static str, id: impl Into<String>, reason: String) -> Self {
        SdnError::ResourceInUse {
            kind,
            id: id.into(),
            reason,
        }
    }

    /// Stable name of the error kind, used by scenario expectations.
    pub fn kind(&self) -> &'static str {
        match self {
            SdnError::MissingField(_) => "MissingField",
            SdnError::UnknownField(_) => "UnknownField",
            SdnError::InvalidPayload(_) => "InvalidPayload",
            SdnError::ResourceNotFound { .. } => "ResourceNotFound",
            SdnError::PortNotFound(_) => "PortNotFound",
            SdnError::ResourceInUse { .. } => "ResourceInUse",
        }
    }

    /// HTTP-style status code for the error.
    pub fn status_code(&self) -> u32 {
        match self {
            SdnError::MissingField(_) | SdnError::UnknownField(_) | SdnError::InvalidPayload(_) => {
                400
            }
            SdnError::ResourceNotFound { .. } | SdnError::PortNotFound(_) => 404,
            SdnError::ResourceInUse { .. } => 409,
        }
    }
}

/// Result type for emulator operations.
pub type Result<T> = std::result::Result<T, SdnError>;
