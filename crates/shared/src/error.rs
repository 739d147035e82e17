use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error classes the claims backend reports in its JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Auth token missing, expired, or not allowed to touch this claim.
    Unauthorized,
    /// Lender or claim id the backend has no record of.
    NotFound,
    /// Request body failed the backend's field validation.
    Validation,
    /// The claim is in a state that conflicts with the request, e.g. a
    /// duplicate submission.
    Conflict,
    Internal,
}

impl ErrorCode {
    /// Validation failures belong on the form inline; everything else is
    /// surfaced as a toast.
    pub fn is_validation(self) -> bool {
        self == Self::Validation
    }
}

/// Error envelope as serialized by the claims backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The same failure as a std error, for propagating with `?` client-side.
#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
