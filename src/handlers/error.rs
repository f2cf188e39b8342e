// src/handlers/error.rs
use std::fmt;
use warp::reject::Reject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Upstream market-data API failed or returned garbage.
    External,
    /// The valuation core rejected the inputs or assumptions.
    Valuation,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn external_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::External,
            message: message.into(),
        }
    }

    pub fn valuation_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Valuation,
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Internal,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
