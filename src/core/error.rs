//! Error types for fetching rates and converting amounts

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single request to the rate provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

impl FetchError {
    /// HTTP status of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn decode(url: &str, reason: impl Into<String>) -> Self {
        FetchError::Decode {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Unknown currency code for conversion: {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Converting {amount} {from} to {to} does not fit in a finite number")]
    OutOfRange { amount: f64, from: String, to: String },
}
