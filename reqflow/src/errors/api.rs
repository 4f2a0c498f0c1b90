//! Application errors declared by the peer.

use super::probe::ErrorProbe;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Which side the peer blames for an API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorFault {
    /// No attribution.
    #[default]
    Unknown,
    /// The server is at fault.
    Server,
    /// The client is at fault.
    Client,
}

impl fmt::Display for ErrorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Server => write!(f, "Server"),
            Self::Client => write!(f, "Client"),
        }
    }
}

/// An error decoded from a response body.
///
/// Service clients implement this for their own error shapes, for example a
/// `NotFound` type for 404 responses.
pub trait ApiError: ErrorProbe {
    /// The application error code.
    fn code(&self) -> &str;

    /// The human readable message.
    fn message(&self) -> &str;

    /// Who the peer blames.
    fn fault(&self) -> ErrorFault {
        ErrorFault::Unknown
    }
}

/// A code and message pair for services without dedicated error types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error, Serialize, Deserialize)]
#[error("api error: {code}, {message}")]
pub struct GenericApiError {
    /// Application error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Who the peer blames.
    #[serde(default)]
    pub fault: ErrorFault,
}

impl GenericApiError {
    /// Creates an error with unknown fault.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fault: ErrorFault::Unknown,
        }
    }

    /// Sets the fault.
    #[must_use]
    pub fn with_fault(mut self, fault: ErrorFault) -> Self {
        self.fault = fault;
        self
    }
}

impl ErrorProbe for GenericApiError {
    fn error_code(&self) -> Option<&str> {
        Some(&self.code)
    }
}

impl ApiError for GenericApiError {
    fn code(&self) -> &str {
        &self.code
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn fault(&self) -> ErrorFault {
        self.fault
    }
}

impl StdError for Box<dyn ApiError> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some((**self).as_std_error())
    }
}
