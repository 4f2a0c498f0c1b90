//! Retryability classification.

use crate::errors::Error;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

/// A classifier's verdict on one error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Retryable {
    /// No opinion. Treated as not retryable once every rule has passed.
    #[default]
    Unknown,
    /// Retry the call.
    Yes,
    /// Do not retry the call.
    No,
}

impl fmt::Display for Retryable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// One classification rule.
///
/// Rules must be pure functions of the error value.
pub trait RetryableChecker: Send + Sync {
    /// Classifies `err`.
    fn check(&self, err: &Error) -> Retryable;
}

impl<F> RetryableChecker for F
where
    F: Fn(&Error) -> Retryable + Send + Sync,
{
    fn check(&self, err: &Error) -> Retryable {
        self(err)
    }
}

/// An ordered chain of rules. The first verdict other than
/// [`Retryable::Unknown`] wins.
#[derive(Clone, Default)]
pub struct RetryableCheckers {
    checkers: Vec<Arc<dyn RetryableChecker>>,
}

impl RetryableCheckers {
    /// Creates an empty chain, which answers `Unknown` for everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    #[must_use]
    pub fn with(mut self, checker: impl RetryableChecker + 'static) -> Self {
        self.checkers.push(Arc::new(checker));
        self
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    /// Returns true if the chain has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

impl RetryableChecker for RetryableCheckers {
    fn check(&self, err: &Error) -> Retryable {
        self.checkers
            .iter()
            .map(|c| c.check(err))
            .find(|verdict| *verdict != Retryable::Unknown)
            .unwrap_or(Retryable::Unknown)
    }
}

impl fmt::Debug for RetryableCheckers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryableCheckers")
            .field("len", &self.checkers.len())
            .finish()
    }
}

/// The default chain: self-declared retryability, connection failures, then
/// 5xx status codes.
#[must_use]
pub fn default_checker() -> RetryableCheckers {
    RetryableCheckers::new()
        .with(RetryableErrorChecker)
        .with(ConnectionErrorChecker)
        .with(HttpStatusCodeChecker::default())
}

/// Trusts errors that declare their own retryability.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryableErrorChecker;

impl RetryableChecker for RetryableErrorChecker {
    fn check(&self, err: &Error) -> Retryable {
        match err.probe(|p| p.retryable_error()) {
            Some(true) => Retryable::Yes,
            Some(false) => Retryable::No,
            None => Retryable::Unknown,
        }
    }
}

/// Recognizes failures to reach the peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionErrorChecker;

impl ConnectionErrorChecker {
    fn is_connection_failure(err: &(dyn StdError + 'static)) -> bool {
        if let Some(io) = err.downcast_ref::<io::Error>() {
            return matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::TimedOut
            );
        }
        #[cfg(feature = "reqwest")]
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            return http.is_connect() || http.is_timeout();
        }
        false
    }
}

impl RetryableChecker for ConnectionErrorChecker {
    fn check(&self, err: &Error) -> Retryable {
        if err.to_string().contains("connection reset") {
            return Retryable::Yes;
        }

        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if Self::is_connection_failure(e) {
                return Retryable::Yes;
            }
            current = e.source();
        }

        if err.probe(|p| p.temporary()) == Some(true) || err.probe(|p| p.timeout()) == Some(true) {
            return Retryable::Yes;
        }
        Retryable::Unknown
    }
}

/// Status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Retries errors carrying one of a set of HTTP status codes.
#[derive(Debug, Clone)]
pub struct HttpStatusCodeChecker {
    codes: HashSet<u16>,
}

impl HttpStatusCodeChecker {
    /// Creates a checker for `codes`.
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }
}

impl Default for HttpStatusCodeChecker {
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_STATUS_CODES)
    }
}

impl RetryableChecker for HttpStatusCodeChecker {
    fn check(&self, err: &Error) -> Retryable {
        match err.probe(|p| p.http_status_code()) {
            Some(code) if self.codes.contains(&code) => Retryable::Yes,
            _ => Retryable::Unknown,
        }
    }
}

/// Retries errors carrying one of a set of application error codes.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeChecker {
    codes: HashSet<String>,
}

impl ErrorCodeChecker {
    /// Creates a checker for `codes`.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }
}

impl RetryableChecker for ErrorCodeChecker {
    fn check(&self, err: &Error) -> Retryable {
        match err.probe(|p| p.error_code().map(|code| self.codes.contains(code))) {
            Some(true) => Retryable::Yes,
            _ => Retryable::Unknown,
        }
    }
}
