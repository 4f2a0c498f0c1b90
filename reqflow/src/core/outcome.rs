//! The value every stage function hands back up the chain.

use super::metadata::Metadata;
use crate::errors::Error;

/// Output, metadata and error returned by a stage.
///
/// Metadata travels on both the success and the failure path: an outer
/// interceptor inspecting a failed call may find that metadata is all that is
/// left of what inner stages learned.
#[derive(Debug)]
pub struct Outcome<T> {
    /// Stage output. For failed calls this is usually the default value.
    pub output: T,
    /// Side-channel values written by inner stages.
    pub metadata: Metadata,
    /// The failure, if any.
    pub error: Option<Error>,
}

impl<T> Outcome<T> {
    /// Creates a successful outcome with empty metadata.
    pub fn ok(output: T) -> Self {
        Self {
            output,
            metadata: Metadata::new(),
            error: None,
        }
    }

    /// Replaces the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns true if no error is set.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if an error is set.
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Converts the output to a different type, keeping metadata and error.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            output: f(self.output),
            metadata: self.metadata,
            error: self.error,
        }
    }

    /// Drops the metadata and returns the output or the error.
    pub fn into_result(self) -> Result<T, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.output),
        }
    }

    /// Splits into the result and the metadata.
    pub fn into_parts(self) -> (Result<T, Error>, Metadata) {
        let metadata = self.metadata;
        let result = match self.error {
            Some(err) => Err(err),
            None => Ok(self.output),
        };
        (result, metadata)
    }
}

impl<T: Default> Outcome<T> {
    /// Creates a failed outcome with empty metadata.
    pub fn err(error: impl Into<Error>) -> Self {
        Self {
            output: T::default(),
            metadata: Metadata::new(),
            error: Some(error.into()),
        }
    }
}
