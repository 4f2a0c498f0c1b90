//! Optional capabilities an error may expose to classifiers.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// A boxed collaborator error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Upcasts to the object types the error chain needs.
///
/// Implemented for every [`ErrorProbe`]; never implement it by hand.
pub trait AsProbe {
    /// Returns `self` as a probe.
    fn as_probe(&self) -> &dyn ErrorProbe;
    /// Returns `self` as a standard error.
    fn as_std_error(&self) -> &(dyn StdError + Send + Sync + 'static);
}

impl<T: ErrorProbe> AsProbe for T {
    fn as_probe(&self) -> &dyn ErrorProbe {
        self
    }

    fn as_std_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }
}

/// Capability probes consulted by retry classifiers.
///
/// Every method defaults to `None`, meaning the error does not implement that
/// capability. Returning `Some` opts in, whatever the value.
pub trait ErrorProbe: StdError + Send + Sync + 'static + AsProbe {
    /// Whether the error declares itself retryable.
    fn retryable_error(&self) -> Option<bool> {
        None
    }

    /// The HTTP status code the error carries.
    fn http_status_code(&self) -> Option<u16> {
        None
    }

    /// An application error code.
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// Whether the condition is transient.
    fn temporary(&self) -> Option<bool> {
        None
    }

    /// Whether the error is a timeout.
    fn timeout(&self) -> Option<bool> {
        None
    }
}

/// A plain error with no probes of its own.
///
/// It answers `timeout` and `temporary` from any [`io::Error`] found in the
/// wrapped error's source chain.
pub struct Opaque(BoxError);

impl Opaque {
    /// Wraps an error.
    #[must_use]
    pub fn new(err: BoxError) -> Self {
        Self(err)
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwraps the boxed error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }

    fn io_kind(&self) -> Option<io::ErrorKind> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self.0.as_ref());
        while let Some(err) = current {
            if let Some(io) = err.downcast_ref::<io::Error>() {
                return Some(io.kind());
            }
            current = err.source();
        }
        None
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Opaque {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl ErrorProbe for Opaque {
    fn timeout(&self) -> Option<bool> {
        self.io_kind().map(|kind| kind == io::ErrorKind::TimedOut)
    }

    fn temporary(&self) -> Option<bool> {
        self.io_kind().map(|kind| {
            matches!(
                kind,
                io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            )
        })
    }
}

/// A boxed [`ErrorProbe`] reports the error it holds as its source, looking through
/// [`Opaque`] to the collaborator error.
impl StdError for Box<dyn ErrorProbe> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let inner = (**self).as_std_error();
        match inner.downcast_ref::<Opaque>() {
            Some(opaque) => Some(opaque.get_ref()),
            None => Some(inner),
        }
    }
}
