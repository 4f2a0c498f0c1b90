//! Input validation errors.
//!
//! Serializers check their input before building a request and report every
//! problem at once through [`InvalidParamsError`]. Each entry records the
//! path of the offending field, rendered as `Input.Items[0].Name.`.

use crate::errors::{Error, ErrorProbe};
use std::fmt;

/// One invalid input parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidParamError {
    /// Path segments from the input root to the field. Index segments look
    /// like `[3]`.
    pub context: Vec<String>,
    /// What is wrong with the field.
    pub reason: String,
}

impl InvalidParamError {
    /// Creates an error for the field at `context`.
    pub fn new<I, S>(reason: impl Into<String>, context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            context: context.into_iter().map(Into::into).collect(),
            reason: reason.into(),
        }
    }

    fn write_to(&self, f: &mut fmt::Formatter<'_>, prefix: &[String]) -> fmt::Result {
        f.write_str(&self.reason)?;
        let mut segments = prefix.iter().chain(&self.context);
        let Some(first) = segments.next() else {
            return Ok(());
        };
        write!(f, ", {first}")?;
        for segment in segments {
            if !segment.starts_with('[') {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        f.write_str(".")
    }
}

impl fmt::Display for InvalidParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &[])
    }
}

impl std::error::Error for InvalidParamError {}

impl ErrorProbe for InvalidParamError {}

/// Reports a missing required field.
pub fn param_required<I, S>(context: I) -> InvalidParamError
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    InvalidParamError::new("missing required param", context)
}

/// Every invalid parameter found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidParamsError {
    /// Path prefix shared by every entry.
    pub context: Vec<String>,
    /// The collected failures, in the order found.
    pub errs: Vec<InvalidParamError>,
}

impl InvalidParamsError {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection whose entries all sit under `context`.
    pub fn with_context<I, S>(context: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            context: context.into_iter().map(Into::into).collect(),
            errs: Vec::new(),
        }
    }

    /// Records a failure found under `context`.
    ///
    /// Nested validation errors are flattened so each entry carries its full
    /// path. Any other error becomes one entry with the error's message as
    /// the reason.
    pub fn add_invalid(&mut self, err: impl Into<Error>, context: &[&str]) {
        let prefix: Vec<String> = context.iter().map(|s| (*s).to_string()).collect();
        match err.into() {
            Error::InvalidParam(e) => self.push(e, &prefix),
            Error::InvalidParams(e) => {
                let mut nested = prefix;
                nested.extend(e.context);
                for inner in e.errs {
                    self.push(inner, &nested);
                }
            }
            other => self.errs.push(InvalidParamError {
                context: prefix,
                reason: other.to_string(),
            }),
        }
    }

    /// Records a failure for element `index` of the list at `context`.
    pub fn add_invalid_with_index(&mut self, err: impl Into<Error>, index: usize, context: &[&str]) {
        let segment = format!("[{index}]");
        let mut path: Vec<&str> = context.to_vec();
        path.push(&segment);
        self.add_invalid(err, &path);
    }

    fn push(&mut self, mut err: InvalidParamError, prefix: &[String]) {
        if !prefix.is_empty() {
            let mut context = prefix.to_vec();
            context.append(&mut err.context);
            err.context = context;
        }
        self.errs.push(err);
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errs.is_empty()
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errs.len()
    }

    /// Succeeds when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errs.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for InvalidParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} validation error(s) found.", self.errs.len())?;
        for err in &self.errs {
            f.write_str("- ")?;
            err.write_to(f, &self.context)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidParamsError {}

impl ErrorProbe for InvalidParamsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_param_error_display() {
        assert_eq!(
            param_required(["Name"]).to_string(),
            "missing required param, Name."
        );
        assert_eq!(
            InvalidParamError::new("too long", Vec::<String>::new()).to_string(),
            "too long"
        );
    }

    #[test]
    fn test_nested_context_paths() {
        let mut item = InvalidParamsError::new();
        item.add_invalid(param_required(["Name"]), &[]);

        let mut input = InvalidParamsError::with_context(["Input"]);
        input.add_invalid_with_index(item, 0, &["Items"]);
        input.add_invalid(std::io::Error::other("not a number"), &["Count"]);

        assert_eq!(input.len(), 2);
        assert_eq!(
            input.to_string(),
            "2 validation error(s) found.\n\
             - missing required param, Input.Items[0].Name.\n\
             - not a number, Input.Count.\n"
        );
    }

    #[test]
    fn test_into_result() {
        assert!(InvalidParamsError::new().into_result().is_ok());

        let mut errs = InvalidParamsError::new();
        errs.add_invalid(param_required(["Bucket"]), &[]);
        let err = Error::from(errs.into_result().unwrap_err());
        assert_eq!(
            err.to_string(),
            "1 validation error(s) found.\n- missing required param, Bucket.\n"
        );
    }
}
