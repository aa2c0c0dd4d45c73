//! Errors produced by individual test bodies.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// What every test body returns.
pub type UnitResult = Result<(), UnitError>;

/// A position in Rust source, captured with `#[track_caller]` or from a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    #[track_caller]
    pub fn caller() -> Self {
        std::panic::Location::caller().into()
    }
}

impl From<&std::panic::Location<'_>> for SourcePosition {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// An assertion-style failure: expected, expressive, human readable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
    pub position: Option<SourcePosition>,
}

impl AssertionFailure {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: Some(SourcePosition::caller()),
        }
    }

    pub fn at(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// A lookup of a missing attribute on an object.
///
/// The message keeps the `<repr> object has no attribute '<name>'` shape so
/// the exception manager can recognise disabled syntax by text alone.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct AttributeError {
    pub message: String,
}

impl AttributeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds the canonical message for `name` missing on a value of `type_name`.
    pub fn missing(type_name: &str, name: &str) -> Self {
        Self::new(format!("'{type_name}' object has no attribute '{name}'"))
    }
}

/// Why a test body did not pass.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    SpecialSyntaxDisabled(#[from] super::SpecialSyntaxDisabledError),

    #[error("{message}")]
    Panic {
        message: String,
        position: Option<SourcePosition>,
    },

    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Other(Box<dyn StdError + 'static>),
}

impl UnitError {
    /// Wraps any error as an unexpected error.
    pub fn other(error: impl StdError + 'static) -> Self {
        UnitError::Other(Box::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        UnitError::Message(message.into())
    }

    /// Assertion-derived errors are failures; the rest are errors.
    pub fn is_failure(&self) -> bool {
        matches!(self, UnitError::Assertion(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            UnitError::Assertion(_) => "AssertionFailure",
            UnitError::Attribute(_) => "AttributeError",
            UnitError::SpecialSyntaxDisabled(_) => "SpecialSyntaxDisabledError",
            UnitError::Panic { .. } => "panic",
            UnitError::Message(_) => "Error",
            UnitError::Other(_) => "Error",
        }
    }

    pub fn position(&self) -> Option<&SourcePosition> {
        match self {
            UnitError::Assertion(failure) => failure.position.as_ref(),
            UnitError::Panic { position, .. } => position.as_ref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for UnitError {
    fn from(error: std::io::Error) -> Self {
        UnitError::other(error)
    }
}

impl From<crate::errors::VerityError> for UnitError {
    fn from(error: crate::errors::VerityError) -> Self {
        UnitError::other(error)
    }
}

// ============================================================================
// ERROR STACK
// ============================================================================

/// The recorded shape of an unexpected error: its kind, message, cause chain
/// and the position it was raised at, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStack {
    pub kind: String,
    pub message: String,
    pub causes: Vec<String>,
    pub position: Option<SourcePosition>,
}

impl ErrorStack {
    pub fn from_error(error: &UnitError) -> Self {
        let mut causes = Vec::new();
        let mut source = match error {
            UnitError::Other(inner) => inner.source(),
            other => other.source(),
        };
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: error.kind_name().to_string(),
            message: error.to_string(),
            causes,
            position: error.position().cloned(),
        }
    }
}

impl fmt::Display for ErrorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        if let Some(position) = &self.position {
            write!(f, "\n  at {}", position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_assertion_failure_records_caller() {
        let failure = AssertionFailure::new("nope");
        let position = failure.position.expect("position captured");
        assert!(position.file.ends_with("unit.rs"));
    }

    #[test]
    fn test_only_assertions_are_failures() {
        assert!(UnitError::from(AssertionFailure::new("x")).is_failure());
        assert!(!UnitError::msg("x").is_failure());
        assert!(!UnitError::from(AttributeError::missing("str", "foo")).is_failure());
    }

    #[test]
    fn test_error_stack_collects_cause_chain() {
        let error = UnitError::other(Outer {
            inner: std::io::Error::new(std::io::ErrorKind::NotFound, "missing file"),
        });
        let stack = ErrorStack::from_error(&error);
        assert_eq!(stack.kind, "Error");
        assert_eq!(stack.message, "outer");
        assert_eq!(stack.causes, vec!["missing file".to_string()]);
        assert!(stack.to_string().contains("caused by: missing file"));
    }

    #[test]
    fn test_attribute_error_message_shape() {
        let error = AttributeError::missing("str", "should");
        assert_eq!(error.to_string(), "'str' object has no attribute 'should'");
    }
}
