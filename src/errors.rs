//! Verity Error Handling
//!
//! Three families of errors live here:
//!
//! - [`VerityError`]: failures of the runtime itself (discovery, loading,
//!   configuration, unsupported objects). Rendered through `miette`.
//! - [`UnitError`]: what a single test body produces when it does not pass.
//!   Assertion-style errors become failures, everything else becomes an error.
//! - [`InternalRuntimeError`]: a bug or misuse of the runtime. Always fatal,
//!   always reported through `Reporter::on_internal_runtime_error`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

mod manager;
mod unit;

pub use manager::{ExceptionManager, SpecialSyntaxDisabledError, SPECIAL_SYNTAX_NAMES};
pub use unit::{AssertionFailure, AttributeError, ErrorStack, SourcePosition, UnitError, UnitResult};

// ============================================================================
// EXIT CODES
// ============================================================================

/// Derives a process exit status from a codeword by XOR-ing its characters.
///
/// ```rust
/// use verity::errors::exit_code;
/// assert_eq!(exit_code("ERROR"), 88);
/// assert_eq!(exit_code("FAILURE"), 64);
/// ```
pub fn exit_code(codeword: &str) -> i32 {
    codeword.chars().fold(0u32, |acc, c| acc ^ c as u32) as i32
}

pub const FAILURE_CODEWORD: &str = "FAILURE";
pub const ERROR_CODEWORD: &str = "ERROR";
pub const INTERNAL_CODEWORD: &str = "INTERNAL RUNTIME ERROR";

// ============================================================================
// RUNTIME ERRORS
// ============================================================================

/// Unified error type for everything that can go wrong outside a test body.
#[derive(Error, Diagnostic, Debug)]
pub enum VerityError {
    #[error("cannot resolve a location for {repr} of type {type_name}")]
    #[diagnostic(
        code(verity::location::unsupported),
        help("only functions, methods, classes and instances have a location")
    )]
    UnsupportedObject { repr: String, type_name: String },

    #[error("no module named '{name}' is registered (needed by {})", .path.display())]
    #[diagnostic(
        code(verity::loader::not_found),
        help("register a module factory under this name or exclude the file")
    )]
    ModuleNotFound { name: String, path: PathBuf },

    #[error("failed to load module from {}: {reason}", .path.display())]
    #[diagnostic(code(verity::loader::load))]
    Load { path: PathBuf, reason: String },

    #[error("failed to read {}", .path.display())]
    #[diagnostic(code(verity::loader::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}", .path.display())]
    #[diagnostic(code(verity::loader::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid YAML in {}", .path.display())]
    #[diagnostic(code(verity::loader::yaml))]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid pattern '{pattern}'")]
    #[diagnostic(
        code(verity::loader::pattern),
        help("globs support *, ** and ?; classification rules take regular expressions")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(verity::config::invalid))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    InternalRuntime(#[from] InternalRuntimeError),
}

impl VerityError {
    pub fn unsupported(value: &crate::value::Value) -> Self {
        VerityError::UnsupportedObject {
            repr: value.repr(),
            type_name: value.type_name().to_string(),
        }
    }
}

/// A bug or misuse of the runtime. Carries a fixed status code.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("internal runtime error during {during}: {message}")]
#[diagnostic(
    code(verity::runtime::internal),
    help("this is not a test failure; the run was stopped")
)]
pub struct InternalRuntimeError {
    pub during: String,
    pub message: String,
}

impl InternalRuntimeError {
    pub fn new(during: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            during: during.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> i32 {
        exit_code(INTERNAL_CODEWORD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codewords_map_to_distinct_codes() {
        assert_eq!(exit_code(ERROR_CODEWORD), 88);
        assert_eq!(exit_code(FAILURE_CODEWORD), 64);
        assert_eq!(exit_code(INTERNAL_CODEWORD), 3);
        assert_eq!(exit_code(""), 0);
    }

    #[test]
    fn test_unsupported_object_names_value_and_type() {
        let err = VerityError::unsupported(&crate::value::Value::from(vec![1]));
        let text = err.to_string();
        assert!(text.contains("[1]"));
        assert!(text.contains("list"));
    }

    #[test]
    fn test_internal_error_renders_through_miette() {
        let err = VerityError::from(InternalRuntimeError::new("on_start", "boom"));
        let report = miette::Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("boom"));
        assert!(output.contains("verity::runtime::internal"));
    }

    #[test]
    fn test_internal_error_status_is_separate_from_diagnostic_code() {
        use miette::Diagnostic;

        let err = InternalRuntimeError::new("on_finish", "boom");
        assert_eq!(err.status_code(), 3);
        assert_eq!(
            err.code().map(|code| code.to_string()).as_deref(),
            Some("verity::runtime::internal")
        );
    }
}
