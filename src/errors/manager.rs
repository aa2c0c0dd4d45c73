//! Disambiguation of attribute errors raised by disabled assertion syntax.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::unit::UnitError;

/// Identifiers of the optional assertion-chain syntax.
pub const SPECIAL_SYNTAX_NAMES: &[&str] = &[
    "should",
    "should_not",
    "shouldnt",
    "shouldnot",
    "must",
    "must_not",
    "mustnt",
    "does",
    "does_not",
    "doesnt",
    "doesnot",
    "do",
    "do_not",
    "dont",
    "when",
];

static NO_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<repr>.+) object has no attribute '(?P<name>[^']+)'$")
        .expect("static pattern compiles")
});

/// Raised instead of an attribute error when the missing attribute is part of
/// the optional assertion-chain syntax, which is disabled.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{object_repr} object has no attribute '{attribute}': special syntax is disabled")]
pub struct SpecialSyntaxDisabledError {
    pub object_repr: String,
    pub attribute: String,
}

/// Routes a caught error, replacing attribute errors that look like a use of
/// disabled special syntax with [`SpecialSyntaxDisabledError`].
#[derive(Debug)]
pub struct ExceptionManager {
    error: UnitError,
}

impl ExceptionManager {
    pub fn new(error: UnitError) -> Self {
        Self { error }
    }

    /// Returns `(object_repr, attribute)` when the error is an attribute error
    /// naming one of [`SPECIAL_SYNTAX_NAMES`].
    pub fn special_syntax_match(&self) -> Option<(String, String)> {
        let UnitError::Attribute(attribute) = &self.error else {
            return None;
        };
        let captures = NO_ATTRIBUTE.captures(&attribute.message)?;
        let name = captures.name("name")?.as_str();
        if !SPECIAL_SYNTAX_NAMES.contains(&name) {
            return None;
        }
        let repr = captures.name("repr")?.as_str();
        Some((repr.to_string(), name.to_string()))
    }

    /// Consumes the manager, returning the error to record.
    pub fn resolve(self) -> UnitError {
        match self.special_syntax_match() {
            Some((object_repr, attribute)) => {
                tracing::debug!(%attribute, "attribute error resolved as disabled special syntax");
                UnitError::SpecialSyntaxDisabled(SpecialSyntaxDisabledError {
                    object_repr,
                    attribute,
                })
            }
            None => self.error,
        }
    }
}
