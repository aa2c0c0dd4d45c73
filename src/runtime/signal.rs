//! Abort signals that unwind a run in immediate mode.
//!
//! These travel as the `Err` side of `Scenario::run`, `Feature::run` and
//! `Runner::execute`, each level folding its partial results in, and are
//! interpreted only at the runner boundary.

use std::fmt;

use crate::errors::{exit_code, InternalRuntimeError, VerityError, ERROR_CODEWORD, FAILURE_CODEWORD};

use super::result::ScenarioResult;

/// Internal request to stop the run, carrying the result that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub enum Exit {
    Failure(ScenarioResult),
    Error(ScenarioResult),
}

impl Exit {
    pub fn code(&self) -> i32 {
        match self {
            Exit::Failure(_) => exit_code(FAILURE_CODEWORD),
            Exit::Error(_) => exit_code(ERROR_CODEWORD),
        }
    }

    pub fn result(&self) -> &ScenarioResult {
        match self {
            Exit::Failure(result) | Exit::Error(result) => result,
        }
    }
}

/// Why a level of the run stopped early.
#[derive(Debug)]
pub enum Interrupt {
    Exit(Exit),
    Internal(InternalRuntimeError),
    Discovery(VerityError),
}

impl From<Exit> for Interrupt {
    fn from(exit: Exit) -> Self {
        Interrupt::Exit(exit)
    }
}

impl From<InternalRuntimeError> for Interrupt {
    fn from(error: InternalRuntimeError) -> Self {
        Interrupt::Internal(error)
    }
}

/// An interrupt together with whatever was collected before it.
#[derive(Debug)]
pub struct Interrupted<T> {
    pub cause: Interrupt,
    pub partial: T,
}

impl<T> Interrupted<T> {
    pub fn new(cause: impl Into<Interrupt>, partial: T) -> Self {
        Self {
            cause: cause.into(),
            partial,
        }
    }
}

/// The outward-facing outcome of an immediate abort, as returned by
/// `Runner::run`.
#[derive(Debug, Clone, PartialEq)]
pub enum Immediate {
    Failure(ScenarioResult),
    Error(ScenarioResult),
}

impl Immediate {
    pub fn result(&self) -> &ScenarioResult {
        match self {
            Immediate::Failure(result) | Immediate::Error(result) => result,
        }
    }
}

impl From<Exit> for Immediate {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Failure(result) => Immediate::Failure(result),
            Exit::Error(result) => Immediate::Error(result),
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, result) = match self {
            Immediate::Failure(result) => ("failure", result),
            Immediate::Error(result) => ("error", result),
        };
        write!(f, "stopped at the first {kind}: {}", result.location)
    }
}
