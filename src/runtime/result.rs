//! Results of running containers, aggregated bottom-up.

use std::fmt;

use crate::errors::{exit_code, AssertionFailure, ErrorStack, UnitError, ERROR_CODEWORD, FAILURE_CODEWORD};
use crate::location::Location;

use super::signal::Immediate;
use super::warnings::Warning;

/// Which part of an arrangement produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Test,
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Setup => "setup",
            Stage::Test => "test",
            Stage::Teardown => "teardown",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    Failure(AssertionFailure),
    Error(ErrorStack),
}

impl Outcome {
    pub fn from_unit(result: Result<(), UnitError>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(UnitError::Assertion(failure)) => Outcome::Failure(failure),
            Err(error) => Outcome::Error(ErrorStack::from_error(&error)),
        }
    }
}

/// The result of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub scenario: String,
    pub container: String,
    pub stage: Stage,
    pub location: Location,
    pub outcome: Outcome,
}

impl ScenarioResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn failure(&self) -> Option<&AssertionFailure> {
        match &self.outcome {
            Outcome::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorStack> {
        match &self.outcome {
            Outcome::Error(stack) => Some(stack),
            _ => None,
        }
    }
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Shared view over anything holding scenario results.
///
/// Results are visited left to right, so `first_*` follow declaration order.
pub trait Aggregate {
    fn results(&self) -> Box<dyn Iterator<Item = &ScenarioResult> + '_>;

    fn first_error(&self) -> Option<&ScenarioResult> {
        self.results().find(|result| result.is_error())
    }

    fn first_failure(&self) -> Option<&ScenarioResult> {
        self.results().find(|result| result.is_failure())
    }

    fn success_count(&self) -> usize {
        self.results().filter(|result| result.is_success()).count()
    }

    fn failure_count(&self) -> usize {
        self.results().filter(|result| result.is_failure()).count()
    }

    fn error_count(&self) -> usize {
        self.results().filter(|result| result.is_error()).count()
    }

    fn total(&self) -> usize {
        self.results().count()
    }

    fn is_success(&self) -> bool {
        self.results().all(ScenarioResult::is_success)
    }
}

/// Results of one scenario, across all of its flattened arrangements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioResultSet {
    pub scenario: String,
    pub scenario_results: Vec<ScenarioResult>,
}

impl ScenarioResultSet {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            scenario_results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ScenarioResult) {
        self.scenario_results.push(result);
    }
}

impl Aggregate for ScenarioResultSet {
    fn results(&self) -> Box<dyn Iterator<Item = &ScenarioResult> + '_> {
        Box::new(self.scenario_results.iter())
    }
}

/// Results of one feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureResult {
    pub feature: String,
    pub scenario_results: Vec<ScenarioResultSet>,
}

impl FeatureResult {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            scenario_results: Vec::new(),
        }
    }
}

impl Aggregate for FeatureResult {
    fn results(&self) -> Box<dyn Iterator<Item = &ScenarioResult> + '_> {
        Box::new(self.scenario_results.iter().flat_map(|set| set.results()))
    }
}

/// Results of a whole run.
#[derive(Debug, Clone, Default)]
pub struct FeatureResultSet {
    pub feature_results: Vec<FeatureResult>,
    /// Set when an immediate-mode abort ended the run early.
    pub immediate: Option<Immediate>,
    pub warnings: Vec<Warning>,
}

impl FeatureResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process exit status for this run. Errors win over failures.
    pub fn exit_status(&self) -> i32 {
        match &self.immediate {
            Some(Immediate::Error(_)) => exit_code(ERROR_CODEWORD),
            Some(Immediate::Failure(_)) => exit_code(FAILURE_CODEWORD),
            None if self.error_count() > 0 => exit_code(ERROR_CODEWORD),
            None if self.failure_count() > 0 => exit_code(FAILURE_CODEWORD),
            None => 0,
        }
    }
}

impl Aggregate for FeatureResultSet {
    fn results(&self) -> Box<dyn Iterator<Item = &ScenarioResult> + '_> {
        Box::new(self.feature_results.iter().flat_map(|feature| feature.results()))
    }
}
