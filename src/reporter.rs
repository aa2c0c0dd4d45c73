//! The reporter interface and the reporters shipped with verity.
//!
//! The runtime notifies a [`Reporter`] at every lifecycle point of a run.
//! Every hook defaults to [`ReporterError::NotImplemented`]; a reporter that
//! leaves a hook unimplemented ends the run with an internal runtime error the
//! first time that hook fires.

use std::io;

use thiserror::Error;

use crate::errors::InternalRuntimeError;
use crate::runtime::{
    Feature, FeatureResult, FeatureResultSet, RuntimeOptions, Scenario, ScenarioResult,
    ScenarioResultSet,
};

mod recording;
mod stream;

pub use recording::{Event, RecordingReporter};
pub use stream::{StreamReporter, Verbosity};

pub type ReporterResult = Result<(), ReporterError>;

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("reporter does not implement `{0}`")]
    NotImplemented(&'static str),

    #[error("failed to write report")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Observer of a run's lifecycle.
pub trait Reporter {
    fn on_start(&mut self) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_start"))
    }

    fn on_feature(&mut self, _feature: &Feature) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_feature"))
    }

    fn on_feature_done(&mut self, _feature: &Feature, _result: &FeatureResult) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_feature_done"))
    }

    fn on_scenario(&mut self, _scenario: &Scenario) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_scenario"))
    }

    fn on_scenario_done(
        &mut self,
        _scenario: &Scenario,
        _result: &ScenarioResultSet,
    ) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_scenario_done"))
    }

    fn on_success(&mut self, _scenario: &Scenario, _result: &ScenarioResult) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_success"))
    }

    fn on_failure(&mut self, _scenario: &Scenario, _result: &ScenarioResult) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_failure"))
    }

    fn on_error(&mut self, _scenario: &Scenario, _result: &ScenarioResult) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_error"))
    }

    fn on_internal_runtime_error(
        &mut self,
        _options: &RuntimeOptions,
        _error: &InternalRuntimeError,
    ) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_internal_runtime_error"))
    }

    fn on_finish(&mut self, _results: &FeatureResultSet) -> ReporterResult {
        Err(ReporterError::NotImplemented("on_finish"))
    }
}

/// Names accepted by [`by_name`].
pub const REPORTER_NAMES: &[&str] = &["feature", "quiet"];

/// Builds a terminal reporter from its command-line name.
pub fn by_name(name: &str) -> Option<Box<dyn Reporter>> {
    let verbosity = match name {
        "feature" => Verbosity::Feature,
        "quiet" => Verbosity::Quiet,
        _ => return None,
    };
    Some(Box::new(StreamReporter::stdout(verbosity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl Reporter for Silent {}

    #[test]
    fn test_hooks_default_to_not_implemented() {
        let mut reporter = Silent;
        match reporter.on_start() {
            Err(ReporterError::NotImplemented(hook)) => assert_eq!(hook, "on_start"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(reporter.on_finish(&FeatureResultSet::new()).is_err());
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("feature").is_some());
        assert!(by_name("quiet").is_some());
        assert!(by_name("spec").is_none());
    }
}
