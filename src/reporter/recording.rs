use crate::errors::InternalRuntimeError;
use crate::runtime::{
    Aggregate, Feature, FeatureResult, FeatureResultSet, RuntimeOptions, Scenario, ScenarioResult,
    ScenarioResultSet,
};

use super::{Reporter, ReporterError, ReporterResult};

/// One reporter notification, as recorded by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Feature(String),
    FeatureDone {
        feature: String,
        total: usize,
    },
    Scenario(String),
    ScenarioDone {
        scenario: String,
        total: usize,
    },
    Success(String),
    Failure(String),
    Error(String),
    InternalRuntimeError(String),
    Finish {
        successes: usize,
        failures: usize,
        errors: usize,
        immediate: bool,
    },
}

/// Records every notification in order. Can be told to fail on a hook.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<Event>,
    failing_hook: Option<&'static str>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `hook` return an error every time it is called.
    pub fn failing_on(mut self, hook: &'static str) -> Self {
        self.failing_hook = Some(hook);
        self
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }

    fn record(&mut self, hook: &'static str, event: Event) -> ReporterResult {
        if self.failing_hook == Some(hook) {
            return Err(ReporterError::Other(format!("{hook} refused")));
        }
        self.events.push(event);
        Ok(())
    }
}

impl Reporter for RecordingReporter {
    fn on_start(&mut self) -> ReporterResult {
        self.record("on_start", Event::Start)
    }

    fn on_feature(&mut self, feature: &Feature) -> ReporterResult {
        self.record("on_feature", Event::Feature(feature.name.clone()))
    }

    fn on_feature_done(&mut self, feature: &Feature, result: &FeatureResult) -> ReporterResult {
        self.record(
            "on_feature_done",
            Event::FeatureDone {
                feature: feature.name.clone(),
                total: result.total(),
            },
        )
    }

    fn on_scenario(&mut self, scenario: &Scenario) -> ReporterResult {
        self.record("on_scenario", Event::Scenario(scenario.name.clone()))
    }

    fn on_scenario_done(&mut self, scenario: &Scenario, result: &ScenarioResultSet) -> ReporterResult {
        self.record(
            "on_scenario_done",
            Event::ScenarioDone {
                scenario: scenario.name.clone(),
                total: result.total(),
            },
        )
    }

    fn on_success(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        self.record("on_success", Event::Success(result.container.clone()))
    }

    fn on_failure(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        self.record("on_failure", Event::Failure(result.container.clone()))
    }

    fn on_error(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        self.record("on_error", Event::Error(result.container.clone()))
    }

    fn on_internal_runtime_error(
        &mut self,
        _options: &RuntimeOptions,
        error: &InternalRuntimeError,
    ) -> ReporterResult {
        self.events
            .push(Event::InternalRuntimeError(error.during.clone()));
        Ok(())
    }

    fn on_finish(&mut self, results: &FeatureResultSet) -> ReporterResult {
        self.record(
            "on_finish",
            Event::Finish {
                successes: results.success_count(),
                failures: results.failure_count(),
                errors: results.error_count(),
                immediate: results.immediate.is_some(),
            },
        )
    }
}
