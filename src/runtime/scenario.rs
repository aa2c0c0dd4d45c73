//! Driving one scenario through its lifecycle.

use crate::location::Location;

use super::arrangement::ScenarioArrangement;
use super::container::Container;
use super::context::{RuntimeContext, TeardownPolicy};
use super::result::{Outcome, ScenarioResult, ScenarioResultSet, Stage};
use super::signal::{Exit, Interrupt, Interrupted};

pub type ScenarioRun = Result<ScenarioResultSet, Interrupted<ScenarioResultSet>>;

/// One schedulable unit of execution: a top-level function or class of a
/// module, possibly expanding into several flattened arrangements.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub arrangement: ScenarioArrangement,
}

impl Scenario {
    pub fn new(arrangement: ScenarioArrangement) -> Self {
        Self {
            name: arrangement.name.clone(),
            arrangement,
        }
    }

    pub fn location(&self) -> &Location {
        &self.arrangement.location
    }

    /// Runs every flattened arrangement in declaration order.
    ///
    /// In immediate mode the first failure or error interrupts the run; the
    /// interrupt carries the results collected up to that point.
    pub fn run(&self, context: &RuntimeContext<'_>) -> ScenarioRun {
        let mut results = ScenarioResultSet::new(self.name.clone());
        if let Err(error) = context.notify("on_scenario", |r| r.on_scenario(self)) {
            return Err(Interrupted::new(error, results));
        }

        for arrangement in self.arrangement.uncollapse_nested() {
            if !arrangement.is_runnable() {
                continue;
            }
            if let Err(cause) = self.run_arrangement(arrangement, context, &mut results) {
                return Err(Interrupted::new(cause, results));
            }
        }

        match context.notify("on_scenario_done", |r| r.on_scenario_done(self, &results)) {
            Ok(()) => Ok(results),
            Err(error) => Err(Interrupted::new(error, results)),
        }
    }

    fn run_arrangement(
        &self,
        arrangement: &ScenarioArrangement,
        context: &RuntimeContext<'_>,
        results: &mut ScenarioResultSet,
    ) -> Result<(), Interrupt> {
        tracing::debug!(
            scenario = %self.name,
            arrangement = %arrangement.name,
            tests = arrangement.test_methods.len(),
            "running arrangement"
        );

        let mut ready = true;
        for setup in &arrangement.setup_methods {
            match self.run_container(setup, Stage::Setup, context, results, true) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(setup = %setup.name, "setup did not pass, skipping tests");
                    ready = false;
                    break;
                }
                Err(cause) => {
                    self.teardown_after_abort(arrangement, context, results, &cause)?;
                    return Err(cause);
                }
            }
        }

        if ready {
            for test in &arrangement.test_methods {
                if let Err(cause) = self.run_container(test, Stage::Test, context, results, true) {
                    self.teardown_after_abort(arrangement, context, results, &cause)?;
                    return Err(cause);
                }
            }
        }

        for teardown in &arrangement.teardown_methods {
            self.run_container(teardown, Stage::Teardown, context, results, true)?;
        }
        Ok(())
    }

    /// Runs teardowns while an abort propagates, when the policy asks for it.
    /// Their outcomes are recorded but cannot start another abort.
    fn teardown_after_abort(
        &self,
        arrangement: &ScenarioArrangement,
        context: &RuntimeContext<'_>,
        results: &mut ScenarioResultSet,
        cause: &Interrupt,
    ) -> Result<(), Interrupt> {
        let aborting = matches!(cause, Interrupt::Exit(_));
        if !aborting || context.options().teardown_policy != TeardownPolicy::Always {
            return Ok(());
        }
        for teardown in &arrangement.teardown_methods {
            self.run_container(teardown, Stage::Teardown, context, results, false)?;
        }
        Ok(())
    }

    /// Runs one container and records its result, returning whether it
    /// passed.
    ///
    /// Setup and teardown containers that pass leave no result behind.
    fn run_container(
        &self,
        container: &Container,
        stage: Stage,
        context: &RuntimeContext<'_>,
        results: &mut ScenarioResultSet,
        may_abort: bool,
    ) -> Result<bool, Interrupt> {
        let outcome = Outcome::from_unit(container.run(context));
        let passed = matches!(outcome, Outcome::Success);
        if stage != Stage::Test && passed {
            return Ok(true);
        }

        let result = ScenarioResult {
            scenario: self.name.clone(),
            container: container.name.clone(),
            stage,
            location: container.location.clone(),
            outcome,
        };
        match &result.outcome {
            Outcome::Success => context.notify("on_success", |r| r.on_success(self, &result))?,
            Outcome::Failure(_) => context.notify("on_failure", |r| r.on_failure(self, &result))?,
            Outcome::Error(_) => context.notify("on_error", |r| r.on_error(self, &result))?,
        }
        results.push(result.clone());

        if !(may_abort && context.options().immediate) {
            return Ok(passed);
        }
        match result.outcome {
            Outcome::Success => Ok(true),
            Outcome::Failure(_) => {
                tracing::info!(container = %container.name, "immediate mode: stopping at failure");
                Err(Exit::Failure(result).into())
            }
            Outcome::Error(_) => {
                tracing::info!(container = %container.name, "immediate mode: stopping at error");
                Err(Exit::Error(result).into())
            }
        }
    }
}
