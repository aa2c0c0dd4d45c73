//! The top-level driver of a run.

use std::path::PathBuf;

use crate::errors::{InternalRuntimeError, VerityError};
use crate::loader::ModuleLoader;
use crate::object::ModuleIndex;
use crate::reporter::Reporter;

use super::arrangement::ClassificationRules;
use super::context::{RuntimeContext, RuntimeOptions};
use super::feature::Feature;
use super::panic;
use super::result::{Aggregate, FeatureResultSet};
use super::signal::{Interrupt, Interrupted};

pub type RunnerRun = Result<FeatureResultSet, Interrupted<FeatureResultSet>>;

pub struct Runner {
    loader: Box<dyn ModuleLoader>,
    options: RuntimeOptions,
    rules: ClassificationRules,
}

impl Runner {
    pub fn new(loader: impl ModuleLoader + 'static, options: RuntimeOptions) -> Self {
        Self {
            loader: Box::new(loader),
            options,
            rules: ClassificationRules::default(),
        }
    }

    /// Replaces the rules used to classify members.
    pub fn with_rules(mut self, rules: ClassificationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Loads the modules under `paths` and builds one feature per module.
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<Feature>, VerityError> {
        let modules = self.loader.load(
            paths,
            &self.options.glob_pattern,
            &self.options.excludes,
        )?;
        let index: ModuleIndex = modules.iter().collect();
        modules
            .iter()
            .map(|module| Feature::from_module(module, &self.rules, &index))
            .collect()
    }

    /// Discovers and runs every feature.
    ///
    /// Immediate-mode aborts and internal errors come back as the `Err`
    /// side, carrying the results collected so far.
    pub fn execute(&self, paths: &[PathBuf], context: &RuntimeContext<'_>) -> RunnerRun {
        let mut results = FeatureResultSet::new();
        let features = match self.discover(paths) {
            Ok(features) => features,
            Err(error) => return Err(Interrupted::new(Interrupt::Discovery(error), results)),
        };
        tracing::info!(features = features.len(), "starting run");

        for feature in &features {
            match feature.run(context) {
                Ok(result) => results.feature_results.push(result),
                Err(interrupted) => {
                    results.feature_results.push(interrupted.partial);
                    return Err(Interrupted {
                        cause: interrupted.cause,
                        partial: results,
                    });
                }
            }
        }
        Ok(results)
    }

    /// Runs everything under `paths`, reporting to `reporter`.
    ///
    /// An immediate-mode abort is not an error here: the partial results are
    /// returned with [`FeatureResultSet::immediate`] set. Discovery failures
    /// and internal runtime errors are returned as errors. A panic outside a
    /// test body is an internal runtime error too.
    pub fn run(
        &self,
        paths: &[PathBuf],
        reporter: &mut dyn Reporter,
    ) -> Result<FeatureResultSet, VerityError> {
        let context = RuntimeContext::new(reporter, self.options.clone());
        context.notify("on_start", |r| r.on_start())?;

        let run = match panic::guard(|| self.execute(paths, &context)) {
            Ok(run) => run,
            Err((message, _)) => {
                let error = InternalRuntimeError::new("execute", format!("panicked: {message}"));
                tracing::error!(error = %error.message, "runtime panicked");
                context.report_internal(&error);
                return Err(error.into());
            }
        };
        let mut results = match run {
            Ok(results) => results,
            Err(Interrupted { cause, mut partial }) => match cause {
                Interrupt::Exit(exit) => {
                    tracing::info!(code = exit.code(), "run stopped early");
                    partial.immediate = Some(exit.into());
                    partial
                }
                Interrupt::Internal(error) => return Err(error.into()),
                Interrupt::Discovery(error) => return Err(error),
            },
        };
        results.warnings = context.take_warnings();

        context.notify("on_finish", |r| r.on_finish(&results))?;
        tracing::info!(
            total = results.total(),
            failures = results.failure_count(),
            errors = results.error_count(),
            "run finished"
        );
        Ok(results)
    }
}
