use std::path::PathBuf;

use crate::errors::VerityError;
use crate::object::{Member, Module, ModuleIndex};

use super::arrangement::{ClassificationRules, ScenarioArrangement, Source};
use super::context::RuntimeContext;
use super::result::FeatureResult;
use super::scenario::Scenario;
use super::signal::Interrupted;

pub type FeatureRun = Result<FeatureResult, Interrupted<FeatureResult>>;

/// The scenarios discovered in one module.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub file: PathBuf,
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Builds a feature from a module's members.
    ///
    /// Functions the rules classify as tests and every class become
    /// scenarios, in declaration order. Data members are ignored.
    pub fn from_module(
        module: &Module,
        rules: &ClassificationRules,
        index: &ModuleIndex,
    ) -> Result<Self, VerityError> {
        let mut scenarios = Vec::new();
        for member in &module.members {
            let source = match member {
                Member::Function(function) if rules.seem_to_indicate_test(&function.name) => {
                    Source::Function(function.clone())
                }
                Member::Class(class) => Source::Class(class.clone()),
                _ => continue,
            };
            let arrangement = ScenarioArrangement::arrange(source, rules, index)?;
            scenarios.push(Scenario::new(arrangement));
        }
        tracing::debug!(module = %module.name, scenarios = scenarios.len(), "built feature");

        let description = match module.doc.as_deref().map(str::trim) {
            Some(doc) if !doc.is_empty() => doc.to_string(),
            _ => module.name.clone(),
        };
        Ok(Self {
            name: module.name.clone(),
            description,
            file: module.file.clone(),
            scenarios,
        })
    }

    /// Runs the scenarios in discovery order.
    pub fn run(&self, context: &RuntimeContext<'_>) -> FeatureRun {
        let mut result = FeatureResult::new(self.name.clone());
        if let Err(error) = context.notify("on_feature", |r| r.on_feature(self)) {
            return Err(Interrupted::new(error, result));
        }
        tracing::info!(feature = %self.name, "running feature");

        for scenario in &self.scenarios {
            match scenario.run(context) {
                Ok(set) => result.scenario_results.push(set),
                Err(interrupted) => {
                    result.scenario_results.push(interrupted.partial);
                    return Err(Interrupted {
                        cause: interrupted.cause,
                        partial: result,
                    });
                }
            }
        }

        match context.notify("on_feature_done", |r| r.on_feature_done(self, &result)) {
            Ok(()) => Ok(result),
            Err(error) => Err(Interrupted::new(error, result)),
        }
    }
}
