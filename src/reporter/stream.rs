//! Terminal reporter.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::InternalRuntimeError;
use crate::runtime::{
    Aggregate, Feature, FeatureResult, FeatureResultSet, Immediate, Outcome, RuntimeOptions,
    Scenario, ScenarioResult, ScenarioResultSet, Stage,
};

use super::{Reporter, ReporterResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// One line per feature, scenario and test.
    Feature,
    /// Only the summary and the details of what went wrong.
    Quiet,
}

/// Writes a run's progress and summary to a colour-capable stream.
pub struct StreamReporter<W: WriteColor = StandardStream> {
    out: W,
    verbosity: Verbosity,
}

impl StreamReporter<StandardStream> {
    /// Reports to stdout, with colours only when stdout is a terminal.
    pub fn stdout(verbosity: Verbosity) -> Self {
        let choice = if atty::is(atty::Stream::Stdout) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(choice), verbosity)
    }
}

impl<W: WriteColor> StreamReporter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self { out, verbosity }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn verbose(&self) -> bool {
        self.verbosity == Verbosity::Feature
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> std::io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }

    fn write_detail(&mut self, result: &ScenarioResult) -> std::io::Result<()> {
        let (color, label) = match result.outcome {
            Outcome::Failure(_) => (Color::Red, "FAILURE"),
            Outcome::Error(_) => (Color::Yellow, "ERROR"),
            Outcome::Success => return Ok(()),
        };
        self.colored(color, true, label)?;
        write!(self.out, " in {}", result.location)?;
        if result.stage != Stage::Test {
            write!(self.out, " [{}]", result.stage)?;
        }
        writeln!(self.out)?;
        match &result.outcome {
            Outcome::Failure(failure) => {
                for line in failure.message.lines() {
                    writeln!(self.out, "    {line}")?;
                }
                if let Some(position) = &failure.position {
                    writeln!(self.out, "    at {position}")?;
                }
            }
            Outcome::Error(stack) => {
                for line in stack.to_string().lines() {
                    writeln!(self.out, "    {line}")?;
                }
            }
            Outcome::Success => {}
        }
        writeln!(self.out)
    }
}

impl<W: WriteColor> Reporter for StreamReporter<W> {
    fn on_start(&mut self) -> ReporterResult {
        Ok(())
    }

    fn on_feature(&mut self, feature: &Feature) -> ReporterResult {
        if self.verbose() {
            self.colored(Color::Cyan, true, &format!("Feature: {}", feature.description))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn on_feature_done(&mut self, _feature: &Feature, _result: &FeatureResult) -> ReporterResult {
        if self.verbose() {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn on_scenario(&mut self, scenario: &Scenario) -> ReporterResult {
        if self.verbose() && !scenario.arrangement.nested_containers.is_empty() {
            writeln!(self.out, "  {}", scenario.location().description)?;
        }
        Ok(())
    }

    fn on_scenario_done(
        &mut self,
        _scenario: &Scenario,
        _result: &ScenarioResultSet,
    ) -> ReporterResult {
        Ok(())
    }

    fn on_success(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        if self.verbose() {
            self.colored(Color::Green, false, "  ✓ ")?;
            writeln!(self.out, "{}", result.location.description)?;
        }
        Ok(())
    }

    fn on_failure(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        if self.verbose() {
            self.colored(Color::Red, false, "  ✗ ")?;
            writeln!(self.out, "{}", result.location.description)?;
        }
        Ok(())
    }

    fn on_error(&mut self, _scenario: &Scenario, result: &ScenarioResult) -> ReporterResult {
        if self.verbose() {
            self.colored(Color::Yellow, false, "  ✗ ")?;
            writeln!(self.out, "{} (error)", result.location.description)?;
        }
        Ok(())
    }

    fn on_internal_runtime_error(
        &mut self,
        _options: &RuntimeOptions,
        error: &InternalRuntimeError,
    ) -> ReporterResult {
        self.colored(Color::Red, true, "INTERNAL RUNTIME ERROR")?;
        writeln!(self.out, " {error}")?;
        Ok(())
    }

    fn on_finish(&mut self, results: &FeatureResultSet) -> ReporterResult {
        let problems: Vec<&ScenarioResult> =
            results.results().filter(|r| !r.is_success()).collect();
        for result in problems {
            self.write_detail(result)?;
        }

        if let Some(immediate) = &results.immediate {
            let color = match immediate {
                Immediate::Failure(_) => Color::Red,
                Immediate::Error(_) => Color::Yellow,
            };
            self.colored(color, true, &immediate.to_string())?;
            writeln!(self.out)?;
        }

        if !results.warnings.is_empty() {
            self.colored(Color::Yellow, true, &format!("{} warnings", results.warnings.len()))?;
            writeln!(self.out)?;
            for warning in &results.warnings {
                writeln!(self.out, "  {warning}")?;
            }
        }

        let (passed, failed, errors) = (
            results.success_count(),
            results.failure_count(),
            results.error_count(),
        );
        write!(self.out, "{} tests: ", results.total())?;
        self.colored(Color::Green, false, &format!("{passed} passed"))?;
        write!(self.out, ", ")?;
        self.colored(Color::Red, false, &format!("{failed} failed"))?;
        write!(self.out, ", ")?;
        self.colored(Color::Yellow, false, &format!("{errors} errors"))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use super::*;
    use crate::errors::AssertionFailure;
    use crate::location::{Location, RunnableKind};

    fn report(verbosity: Verbosity, results: &FeatureResultSet) -> String {
        let mut reporter = StreamReporter::new(NoColor::new(Vec::new()), verbosity);
        reporter.on_finish(results).unwrap();
        String::from_utf8(reporter.into_inner().into_inner()).unwrap()
    }

    fn failing_run() -> FeatureResultSet {
        let mut scenario = ScenarioResultSet::new("test_bad");
        scenario.push(ScenarioResult {
            scenario: "test_bad".into(),
            container: "test_bad".into(),
            stage: Stage::Test,
            location: Location {
                name: "test_bad".into(),
                filename: "suite.rs".into(),
                line: 9,
                kind: RunnableKind::Function,
                description: "fails on purpose".into(),
                ancestral_description: "suite".into(),
            },
            outcome: Outcome::Failure(AssertionFailure::at("X is 1 whereas Y is 2", None)),
        });
        FeatureResultSet {
            feature_results: vec![FeatureResult {
                feature: "suite".into(),
                scenario_results: vec![scenario],
            }],
            ..FeatureResultSet::default()
        }
    }

    #[test]
    fn test_summary_lists_failures_with_location() {
        let output = report(Verbosity::Quiet, &failing_run());
        assert!(output.contains("FAILURE in fails on purpose (suite.rs:9)"));
        assert!(output.contains("    X is 1 whereas Y is 2"));
        assert!(output.ends_with("1 tests: 0 passed, 1 failed, 0 errors\n"));
    }

    #[test]
    fn test_internal_error_is_always_printed() {
        let mut reporter = StreamReporter::new(NoColor::new(Vec::new()), Verbosity::Quiet);
        reporter
            .on_internal_runtime_error(
                &RuntimeOptions::default(),
                &InternalRuntimeError::new("on_feature", "broken pipe"),
            )
            .unwrap();
        let output = String::from_utf8(reporter.into_inner().into_inner()).unwrap();
        assert_eq!(
            output,
            "INTERNAL RUNTIME ERROR internal runtime error during on_feature: broken pipe\n"
        );
    }
}
