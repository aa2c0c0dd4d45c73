//! The runtime engine: discovery of scenarios, their execution and the
//! aggregation of results.
//!
//! Control flows `Runner -> Feature -> Scenario -> ScenarioArrangement ->
//! Container`, and results flow back up as nested aggregates. Execution is
//! sequential on the calling thread.
//!
//! ```rust
//! use verity::object::{FunctionDef, Module};
//! use verity::loader::StaticLoader;
//! use verity::reporter::RecordingReporter;
//! use verity::runtime::{Aggregate, Runner, RuntimeOptions};
//!
//! let module = Module::new("arithmetic")
//!     .function(FunctionDef::new("test_adds", || {
//!         assert_eq!(2 + 2, 4);
//!         Ok(())
//!     }));
//! let runner = Runner::new(StaticLoader::new(vec![module]), RuntimeOptions::default());
//! let mut reporter = RecordingReporter::new();
//! let results = runner.run(&[], &mut reporter).unwrap();
//! assert_eq!(results.success_count(), 1);
//! ```

mod arrangement;
mod container;
mod context;
mod feature;
pub mod panic;
mod result;
mod runner;
mod scenario;
mod signal;
mod warnings;

pub use arrangement::{ClassificationRules, Role, ScenarioArrangement, Source};
pub use container::{Container, Owner};
pub use context::{RuntimeContext, RuntimeOptions, TeardownPolicy, DEFAULT_GLOB};
pub use feature::{Feature, FeatureRun};
pub use panic::PanicCapture;
pub use result::{
    Aggregate, FeatureResult, FeatureResultSet, Outcome, ScenarioResult, ScenarioResultSet, Stage,
};
pub use runner::{Runner, RunnerRun};
pub use scenario::{Scenario, ScenarioRun};
pub use signal::{Exit, Immediate, Interrupt, Interrupted};
pub use warnings::{ReapingGuard, Warning, WarningReaper};
