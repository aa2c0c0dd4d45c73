//! Run configuration and the per-run context threaded through execution.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{InternalRuntimeError, VerityError};
use crate::reporter::{Reporter, ReporterError};

use super::panic;
use super::warnings::{ReapingGuard, Warning, WarningReaper};

/// Default discovery filter: files whose name starts with `test`.
pub const DEFAULT_GLOB: &str = "**/test*";

/// Whether teardowns still run while an immediate abort is propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    #[default]
    SkipOnAbort,
    Always,
}

/// Options for one run. Constructed once, never changed during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeOptions {
    /// Abort the whole run at the first failure or error.
    pub immediate: bool,
    pub glob_pattern: String,
    pub excludes: Vec<String>,
    pub reap_warnings: bool,
    pub teardown_policy: TeardownPolicy,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            glob_pattern: DEFAULT_GLOB.to_string(),
            excludes: Vec::new(),
            reap_warnings: false,
            teardown_policy: TeardownPolicy::default(),
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn glob_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.glob_pattern = pattern.into();
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn reap_warnings(mut self, reap: bool) -> Self {
        self.reap_warnings = reap;
        self
    }

    pub fn teardown_policy(mut self, policy: TeardownPolicy) -> Self {
        self.teardown_policy = policy;
        self
    }

    /// Reads options from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, VerityError> {
        let source = std::fs::read_to_string(path).map_err(|source| VerityError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&source).map_err(|source| VerityError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// RUNTIME CONTEXT
// ============================================================================

/// Everything a run needs while it executes: the reporter, the options and
/// the warnings reaped so far.
///
/// Created once per `Runner::run`. Dropping it ends warning reaping on the
/// current thread.
pub struct RuntimeContext<'r> {
    reporter: RefCell<&'r mut dyn Reporter>,
    options: RuntimeOptions,
    reaper: WarningReaper,
    _reaping: Option<ReapingGuard>,
}

impl<'r> RuntimeContext<'r> {
    pub fn new(reporter: &'r mut dyn Reporter, options: RuntimeOptions) -> Self {
        let reaper = WarningReaper::new();
        let reaping = options.reap_warnings.then(|| reaper.start());
        Self {
            reporter: RefCell::new(reporter),
            options,
            reaper,
            _reaping: reaping,
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Warnings recorded so far; empty unless reaping is enabled.
    pub fn warnings(&self) -> Vec<Warning> {
        self.reaper.snapshot()
    }

    pub(crate) fn take_warnings(&self) -> Vec<Warning> {
        self.reaper.take()
    }

    /// Calls one reporter hook.
    ///
    /// A hook that fails or panics is turned into an [`InternalRuntimeError`],
    /// which is handed to `on_internal_runtime_error` before being returned.
    pub(crate) fn notify<F>(&self, hook: &'static str, f: F) -> Result<(), InternalRuntimeError>
    where
        F: FnOnce(&mut dyn Reporter) -> Result<(), ReporterError>,
    {
        let outcome = {
            let mut reporter = self.reporter.borrow_mut();
            panic::guard(|| f(&mut **reporter))
        };
        let error = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) => InternalRuntimeError::new(hook, error.to_string()),
            Err((message, _)) => InternalRuntimeError::new(hook, format!("panicked: {message}")),
        };
        tracing::error!(%hook, error = %error.message, "reporter hook failed");
        self.report_internal(&error);
        Err(error)
    }

    /// Hands `error` to `on_internal_runtime_error`. Failures of that hook
    /// are only logged.
    pub(crate) fn report_internal(&self, error: &InternalRuntimeError) {
        let mut reporter = self.reporter.borrow_mut();
        match panic::guard(|| reporter.on_internal_runtime_error(&self.options, error)) {
            Ok(Ok(())) => {}
            Ok(Err(nested)) => {
                tracing::error!(
                    error = %nested,
                    "reporter could not report an internal runtime error"
                );
            }
            Err((message, _)) => {
                tracing::error!(%message, "reporter panicked reporting an internal runtime error");
            }
        }
    }
}

impl fmt::Debug for RuntimeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("options", &self.options)
            .field("reaping", &self._reaping.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{Event, RecordingReporter};

    #[test]
    fn test_defaults() {
        let options = RuntimeOptions::default();
        assert!(!options.immediate);
        assert_eq!(options.glob_pattern, "**/test*");
        assert_eq!(options.teardown_policy, TeardownPolicy::SkipOnAbort);
    }

    #[test]
    fn test_yaml_keeps_defaults_for_missing_keys() {
        let options: RuntimeOptions =
            serde_yaml::from_str("immediate: true\nteardown_policy: always\n").unwrap();
        assert!(options.immediate);
        assert_eq!(options.teardown_policy, TeardownPolicy::Always);
        assert_eq!(options.glob_pattern, DEFAULT_GLOB);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<RuntimeOptions>("immediately: true\n").is_err());
    }

    #[test]
    fn test_failing_hook_becomes_internal_error() {
        let mut reporter = RecordingReporter::new().failing_on("on_start");
        let context = RuntimeContext::new(&mut reporter, RuntimeOptions::default());
        let error = context
            .notify("on_start", |r| r.on_start())
            .unwrap_err();
        assert_eq!(error.during, "on_start");
        drop(context);
        assert!(matches!(
            reporter.events.last(),
            Some(Event::InternalRuntimeError(during)) if during == "on_start"
        ));
    }

    #[derive(Default)]
    struct PanickingReporter {
        internal: Vec<InternalRuntimeError>,
    }

    impl Reporter for PanickingReporter {
        fn on_start(&mut self) -> Result<(), ReporterError> {
            panic!("reporter bug in on_start");
        }

        fn on_internal_runtime_error(
            &mut self,
            _options: &RuntimeOptions,
            error: &InternalRuntimeError,
        ) -> Result<(), ReporterError> {
            self.internal.push(error.clone());
            Ok(())
        }
    }

    #[test]
    fn test_panicking_hook_becomes_internal_error() {
        let mut reporter = PanickingReporter::default();
        let context = RuntimeContext::new(&mut reporter, RuntimeOptions::default());
        let error = context.notify("on_start", |r| r.on_start()).unwrap_err();
        drop(context);
        assert_eq!(error.message, "panicked: reporter bug in on_start");
        assert_eq!(reporter.internal, vec![error]);
    }

    #[test]
    fn test_reaping_follows_options() {
        let mut reporter = RecordingReporter::new();
        let context =
            RuntimeContext::new(&mut reporter, RuntimeOptions::default().reap_warnings(true));
        tracing::warn!("heads up");
        assert_eq!(context.warnings().len(), 1);
        assert_eq!(context.take_warnings()[0].message, "heads up");
        assert!(context.warnings().is_empty());
    }
}
