//! Capture of warnings emitted while a run is in progress.
//!
//! Warnings are `tracing` events at WARN level. While reaping is active the
//! reaper's subscriber is the thread's default, so it sees every warning the
//! run emits, including those from discovery.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub target: String,
    pub message: String,
    pub fields: Vec<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)?;
        if !self.fields.is_empty() {
            write!(f, " ({})", self.fields.join(", "))?;
        }
        Ok(())
    }
}

/// Collects warnings for the lifetime of one run.
#[derive(Debug, Clone, Default)]
pub struct WarningReaper {
    sink: Arc<Mutex<Vec<Warning>>>,
}

/// Keeps reaping active on the current thread until dropped.
pub struct ReapingGuard {
    _default: DefaultGuard,
}

impl fmt::Debug for ReapingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReapingGuard")
    }
}

impl WarningReaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording; stops when the returned guard is dropped.
    pub fn start(&self) -> ReapingGuard {
        let layer = ReaperLayer {
            sink: Arc::clone(&self.sink),
        };
        let subscriber = Registry::default().with(layer);
        ReapingGuard {
            _default: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn snapshot(&self) -> Vec<Warning> {
        match self.sink.lock() {
            Ok(warnings) => warnings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<Warning> {
        match self.sink.lock() {
            Ok(mut warnings) => std::mem::take(&mut *warnings),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

struct ReaperLayer {
    sink: Arc<Mutex<Vec<Warning>>>,
}

impl<S: Subscriber> Layer<S> for ReaperLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::WARN {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let warning = Warning {
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
        };
        if let Ok(mut warnings) = self.sink.lock() {
            warnings.push(warning);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaps_only_warnings_while_active() {
        let reaper = WarningReaper::new();
        {
            let _guard = reaper.start();
            tracing::warn!(path = "a/__init__.py", "skipping dunder file");
            tracing::info!("not a warning");
        }
        tracing::warn!("after the guard");
        let warnings = reaper.take();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "skipping dunder file");
        assert_eq!(warnings[0].fields, vec!["path=a/__init__.py".to_string()]);
        assert!(reaper.take().is_empty());
    }

    #[test]
    fn test_display() {
        let warning = Warning {
            target: "verity::loader".into(),
            message: "skipped".into(),
            fields: vec!["path=x".into()],
            file: None,
            line: None,
        };
        assert_eq!(warning.to_string(), "verity::loader: skipped (path=x)");
    }
}
