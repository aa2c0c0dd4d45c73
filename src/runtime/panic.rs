//! Turning panics inside test bodies into results.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::errors::{AssertionFailure, SourcePosition, UnitError, UnitResult};

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static CAPTURING: Cell<usize> = const { Cell::new(0) };
    static LAST_POSITION: RefCell<Option<SourcePosition>> = const { RefCell::new(None) };
}

/// Installs the process-wide panic hook once.
///
/// While a [`PanicCapture`] is alive on the current thread the hook records
/// where the panic happened and prints nothing; otherwise it defers to the
/// hook that was installed before. [`catch`] and [`guard`] hold a capture only
/// around the closure they run.
fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let capturing = CAPTURING.try_with(|c| c.get() > 0).unwrap_or(false);
            if capturing {
                let position = info.location().map(SourcePosition::from);
                let _ = LAST_POSITION.try_with(|last| *last.borrow_mut() = position);
            } else {
                previous(info);
            }
        }));
    });
}

/// Scope during which panics on this thread are captured silently.
#[derive(Debug)]
pub struct PanicCapture {
    _private: (),
}

impl PanicCapture {
    pub fn new() -> Self {
        install_hook();
        CAPTURING.with(|c| c.set(c.get() + 1));
        Self { _private: () }
    }
}

impl Default for PanicCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PanicCapture {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(c.get().saturating_sub(1)));
    }
}

/// Runs `f`, converting a panic into a [`UnitError`].
///
/// Panics from `assert!`-style macros become assertion failures; any other
/// panic is an error.
pub fn catch<F>(f: F) -> UnitResult
where
    F: FnOnce() -> UnitResult,
{
    match guard(f) {
        Ok(result) => result,
        Err((message, position)) => {
            tracing::debug!(%message, "test body panicked");
            if message.starts_with("assertion") {
                Err(AssertionFailure::at(message, position).into())
            } else {
                Err(UnitError::Panic { message, position })
            }
        }
    }
}

/// Runs `f` with panics captured, returning the panic message and position
/// instead of unwinding further.
pub fn guard<F, R>(f: F) -> Result<R, (String, Option<SourcePosition>)>
where
    F: FnOnce() -> R,
{
    let _capture = PanicCapture::new();
    LAST_POSITION.with(|last| last.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload_message(payload.as_ref());
        let position = LAST_POSITION.with(|last| last.borrow_mut().take());
        (message, position)
    })
}

#[cfg(test)]
fn is_capturing() -> bool {
    CAPTURING.with(|c| c.get() > 0)
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_panics_are_failures() {
        let result = catch(|| {
            assert_eq!(1 + 1, 3);
            Ok(())
        });
        match result {
            Err(UnitError::Assertion(failure)) => {
                assert!(failure.message.starts_with("assertion"));
                let position = failure.position.expect("hook records position");
                assert!(position.file.ends_with("panic.rs"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_other_panics_are_errors() {
        let result = catch(|| panic!("boom"));
        match result {
            Err(UnitError::Panic { message, .. }) => assert_eq!(message, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_returned_errors_pass_through() {
        let result = catch(|| Err(UnitError::msg("plain")));
        assert_eq!(result.unwrap_err().to_string(), "plain");
        assert!(catch(|| Ok(())).is_ok());
    }

    #[test]
    fn test_capture_only_lasts_for_the_call() {
        assert!(!is_capturing());
        let inside = catch(|| {
            assert!(is_capturing());
            Ok(())
        });
        assert!(inside.is_ok());
        assert!(!is_capturing());
    }

    #[test]
    fn test_guard_returns_message_and_position() {
        let (message, position) = guard(|| panic!("reporter bug")).unwrap_err();
        assert_eq!(message, "reporter bug");
        assert!(position.unwrap().file.ends_with("panic.rs"));
        assert_eq!(guard(|| 7).unwrap(), 7);
    }
}
