//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use verity::errors::{AssertionFailure, UnitResult};
use verity::object::{FunctionDef, Module};
use verity::reporter::{Event, RecordingReporter};

pub fn passing(name: &str) -> FunctionDef {
    FunctionDef::new(name, || Ok(()))
}

#[track_caller]
pub fn failing(name: &str) -> FunctionDef {
    FunctionDef::new(name, || Err(AssertionFailure::new("expected to fail").into()))
}

/// A function that flips `flag` when it runs.
pub fn flagging(name: &str, flag: &Rc<Cell<bool>>) -> FunctionDef {
    let flag = Rc::clone(flag);
    FunctionDef::new(name, move || -> UnitResult {
        flag.set(true);
        Ok(())
    })
}

pub fn module(name: &str, functions: Vec<FunctionDef>) -> Module {
    functions
        .into_iter()
        .fold(Module::new(name), |module, function| module.function(function))
}

pub fn failures(reporter: &RecordingReporter) -> Vec<String> {
    reporter
        .events
        .iter()
        .filter_map(|event| match event {
            Event::Failure(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

pub fn mentions(reporter: &RecordingReporter, container: &str) -> bool {
    reporter.events.iter().any(|event| match event {
        Event::Success(name) | Event::Failure(name) | Event::Error(name) => name == container,
        Event::Scenario(name) => name == container,
        _ => false,
    })
}
