use std::fmt;

use crate::errors::{ExceptionManager, UnitResult};
use crate::location::Location;
use crate::object::Body;

use super::context::RuntimeContext;
use super::panic;

/// The scope a container was declared in. Only used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Module(String),
    Instance(String),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Module(name) => write!(f, "module {name}"),
            Owner::Instance(class) => write!(f, "<{class} instance>"),
        }
    }
}

/// A single runnable unit with its resolved location.
#[derive(Clone)]
pub struct Container {
    pub name: String,
    pub runnable: Body,
    pub location: Location,
    pub owner: Owner,
}

impl Container {
    pub fn new(name: impl Into<String>, runnable: Body, location: Location, owner: Owner) -> Self {
        Self {
            name: name.into(),
            runnable,
            location,
            owner,
        }
    }

    /// Runs the body in isolation.
    ///
    /// Panics are caught, and the error is routed through the
    /// [`ExceptionManager`] before it is returned.
    pub fn run(&self, context: &RuntimeContext<'_>) -> UnitResult {
        tracing::debug!(container = %self.name, owner = %self.owner, "running container");
        panic::catch(|| self.runnable.call(context))
            .map_err(|error| ExceptionManager::new(error).resolve())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Container {} of {}>", self.name, self.owner)
    }
}
