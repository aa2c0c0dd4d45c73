use std::fmt;
use std::rc::Rc;

use crate::errors::{SourcePosition, UnitResult};
use crate::runtime::RuntimeContext;

/// A callable taking no arguments, or one receiving the runtime context.
#[derive(Clone)]
pub enum Body {
    Plain(Rc<dyn Fn() -> UnitResult>),
    WithContext(Rc<dyn Fn(&RuntimeContext<'_>) -> UnitResult>),
}

impl Body {
    pub fn call(&self, context: &RuntimeContext<'_>) -> UnitResult {
        match self {
            Body::Plain(f) => f(),
            Body::WithContext(f) => f(context),
        }
    }

    /// Number of parameters the callable declares.
    pub fn arity(&self) -> usize {
        match self {
            Body::Plain(_) => 0,
            Body::WithContext(_) => 1,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Plain(_) => f.write_str("Body::Plain"),
            Body::WithContext(_) => f.write_str("Body::WithContext"),
        }
    }
}

/// A free-standing test function.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub doc: Option<String>,
    pub module: String,
    pub position: SourcePosition,
    pub body: Body,
}

impl FunctionDef {
    /// Registers a zero-argument function; the caller's position is recorded.
    #[track_caller]
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> UnitResult + 'static,
    {
        Self::from_body(name, Body::Plain(Rc::new(f)), SourcePosition::caller())
    }

    /// Registers a function that receives the runtime context.
    #[track_caller]
    pub fn with_context<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RuntimeContext<'_>) -> UnitResult + 'static,
    {
        Self::from_body(name, Body::WithContext(Rc::new(f)), SourcePosition::caller())
    }

    pub fn from_body(name: impl Into<String>, body: Body, position: SourcePosition) -> Self {
        Self {
            name: name.into(),
            doc: None,
            module: String::new(),
            position,
            body,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn at(mut self, position: SourcePosition) -> Self {
        self.position = position;
        self
    }
}
