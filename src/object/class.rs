use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::errors::{SourcePosition, UnitError, UnitResult};
use crate::runtime::RuntimeContext;
use crate::value::Value;

use super::function::Body;

type MethodFn = Rc<dyn Fn(&mut dyn Any) -> UnitResult>;
type ContextMethodFn = Rc<dyn Fn(&mut dyn Any, &RuntimeContext<'_>) -> UnitResult>;

/// Whether a class is a plain grouping or a test-case class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    #[default]
    Plain,
    TestCase,
}

/// How instances of a class come to be.
#[derive(Clone)]
pub enum Constructor {
    /// Builds the default instance state.
    Default(Rc<dyn Fn() -> Box<dyn Any>>),
    /// Construction needs `arity` arguments the runtime cannot supply.
    Parameterized { arity: usize },
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constructor::Default(_) => f.write_str("Constructor::Default"),
            Constructor::Parameterized { arity } => {
                write!(f, "Constructor::Parameterized({arity})")
            }
        }
    }
}

#[derive(Clone)]
pub enum MethodBody {
    Plain(MethodFn),
    WithContext(ContextMethodFn),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Plain(_) => f.write_str("MethodBody::Plain"),
            MethodBody::WithContext(_) => f.write_str("MethodBody::WithContext"),
        }
    }
}

/// A method declared on a class. Receives the instance state mutably.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub doc: Option<String>,
    pub module: String,
    pub position: SourcePosition,
    pub body: MethodBody,
}

/// A class: instance state, methods, nested classes and data attributes.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub doc: Option<String>,
    pub module: String,
    pub position: SourcePosition,
    pub kind: ClassKind,
    pub constructor: Constructor,
    pub methods: Vec<MethodDef>,
    pub nested: Vec<ClassDef>,
    pub attributes: Vec<(String, Value)>,
}

impl ClassDef {
    /// Starts a class whose instances are `T::default()`.
    #[track_caller]
    pub fn build<T: Default + 'static>(name: impl Into<String>) -> ClassBuilder<T> {
        let constructor = Constructor::Default(Rc::new(|| Box::new(T::default()) as Box<dyn Any>));
        ClassBuilder::new(name.into(), constructor, SourcePosition::caller())
    }

    /// Starts a class whose construction needs `arity` arguments.
    ///
    /// Such a class is never instantiated by the runtime, so its arrangement
    /// is not runnable.
    #[track_caller]
    pub fn requiring<T: 'static>(name: impl Into<String>, arity: usize) -> ClassBuilder<T> {
        ClassBuilder::new(
            name.into(),
            Constructor::Parameterized { arity },
            SourcePosition::caller(),
        )
    }

    /// Constructor parameters, not counting the receiver.
    pub fn arity(&self) -> usize {
        match self.constructor {
            Constructor::Default(_) => 0,
            Constructor::Parameterized { arity } => arity,
        }
    }

    pub fn instantiate(&self) -> Option<Instance> {
        match &self.constructor {
            Constructor::Default(make) => Some(Instance {
                class_name: self.name.clone(),
                state: Rc::new(RefCell::new(make())),
            }),
            Constructor::Parameterized { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn set_module(&mut self, module: &str) {
        self.module = module.to_string();
        for method in &mut self.methods {
            method.module = module.to_string();
        }
        for nested in &mut self.nested {
            nested.set_module(module);
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Declares a [`ClassDef`] whose methods operate on `T`.
pub struct ClassBuilder<T> {
    class: ClassDef,
    _state: PhantomData<fn(&mut T)>,
}

impl<T: 'static> ClassBuilder<T> {
    fn new(name: String, constructor: Constructor, position: SourcePosition) -> Self {
        Self {
            class: ClassDef {
                name,
                doc: None,
                module: String::new(),
                position,
                kind: ClassKind::Plain,
                constructor,
                methods: Vec::new(),
                nested: Vec::new(),
                attributes: Vec::new(),
            },
            _state: PhantomData,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.class.doc = Some(doc.into());
        self
    }

    pub fn test_case(mut self) -> Self {
        self.class.kind = ClassKind::TestCase;
        self
    }

    pub fn at(mut self, position: SourcePosition) -> Self {
        self.class.position = position;
        self
    }

    #[track_caller]
    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut T) -> UnitResult + 'static,
    {
        let class_name = self.class.name.clone();
        let body = MethodBody::Plain(Rc::new(move |state: &mut dyn Any| {
            f(downcast::<T>(state, &class_name)?)
        }));
        self.push(name.into(), None, body, SourcePosition::caller())
    }

    #[track_caller]
    pub fn method_with_context<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut T, &RuntimeContext<'_>) -> UnitResult + 'static,
    {
        let class_name = self.class.name.clone();
        let body = MethodBody::WithContext(Rc::new(
            move |state: &mut dyn Any, context: &RuntimeContext<'_>| {
                f(downcast::<T>(state, &class_name)?, context)
            },
        ));
        self.push(name.into(), None, body, SourcePosition::caller())
    }

    /// Attaches a doc to the most recently declared method.
    pub fn method_doc(mut self, doc: impl Into<String>) -> Self {
        if let Some(method) = self.class.methods.last_mut() {
            method.doc = Some(doc.into());
        }
        self
    }

    /// Adds an already-erased method, keeping its own position.
    pub fn method_def(mut self, method: MethodDef) -> Self {
        self.class.methods.push(method);
        self
    }

    pub fn nested(mut self, class: ClassDef) -> Self {
        self.class.nested.push(class);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.class.attributes.push((name.into(), value.into()));
        self
    }

    pub fn finish(self) -> ClassDef {
        self.class
    }

    fn push(
        mut self,
        name: String,
        doc: Option<String>,
        body: MethodBody,
        position: SourcePosition,
    ) -> Self {
        self.class.methods.push(MethodDef {
            name,
            doc,
            module: String::new(),
            position,
            body,
        });
        self
    }
}

impl<T: 'static> From<ClassBuilder<T>> for ClassDef {
    fn from(builder: ClassBuilder<T>) -> Self {
        builder.finish()
    }
}

fn downcast<'s, T: 'static>(state: &'s mut dyn Any, class: &str) -> Result<&'s mut T, UnitError> {
    state.downcast_mut::<T>().ok_or_else(|| {
        UnitError::msg(format!(
            "instance state of {class} is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

// ============================================================================
// INSTANCES
// ============================================================================

/// One instance of a class, shared by every method bound to it.
#[derive(Clone)]
pub struct Instance {
    pub class_name: String,
    state: Rc<RefCell<Box<dyn Any>>>,
}

impl Instance {
    /// Binds `method` to this instance, yielding a callable body.
    pub fn bind(&self, method: &MethodDef) -> Body {
        let state = Rc::clone(&self.state);
        match &method.body {
            MethodBody::Plain(f) => {
                let f = Rc::clone(f);
                Body::Plain(Rc::new(move || {
                    let mut state = state.borrow_mut();
                    f(&mut **state)
                }))
            }
            MethodBody::WithContext(f) => {
                let f = Rc::clone(f);
                Body::WithContext(Rc::new(move |context: &RuntimeContext<'_>| {
                    let mut state = state.borrow_mut();
                    f(&mut **state, context)
                }))
            }
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class_name)
    }
}
