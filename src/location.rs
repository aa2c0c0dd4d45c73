//! Human-readable identity of runnable objects.
//!
//! A [`Location`] is resolved once per runnable at discovery time from the
//! metadata declared in the object graph and never changes afterwards.

use std::fmt;

use crate::errors::{SourcePosition, VerityError};
use crate::object::{ClassDef, ClassKind, FunctionDef, MethodDef, ModuleIndex, Object};

/// What sort of runnable a location describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnableKind {
    Function,
    Method,
    Class,
    UnittestCase,
    Instance,
}

/// Identity and source position of a declared runnable.
pub trait Describable {
    fn name(&self) -> &str;
    fn doc(&self) -> Option<&str>;
    fn module(&self) -> &str;
    fn source_position(&self) -> &SourcePosition;
    fn kind(&self) -> RunnableKind;

    /// The trimmed doc, or the name when there is no usable doc.
    fn description(&self) -> String {
        match self.doc().map(str::trim) {
            Some(doc) if !doc.is_empty() => doc.to_string(),
            _ => self.name().to_string(),
        }
    }
}

impl Describable for FunctionDef {
    fn name(&self) -> &str {
        &self.name
    }
    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
    fn module(&self) -> &str {
        &self.module
    }
    fn source_position(&self) -> &SourcePosition {
        &self.position
    }
    fn kind(&self) -> RunnableKind {
        RunnableKind::Function
    }
}

impl Describable for MethodDef {
    fn name(&self) -> &str {
        &self.name
    }
    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
    fn module(&self) -> &str {
        &self.module
    }
    fn source_position(&self) -> &SourcePosition {
        &self.position
    }
    fn kind(&self) -> RunnableKind {
        RunnableKind::Method
    }
}

impl Describable for ClassDef {
    fn name(&self) -> &str {
        &self.name
    }
    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
    fn module(&self) -> &str {
        &self.module
    }
    fn source_position(&self) -> &SourcePosition {
        &self.position
    }
    fn kind(&self) -> RunnableKind {
        match self.kind {
            ClassKind::Plain => RunnableKind::Class,
            ClassKind::TestCase => RunnableKind::UnittestCase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub filename: String,
    pub line: u32,
    pub kind: RunnableKind,
    pub description: String,
    pub ancestral_description: String,
}

impl Location {
    /// Resolves `object` to a location.
    ///
    /// Plain values have no location. The object's module may not be in
    /// `index` yet; the module name then stands in for its description.
    pub fn resolve(object: Object<'_>, index: &ModuleIndex) -> Result<Location, VerityError> {
        let location = match object {
            Object::Function(function) => {
                Self::from_describable(function, module_description(function.module(), index))
            }
            Object::Method { method, .. } => {
                Self::from_describable(method, module_description(method.module(), index))
            }
            Object::Class(class) => {
                Self::from_describable(class, module_description(class.module(), index))
            }
            Object::Instance(class) => Location {
                kind: RunnableKind::Instance,
                ..Self::from_describable(class, module_description(class.module(), index))
            },
            Object::Value(value) => return Err(VerityError::unsupported(value)),
        };
        tracing::trace!(name = %location.name, kind = ?location.kind, "resolved location");
        Ok(location)
    }

    fn from_describable(object: &dyn Describable, ancestral_description: String) -> Location {
        let position = object.source_position();
        Location {
            name: object.name().to_string(),
            filename: position.file.clone(),
            line: position.line,
            kind: object.kind(),
            description: object.description(),
            ancestral_description,
        }
    }
}

fn module_description(module: &str, index: &ModuleIndex) -> String {
    match index.get(module) {
        Some(info) => match info.doc.as_deref().map(str::trim) {
            Some(doc) if !doc.is_empty() => doc.to_string(),
            _ => info.name.clone(),
        },
        None => module.to_string(),
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.description, self.filename, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Module;
    use crate::value::Value;

    #[derive(Default)]
    struct Empty;

    fn sample() -> Module {
        Module::new("calculator")
            .doc("  Calculator features  ")
            .function(FunctionDef::new("test_adds", || Ok(())).doc("adds numbers"))
            .function(FunctionDef::new("test_plain", || Ok(())))
            .class(
                ClassDef::build::<Empty>("Outer")
                    .test_case()
                    .method("test_inner", |_| Ok(()))
                    .method_doc("inner behaviour")
                    .nested(ClassDef::build::<Empty>("Inner").doc("nested doc").finish()),
            )
    }

    #[test]
    fn test_function_prefers_doc() {
        let module = sample();
        let index: ModuleIndex = std::iter::once(&module).collect();
        let function = module.functions().next().unwrap();
        let location = Location::resolve(Object::Function(function), &index).unwrap();
        assert_eq!(location.name, "test_adds");
        assert_eq!(location.kind, RunnableKind::Function);
        assert_eq!(location.description, "adds numbers");
        assert_eq!(location.ancestral_description, "Calculator features");
        assert!(location.filename.ends_with("location.rs"));
        assert!(location.line > 0);
    }

    #[test]
    fn test_function_without_doc_uses_name() {
        let module = sample();
        let index: ModuleIndex = std::iter::once(&module).collect();
        let function = module.functions().nth(1).unwrap();
        let location = Location::resolve(Object::Function(function), &index).unwrap();
        assert_eq!(location.description, "test_plain");
    }

    #[test]
    fn test_nested_class_ancestry_is_the_module() {
        let module = sample();
        let index: ModuleIndex = std::iter::once(&module).collect();
        let outer = module.classes().next().unwrap();
        let location = Location::resolve(Object::Class(&outer.nested[0]), &index).unwrap();
        assert_eq!(location.description, "nested doc");
        assert_eq!(location.ancestral_description, "Calculator features");
        assert_eq!(location.kind, RunnableKind::Class);
    }

    #[test]
    fn test_test_case_and_instance_kinds() {
        let module = sample();
        let index = ModuleIndex::new();
        let outer = module.classes().next().unwrap();
        let class = Location::resolve(Object::Class(outer), &index).unwrap();
        assert_eq!(class.kind, RunnableKind::UnittestCase);
        let instance = Location::resolve(Object::Instance(outer), &index).unwrap();
        assert_eq!(instance.kind, RunnableKind::Instance);
    }

    #[test]
    fn test_method_location() {
        let module = sample();
        let index: ModuleIndex = std::iter::once(&module).collect();
        let class = module.classes().next().unwrap();
        let location = Location::resolve(
            Object::Method {
                class,
                method: &class.methods[0],
            },
            &index,
        )
        .unwrap();
        assert_eq!(location.kind, RunnableKind::Method);
        assert_eq!(location.description, "inner behaviour");
        // the enclosing module, not the class
        assert_eq!(location.ancestral_description, "Calculator features");
    }

    #[test]
    fn test_unregistered_module_is_tolerated() {
        let module = sample();
        let function = module.functions().next().unwrap();
        let location = Location::resolve(Object::Function(function), &ModuleIndex::new()).unwrap();
        assert_eq!(location.ancestral_description, "calculator");
    }

    #[test]
    fn test_values_are_unsupported() {
        let value = Value::from(vec![1, 2]);
        let error = Location::resolve(Object::Value(&value), &ModuleIndex::new()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "cannot resolve a location for [1, 2] of type list"
        );
    }

    #[test]
    fn test_display() {
        let location = Location {
            name: "test_x".into(),
            filename: "suite.rs".into(),
            line: 7,
            kind: RunnableKind::Function,
            description: "does x".into(),
            ancestral_description: "suite".into(),
        };
        assert_eq!(location.to_string(), "does x (suite.rs:7)");
    }
}
