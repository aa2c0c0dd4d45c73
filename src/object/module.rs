use std::path::PathBuf;

use crate::value::Value;

use super::class::ClassDef;
use super::function::FunctionDef;

/// One declared member of a module, in declaration order.
#[derive(Debug, Clone)]
pub enum Member {
    Function(FunctionDef),
    Class(ClassDef),
    Value { name: String, value: Value },
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Function(function) => &function.name,
            Member::Class(class) => &class.name,
            Member::Value { name, .. } => name,
        }
    }
}

/// A loaded test module.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub file: PathBuf,
    pub doc: Option<String>,
    pub members: Vec<Member>,
}

impl Module {
    /// Creates an empty module; its file defaults to the caller's source file.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: PathBuf::from(std::panic::Location::caller().file()),
            doc: None,
            members: Vec::new(),
        }
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn function(mut self, mut function: FunctionDef) -> Self {
        function.module = self.name.clone();
        self.members.push(Member::Function(function));
        self
    }

    pub fn class(mut self, class: impl Into<ClassDef>) -> Self {
        let mut class = class.into();
        class.set_module(&self.name);
        self.members.push(Member::Class(class));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push(Member::Value {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.members.iter().filter_map(|member| match member {
            Member::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.members.iter().filter_map(|member| match member {
            Member::Class(class) => Some(class),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_keep_declaration_order() {
        let module = Module::new("suite")
            .value("answer", 42)
            .function(FunctionDef::new("test_b", || Ok(())))
            .function(FunctionDef::new("test_a", || Ok(())));
        let names: Vec<_> = module.members.iter().map(Member::name).collect();
        assert_eq!(names, ["answer", "test_b", "test_a"]);
        assert_eq!(module.functions().count(), 2);
        assert!(module.functions().all(|f| f.module == "suite"));
    }

    #[test]
    fn test_file_defaults_to_caller() {
        let module = Module::new("suite");
        assert!(module.file.ends_with("module.rs"));
    }
}
