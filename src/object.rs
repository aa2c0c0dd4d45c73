//! The runnable object graph consumed by discovery.
//!
//! Test code registers its units explicitly: a [`Module`] owns functions,
//! classes (with methods and nested classes) and plain data attributes. The
//! runtime never reflects over Rust code; everything it knows about a unit is
//! declared here, including the source position captured at registration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::value::Value;

pub mod class;
pub mod function;
pub mod module;

pub use class::{ClassBuilder, ClassDef, ClassKind, Constructor, Instance, MethodBody, MethodDef};
pub use function::{Body, FunctionDef};
pub use module::{Member, Module};

/// Everything a location can be asked for.
#[derive(Debug, Clone, Copy)]
pub enum Object<'a> {
    Function(&'a FunctionDef),
    Method {
        class: &'a ClassDef,
        method: &'a MethodDef,
    },
    Class(&'a ClassDef),
    Instance(&'a ClassDef),
    Value(&'a Value),
}

// ============================================================================
// MODULE INDEX
// ============================================================================

/// What the runtime knows about a loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub file: PathBuf,
    pub doc: Option<String>,
}

/// Registry of modules loaded during the current run, keyed by name.
///
/// Objects refer to their module by name only. A lookup miss is normal while
/// discovery is still registering modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    modules: BTreeMap<String, ModuleInfo>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: &Module) {
        self.modules.insert(
            module.name.clone(),
            ModuleInfo {
                name: module.name.clone(),
                file: module.file.clone(),
                doc: module.doc.clone(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<'a> FromIterator<&'a Module> for ModuleIndex {
    fn from_iter<I: IntoIterator<Item = &'a Module>>(iter: I) -> Self {
        let mut index = ModuleIndex::new();
        for module in iter {
            index.register(module);
        }
        index
    }
}
