use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::errors::VerityError;
use crate::object::Module;

type ModuleFactory = Box<dyn Fn() -> Module>;

/// In-process modules, keyed by the file stem that selects them.
///
/// A Rust test file cannot be loaded at run time, so test code registers a
/// factory per module and discovery resolves matching files against it.
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Module + 'static,
    {
        self.insert(name, factory);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Module + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Builds the module registered under `name`, which `path` asked for.
    pub fn resolve(&self, name: &str, path: &Path) -> Result<Module, VerityError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| VerityError::ModuleNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            })?;
        Ok(factory())
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let registry = ModuleRegistry::new().register("test_math", || Module::new("math"));
        let module = registry.resolve("test_math", Path::new("t/test_math.rs")).unwrap();
        assert_eq!(module.name, "math");
        assert!(registry.contains("test_math"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["test_math"]);
    }

    #[test]
    fn test_miss_names_module_and_path() {
        let error = ModuleRegistry::new()
            .resolve("test_gone", Path::new("t/test_gone.rs"))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "no module named 'test_gone' is registered (needed by t/test_gone.rs)"
        );
    }
}
