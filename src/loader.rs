//! Module discovery on the filesystem.
//!
//! The runtime only consumes the output of a [`ModuleLoader`]: the modules
//! found under a set of paths. [`FsModuleLoader`] walks the paths, filters by
//! glob and excludes, then loads YAML modules from disk and everything else
//! from the in-process [`ModuleRegistry`].

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::VerityError;
use crate::object::Module;

mod glob;
mod registry;
pub mod yaml;

pub use glob::GlobPattern;
pub use registry::ModuleRegistry;

/// Produces the modules a run should execute.
pub trait ModuleLoader {
    /// Loads every module under `paths` matching `glob` and none of
    /// `excludes`. A file that matches but fails to load fails the call.
    fn load(
        &self,
        paths: &[PathBuf],
        glob: &str,
        excludes: &[String],
    ) -> Result<Vec<Module>, VerityError>;
}

// ============================================================================
// FILESYSTEM LOADER
// ============================================================================

#[derive(Debug, Default)]
pub struct FsModuleLoader {
    registry: ModuleRegistry,
}

impl FsModuleLoader {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Lists the files a load would consider, sorted per root.
    pub fn discover(
        &self,
        paths: &[PathBuf],
        glob: &str,
        excludes: &[String],
    ) -> Result<Vec<PathBuf>, VerityError> {
        let glob = GlobPattern::new(glob)?;
        let excludes = excludes
            .iter()
            .map(|pattern| GlobPattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        for root in paths {
            if std::fs::symlink_metadata(root).is_err() {
                return Err(VerityError::Io {
                    path: root.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "path does not exist",
                    ),
                });
            }
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.map_err(|source| VerityError::Walk {
                    path: root.clone(),
                    source,
                })?;
                let path = entry.path();
                if !glob.matches(path) {
                    continue;
                }
                if excludes.iter().any(|exclude| exclude.matches(path)) {
                    tracing::debug!(path = %path.display(), "excluded");
                    continue;
                }
                let linked_dir = entry.path_is_symlink()
                    && std::fs::metadata(path).is_ok_and(|meta| meta.is_dir());
                if entry.file_type().is_dir() || linked_dir {
                    tracing::warn!(path = %path.display(), "skipping directory");
                    continue;
                }
                if entry.path_is_symlink() && std::fs::metadata(path).is_err() {
                    tracing::warn!(path = %path.display(), "skipping broken symlink");
                    continue;
                }
                if is_dunder(path) {
                    tracing::warn!(path = %path.display(), "skipping dunder file");
                    continue;
                }
                if !files.iter().any(|known| known == path) {
                    files.push(path.to_path_buf());
                }
            }
        }
        tracing::debug!(count = files.len(), "discovered candidate files");
        Ok(files)
    }

    fn load_file(&self, path: &Path) -> Result<Module, VerityError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if matches!(extension, "yaml" | "yml") {
            return yaml::load_module(path);
        }
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.registry.resolve(&stem, path)
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(
        &self,
        paths: &[PathBuf],
        glob: &str,
        excludes: &[String],
    ) -> Result<Vec<Module>, VerityError> {
        self.discover(paths, glob, excludes)?
            .iter()
            .map(|path| self.load_file(path))
            .collect()
    }
}

fn is_dunder(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| {
            let stem = stem.to_string_lossy();
            stem.len() > 4 && stem.starts_with("__") && stem.ends_with("__")
        })
        .unwrap_or(false)
}

// ============================================================================
// STATIC LOADER
// ============================================================================

/// Hands out a fixed set of modules regardless of paths. Useful when test
/// code builds its modules directly.
#[derive(Debug, Default, Clone)]
pub struct StaticLoader {
    modules: Vec<Module>,
}

impl StaticLoader {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    pub fn with(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }
}

impl ModuleLoader for StaticLoader {
    fn load(
        &self,
        _paths: &[PathBuf],
        _glob: &str,
        _excludes: &[String],
    ) -> Result<Vec<Module>, VerityError> {
        Ok(self.modules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dunder_detection() {
        assert!(is_dunder(Path::new("pkg/__init__.py")));
        assert!(is_dunder(Path::new("__main__.yaml")));
        assert!(!is_dunder(Path::new("____")));
        assert!(!is_dunder(Path::new("test__x__.yaml")));
    }

    #[test]
    fn test_static_loader_ignores_paths() {
        let loader = StaticLoader::default().with(Module::new("suite"));
        let modules = loader.load(&[], "**/test*", &[]).unwrap();
        assert_eq!(modules.len(), 1);
    }
}
