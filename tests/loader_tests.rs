use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use verity::errors::VerityError;
use verity::loader::{FsModuleLoader, ModuleLoader, ModuleRegistry};
use verity::object::{FunctionDef, Module};
use verity::runtime::DEFAULT_GLOB;

const PASSING: &str = "functions:\n  - name: test_ok\n";

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn names(dir: &Path, files: Vec<PathBuf>) -> Vec<String> {
    files
        .into_iter()
        .map(|path| {
            path.strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn default_glob_finds_test_files_in_sorted_order() {
    let dir = tree(&[
        ("test_b.yaml", PASSING),
        ("test_a.yaml", PASSING),
        ("helpers.yaml", PASSING),
        ("sub/test_c.yml", PASSING),
    ]);
    let loader = FsModuleLoader::default();
    let found = loader
        .discover(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap();
    assert_eq!(names(dir.path(), found), ["sub/test_c.yml", "test_a.yaml", "test_b.yaml"]);
}

#[test]
fn excludes_directories_and_dunder_files_are_skipped() {
    let dir = tree(&[
        ("test_keep.yaml", PASSING),
        ("test_skip.yaml", PASSING),
        ("__init__.yaml", PASSING),
        ("data.yaml/notes.txt", "not yaml"),
    ]);
    let loader = FsModuleLoader::default();
    let found = loader
        .discover(&[dir.path().to_path_buf()], "*.yaml", &["*skip*".to_string()])
        .unwrap();
    assert_eq!(names(dir.path(), found), ["test_keep.yaml"]);
}

#[test]
fn same_file_under_two_roots_is_loaded_once() {
    let dir = tree(&[("test_once.yaml", PASSING)]);
    let root = dir.path().to_path_buf();
    let modules = FsModuleLoader::default()
        .load(&[root.clone(), root], DEFAULT_GLOB, &[])
        .unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "test_once");
}

#[cfg(unix)]
#[test]
fn broken_symlinks_are_skipped() {
    let dir = tree(&[("test_real.yaml", PASSING)]);
    let (target, link) = (dir.path().join("missing.yaml"), dir.path().join("test_dangling.yaml"));
    std::os::unix::fs::symlink(target, link).unwrap();
    let found = FsModuleLoader::default()
        .discover(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap();
    assert_eq!(names(dir.path(), found), ["test_real.yaml"]);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_skipped() {
    let dir = tree(&[("test_real.yaml", PASSING), ("data/test_inner.yaml", PASSING)]);
    std::os::unix::fs::symlink(dir.path().join("data"), dir.path().join("testdata")).unwrap();
    let modules = FsModuleLoader::default()
        .load(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap();
    let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["test_inner", "test_real"]);
}

#[test]
fn missing_root_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let error = FsModuleLoader::default()
        .load(&[dir.path().join("nowhere")], DEFAULT_GLOB, &[])
        .unwrap_err();
    assert!(matches!(error, VerityError::Io { .. }));
}

#[test]
fn non_yaml_files_resolve_through_the_registry() {
    let dir = tree(&[("test_native.rs", ""), ("test_doc.yaml", PASSING)]);
    let registry = ModuleRegistry::new().register("test_native", || {
        Module::new("test_native").function(FunctionDef::new("test_native_ok", || Ok(())))
    });
    let modules = FsModuleLoader::new(registry)
        .load(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap();
    let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["test_doc", "test_native"]);
    assert_eq!(modules[1].functions().next().unwrap().name, "test_native_ok");
}

#[test]
fn unregistered_module_fails_the_whole_load() {
    let dir = tree(&[("test_a.yaml", PASSING), ("test_unknown.rs", "")]);
    let error = FsModuleLoader::default()
        .load(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap_err();
    match error {
        VerityError::ModuleNotFound { name, .. } => assert_eq!(name, "test_unknown"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn malformed_yaml_fails_the_whole_load() {
    let dir = tree(&[("test_a.yaml", PASSING), ("test_b.yaml", "functions: [unclosed")]);
    let error = FsModuleLoader::default()
        .load(&[dir.path().to_path_buf()], DEFAULT_GLOB, &[])
        .unwrap_err();
    assert!(matches!(error, VerityError::Yaml { .. }));
}

#[test]
fn regex_characters_in_globs_are_literal() {
    let dir = tree(&[("test[1].yaml", PASSING), ("test1.yaml", PASSING)]);
    let found = FsModuleLoader::default()
        .discover(&[dir.path().to_path_buf()], "test[1].yaml", &[])
        .unwrap();
    assert_eq!(names(dir.path(), found), ["test[1].yaml"]);
}
