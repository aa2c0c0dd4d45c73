//! Declarative test modules written in YAML.
//!
//! ```yaml
//! doc: Calculator features
//! functions:
//!   - name: test_adds
//!     compare: { x: 4, y: 4 }
//! classes:
//!   - name: Calculator
//!     methods:
//!       - name: setup
//!       - name: test_rounding
//!         compare: { x: 4.242423, y: 4.24242, epsilon: 0.000005 }
//! ```
//!
//! Each step does at most one thing: compare two values, fail, error, emit a
//! warning, or look up a missing attribute. A step that does nothing passes.

use std::any::Any;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use crate::compare::assert_deep_equal;
use crate::errors::{
    AssertionFailure, AttributeError, SourcePosition, UnitError, UnitResult, VerityError,
};
use crate::object::{Body, ClassDef, FunctionDef, MethodBody, MethodDef, Module};
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleSpec {
    name: Option<String>,
    doc: Option<String>,
    #[serde(default)]
    functions: Vec<StepSpec>,
    #[serde(default)]
    classes: Vec<ClassSpec>,
    #[serde(default)]
    values: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassSpec {
    name: String,
    doc: Option<String>,
    #[serde(default)]
    test_case: bool,
    #[serde(default)]
    params: usize,
    #[serde(default)]
    methods: Vec<StepSpec>,
    #[serde(default)]
    classes: Vec<ClassSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepSpec {
    name: String,
    doc: Option<String>,
    compare: Option<CompareSpec>,
    fail: Option<String>,
    error: Option<String>,
    warn: Option<String>,
    missing_attribute: Option<MissingAttributeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompareSpec {
    x: serde_yaml::Value,
    y: serde_yaml::Value,
    epsilon: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct MissingAttributeSpec {
    #[serde(rename = "type")]
    type_name: String,
    name: String,
}

/// What a step does when run.
#[derive(Debug, Clone)]
enum Action {
    Pass,
    Compare {
        x: Value,
        y: Value,
        epsilon: Option<f64>,
    },
    Fail(String),
    Error(String),
    Warn(String),
    MissingAttribute { type_name: String, name: String },
}

impl Action {
    fn run(&self, position: &SourcePosition) -> UnitResult {
        match self {
            Action::Pass => Ok(()),
            Action::Compare { x, y, epsilon } => {
                assert_deep_equal(x, y, *epsilon).map_err(|failure| {
                    UnitError::from(AssertionFailure::at(failure.message, Some(position.clone())))
                })
            }
            Action::Fail(message) => {
                Err(AssertionFailure::at(message.clone(), Some(position.clone())).into())
            }
            Action::Error(message) => Err(UnitError::msg(message.clone())),
            Action::Warn(message) => {
                tracing::warn!(step = %position, "{message}");
                Ok(())
            }
            Action::MissingAttribute { type_name, name } => {
                Err(AttributeError::missing(type_name, name).into())
            }
        }
    }
}

impl StepSpec {
    fn action(&self, path: &Path) -> Result<Action, VerityError> {
        let mut actions = Vec::new();
        if let Some(compare) = &self.compare {
            actions.push(Action::Compare {
                x: compare.x.clone().into(),
                y: compare.y.clone().into(),
                epsilon: compare.epsilon,
            });
        }
        if let Some(message) = &self.fail {
            actions.push(Action::Fail(message.clone()));
        }
        if let Some(message) = &self.error {
            actions.push(Action::Error(message.clone()));
        }
        if let Some(message) = &self.warn {
            actions.push(Action::Warn(message.clone()));
        }
        if let Some(missing) = &self.missing_attribute {
            actions.push(Action::MissingAttribute {
                type_name: missing.type_name.clone(),
                name: missing.name.clone(),
            });
        }
        match actions.len() {
            0 => Ok(Action::Pass),
            1 => Ok(actions.remove(0)),
            _ => Err(VerityError::Load {
                path: path.to_path_buf(),
                reason: format!("step '{}' declares more than one action", self.name),
            }),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Reads a YAML module from `path`. The module is named after the file stem
/// unless the document names it.
pub fn load_module(path: &Path) -> Result<Module, VerityError> {
    let source = std::fs::read_to_string(path).map_err(|source| VerityError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_module(&source, path)
}

pub fn parse_module(source: &str, path: &Path) -> Result<Module, VerityError> {
    let spec: ModuleSpec = serde_yaml::from_str(source).map_err(|source| VerityError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = LineFinder { source, path };

    let name = match spec.name {
        Some(name) => name,
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| VerityError::Load {
                path: path.to_path_buf(),
                reason: "file has no name".to_string(),
            })?,
    };

    let mut module = Module::new(name).file(path);
    if let Some(doc) = spec.doc {
        module = module.doc(doc);
    }
    for (key, value) in spec.values {
        let key = match Value::from(key) {
            Value::Str(key) => key,
            other => other.repr(),
        };
        module = module.value(key, Value::from(value));
    }
    let mut after = 0;
    for step in &spec.functions {
        let function = build_function(step, &lines, after)?;
        after = function.position.line;
        module = module.function(function);
    }
    let mut after = 0;
    for class in &spec.classes {
        let class = build_class(class, &lines, after)?;
        after = class.position.line;
        module = module.class(class);
    }
    tracing::debug!(module = %module.name, path = %path.display(), "loaded YAML module");
    Ok(module)
}

fn build_function(
    step: &StepSpec,
    lines: &LineFinder<'_>,
    after: u32,
) -> Result<FunctionDef, VerityError> {
    let action = step.action(lines.path)?;
    let position = lines.position_of(&step.name, after);
    let body_position = position.clone();
    let body = Body::Plain(Rc::new(move || action.run(&body_position)));
    let mut function = FunctionDef::from_body(step.name.clone(), body, position);
    function.doc = step.doc.clone();
    Ok(function)
}

fn build_class(
    spec: &ClassSpec,
    lines: &LineFinder<'_>,
    after: u32,
) -> Result<ClassDef, VerityError> {
    let class_position = lines.position_of(&spec.name, after);
    let class_line = class_position.line;
    let mut builder = if spec.params > 0 {
        ClassDef::requiring::<()>(spec.name.clone(), spec.params)
    } else {
        ClassDef::build::<()>(spec.name.clone())
    }
    .at(class_position);
    if let Some(doc) = &spec.doc {
        builder = builder.doc(doc.clone());
    }
    if spec.test_case {
        builder = builder.test_case();
    }
    let mut after = class_line;
    for step in &spec.methods {
        let action = step.action(lines.path)?;
        let position = lines.position_of(&step.name, after);
        after = position.line;
        let body_position = position.clone();
        builder = builder.method_def(MethodDef {
            name: step.name.clone(),
            doc: step.doc.clone(),
            module: String::new(),
            position,
            body: MethodBody::Plain(Rc::new(move |_: &mut dyn Any| action.run(&body_position))),
        });
    }
    let mut after = class_line;
    for nested in &spec.classes {
        let nested = build_class(nested, lines, after)?;
        after = nested.position.line;
        builder = builder.nested(nested);
    }
    Ok(builder.finish())
}

/// Finds the line a named entry was declared on. serde_yaml does not keep
/// positions, so the first `name: <entry>` line below the enclosing entry or
/// the previous sibling wins.
struct LineFinder<'a> {
    source: &'a str,
    path: &'a Path,
}

impl LineFinder<'_> {
    fn position_of(&self, name: &str, after: u32) -> SourcePosition {
        let skip = after as usize;
        let line = self
            .source
            .lines()
            .skip(skip)
            .position(|line| {
                let line = line.trim_start().trim_start_matches("- ").trim();
                line.strip_prefix("name:")
                    .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'') == name)
                    .unwrap_or(false)
            })
            .map(|index| (skip + index) as u32 + 1)
            .unwrap_or(1);
        SourcePosition {
            file: self.path.display().to_string(),
            line,
            column: 1,
        }
    }
}
