//! Deep Comparison Engine
//!
//! Compares two [`Value`]s recursively and, when they differ, explains the
//! first divergence found with a path from the root (`X['a'][2]`).
//!
//! The rules are applied in this order at every level:
//!
//! 1. Mock call lists are coerced to plain lists on both sides.
//! 2. A wildcard (`Anything`) on either side is equal.
//! 3. Complex values (float, dict, list, tuple) of the same type are compared
//!    structurally.
//! 4. Two simple values (str, int, bool, bytes) are compared with `==` and
//!    explained by value.
//! 5. Values of different types are explained by type name.
//! 6. Anything else falls back to `==` and is explained without values.
//!
//! Only the first divergence is reported. For dicts an extra key in X wins
//! over an extra key in Y, which wins over value mismatches.

use std::borrow::Cow;
use std::fmt;

use crate::errors::AssertionFailure;
use crate::value::{Dict, Value};

// ============================================================================
// EXPLANATION
// ============================================================================

/// Why two values are not equal, phrased relative to the compared operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation(String);

impl Explanation {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the full assertion message: both operands in full, then the explanation.
    pub fn with_header(&self, x: &Value, y: &Value) -> String {
        format!(
            "given\nX = {}\n    and\nY = {}\n{}",
            x.repr(),
            y.repr(),
            self.0
        )
    }

    /// Converts the explanation into an assertion failure about `x` and `y`.
    #[track_caller]
    pub fn into_failure(self, x: &Value, y: &Value) -> AssertionFailure {
        AssertionFailure::new(self.with_header(x, y))
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PATH
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Key(Value),
    Index(usize),
}

/// Accessors from the root operands down to the values being compared.
#[derive(Debug, Clone, Default)]
struct KeyPath(Vec<Step>);

impl KeyPath {
    fn child(&self, step: Step) -> KeyPath {
        let mut steps = self.0.clone();
        steps.push(step);
        KeyPath(steps)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            match step {
                Step::Key(key) => write!(f, "[{}]", key.repr())?,
                Step::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// DEEP COMPARISON
// ============================================================================

/// A configured comparison of two values.
///
/// ```rust
/// use verity::compare::DeepComparison;
/// use verity::value::Value;
///
/// let x = Value::from(4.242423);
/// let y = Value::from(4.242420);
/// assert!(DeepComparison::new(&x, &y).epsilon(0.000005).compare().is_ok());
/// assert!(DeepComparison::new(&x, &y).compare().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DeepComparison<'a> {
    x: &'a Value,
    y: &'a Value,
    epsilon: Option<f64>,
}

impl<'a> DeepComparison<'a> {
    pub fn new(x: &'a Value, y: &'a Value) -> Self {
        Self {
            x,
            y,
            epsilon: None,
        }
    }

    /// Tolerance applied to float comparisons.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    pub fn with_epsilon(mut self, epsilon: Option<f64>) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Returns `Ok(())` when equal, otherwise the explanation of the first divergence.
    pub fn compare(&self) -> Result<(), Explanation> {
        self.compare_at(self.x, self.y, &KeyPath::default())
    }

    fn compare_at(&self, x: &Value, y: &Value, path: &KeyPath) -> Result<(), Explanation> {
        let x = coerce(x);
        let y = coerce(y);
        let (x, y) = (x.as_ref(), y.as_ref());

        if matches!(x, Value::Anything) || matches!(y, Value::Anything) {
            return Ok(());
        }

        if x.is_complex() && x.same_type(y) {
            return match (x, y) {
                (Value::Float(a), Value::Float(b)) => self.compare_floats(x, y, *a, *b, path),
                (Value::Dict(a), Value::Dict(b)) => self.compare_dicts(a, b, path),
                (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                    self.compare_sequences(a, b, path)
                }
                _ => compare_generic(x, y, path),
            };
        }

        if x.is_simple() && y.is_simple() {
            return compare_simple(x, y, path);
        }

        if !x.same_type(y) {
            return Err(Explanation::new(format!(
                "X{path} is a {} and Y{path} is a {} instead",
                x.type_name(),
                y.type_name()
            )));
        }

        compare_generic(x, y, path)
    }

    fn compare_floats(
        &self,
        x: &Value,
        y: &Value,
        a: f64,
        b: f64,
        path: &KeyPath,
    ) -> Result<(), Explanation> {
        let Some(epsilon) = self.epsilon else {
            return compare_simple(x, y, path);
        };
        if (a - b).abs() <= epsilon {
            return Ok(());
        }
        Err(Explanation::new(format!(
            "X{path}±{epsilon} != Y{path}±{epsilon}"
        )))
    }

    fn compare_dicts(&self, x: &Dict, y: &Dict, path: &KeyPath) -> Result<(), Explanation> {
        let x_keys = ordered_keys(x);
        let y_keys = ordered_keys(y);

        if let Some(key) = x_keys.iter().find(|k| !y.contains_key(k)) {
            return Err(Explanation::new(format!(
                "X{path} has the key \"{}\" whereas Y{path} does not",
                key.repr()
            )));
        }
        if let Some(key) = y_keys.iter().find(|k| !x.contains_key(k)) {
            return Err(Explanation::new(format!(
                "X{path} does not have the key \"{}\" whereas Y{path} has it",
                key.repr()
            )));
        }
        if x == y {
            return Ok(());
        }

        for key in x_keys {
            let (Some(value_x), Some(value_y)) = (x.get(key), y.get(key)) else {
                continue;
            };
            self.compare_at(value_x, value_y, &path.child(Step::Key(key.clone())))?;
        }
        Ok(())
    }

    fn compare_sequences(
        &self,
        x: &[Value],
        y: &[Value],
        path: &KeyPath,
    ) -> Result<(), Explanation> {
        if x.len() > y.len() {
            return Err(Explanation::new(format!(
                "X{path} has {} items whereas Y{path} has only {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < y.len() {
            return Err(Explanation::new(format!(
                "Y{path} has {} items whereas X{path} has only {}",
                y.len(),
                x.len()
            )));
        }
        if x == y {
            return Ok(());
        }

        for (i, (value_x, value_y)) in x.iter().zip(y).enumerate() {
            self.compare_at(value_x, value_y, &path.child(Step::Index(i)))?;
        }
        Ok(())
    }
}

fn coerce(value: &Value) -> Cow<'_, Value> {
    match value {
        Value::CallList(items) => Cow::Owned(Value::List(items.clone())),
        other => Cow::Borrowed(other),
    }
}

fn compare_simple(x: &Value, y: &Value, path: &KeyPath) -> Result<(), Explanation> {
    if x == y {
        return Ok(());
    }
    Err(Explanation::new(format!(
        "X{path} is {} whereas Y{path} is {}",
        x.repr(),
        y.repr()
    )))
}

fn compare_generic(x: &Value, y: &Value, path: &KeyPath) -> Result<(), Explanation> {
    if x == y {
        return Ok(());
    }
    Err(Explanation::new(format!("X{path} != Y{path}")))
}

/// Keys sorted when they are mutually orderable, otherwise in insertion order.
fn ordered_keys(dict: &Dict) -> Vec<&Value> {
    let mut keys: Vec<&Value> = dict.keys().collect();
    let orderable = keys
        .iter()
        .all(|a| keys.iter().all(|b| a.key_cmp(b).is_some()));
    if orderable {
        keys.sort_by(|a, b| a.key_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }
    keys
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Compares `x` and `y`, optionally with a float tolerance.
pub fn compare(x: &Value, y: &Value, epsilon: Option<f64>) -> Result<(), Explanation> {
    DeepComparison::new(x, y).with_epsilon(epsilon).compare()
}

/// Compares `x` and `y` and turns a difference into an [`AssertionFailure`]
/// carrying both operands and the explanation.
#[track_caller]
pub fn assert_deep_equal(
    x: &Value,
    y: &Value,
    epsilon: Option<f64>,
) -> Result<(), AssertionFailure> {
    match compare(x, y, epsilon) {
        Ok(()) => Ok(()),
        Err(explanation) => Err(explanation.into_failure(x, y)),
    }
}
