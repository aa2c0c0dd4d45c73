//! Dynamic values compared by the deep comparison engine.
//!
//! A [`Value`] is the common currency between test bodies, declarative
//! modules and the comparator. Every value knows its `type_name()` and a
//! `repr()` which mirrors the notation used in explanations (`'text'`,
//! `[1, 2]`, `(1,)`, `{'key': 'value'}`, `None`, `True`).

use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// VALUE
// ============================================================================

/// A dynamically typed value.
///
/// # Examples
///
/// ```rust
/// use verity::value::Value;
/// let v = Value::from(vec![1, 2, 3]);
/// assert_eq!(v.type_name(), "list");
/// assert_eq!(v.repr(), "[1, 2, 3]");
/// assert_eq!(Value::from("one").repr(), "'one'");
/// ```
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Dict),
    /// A recorded list of mock calls. Compared structurally as a list.
    CallList(Vec<Value>),
    /// Wildcard that equals every value.
    Anything,
    Opaque(Opaque),
}

impl Value {
    /// Returns the type name used in explanations.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::CallList(_) => "CallList",
            Value::Anything => "Anything",
            Value::Opaque(o) => o.type_name(),
        }
    }

    /// Returns true if both values are of the same variant.
    ///
    /// Opaque values additionally need the same underlying Rust type.
    pub fn same_type(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Opaque(a), Value::Opaque(b)) => a.type_id() == b.type_id(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Simple values are compared with `==` and explained by value.
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Value::Str(_) | Value::Int(_) | Value::Bool(_) | Value::Bytes(_) | Value::Anything
        )
    }

    /// Complex values have a dedicated structural comparison rule.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Value::Float(_) | Value::Dict(_) | Value::List(_) | Value::Tuple(_)
        )
    }

    /// Converts a mock call list into a plain list, leaving other values untouched.
    pub fn coerce_call_list(self) -> Value {
        match self {
            Value::CallList(items) => Value::List(items),
            other => other,
        }
    }

    /// Builds a tuple value.
    pub fn tuple<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a mock call list value.
    pub fn calls<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::CallList(items.into_iter().map(Into::into).collect())
    }

    /// Wraps any comparable Rust value that has no dedicated variant.
    pub fn opaque<T: PartialEq + fmt::Debug + 'static>(value: T) -> Value {
        Value::Opaque(Opaque::new(value))
    }

    /// Returns the canonical textual representation.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Float(f) => out.push_str(&float_repr(*f)),
            Value::Str(s) => out.push_str(&str_repr(s)),
            Value::Bytes(b) => out.push_str(&bytes_repr(b)),
            Value::List(items) | Value::CallList(items) => {
                out.push('[');
                write_items(items, out);
                out.push(']');
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(dict) => {
                out.push('{');
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out);
                    out.push_str(": ");
                    value.write_repr(out);
                }
                out.push('}');
            }
            Value::Anything => out.push_str("<Anything>"),
            Value::Opaque(o) => out.push_str(&format!("{:?}", o)),
        }
    }

    /// Orders two keys when they are of a mutually orderable kind.
    pub(crate) fn key_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn write_items(items: &[Value], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
}

fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn bytes_repr(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };
    let mut out = String::from("b");
    out.push(quote as char);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote as char);
    out
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Anything, _) | (_, Value::Anything) => true,
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b))
            | (Value::CallList(a), Value::CallList(b))
            | (Value::List(a), Value::CallList(b))
            | (Value::CallList(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

// ============================================================================
// DICT: insertion-ordered mapping
// ============================================================================

/// An insertion-ordered mapping from values to values.
#[derive(Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key, replacing the value in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.strict_eq(&key)) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.strict_eq(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl Value {
    /// Equality used for key identity: no wildcard matching.
    fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Anything, Value::Anything) => true,
            (Value::Anything, _) | (_, Value::Anything) => false,
            _ => self.same_type(other) && self == other,
        }
    }
}

// ============================================================================
// OPAQUE: values without a dedicated variant
// ============================================================================

/// A type-erased Rust value compared through its own `PartialEq`.
///
/// Opaque values have no reliable textual form, so the comparator never
/// prints them in explanations.
#[derive(Clone)]
pub struct Opaque {
    inner: Rc<dyn Any>,
    type_name: &'static str,
    eq: fn(&dyn Any, &dyn Any) -> bool,
    debug: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Opaque {
    pub fn new<T: PartialEq + fmt::Debug + 'static>(value: T) -> Self {
        fn eq_impl<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
            match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        fn debug_impl<T: fmt::Debug + 'static>(
            a: &dyn Any,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            match a.downcast_ref::<T>() {
                Some(a) => fmt::Debug::fmt(a, f),
                None => f.write_str("<opaque>"),
            }
        }
        let full = std::any::type_name::<T>();
        let short = full
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full);
        Self {
            inner: Rc::new(value),
            type_name: short,
            eq: eq_impl::<T>,
            debug: debug_impl::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    fn type_id(&self) -> std::any::TypeId {
        (*self.inner).type_id()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        (self.eq)(&*self.inner, &*other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.inner, f)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i64::from(i))
            }
        })*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

/// Unsigned values past `i64::MAX` become floats rather than wrapping.
macro_rules! wide_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
            }
        })*
    };
}

wide_into_value!(u64, usize);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>, D: Into<Value>> From<(A, B, C, D)>
    for Value
{
    fn from((a, b, c, d): (A, B, C, D)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into(), d.into()])
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::Dict(map.into_iter().collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(map: HashMap<K, V>) -> Self {
        let mut entries: Vec<(Value, Value)> = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.key_cmp(b).unwrap_or_else(|| a.repr().cmp(&b.repr())));
        Value::Dict(entries.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(map) => Value::Dict(map.into_iter().collect()),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(yaml: serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Null => Value::None,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::Str(s),
            serde_yaml::Value::Sequence(items) => items.into(),
            serde_yaml::Value::Mapping(map) => Value::Dict(
                map.into_iter()
                    .map(|(k, v)| (Value::from(k), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => tagged_yaml(*tagged),
        }
    }
}

/// `!tuple`, `!calls`, `!bytes` and `!anything` tags select the matching variant.
fn tagged_yaml(tagged: serde_yaml::value::TaggedValue) -> Value {
    let inner = Value::from(tagged.value);
    if tagged.tag == "tuple" {
        match inner {
            Value::List(items) => Value::Tuple(items),
            other => Value::Tuple(vec![other]),
        }
    } else if tagged.tag == "calls" {
        match inner {
            Value::List(items) => Value::CallList(items),
            other => Value::CallList(vec![other]),
        }
    } else if tagged.tag == "bytes" {
        match inner {
            Value::Str(s) => Value::Bytes(s.into_bytes()),
            other => other,
        }
    } else if tagged.tag == "anything" {
        Value::Anything
    } else {
        inner
    }
}

/// Builds a [`Value::Dict`] preserving the written key order.
///
/// ```rust
/// use verity::dict;
/// let d = dict! { "one" => "yeah", "two" => 2 };
/// assert_eq!(d.repr(), "{'one': 'yeah', 'two': 2}");
/// ```
#[macro_export]
macro_rules! dict {
    () => {
        $crate::value::Value::Dict($crate::value::Dict::new())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut dict = $crate::value::Dict::new();
        $(dict.insert($key, $value);)+
        $crate::value::Value::Dict(dict)
    }};
}

/// Builds a [`Value::List`] from heterogeneous items.
#[macro_export]
macro_rules! list {
    () => {
        $crate::value::Value::List(Vec::new())
    };
    ($($item:expr),+ $(,)?) => {
        $crate::value::Value::List(vec![$($crate::value::Value::from($item)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_of_primitives() {
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::Bool(true).repr(), "True");
        assert_eq!(Value::Int(-3).repr(), "-3");
        assert_eq!(Value::Float(3.0).repr(), "3.0");
        assert_eq!(Value::Float(4.242423).repr(), "4.242423");
        assert_eq!(Value::from("it's").repr(), "\"it's\"");
        assert_eq!(Value::from("a\nb").repr(), "'a\\nb'");
        assert_eq!(Value::Bytes(b"ab\x00".to_vec()).repr(), "b'ab\\x00'");
    }

    #[test]
    fn test_wide_unsigned_values_do_not_wrap() {
        assert!(matches!(Value::from(7usize), Value::Int(7)));
        assert!(matches!(Value::from(u64::MAX), Value::Float(f) if f > 0.0));
        assert!(matches!(Value::from(usize::MAX), Value::Float(f) if f > 0.0));
    }

    #[test]
    fn test_repr_of_containers() {
        assert_eq!(Value::tuple([1]).repr(), "(1,)");
        assert_eq!(Value::tuple(Vec::<i32>::new()).repr(), "()");
        assert_eq!(Value::from((1, "a")).repr(), "(1, 'a')");
        assert_eq!(dict! { "k" => list![1, "x"] }.repr(), "{'k': [1, 'x']}");
    }

    #[test]
    fn test_dict_equality_ignores_order() {
        let a = dict! { "a" => 1, "b" => 2 };
        let b = dict! { "b" => 2, "a" => 1 };
        assert_eq!(a, b);
    }

    #[test]
    fn test_dict_insert_replaces_existing_key() {
        let mut d = Dict::new();
        d.insert("a", 1);
        assert_eq!(d.insert("a", 2), Some(Value::Int(1)));
        assert_eq!(d.len(), 1);
        assert_eq!(d.get(&Value::from("a")), Some(&Value::Int(2)));
    }

    #[test]
    fn test_call_list_equals_list() {
        assert_eq!(Value::calls([1, 2]), Value::from(vec![1, 2]));
        assert_eq!(Value::calls([1]).coerce_call_list().type_name(), "list");
    }

    #[test]
    fn test_anything_matches_everything() {
        assert_eq!(Value::Anything, Value::from("whatever"));
        assert_eq!(Value::from(vec![1, 2]), Value::Anything);
    }

    #[test]
    fn test_opaque_values_use_their_own_equality() {
        #[derive(Debug, PartialEq)]
        struct Stamp(u32);
        let a = Value::opaque(Stamp(1));
        assert_eq!(a, Value::opaque(Stamp(1)));
        assert_ne!(a, Value::opaque(Stamp(2)));
        assert_eq!(a.type_name(), "Stamp");
        assert!(!a.same_type(&Value::opaque(1u8)));
    }

    #[test]
    fn test_yaml_tags_select_variants() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("!tuple [1, 2]").unwrap();
        assert_eq!(Value::from(yaml).type_name(), "tuple");
        let yaml: serde_yaml::Value = serde_yaml::from_str("!anything ~").unwrap();
        assert!(matches!(Value::from(yaml), Value::Anything));
    }

    #[test]
    fn test_hash_map_conversion_is_sorted() {
        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(Value::from(map).repr(), "{'a': 1, 'b': 2}");
    }
}
