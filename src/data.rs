//! Production data: the values templates read from
//!
//! A [`Data`] record maps keys to [`Value`]s. Values can be scalars, lists,
//! nested records, or callables supplied by the host. Records are never
//! mutated by the engine; loop scopes are built with [`Data::merged`].
//!
//! Lists and records are reference counted, so cloning a value or merging a
//! scope never copies nested data.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::production::OutputElement;

/// Failure raised by a host callable
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Something the engine can invoke with the element being built and the
/// data in scope.
pub trait Callable: Send + Sync {
    fn call(&self, target: &mut OutputElement, data: &Data) -> Result<(), CallbackError>;
}

impl<F> Callable for F
where
    F: Fn(&mut OutputElement, &Data) -> Result<(), CallbackError> + Send + Sync,
{
    fn call(&self, target: &mut OutputElement, data: &Data) -> Result<(), CallbackError> {
        self(target, data)
    }
}

/// Shared handle to a host callable
#[derive(Clone)]
pub struct Callback(Arc<dyn Callable>);

impl Callback {
    pub fn new(callable: impl Callable + 'static) -> Self {
        Self(Arc::new(callable))
    }

    /// Wrap a closure; unlike [`Callback::new`] this lets the closure's
    /// argument types be inferred.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut OutputElement, &Data) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    pub fn call(&self, target: &mut OutputElement, data: &Data) -> Result<(), CallbackError> {
        self.0.call(target, data)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<callable>")
    }
}

/// A value in a production data record
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Arc<[Value]>),
    Map(Data),
    Callable(Callback),
}

impl Value {
    /// Wrap a closure as a callable value
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&mut OutputElement, &Data) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Value::Callable(Callback::from_fn(f))
    }

    /// Name of the value's kind, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "record",
            Value::Callable(_) => "callable",
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Data> {
        match self {
            Value::Map(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Callable(cb) => Some(cb),
            _ => None,
        }
    }

    /// Text form used when a value is substituted into markup.
    ///
    /// Integral numbers print without a fractional part, lists are joined
    /// with commas, and values without a sensible text form print as the
    /// empty string.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::List(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.to_text().into_owned())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Null | Value::Map(_) | Value::Callable(_) => Cow::Borrowed(""),
        }
    }

    /// Truthiness as used by test expressions
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) | Value::Callable(_) => true,
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Data> for Value {
    fn from(data: Data) -> Self {
        Value::Map(data)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Callable(cb)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(Data::from(map)),
        }
    }
}

/// A production data record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    entries: Arc<BTreeMap<String, Value>>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        Arc::make_mut(&mut self.entries).insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A new record holding this record's entries overlaid with `overlay`'s.
    /// Keys present in both take the overlay's value.
    ///
    /// The merge is shallow: nested lists and records are shared with both
    /// inputs.
    pub fn merged(&self, overlay: &Data) -> Data {
        if overlay.is_empty() {
            return self.clone();
        }
        let mut entries = BTreeMap::clone(&self.entries);
        for (key, value) in overlay.entries.iter() {
            entries.insert(key.clone(), value.clone());
        }
        Data {
            entries: Arc::new(entries),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Data {
            entries: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Data {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}
