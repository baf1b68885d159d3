/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template value and variable scope types.
//!
//! This module defines the values templates operate on and the variable
//! scope the evaluator keeps while walking a template.
//!
//! **Important**: These types are independent of the document model.
//! Conversion from model nodes to `TemplateValue` happens in the build layer.

use std::collections::BTreeMap;
use std::fmt;

/// A value that can be used in template evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// An integer value.
    Int(i64),

    /// A string value.
    String(String),

    /// A list of values.
    List(Vec<TemplateValue>),

    /// A map of string keys to values, iterated in key order.
    Map(BTreeMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Check if this value is "truthy" for conditional evaluation.
    ///
    /// - Any non-empty string, list or map is truthy (even the string "false")
    /// - Boolean true and non-zero integers are truthy
    /// - Null is never truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Bool(b) => *b,
            TemplateValue::Int(i) => *i != 0,
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Map(m) => !m.is_empty(),
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["Author", "EMail"])` on a Map containing
    /// `{"Author": {"EMail": "x"}}` returns the email value.
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => match self {
                TemplateValue::Map(m) => m.get(*first).and_then(|v| v.get_path(rest)),
                _ => None,
            },
        }
    }

    /// Name of the value's kind, as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TemplateValue::Null => "nil",
            TemplateValue::Bool(_) => "bool",
            TemplateValue::Int(_) => "int",
            TemplateValue::String(_) => "string",
            TemplateValue::List(_) => "list",
            TemplateValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TemplateValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> TemplateValue
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TemplateValue)>,
    {
        TemplateValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Output form of a value.
///
/// Strings print as-is, null prints nothing, lists print as `[a b]` and
/// maps as `map[k:v]`.
impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Null => Ok(()),
            TemplateValue::Bool(b) => write!(f, "{}", b),
            TemplateValue::Int(i) => write!(f, "{}", i),
            TemplateValue::String(s) => f.write_str(s),
            TemplateValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            TemplateValue::Map(m) => {
                f.write_str("map[")?;
                for (i, (key, value)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<i64> for TemplateValue {
    fn from(i: i64) -> Self {
        TemplateValue::Int(i)
    }
}

impl From<u32> for TemplateValue {
    fn from(i: u32) -> Self {
        TemplateValue::Int(i64::from(i))
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(items: Vec<T>) -> Self {
        TemplateValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Conversion from JSON data, for rendering templates against plain data.
///
/// Floats are truncated to integers.
impl From<serde_json::Value> for TemplateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(b),
            serde_json::Value::Number(n) => TemplateValue::Int(
                n.as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .unwrap_or_default(),
            ),
            serde_json::Value::String(s) => TemplateValue::String(s),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(m) => {
                TemplateValue::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Variable bindings visible while evaluating a template.
///
/// Variables live on a stack. Control structures take a [`Scope::mark`]
/// on entry and [`Scope::pop_to`] it on exit, so declarations made inside
/// a block disappear at its `end`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: Vec<(String, TemplateValue)>,
}

impl Scope {
    /// Create a scope with `$` bound to the template's data.
    pub fn new(data: TemplateValue) -> Self {
        Self {
            variables: vec![(String::new(), data)],
        }
    }

    pub fn mark(&self) -> usize {
        self.variables.len()
    }

    pub fn pop_to(&mut self, mark: usize) {
        self.variables.truncate(mark);
    }

    /// Declare a new variable, shadowing any outer one of the same name.
    pub fn declare(&mut self, name: impl Into<String>, value: TemplateValue) {
        self.variables.push((name.into(), value));
    }

    /// Overwrite the innermost variable with this name.
    ///
    /// Returns false if no such variable exists.
    pub fn assign(&mut self, name: &str, value: TemplateValue) -> bool {
        match self.variables.iter_mut().rev().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    /// Look up the innermost variable with this name.
    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.variables
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
