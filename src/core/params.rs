//! Runtime parameters handed to an action.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A primitive parameter value, usable on its own or inside a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Text.
    String(String),
}

/// Parameter values as they arrive from the scheduling front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WireParamValue {
    /// Single string value.
    String(String),
    /// Ordered list of strings.
    List(Vec<String>),
    /// String-to-string map.
    Map(BTreeMap<String, String>),
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    /// Primitive value.
    Primitive(Primitive),
    /// Point in time, milliseconds since the Unix epoch.
    Date(i64),
    /// List of primitives.
    List(Vec<Primitive>),
    /// Front-end parameter value.
    Wire(WireParamValue),
}

impl ParamValue {
    /// The boolean inside a primitive boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Primitive(Primitive::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The text inside a primitive or wire string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Primitive(Primitive::String(s)) | Self::Wire(WireParamValue::String(s)) => {
                Some(s)
            }
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Primitive(Primitive::Bool(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Primitive(Primitive::Integer(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Primitive(Primitive::Float(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Primitive(Primitive::String(value.to_owned()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Primitive(Primitive::String(value))
    }
}

impl From<WireParamValue> for ParamValue {
    fn from(value: WireParamValue) -> Self {
        Self::Wire(value)
    }
}

/// Name-to-value parameter map owned by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: HashMap<String, ParamValue>,
}

impl ParameterSet {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Insert only if `name` is not present yet. Returns `true` if inserted.
    pub fn insert_if_absent(&mut self, name: &str, value: impl Into<ParamValue>) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_owned(), value.into());
        true
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Whether `name` is present.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Positional expansion for variable-argument actions: every entry,
    /// ordered by name.
    #[must_use]
    pub fn expand_positional(&self) -> Vec<(String, ParamValue)> {
        let mut args: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        args.sort_by(|a, b| a.0.cmp(&b.0));
        args
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
