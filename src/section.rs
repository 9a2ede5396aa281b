//! Record value model
//!
//! Archive records are trees of [`Section`]s. Every section carries the name of
//! its section definition (`m_def`) and a flat map of set fields. Field values are
//! a closed set of node kinds so path descent can branch on them explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A numeric value with its unit attached, stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A measured series sharing one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Series {
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Series {
    pub fn new(values: Vec<f64>, unit: Option<&str>) -> Self {
        Self {
            values,
            unit: unit.map(str::to_string),
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} values in {}", self.values.len(), unit),
            None => write!(f, "{} values", self.values.len()),
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Quantity(Quantity),
    Series(Series),
    Section(Section),
    List(Vec<Value>),
    /// Strings (including reference strings), numbers, booleans and null.
    Scalar(serde_json::Value),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(serde_json::Value::String(s.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(serde_json::Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Value::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Null and empty strings count as unset, matching how ELN forms clear a field.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Scalar(serde_json::Value::Null) => true,
            Value::Scalar(serde_json::Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Quantity(q) => write!(f, "{}", q),
            Value::Series(s) => write!(f, "{}", s),
            Value::Section(s) => match s.name() {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "{}", s.m_def),
            },
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Scalar(serde_json::Value::String(s)) => write!(f, "{}", s),
            Value::Scalar(other) => write!(f, "{}", other),
        }
    }
}

/// A record instance of one section definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub m_def: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Section {
    pub fn new(m_def: impl Into<String>) -> Self {
        Self {
            m_def: m_def.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_unset())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn set_str(&mut self, field: &str, value: impl Into<String>) {
        self.set(field, Value::string(value));
    }
}
