use std::collections::BTreeMap;

use dkron_errors::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};

/// Flat attribute bag exchanged with the host, keyed by attribute name.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A single host-side attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<AttributeValue>),
    Map(AttributeMap),
}

impl AttributeValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::String(_) => "string",
            AttributeValue::List(_) => "list",
            AttributeValue::Map(_) => "map",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, AttributeValue::List(_) | AttributeValue::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttributeMap> {
        match self {
            AttributeValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        AttributeValue::List(value)
    }
}

impl From<AttributeMap> for AttributeValue {
    fn from(value: AttributeMap) -> Self {
        AttributeValue::Map(value)
    }
}

fn type_mismatch(key: &str, expected: &str, found: &AttributeValue) -> ProviderError {
    ProviderError::validation_error(
        key,
        format!("expected {expected}, found {}", found.kind_name()),
    )
}

/// String attribute, or `""` when unset.
pub(crate) fn get_string(attrs: &AttributeMap, key: &str) -> ProviderResult<String> {
    match attrs.get(key) {
        None => Ok(String::new()),
        Some(AttributeValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(type_mismatch(key, "string", other)),
    }
}

pub(crate) fn get_optional_string(
    attrs: &AttributeMap,
    key: &str,
) -> ProviderResult<Option<String>> {
    match attrs.get(key) {
        None => Ok(None),
        Some(AttributeValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_mismatch(key, "string", other)),
    }
}

pub(crate) fn get_bool(attrs: &AttributeMap, key: &str) -> ProviderResult<bool> {
    match attrs.get(key) {
        None => Ok(false),
        Some(AttributeValue::Bool(b)) => Ok(*b),
        Some(other) => Err(type_mismatch(key, "bool", other)),
    }
}

pub(crate) fn get_int(attrs: &AttributeMap, key: &str) -> ProviderResult<i64> {
    match attrs.get(key) {
        None => Ok(0),
        Some(AttributeValue::Int(i)) => Ok(*i),
        Some(other) => Err(type_mismatch(key, "int", other)),
    }
}

pub(crate) fn get_list<'a>(
    attrs: &'a AttributeMap,
    key: &str,
) -> ProviderResult<&'a [AttributeValue]> {
    match attrs.get(key) {
        None => Ok(&[]),
        Some(AttributeValue::List(items)) => Ok(items),
        Some(other) => Err(type_mismatch(key, "list", other)),
    }
}

pub(crate) fn get_map<'a>(
    attrs: &'a AttributeMap,
    key: &str,
) -> ProviderResult<Option<&'a AttributeMap>> {
    match attrs.get(key) {
        None => Ok(None),
        Some(AttributeValue::Map(map)) => Ok(Some(map)),
        Some(other) => Err(type_mismatch(key, "map", other)),
    }
}
