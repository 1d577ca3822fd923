//! Structural typing of template variables.
//!
//! Variable types are never declared in a manifest. They are derived from
//! the shape of a decoded value: the `example` of a variable declaration
//! fixes the type that defaults and user input are checked against.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Semantic type of a decoded variable value.
///
/// Collections carry a structural descriptor: a list nests the type of its
/// first element, a map the sorted `key: type` pairs of its entries. Empty
/// collections have no descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableType {
    String,
    Integer,
    Decimal,
    Boolean,
    List(Option<Box<VariableType>>),
    Map(BTreeMap<String, VariableType>),
    Unknown,
}

impl VariableType {
    /// Tag of this type without its structural descriptor.
    pub fn tag(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Integer => "integer",
            VariableType::Decimal => "decimal",
            VariableType::Boolean => "boolean",
            VariableType::List(_) => "list",
            VariableType::Map(_) => "map",
            VariableType::Unknown => "unknown",
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let indent = "  ".repeat(level);
        match self {
            VariableType::List(Some(element)) => {
                writeln!(f, "list [")?;
                write!(f, "{indent}  ")?;
                element.write_indented(f, level + 1)?;
                writeln!(f)?;
                write!(f, "{indent}]")
            }
            VariableType::Map(entries) if !entries.is_empty() => {
                writeln!(f, "map {{")?;
                for (key, value) in entries {
                    write!(f, "{indent}  {key}: ")?;
                    value.write_indented(f, level + 1)?;
                    writeln!(f)?;
                }
                write!(f, "{indent}}}")
            }
            other => f.write_str(other.tag()),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Classifies a decoded value. `null` has no type.
pub fn classify(value: &Value) -> Option<VariableType> {
    let variable_type = match value {
        Value::Null => return None,
        Value::Bool(_) => VariableType::Boolean,
        Value::Number(number) if number.is_i64() || number.is_u64() => VariableType::Integer,
        Value::Number(_) => VariableType::Decimal,
        Value::String(_) => VariableType::String,
        Value::Array(items) => match items.first() {
            None => VariableType::List(None),
            Some(first) => VariableType::List(Some(Box::new(classify_nested(first)))),
        },
        Value::Object(entries) => {
            let mut descriptor = BTreeMap::new();
            for (key, value) in entries {
                // A map with an untyped entry cannot be described.
                match classify_nested(value) {
                    VariableType::Unknown => return Some(VariableType::Unknown),
                    entry_type => descriptor.insert(key.clone(), entry_type),
                };
            }
            VariableType::Map(descriptor)
        }
    };
    Some(variable_type)
}

fn classify_nested(value: &Value) -> VariableType {
    classify(value).unwrap_or(VariableType::Unknown)
}

/// Display form of a value's type, empty for `null`.
pub fn type_name(value: &Value) -> String {
    classify(value).map(|t| t.to_string()).unwrap_or_default()
}

/// Renders a value for display: scalars in their natural form, collections
/// as a YAML document, `null` as an empty string.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => serde_yaml::to_string(value).unwrap_or_default(),
    }
}

/// Decides whether `value` has the same structural type as `expected`.
///
/// Lists are compared by their first element only and maps by every key
/// of `expected`, which must be exactly the keys of `value`. A decimal in
/// `expected` accepts an integer in `value`, never the other way around.
///
/// Only the first element of a list is sampled, so a heterogeneous list
/// is accepted as long as its first element matches. Declared examples are
/// shallow and existing templates rely on this looser check.
pub fn same_structural_type(expected: &Value, value: &Value) -> bool {
    match (expected, value) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::String(_), Value::String(_)) => true,
        (Value::Number(a), Value::Number(b)) => is_integer(a) == is_integer(b) || !is_integer(a),
        (Value::Array(a), Value::Array(b)) => match (a.first(), b.first()) {
            (None, None) => true,
            (Some(a), Some(b)) => same_structural_type(a, b),
            _ => false,
        },
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, a_value)| {
                    b.get(key).is_some_and(|b_value| same_structural_type(a_value, b_value))
                })
        }
        _ => false,
    }
}

fn is_integer(number: &serde_json::Number) -> bool {
    number.is_i64() || number.is_u64()
}
