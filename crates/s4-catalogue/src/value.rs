//! Typed flag values and requirement constraints
//!
//! Every flag slot holds either a boolean or a string. Integers found in
//! catalogue documents are kept as string literals, which is how the
//! build-system generator receives them anyway.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar kind of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    /// On/off switch, implicitly `false`
    #[default]
    #[serde(alias = "bool")]
    Boolean,
    /// Free-form text, implicitly empty
    #[serde(alias = "text")]
    String,
}

impl FlagType {
    /// Parse a type name as written in a catalogue document
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boolean" | "bool" => Some(Self::Boolean),
            "string" | "text" => Some(Self::String),
            _ => None,
        }
    }

    /// Value a flag of this type has when no layer assigns it
    pub fn implicit_default(self) -> Value {
        match self {
            Self::Boolean => Value::Boolean(false),
            Self::String => Value::Text(String::new()),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::String => write!(f, "string"),
        }
    }
}

/// Value assigned to a flag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Convert a scalar document value
    ///
    /// Integers and datetimes keep their literal text. Floats, arrays and
    /// tables are rejected: a parsed float no longer knows how it was
    /// written, so `1.0` would reach the build system as `1`.
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Boolean(b) => Some(Self::Boolean(*b)),
            toml::Value::String(s) => Some(Self::Text(s.clone())),
            toml::Value::Integer(i) => Some(Self::Text(i.to_string())),
            toml::Value::Datetime(d) => Some(Self::Text(d.to_string())),
            toml::Value::Float(_) | toml::Value::Array(_) | toml::Value::Table(_) => None,
        }
    }

    /// Parse a command-line literal for a flag of the given type
    ///
    /// Boolean literals accept `true/false`, `on/off`, `yes/no` and `1/0`
    /// in any case. String literals are taken verbatim.
    pub fn parse_literal(flag_type: FlagType, literal: &str) -> Option<Self> {
        match flag_type {
            FlagType::Boolean => match literal.trim().to_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(Self::Boolean(true)),
                "false" | "off" | "no" | "0" => Some(Self::Boolean(false)),
                _ => None,
            },
            FlagType::String => Some(Self::Text(literal.to_string())),
        }
    }

    pub fn flag_type(&self) -> FlagType {
        match self {
            Self::Boolean(_) => FlagType::Boolean,
            Self::Text(_) => FlagType::String,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    /// Whether this is the value an unassigned flag of the same type holds
    pub fn is_implicit_default(&self) -> bool {
        match self {
            Self::Boolean(b) => !b,
            Self::Text(s) => s.is_empty(),
        }
    }

    /// Rendering used by CMake (`ON`/`OFF` for booleans)
    pub fn cmake_str(&self) -> &str {
        match self {
            Self::Boolean(true) => "ON",
            Self::Boolean(false) => "OFF",
            Self::Text(text) => text.as_str(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => fmt::Display::fmt(value, f),
            Self::Text(value) => write!(f, "\"{}\"", value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A required value for one referenced flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    /// The flag must hold exactly this value
    Single(Value),
    /// The flag must hold any of these values
    Any(BTreeSet<Value>),
}

impl Requirement {
    /// Convert a document value: a scalar or a non-empty array of scalars
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Array(items) => {
                if items.is_empty() {
                    return None;
                }
                items
                    .iter()
                    .map(Value::from_toml)
                    .collect::<Option<BTreeSet<_>>>()
                    .map(Self::Any)
            }
            scalar => Value::from_toml(scalar).map(Self::Single),
        }
    }

    pub fn is_satisfied_by(&self, value: &Value) -> bool {
        match self {
            Self::Single(required) => required == value,
            Self::Any(accepted) => accepted.contains(value),
        }
    }

    /// All values this requirement mentions
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Self::Single(value) => Box::new(std::iter::once(value)),
            Self::Any(values) => Box::new(values.iter()),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{}", value),
            Self::Any(values) => {
                write!(f, "one of [")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Conjunction of constraints on other flags
pub type RequirementSet = BTreeMap<String, Requirement>;
