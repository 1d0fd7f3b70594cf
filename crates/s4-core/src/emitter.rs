//! Build-variable emission
//!
//! Turns a validated [`FlagTable`] into the ordered list of typed variables
//! handed to the build-system generator, and renders that list as CMake
//! definitions, an initial-cache script or JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use s4_catalogue::{Catalogue, FlagType, Value};

use crate::error::UnknownRendering;
use crate::table::FlagTable;

/// Which variable-mapped flags are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmitPolicy {
    /// Every flag with a variable, unassigned ones at their implicit default
    #[default]
    AllMapped,
    /// Only flags some layer assigned
    AssignedOnly,
}

/// CMake cache type of an emitted variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheType {
    Bool,
    String,
}

impl From<FlagType> for CacheType {
    fn from(flag_type: FlagType) -> Self {
        match flag_type {
            FlagType::Boolean => Self::Bool,
            FlagType::String => Self::String,
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::String => write!(f, "STRING"),
        }
    }
}

/// One emitted build variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariable {
    pub variable: String,
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    pub value: Value,
}

impl BuildVariable {
    /// `-DName:TYPE=value`, passed as a single argument
    pub fn definition(&self) -> String {
        format!(
            "-D{}:{}={}",
            self.variable,
            self.cache_type,
            self.value.cmake_str()
        )
    }

    /// `set(Name value CACHE TYPE "" FORCE)`
    pub fn cache_entry(&self) -> String {
        let value = match &self.value {
            Value::Boolean(_) => self.value.cmake_str().to_string(),
            Value::Text(text) => format!("\"{}\"", escape_cmake(text)),
        };
        format!(
            "set({} {} CACHE {} \"\" FORCE)",
            self.variable, value, self.cache_type
        )
    }
}

fn escape_cmake(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Output format for [`BuildVariables::render`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rendering {
    /// One `-D` definition per line
    #[default]
    Cmake,
    /// A script suitable for `cmake -C`
    Cache,
    Json,
}

impl FromStr for Rendering {
    type Err = UnknownRendering;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cmake" => Ok(Self::Cmake),
            "cache" => Ok(Self::Cache),
            "json" => Ok(Self::Json),
            _ => Err(UnknownRendering {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Rendering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cmake => write!(f, "cmake"),
            Self::Cache => write!(f, "cache"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Emitted variables in catalogue declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildVariables(Vec<BuildVariable>);

impl BuildVariables {
    /// Collect the variables of every flag with a `variable` mapping
    pub fn emit(table: &FlagTable, catalogue: &Catalogue, policy: EmitPolicy) -> Self {
        let variables = catalogue
            .flags()
            .iter()
            .filter_map(|flag| {
                let variable = flag.variable.as_ref()?;
                let value = match (table.get(&flag.name), policy) {
                    (Some(value), _) => value.clone(),
                    (None, EmitPolicy::AllMapped) => flag.implicit_default(),
                    (None, EmitPolicy::AssignedOnly) => return None,
                };
                Some(BuildVariable {
                    variable: variable.clone(),
                    cache_type: value.flag_type().into(),
                    value,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = variables.len(), ?policy, "Emitted build variables");
        Self(variables)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildVariable> {
        self.0.iter()
    }

    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|v| v.variable == variable)
            .map(|v| &v.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `-D` arguments for the build-system generator
    pub fn definitions(&self) -> Vec<String> {
        self.0.iter().map(BuildVariable::definition).collect()
    }

    pub fn cache_script(&self) -> String {
        let mut script = String::new();
        for variable in &self.0 {
            script.push_str(&variable.cache_entry());
            script.push('\n');
        }
        script
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self, rendering: Rendering) -> serde_json::Result<String> {
        match rendering {
            Rendering::Cmake => Ok(self
                .definitions()
                .iter()
                .map(|d| format!("{}\n", d))
                .collect()),
            Rendering::Cache => Ok(self.cache_script()),
            Rendering::Json => self.to_json(),
        }
    }

    /// SHA-256 of the CMake rendering
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for definition in self.definitions() {
            hasher.update(definition.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a BuildVariables {
    type Item = &'a BuildVariable;
    type IntoIter = std::slice::Iter<'a, BuildVariable>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
