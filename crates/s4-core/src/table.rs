//! Flag table accumulated by the layer compositor

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use s4_catalogue::{Catalogue, Value};

/// Precedence layer an assignment came from, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Architecture,
    Platform,
    Variation,
    Project,
    CommandLine,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Architecture => write!(f, "architecture"),
            Self::Platform => write!(f, "platform"),
            Self::Variation => write!(f, "variation"),
            Self::Project => write!(f, "project"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A flag value together with the layer that set it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub value: Value,
    pub layer: Layer,
}

/// Mapping from flag name to its current assignment
///
/// Flags that no layer assigned are absent and read as their implicit default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagTable {
    entries: BTreeMap<String, Assignment>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite whatever an earlier layer assigned
    pub fn assign(&mut self, flag: &str, value: Value, layer: Layer) {
        tracing::trace!(flag, %value, %layer, "Assigning flag");
        self.entries
            .insert(flag.to_string(), Assignment { value, layer });
    }

    /// Assign only over nothing or an architecture-layer value
    ///
    /// Returns the layer that kept its value when the assignment was refused.
    pub fn fill(&mut self, flag: &str, value: Value, layer: Layer) -> Option<Layer> {
        match self.entries.get(flag) {
            Some(existing) if existing.layer > Layer::Architecture => Some(existing.layer),
            _ => {
                self.assign(flag, value, layer);
                None
            }
        }
    }

    pub fn get(&self, flag: &str) -> Option<&Value> {
        self.entries.get(flag).map(|a| &a.value)
    }

    pub fn assignment(&self, flag: &str) -> Option<&Assignment> {
        self.entries.get(flag)
    }

    pub fn layer(&self, flag: &str) -> Option<Layer> {
        self.entries.get(flag).map(|a| a.layer)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.entries.contains_key(flag)
    }

    /// Value of `flag`, falling back to the implicit default for its type
    pub fn value_or_default(&self, flag: &str, catalogue: &Catalogue) -> Value {
        self.get(flag)
            .cloned()
            .unwrap_or_else(|| catalogue.flag_type(flag).implicit_default())
    }

    /// Assignments in flag-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
