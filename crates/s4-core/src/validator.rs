//! Requirement validation
//!
//! Every flag whose resolved value differs from its implicit default must
//! satisfy at least one of its requirement sets. All sets are evaluated
//! against the same completed table, so declaration order between a flag
//! and the flags it references does not matter.

use std::fmt;

use serde::Serialize;

use s4_catalogue::{Catalogue, Flag, Requirement, RequirementSet, Value};

use crate::table::FlagTable;

/// A constraint of a requirement set that the table does not meet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmetConstraint {
    pub flag: String,
    pub required: Requirement,
    pub actual: Value,
}

impl fmt::Display for UnmetConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be {} but is {}",
            self.flag, self.required, self.actual
        )
    }
}

/// A flag set to a non-default value with none of its requirement sets met
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub flag: String,
    pub value: Value,
    /// For each requirement set, in declaration order, the constraints it failed
    pub unmet: Vec<Vec<UnmetConstraint>>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is {} but none of its requirement sets hold",
            self.flag, self.value
        )?;
        for (i, set) in self.unmet.iter().enumerate() {
            let reasons: Vec<String> = set.iter().map(ToString::to_string).collect();
            write!(f, "\n  set {}: {}", i + 1, reasons.join(", "))?;
        }
        Ok(())
    }
}

/// Collect every requirement violation in catalogue declaration order
///
/// An empty result means the table is valid.
pub fn validate(table: &FlagTable, catalogue: &Catalogue) -> Vec<Violation> {
    let violations: Vec<Violation> = catalogue
        .flags()
        .iter()
        .filter_map(|flag| check_flag(table, catalogue, flag))
        .collect();

    for violation in &violations {
        tracing::debug!(flag = %violation.flag, "Requirement violation");
    }
    violations
}

fn check_flag(table: &FlagTable, catalogue: &Catalogue, flag: &Flag) -> Option<Violation> {
    let value = table.get(&flag.name)?;
    if value.is_implicit_default() || flag.requires.is_empty() {
        return None;
    }

    let mut unmet = Vec::with_capacity(flag.requires.len());
    for set in &flag.requires {
        let failed = unmet_constraints(table, catalogue, set);
        if failed.is_empty() {
            return None;
        }
        unmet.push(failed);
    }

    Some(Violation {
        flag: flag.name.clone(),
        value: value.clone(),
        unmet,
    })
}

fn unmet_constraints(
    table: &FlagTable,
    catalogue: &Catalogue,
    set: &RequirementSet,
) -> Vec<UnmetConstraint> {
    set.iter()
        .filter_map(|(flag, required)| {
            let actual = table.value_or_default(flag, catalogue);
            (!required.is_satisfied_by(&actual)).then(|| UnmetConstraint {
                flag: flag.clone(),
                required: required.clone(),
                actual,
            })
        })
        .collect()
}
