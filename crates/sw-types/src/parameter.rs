//! Parameter space and configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::errors::{SweepError, SweepResult};

/// A concrete numeric value for one swept parameter.
///
/// Integers and floats are kept apart so each renders the way the solver
/// expects on its command line (`1000`, not `1000.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
}

impl ParameterValue {
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// A single parameter dimension: a name and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Parameter name, also used as the CSV column header (e.g. "cooling_rate").
    pub name: String,
    /// Candidate values in declaration order.
    pub values: Vec<ParameterValue>,
}

/// The full parameter space: an ordered list of parameter definitions.
///
/// Declaration order matters twice: it fixes the solver's positional
/// argument order and the column order of the persisted results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub parameters: Vec<ParameterDef>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<V: Into<ParameterValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Total number of grid points, `None` on overflow.
    pub fn grid_size(&self) -> Option<usize> {
        self.parameters
            .iter()
            .try_fold(1usize, |total, param| total.checked_mul(param.values.len()))
    }

    /// Check the structural invariants: at least one parameter, unique
    /// names, at least one finite candidate per parameter.
    pub fn validate(&self) -> SweepResult<()> {
        if self.parameters.is_empty() {
            return Err(SweepError::Validation(
                "parameter space declares no parameters".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.name.trim().is_empty() {
                return Err(SweepError::Validation(
                    "parameter names must not be empty".to_string(),
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SweepError::Validation(format!(
                    "duplicate parameter name: {}",
                    param.name
                )));
            }
            if param.values.is_empty() {
                return Err(SweepError::Validation(format!(
                    "parameter {} has no candidate values",
                    param.name
                )));
            }
            if let Some(bad) = param.values.iter().find(|v| !v.is_finite()) {
                return Err(SweepError::Validation(format!(
                    "parameter {} has non-finite value {bad}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// One concrete assignment of a value to every parameter of a space, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    entries: Vec<(String, ParameterValue)>,
}

impl Configuration {
    /// Build from `(name, value)` pairs. Callers are expected to supply one
    /// entry per parameter of the space; the grid generator guarantees it.
    pub fn from_entries(entries: Vec<(String, ParameterValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = ParameterValue> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }

    pub fn entries(&self) -> &[(String, ParameterValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values rendered as solver command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        self.values().map(|v| v.to_string()).collect()
    }

    /// True when the key set matches the space's parameter names exactly.
    pub fn matches_space(&self, space: &ParameterSpace) -> bool {
        self.len() == space.len() && self.names().zip(space.names()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
