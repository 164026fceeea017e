//! Exhaustive grid expansion of a parameter space.

use sw_types::{Configuration, ParameterSpace, ParameterValue, SweepResult};
use tracing::debug;

/// Exhaustive grid search over the discrete candidates of a space.
///
/// Ordering: the first-declared parameter varies slowest, the last-declared
/// fastest (odometer order). Downstream code must not rely on it for
/// correctness; it only keeps runs and output files reproducible.
#[derive(Debug, Clone)]
pub struct GridSearch {
    space: ParameterSpace,
    combos: Vec<Configuration>,
}

impl GridSearch {
    pub fn new(space: ParameterSpace) -> SweepResult<Self> {
        space.validate()?;
        let combos = Self::build_grid(&space);
        debug!(
            parameters = space.len(),
            configurations = combos.len(),
            "expanded parameter grid"
        );
        Ok(Self { space, combos })
    }

    fn build_grid(space: &ParameterSpace) -> Vec<Configuration> {
        // Cartesian product
        let mut result: Vec<Vec<(String, ParameterValue)>> = vec![Vec::new()];
        for param in &space.parameters {
            let mut next = Vec::with_capacity(result.len() * param.values.len());
            for existing in &result {
                for value in &param.values {
                    let mut combo = existing.clone();
                    combo.push((param.name.clone(), *value));
                    next.push(combo);
                }
            }
            result = next;
        }

        result.into_iter().map(Configuration::from_entries).collect()
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.combos
    }

    pub fn into_configurations(self) -> Vec<Configuration> {
        self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }
}
