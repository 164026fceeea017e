//! Experiment outcomes and the aggregate result dataset.

use serde::{Deserialize, Serialize};

use crate::errors::{SweepError, SweepResult};
use crate::parameter::{Configuration, ParameterSpace};

/// Column header appended after the parameter columns.
pub const SCORE_COLUMN: &str = "best_score";

/// A scored configuration: one row of the result dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    /// Position of the configuration in the generated grid (0-indexed).
    pub index: usize,
    pub configuration: Configuration,
    pub best_score: f64,
}

impl ExperimentOutcome {
    pub fn new(index: usize, configuration: Configuration, best_score: f64) -> Self {
        Self {
            index,
            configuration,
            best_score,
        }
    }

    /// Row cells in column order: parameter values, then the score.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = self.configuration.to_args();
        record.push(self.best_score.to_string());
        record
    }
}

/// Ordered collection of scored outcomes, one per successful configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDataset {
    parameter_names: Vec<String>,
    rows: Vec<ExperimentOutcome>,
}

impl ResultDataset {
    pub fn new(space: &ParameterSpace) -> Self {
        Self {
            parameter_names: space.names().map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// Append an outcome; its configuration must carry exactly the
    /// dataset's parameter columns, in order.
    pub fn push(&mut self, outcome: ExperimentOutcome) -> SweepResult<()> {
        let matches = outcome.configuration.len() == self.parameter_names.len()
            && outcome
                .configuration
                .names()
                .zip(&self.parameter_names)
                .all(|(a, b)| a == b);
        if !matches {
            return Err(SweepError::Validation(format!(
                "outcome #{} does not match dataset columns {:?}",
                outcome.index, self.parameter_names
            )));
        }
        self.rows.push(outcome);
        Ok(())
    }

    /// Header row: parameter names followed by `best_score`.
    pub fn headers(&self) -> Vec<&str> {
        self.parameter_names
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(SCORE_COLUMN))
            .collect()
    }

    pub fn rows(&self) -> &[ExperimentOutcome] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with the maximum score; ties go to the earliest row.
    pub fn best(&self) -> Option<&ExperimentOutcome> {
        self.rows.iter().fold(None, |best, row| match best {
            Some(current) if current.best_score >= row.best_score => Some(current),
            _ => Some(row),
        })
    }
}
