//! Result persistence and the end-of-sweep summary.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sw_types::{ExperimentOutcome, ResultDataset, SweepResult, SCORE_COLUMN};
use tracing::{debug, info};

/// Default location of the persisted results table.
pub const DEFAULT_OUTPUT_PATH: &str = "experiment_results.csv";

/// Writes the result dataset as a CSV table.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header row of parameter names plus `best_score`, then one row per
    /// outcome. No index column.
    pub fn persist(&self, dataset: &ResultDataset) -> SweepResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(dataset.headers())?;
        for row in dataset.rows() {
            writer.write_record(row.to_record())?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), rows = dataset.len(), "results written");
        Ok(())
    }
}

/// Final outcome of a sweep as presented to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepSummary {
    /// Nothing was scored; no file was written.
    Empty,
    Persisted {
        path: PathBuf,
        rows: usize,
        best: ExperimentOutcome,
    },
}

/// Persist a non-empty dataset and pick its best row, or report that the
/// sweep produced nothing.
pub fn report(dataset: &ResultDataset, store: &ResultStore) -> SweepResult<SweepSummary> {
    let Some(best) = dataset.best() else {
        info!("no configuration produced a score; nothing persisted");
        return Ok(SweepSummary::Empty);
    };

    store.persist(dataset)?;
    info!(
        path = %store.path().display(),
        rows = dataset.len(),
        best_score = best.best_score,
        "results persisted"
    );

    Ok(SweepSummary::Persisted {
        path: store.path().to_path_buf(),
        rows: dataset.len(),
        best: best.clone(),
    })
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "No experiments were successfully completed."),
            Self::Persisted { path, rows, best } => {
                writeln!(
                    f,
                    "Experiments finished. {rows} successful run(s); results saved to {}",
                    path.display()
                )?;
                writeln!(f)?;
                writeln!(f, "Best result:")?;

                let width = best
                    .configuration
                    .names()
                    .map(str::len)
                    .chain(std::iter::once(SCORE_COLUMN.len()))
                    .max()
                    .unwrap_or(0);
                for (name, value) in best.configuration.entries() {
                    writeln!(f, "{name:<width$}  {value}")?;
                }
                write!(f, "{SCORE_COLUMN:<width$}  {}", best.best_score)
            }
        }
    }
}

/// Write a serializable sweep record, such as the full [`SweepReport`]
/// (status, trials and dataset), as pretty-printed JSON.
///
/// [`SweepReport`]: crate::runner::SweepReport
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> SweepResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_types::{Configuration, ParameterSpace, ParameterValue};

    fn space() -> ParameterSpace {
        ParameterSpace::new()
            .add("initial_temp", [1000_i64, 5000, 10000])
            .add("cooling_rate", [0.95])
    }

    fn dataset(scores: &[f64]) -> ResultDataset {
        let temps = [1000_i64, 5000, 10000];
        let mut dataset = ResultDataset::new(&space());
        for (index, score) in scores.iter().enumerate() {
            let config = Configuration::from_entries(vec![
                ("initial_temp".into(), ParameterValue::Int(temps[index % 3])),
                ("cooling_rate".into(), ParameterValue::Float(0.95)),
            ]);
            dataset
                .push(ExperimentOutcome::new(index, config, *score))
                .unwrap();
        }
        dataset
    }

    #[test]
    fn persists_header_and_one_row_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("experiment_results.csv"));

        let summary = report(&dataset(&[10.0, 55.0, 3.0]), &store).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "initial_temp,cooling_rate,best_score",
                "1000,0.95,10",
                "5000,0.95,55",
                "10000,0.95,3",
            ]
        );

        match summary {
            SweepSummary::Persisted { rows, best, .. } => {
                assert_eq!(rows, 3);
                assert_eq!(best.best_score, 55.0);
                assert_eq!(best.configuration.get("initial_temp"), Some(ParameterValue::Int(5000)));
            }
            SweepSummary::Empty => panic!("expected a persisted summary"),
        }
    }

    #[test]
    fn persisted_table_reads_back_with_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("nested/out/results.csv"));
        store.persist(&dataset(&[-1.5, 2.25])).unwrap();

        let mut reader = csv::Reader::from_path(store.path()).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 3);
        let scores: Vec<f64> = reader
            .records()
            .map(|r| r.unwrap()[2].parse().unwrap())
            .collect();
        assert_eq!(scores, vec![-1.5, 2.25]);
    }

    #[test]
    fn empty_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("experiment_results.csv"));

        let summary = report(&dataset(&[]), &store).unwrap();
        assert_eq!(summary, SweepSummary::Empty);
        assert!(!store.path().exists());
        assert_eq!(summary.to_string(), "No experiments were successfully completed.");
    }

    #[test]
    fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as the output file.
        let store = ResultStore::new(dir.path());
        assert!(report(&dataset(&[1.0]), &store).is_err());
    }

    #[test]
    fn summary_lists_best_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("r.csv"));
        let text = report(&dataset(&[4.0, 9.5]), &store).unwrap().to_string();

        assert!(text.contains("2 successful run(s)"));
        assert!(text.contains("Best result:"));
        assert!(text.contains("initial_temp  5000"));
        assert!(text.contains("best_score    9.5"));
    }

    #[test]
    fn write_json_round_trips_through_serde() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let data = dataset(&[1.0]);
        write_json(&data, &path).unwrap();

        let back: ResultDataset =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(back, data);
    }
}
