//! Sweep execution with per-configuration failure isolation.

use serde::Serialize;
use sw_optimizer::{GridSearch, SkipReason, SweepId, SweepStatus, Trial, WorkerPool};
use sw_types::{Configuration, InvocationError, ResultDataset, SweepResult};
use tracing::{error, info, warn};

use crate::extract::ScoreExtractor;
use crate::invoker::SolverInvoker;

/// Everything a finished sweep produced.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub status: SweepStatus,
    /// One trial per configuration, in grid order.
    pub trials: Vec<Trial>,
    /// Scored outcomes only, in grid order.
    pub dataset: ResultDataset,
}

/// Drives the solver across a grid, one trial per configuration.
///
/// A failed or unscored run is logged and skipped; it never aborts the sweep.
pub struct ExperimentRunner<I, E> {
    invoker: I,
    extractor: E,
    workers: usize,
}

impl<I, E> ExperimentRunner<I, E>
where
    I: SolverInvoker,
    E: ScoreExtractor,
{
    pub fn new(invoker: I, extractor: E) -> Self {
        Self {
            invoker,
            extractor,
            workers: 1,
        }
    }

    /// Run up to `workers` configurations at once. `1` keeps the sweep
    /// strictly sequential.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn run(&self, grid: &GridSearch) -> SweepResult<SweepReport> {
        let configurations = grid.configurations();
        let total = configurations.len();
        let workers = self.workers.min(total).max(1);

        let mut status = SweepStatus::new(total, workers);
        let sweep_id = status.id;
        status.mark_running();
        info!(%sweep_id, workers, "Running {total} experiments...");

        let trials: Vec<Trial> = if workers == 1 {
            configurations
                .iter()
                .enumerate()
                .map(|(index, configuration)| {
                    let trial = self.run_trial(sweep_id, index, total, configuration, None);
                    status.record(&trial);
                    trial
                })
                .collect()
        } else {
            self.invoker.isolate_runs()?;
            let pool = WorkerPool::new(workers)?;
            pool.run_indexed(
                configurations.iter().collect(),
                |index, configuration, worker| {
                    self.run_trial(sweep_id, index, total, configuration, Some(worker))
                },
                |_, trial| status.record(trial),
            )
        };

        let mut dataset = ResultDataset::new(grid.space());
        for outcome in trials.iter().filter_map(Trial::outcome) {
            dataset.push(outcome)?;
        }
        status.mark_finished();

        info!(
            %sweep_id,
            completed = status.trials_completed,
            failed = status.trials_failed,
            unscored = status.trials_unscored,
            "sweep finished"
        );

        Ok(SweepReport {
            status,
            trials,
            dataset,
        })
    }

    fn run_trial(
        &self,
        sweep_id: SweepId,
        index: usize,
        total: usize,
        configuration: &Configuration,
        worker: Option<&str>,
    ) -> Trial {
        let mut trial = Trial::new(sweep_id, index, configuration.clone());
        trial.mark_running(worker.map(str::to_string));
        let position = index + 1;

        match worker {
            Some(worker) => info!(worker, "Experiment {position}/{total}: {configuration}"),
            None => info!("Experiment {position}/{total}: {configuration}"),
        }

        let output = match self.invoker.invoke(index, configuration) {
            Ok(output) => output,
            Err(err) => {
                match &err {
                    InvocationError::ExecutableMissing { .. } => {
                        error!("Experiment {position}/{total}: {err}. Build the solver first.")
                    }
                    _ => warn!("{}", failure_message(position, total, configuration, &err)),
                }
                trial.mark_skipped(SkipReason::Invocation {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                });
                return trial;
            }
        };

        match self.extractor.extract(&output) {
            Some(score) => {
                info!("Experiment {position}/{total}: best score {score}");
                trial.mark_completed(score);
            }
            None => {
                warn!("Could not find best score for experiment {position}/{total} with params {configuration}");
                trial.mark_skipped(SkipReason::ScoreNotFound);
            }
        }
        trial
    }
}

/// Log line for a run that failed to reach a clean exit. A crash's stderr
/// is already part of the error's message.
fn failure_message(
    position: usize,
    total: usize,
    configuration: &Configuration,
    err: &InvocationError,
) -> String {
    format!("Error running experiment {position}/{total} with params {configuration}: {err}")
}
