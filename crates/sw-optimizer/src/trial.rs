//! Trial tracking and sweep status management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sw_types::{Configuration, ExperimentOutcome};
use uuid::Uuid;

/// Unique sweep run identifier.
pub type SweepId = Uuid;

/// Lifecycle state for a sweep run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepState {
    Pending,
    Running,
    /// Finished with at least one scored configuration.
    Completed,
    /// Finished, but no configuration produced a score.
    Empty,
}

/// Aggregate status of a sweep run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStatus {
    pub id: SweepId,
    pub state: SweepState,
    pub total_configurations: usize,
    pub workers: usize,
    pub trials_completed: usize,
    /// Runs whose solver invocation failed (missing binary, crash, timeout).
    pub trials_failed: usize,
    /// Runs that exited cleanly but printed no recognizable score.
    pub trials_unscored: usize,
    pub best: Option<ExperimentOutcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock time from `mark_running` to `mark_finished`.
    pub elapsed_seconds: Option<f64>,
}

impl SweepStatus {
    pub fn new(total_configurations: usize, workers: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SweepState::Pending,
            total_configurations,
            workers,
            trials_completed: 0,
            trials_failed: 0,
            trials_unscored: 0,
            best: None,
            started_at: None,
            finished_at: None,
            elapsed_seconds: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SweepState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_finished(&mut self) {
        self.state = if self.trials_completed > 0 {
            SweepState::Completed
        } else {
            SweepState::Empty
        };
        let now = Utc::now();
        self.finished_at = Some(now);
        self.elapsed_seconds = self
            .started_at
            .map(|start| (now - start).num_milliseconds() as f64 / 1000.0);
    }

    /// Fold a finished trial into the counters and the running best.
    pub fn record(&mut self, trial: &Trial) {
        match (&trial.status, &trial.skip_reason) {
            (TrialStatus::Completed, _) => self.trials_completed += 1,
            (TrialStatus::Skipped, Some(SkipReason::ScoreNotFound)) => self.trials_unscored += 1,
            (TrialStatus::Skipped, _) => self.trials_failed += 1,
            _ => {}
        }
        if let Some(outcome) = trial.outcome() {
            self.update_best(&outcome);
        }
    }

    /// Update the best outcome if `outcome` strictly improves on it; equal
    /// scores keep the earlier configuration.
    pub fn update_best(&mut self, outcome: &ExperimentOutcome) {
        let improves = match &self.best {
            None => true,
            Some(current) => {
                outcome.best_score > current.best_score
                    || (outcome.best_score == current.best_score && outcome.index < current.index)
            }
        };
        if improves {
            self.best = Some(outcome.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// Why a trial contributed nothing to the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The solver could not be run to a clean exit.
    Invocation { error: String, message: String },
    /// The solver exited cleanly but its output carried no score.
    ScoreNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Skipped,
}

/// A single trial (one configuration evaluated by one solver run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub sweep_id: SweepId,
    /// Position in the generated grid (0-indexed).
    pub index: usize,
    pub configuration: Configuration,
    pub status: TrialStatus,
    pub score: Option<f64>,
    pub skip_reason: Option<SkipReason>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the solver run, set once the trial finishes.
    pub duration_ms: Option<i64>,
    pub worker_id: Option<String>,
}

impl Trial {
    pub fn new(sweep_id: SweepId, index: usize, configuration: Configuration) -> Self {
        Self {
            id: Uuid::new_v4(),
            sweep_id,
            index,
            configuration,
            status: TrialStatus::Pending,
            score: None,
            skip_reason: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            duration_ms: None,
            worker_id: None,
        }
    }

    pub fn mark_running(&mut self, worker_id: Option<String>) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
        self.worker_id = worker_id;
    }

    pub fn mark_completed(&mut self, score: f64) {
        self.status = TrialStatus::Completed;
        self.finish();
        self.score = Some(score);
    }

    pub fn mark_skipped(&mut self, reason: SkipReason) {
        self.status = TrialStatus::Skipped;
        self.finish();
        self.skip_reason = Some(reason);
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = self
            .started_at
            .map(|start| (now - start).num_milliseconds());
    }

    /// The dataset row for this trial, present only when it was scored.
    pub fn outcome(&self) -> Option<ExperimentOutcome> {
        match (self.status, self.score) {
            (TrialStatus::Completed, Some(score)) => Some(ExperimentOutcome::new(
                self.index,
                self.configuration.clone(),
                score,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_types::ParameterValue;

    fn config(temp: i64) -> Configuration {
        Configuration::from_entries(vec![
            ("initial_temp".into(), ParameterValue::Int(temp)),
            ("cooling_rate".into(), ParameterValue::Float(0.99)),
        ])
    }

    fn completed(index: usize, score: f64) -> Trial {
        let mut trial = Trial::new(Uuid::new_v4(), index, config(1000));
        trial.mark_running(None);
        trial.mark_completed(score);
        trial
    }

    #[test]
    fn sweep_status_lifecycle() {
        let mut status = SweepStatus::new(3, 1);

        assert_eq!(status.state, SweepState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, SweepState::Running);
        assert!(status.started_at.is_some());

        status.record(&completed(0, 4.0));
        status.mark_finished();
        assert_eq!(status.state, SweepState::Completed);
        assert!(status.finished_at.is_some());
        assert!(status.elapsed_seconds.is_some_and(|secs| secs >= 0.0));
    }

    #[test]
    fn sweep_without_scores_finishes_empty() {
        let mut status = SweepStatus::new(1, 1);
        status.mark_running();

        let mut trial = Trial::new(status.id, 0, config(1000));
        trial.mark_running(None);
        trial.mark_skipped(SkipReason::ScoreNotFound);
        status.record(&trial);
        status.mark_finished();

        assert_eq!(status.state, SweepState::Empty);
        assert_eq!(status.trials_unscored, 1);
        assert!(status.best.is_none());
    }

    #[test]
    fn best_tracking_maximizes() {
        let mut status = SweepStatus::new(3, 1);
        status.record(&completed(0, 1.5));
        assert_eq!(status.best.as_ref().unwrap().best_score, 1.5);

        status.record(&completed(1, 2.0));
        assert_eq!(status.best.as_ref().unwrap().best_score, 2.0);

        // Worse result should not replace
        status.record(&completed(2, 1.0));
        assert_eq!(status.best.as_ref().unwrap().best_score, 2.0);
        assert_eq!(status.trials_completed, 3);
    }

    #[test]
    fn best_tie_keeps_earliest_index_even_out_of_order() {
        let mut status = SweepStatus::new(4, 2);
        status.record(&completed(3, 9.0));
        status.record(&completed(1, 9.0));
        assert_eq!(status.best.as_ref().unwrap().index, 1);
    }

    #[test]
    fn trial_lifecycle() {
        let mut trial = Trial::new(Uuid::new_v4(), 1, config(5000));
        assert_eq!(trial.status, TrialStatus::Pending);
        assert!(trial.outcome().is_none());

        trial.mark_running(Some("worker-0".into()));
        assert_eq!(trial.status, TrialStatus::Running);
        assert_eq!(trial.worker_id.as_deref(), Some("worker-0"));

        trial.mark_completed(-1.8);
        assert_eq!(trial.status, TrialStatus::Completed);
        assert!(trial.finished_at.is_some());
        assert!(trial.duration_ms.is_some_and(|ms| ms >= 0));

        let outcome = trial.outcome().unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.best_score, -1.8);
        assert_eq!(outcome.configuration, config(5000));
    }

    #[test]
    fn skipped_trial_counts_as_failure() {
        let mut status = SweepStatus::new(1, 1);
        let mut trial = Trial::new(status.id, 0, config(1000));
        trial.mark_running(None);
        trial.mark_skipped(SkipReason::Invocation {
            error: "non_zero_exit".into(),
            message: "Solver exited with exit code 1: boom".into(),
        });
        status.record(&trial);

        assert_eq!(trial.status, TrialStatus::Skipped);
        assert!(trial.outcome().is_none());
        assert_eq!(status.trials_failed, 1);
        assert_eq!(status.trials_unscored, 0);
    }

    #[test]
    fn skip_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(SkipReason::ScoreNotFound).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "score_not_found"}));
    }

    #[test]
    fn durations_are_serialized_once_finished() {
        let mut trial = Trial::new(Uuid::new_v4(), 0, config(1000));
        assert!(trial.duration_ms.is_none());
        trial.mark_running(None);
        trial.mark_skipped(SkipReason::ScoreNotFound);

        let json = serde_json::to_value(&trial).unwrap();
        assert!(json["duration_ms"].as_i64().is_some());

        let mut status = SweepStatus::new(1, 1);
        status.mark_running();
        status.record(&trial);
        status.mark_finished();
        let json = serde_json::to_value(&status).unwrap();
        assert!(json["elapsed_seconds"].as_f64().is_some());
    }
}
