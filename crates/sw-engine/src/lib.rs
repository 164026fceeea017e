//! # sw-engine
//!
//! Executes parameter sweeps against an external solver: spawns one solver
//! process per configuration, pulls the score out of its stdout, isolates
//! failures, and persists the scored configurations.
//!
//! Process management ([`SolverInvoker`]) and output parsing
//! ([`ScoreExtractor`]) sit behind separate traits so either side can be
//! replaced or tested alone.

pub mod extract;
pub mod invoker;
pub mod runner;
pub mod store;

pub use extract::{MarkerExtractor, ScoreExtractor, DEFAULT_SCORE_MARKER};
pub use invoker::{ProcessInvoker, RawOutput, SolverInvoker};
pub use runner::{ExperimentRunner, SweepReport};
pub use store::{report, write_json, ResultStore, SweepSummary, DEFAULT_OUTPUT_PATH};
