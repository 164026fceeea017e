//! # sw-optimizer
//!
//! Sweep orchestration primitives for annealsweep.
//!
//! Provides exhaustive grid expansion of a parameter space, per-configuration
//! trial tracking with an aggregate sweep status, and a bounded worker pool for
//! running independent trials concurrently.

mod pool;
mod search;
mod trial;

pub use pool::WorkerPool;
pub use search::GridSearch;
pub use trial::{SkipReason, SweepId, SweepState, SweepStatus, Trial, TrialStatus};
