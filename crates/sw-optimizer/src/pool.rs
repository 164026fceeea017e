//! Bounded worker pool for running independent trials concurrently.
//!
//! Jobs run on a dedicated rayon thread pool and report back over a
//! crossbeam channel as `(index, result)` messages. The caller observes each
//! completion as it arrives and receives the full result set rejoined in
//! submission order.

use crossbeam_channel::unbounded;
use sw_types::{internal_error, validation_error, SweepResult};
use tracing::debug;

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    workers: usize,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> SweepResult<Self> {
        if workers == 0 {
            return Err(validation_error!("worker count must be at least 1"));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sweep-worker-{i}"))
            .build()
            .map_err(|e| internal_error!("failed to build worker pool: {e}"))?;

        debug!(workers, "worker pool ready");
        Ok(Self { workers, pool })
    }

    /// Run `job` once per item.
    ///
    /// `job` receives the item's index, the item and the executing worker's
    /// label. `on_result` is called on the calling thread in completion order;
    /// the returned vector is in submission order.
    pub fn run_indexed<T, R, F, C>(&self, items: Vec<T>, job: F, mut on_result: C) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T, &str) -> R + Sync,
        C: FnMut(usize, &R),
    {
        let total = items.len();
        let mut results: Vec<(usize, R)> = self.pool.in_place_scope(|scope| {
            let (tx, rx) = unbounded();
            let job = &job;

            for (index, item) in items.into_iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let worker = rayon::current_thread_index()
                        .map(|i| format!("worker-{i}"))
                        .unwrap_or_else(|| "worker-?".to_string());
                    let result = job(index, item, &worker);
                    // Receiver lives until every sender is gone.
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            let mut collected = Vec::with_capacity(total);
            for (index, result) in rx {
                on_result(index, &result);
                collected.push((index, result));
            }
            collected
        });

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;
    use sw_types::SweepError;

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(SweepError::Validation(_))));
    }

    #[test]
    fn results_are_rejoined_in_submission_order() {
        let pool = WorkerPool::new(4).unwrap();
        let items: Vec<u64> = (0..16).collect();

        let results = pool.run_indexed(
            items,
            |index, item, _worker| {
                // Later items finish first.
                std::thread::sleep(Duration::from_millis(16 - item));
                (index, item * 10)
            },
            |_, _| {},
        );

        assert_eq!(results.len(), 16);
        for (position, (index, value)) in results.into_iter().enumerate() {
            assert_eq!(position, index);
            assert_eq!(value, position as u64 * 10);
        }
    }

    #[test]
    fn every_completion_is_observed_once() {
        let pool = WorkerPool::new(3).unwrap();
        let mut seen = Vec::new();
        pool.run_indexed(vec!['a', 'b', 'c', 'd', 'e'], |_, c, _| c, |index, _| {
            seen.push(index)
        });

        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn jobs_run_on_bounded_number_of_workers() {
        let pool = WorkerPool::new(2).unwrap();
        let labels = Mutex::new(HashSet::new());

        pool.run_indexed(
            (0..10).collect::<Vec<_>>(),
            |_, _, worker| {
                labels.lock().unwrap().insert(worker.to_string());
                std::thread::sleep(Duration::from_millis(2));
            },
            |_, _| {},
        );

        let labels = labels.into_inner().unwrap();
        assert!(!labels.is_empty() && labels.len() <= 2);
        assert!(labels.iter().all(|l| l.starts_with("worker-")));
    }

    #[test]
    fn empty_input_returns_empty_output() {
        let pool = WorkerPool::new(2).unwrap();
        let results: Vec<u8> = pool.run_indexed(Vec::<u8>::new(), |_, v, _| v, |_, _| {});
        assert!(results.is_empty());
    }
}
