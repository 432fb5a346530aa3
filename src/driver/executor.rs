use rayon::prelude::*;

use crate::driver::Evaluator;
use crate::{EvalError, Netlist};

/// Runs the evaluation of a batch of tentative netlists
///
/// Results are returned in the order of the batch.
pub trait Executor {
    /// Number of candidates worth evaluating at once
    fn width(&self) -> usize;

    /// Evaluate every netlist of the batch
    fn evaluate_batch(
        &self,
        evaluator: &dyn Evaluator,
        netlists: &[Netlist],
    ) -> Vec<Result<f64, EvalError>>;
}

/// Evaluate one candidate at a time on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential;

impl Executor for Sequential {
    fn width(&self) -> usize {
        1
    }

    fn evaluate_batch(
        &self,
        evaluator: &dyn Evaluator,
        netlists: &[Netlist],
    ) -> Vec<Result<f64, EvalError>> {
        netlists.iter().map(|n| evaluator.evaluate(n)).collect()
    }
}

/// Evaluate candidates concurrently on a dedicated rayon pool
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    jobs: usize,
}

impl ThreadPool {
    /// Create a pool with the given number of threads
    pub fn new(jobs: usize) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        Ok(ThreadPool { pool, jobs })
    }
}

impl Executor for ThreadPool {
    fn width(&self) -> usize {
        self.jobs
    }

    fn evaluate_batch(
        &self,
        evaluator: &dyn Evaluator,
        netlists: &[Netlist],
    ) -> Vec<Result<f64, EvalError>> {
        self.pool
            .install(|| netlists.par_iter().map(|n| evaluator.evaluate(n)).collect())
    }
}

/// Executor for a number of jobs; falls back to sequential evaluation if no pool can be created
pub fn executor_for(jobs: usize) -> Box<dyn Executor> {
    if jobs <= 1 {
        return Box::new(Sequential);
    }
    match ThreadPool::new(jobs) {
        Ok(pool) => Box::new(pool),
        Err(e) => {
            log::warn!("Could not create a pool of {} threads: {}", jobs, e);
            Box::new(Sequential)
        }
    }
}
