//! Iterative pruning driver
//!
//! The driver asks a [`Strategy`] for rounds of candidates, applies each candidate to a copy of the
//! committed netlist, and keeps it if the [`Evaluator`] reports an error within the threshold.
//! A rejected candidate is simply dropped: the committed netlist is never modified before the
//! evaluation succeeds.
//!
//! Candidates may be evaluated concurrently by an [`Executor`]. All candidates of a batch are
//! evaluated against the same committed netlist; results are then processed in candidate order,
//! and the candidates following a commit are evaluated again on the new netlist. The outcome is
//! the same as a sequential evaluation.
//!
//! ```
//! # use axprune::driver::{Driver, Method, PruneConfig};
//! # use axprune::netlist::generators::adder;
//! # use axprune::sim::{Dataset, Metric, SimulationEvaluator};
//! let netlist = adder::ripple_carry(4);
//! let dataset = Dataset::exhaustive(netlist.nb_inputs()).unwrap();
//! let evaluator = SimulationEvaluator::new(&netlist, dataset, Metric::Med).unwrap();
//! let mut config = PruneConfig::new(Method::Significance, 1.0);
//! config.jobs = 2;
//! let outcome = Driver::new(config, &evaluator).run(&netlist).unwrap();
//! assert!(outcome.error <= 1.0);
//! ```

mod config;
mod executor;
mod observer;
mod strategy;

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::netlist::NodeId;
use crate::{EvalError, Netlist, PruneError};

pub use config::{FailurePolicy, Method, PruneConfig};
pub use executor::{executor_for, Executor, Sequential, ThreadPool};
pub use observer::{LogObserver, PruneEvent, PruneObserver};
pub use strategy::{
    strategy_for, ActivityFlow, BitFlow, CarvingFlow, Side, SignificanceFlow, Strategy,
};

/// Scores a tentative netlist
///
/// A failure to evaluate is reported as an error, never as a score.
pub trait Evaluator: Sync {
    /// Error of the netlist compared to the original circuit
    fn evaluate(&self, netlist: &Netlist) -> Result<f64, EvalError>;
}

/// A set of nodes to delete together
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Nodes to delete
    pub nodes: Vec<NodeId>,
    /// Try the nodes one by one if the whole set is rejected
    pub split_on_reject: bool,
}

impl Candidate {
    /// A single node
    pub fn single(node: NodeId) -> Candidate {
        Candidate {
            nodes: vec![node],
            split_on_reject: false,
        }
    }

    /// A group of nodes, tried one by one if rejected
    pub fn group(nodes: Vec<NodeId>) -> Candidate {
        let split_on_reject = nodes.len() > 1;
        Candidate {
            nodes,
            split_on_reject,
        }
    }

    /// Never split this candidate
    pub fn without_split(mut self) -> Candidate {
        self.split_on_reject = false;
        self
    }

    fn split(&self) -> Vec<Candidate> {
        self.nodes.iter().map(|n| Candidate::single(*n)).collect()
    }
}

/// Shared flag to stop a run between two evaluations
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    /// Request the run to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a pruning run ended
#[derive(Clone, Debug, PartialEq)]
pub enum StopReason {
    /// The error is exactly the threshold
    TargetReached,
    /// The strategy has no candidate left
    Exhausted,
    /// The maximum number of evaluations was reached
    IterationBudget,
    /// The run was cancelled
    Cancelled,
    /// An evaluation failed and the policy is to abort
    EvaluationFailed(EvalError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "error threshold reached"),
            StopReason::Exhausted => write!(f, "no candidate left"),
            StopReason::IterationBudget => write!(f, "iteration budget exhausted"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::EvaluationFailed(e) => write!(f, "{}", e),
        }
    }
}

/// Result of a pruning run
#[derive(Clone, Debug)]
pub struct Outcome {
    /// Last committed netlist
    pub netlist: Netlist,
    /// Error of the last committed netlist
    pub error: f64,
    /// Why the run ended
    pub stop: StopReason,
    /// Number of evaluations whose result was used
    pub evaluations: usize,
    /// Deleted nodes, in commit order
    pub committed: Vec<NodeId>,
    /// Number of candidates rejected for exceeding the threshold
    pub rejected: usize,
    /// Number of candidates whose evaluation failed
    pub failed: usize,
}

struct RunState {
    current: Netlist,
    error: f64,
    evaluations: usize,
    committed: Vec<NodeId>,
    rejected: usize,
    failed: usize,
}

/// The pruning loop
pub struct Driver<'a> {
    config: PruneConfig,
    evaluator: &'a dyn Evaluator,
    executor: Box<dyn Executor + 'a>,
    observers: Vec<Box<dyn PruneObserver + 'a>>,
    cancel: CancellationToken,
}

impl<'a> Driver<'a> {
    /// Create a driver, with an executor matching the number of jobs of the configuration
    pub fn new(config: PruneConfig, evaluator: &'a dyn Evaluator) -> Driver<'a> {
        let executor = executor_for(config.jobs);
        Driver {
            config,
            evaluator,
            executor,
            observers: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use a specific executor
    pub fn with_executor(mut self, executor: Box<dyn Executor + 'a>) -> Driver<'a> {
        self.executor = executor;
        self
    }

    /// Register an observer of the driver transitions
    pub fn add_observer(&mut self, observer: Box<dyn PruneObserver + 'a>) {
        self.observers.push(observer);
    }

    /// Token to cancel the run from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Return the configuration
    pub fn config(&self) -> &PruneConfig {
        &self.config
    }

    fn notify(&mut self, netlist: &Netlist, event: PruneEvent) {
        for o in &mut self.observers {
            o.on_event(netlist, &event);
        }
    }

    /// Prune a netlist
    ///
    /// The netlist given is the reference, with an error of 0.
    pub fn run(&mut self, netlist: &Netlist) -> Result<Outcome, PruneError> {
        self.config.validate()?;
        log::info!(
            "Pruning {} nodes with method {}, error threshold {}",
            netlist.nb_nodes() - netlist.nb_deleted(),
            self.config.method,
            self.config.max_error
        );
        let mut strategy = strategy_for(netlist, &self.config);
        let mut state = RunState {
            current: netlist.clone(),
            error: 0.0,
            evaluations: 0,
            committed: Vec::new(),
            rejected: 0,
            failed: 0,
        };
        let stop = self.explore(strategy.as_mut(), &mut state)?;
        self.notify(
            &state.current,
            PruneEvent::Finished {
                stop: &stop,
                error: state.error,
            },
        );
        Ok(Outcome {
            netlist: state.current,
            error: state.error,
            stop,
            evaluations: state.evaluations,
            committed: state.committed,
            rejected: state.rejected,
            failed: state.failed,
        })
    }

    fn explore(
        &mut self,
        strategy: &mut dyn Strategy,
        st: &mut RunState,
    ) -> Result<StopReason, PruneError> {
        let mut progressed = false;
        let mut round = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }
            let Some(candidates) = strategy.next_round(&st.current, progressed)? else {
                return Ok(StopReason::Exhausted);
            };
            self.notify(
                &st.current,
                PruneEvent::RoundStarted {
                    round,
                    candidates: candidates.len(),
                },
            );
            round += 1;
            progressed = false;
            let mut queue: VecDeque<Candidate> = candidates.into();
            while !queue.is_empty() {
                if self.cancel.is_cancelled() {
                    return Ok(StopReason::Cancelled);
                }
                let remaining = match self.config.max_iterations {
                    Some(m) if st.evaluations >= m => return Ok(StopReason::IterationBudget),
                    Some(m) => m - st.evaluations,
                    None => usize::MAX,
                };
                let width = self.executor.width().max(1).min(remaining);

                let mut batch = Vec::new();
                let mut tentatives = Vec::new();
                while batch.len() < width {
                    let Some(mut c) = queue.pop_front() else {
                        break;
                    };
                    c.nodes.retain(|n| !st.current.is_deleted(*n));
                    if c.nodes.is_empty() {
                        continue;
                    }
                    let mut tentative = st.current.clone();
                    for n in &c.nodes {
                        tentative.delete_node(*n);
                    }
                    self.notify(&st.current, PruneEvent::Tentative { nodes: &c.nodes });
                    batch.push(c);
                    tentatives.push(tentative);
                }
                if batch.is_empty() {
                    break;
                }

                self.notify(&st.current, PruneEvent::Evaluating { batch: batch.len() });
                let results = self.executor.evaluate_batch(self.evaluator, &tentatives);

                let mut requeue = Vec::new();
                let mut items = batch.into_iter().zip(tentatives).zip(results);
                while let Some(((c, tentative), result)) = items.next() {
                    st.evaluations += 1;
                    match result {
                        Ok(error) if error <= self.config.max_error => {
                            st.current = tentative;
                            st.error = error;
                            st.committed.extend(&c.nodes);
                            progressed = true;
                            self.notify(
                                &st.current,
                                PruneEvent::Committed {
                                    nodes: &c.nodes,
                                    error,
                                },
                            );
                            if error == self.config.max_error {
                                return Ok(StopReason::TargetReached);
                            }
                            // Evaluated against a stale netlist
                            requeue.extend(items.by_ref().map(|((c, _), _)| c));
                        }
                        Ok(error) => {
                            st.rejected += 1;
                            self.notify(
                                &st.current,
                                PruneEvent::RolledBack {
                                    nodes: &c.nodes,
                                    error,
                                },
                            );
                            if c.split_on_reject && c.nodes.len() > 1 {
                                requeue.extend(c.split());
                                requeue.extend(items.by_ref().map(|((c, _), _)| c));
                            }
                        }
                        Err(error) => {
                            st.failed += 1;
                            self.notify(
                                &st.current,
                                PruneEvent::EvaluationFailed {
                                    nodes: &c.nodes,
                                    error: &error,
                                },
                            );
                            if self.config.on_failure == FailurePolicy::Abort {
                                return Ok(StopReason::EvaluationFailed(error));
                            }
                        }
                    }
                }
                for c in requeue.into_iter().rev() {
                    queue.push_front(c);
                }
            }
        }
    }
}
