use itertools::Itertools;

use crate::driver::StopReason;
use crate::netlist::NodeId;
use crate::{EvalError, Netlist};

/// A state transition of the pruning driver
#[derive(Clone, Copy, Debug)]
pub enum PruneEvent<'a> {
    /// A strategy proposed a new round of candidates
    RoundStarted {
        /// Round number, starting at 0
        round: usize,
        /// Number of candidates in the round
        candidates: usize,
    },
    /// A candidate was applied to a copy of the committed netlist
    Tentative {
        /// Nodes marked deleted in the copy
        nodes: &'a [NodeId],
    },
    /// A batch of tentative netlists is being evaluated
    Evaluating {
        /// Number of netlists in the batch
        batch: usize,
    },
    /// A candidate was kept
    Committed {
        /// Nodes now deleted
        nodes: &'a [NodeId],
        /// Error of the new committed netlist
        error: f64,
    },
    /// A candidate exceeded the error threshold and was discarded
    RolledBack {
        /// Nodes of the candidate
        nodes: &'a [NodeId],
        /// Error the candidate would have caused
        error: f64,
    },
    /// A candidate could not be evaluated and was discarded
    EvaluationFailed {
        /// Nodes of the candidate
        nodes: &'a [NodeId],
        /// Cause of the failure
        error: &'a EvalError,
    },
    /// The run is over
    Finished {
        /// Why the run stopped
        stop: &'a StopReason,
        /// Error of the final netlist
        error: f64,
    },
}

/// Receives every transition of the pruning driver
///
/// The netlist given along the event is the committed one.
pub trait PruneObserver {
    /// Called on each transition
    fn on_event(&mut self, netlist: &Netlist, event: &PruneEvent);
}

fn vars(netlist: &Netlist, nodes: &[NodeId]) -> String {
    nodes.iter().map(|n| netlist.var(*n)).join(", ")
}

/// Forward driver decisions to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl PruneObserver for LogObserver {
    fn on_event(&mut self, netlist: &Netlist, event: &PruneEvent) {
        match event {
            PruneEvent::RoundStarted { round, candidates } => {
                log::info!("Round {}: {} candidates", round, candidates)
            }
            PruneEvent::Tentative { nodes } => {
                log::debug!("Trying to remove {}", vars(netlist, nodes))
            }
            PruneEvent::Evaluating { batch } => log::debug!("Evaluating {} candidates", batch),
            PruneEvent::Committed { nodes, error } => log::info!(
                "Removed {} (error {}, {} nodes deleted)",
                vars(netlist, nodes),
                error,
                netlist.nb_deleted()
            ),
            PruneEvent::RolledBack { nodes, error } => {
                log::info!("Kept {} (error would be {})", vars(netlist, nodes), error)
            }
            PruneEvent::EvaluationFailed { nodes, error } => {
                log::warn!("Evaluation of {} failed: {}", vars(netlist, nodes), error)
            }
            PruneEvent::Finished { stop, error } => log::info!(
                "Finished ({}) with error {} and {} nodes deleted",
                stop,
                error,
                netlist.nb_deleted()
            ),
        }
    }
}
