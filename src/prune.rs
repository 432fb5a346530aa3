//! Pruning strategies
//!
//! Each strategy proposes nodes that could be removed from a netlist. None of them decides whether
//! the removal is acceptable: this is the role of the [`driver`](crate::driver).

mod carving;
mod constants;
mod probability;
mod significance;

pub use carving::{find_cuts, is_closed, Cut};
pub use constants::{propagate_from_constant_inputs, propagate_from_constant_outputs};
pub use probability::{rank_by_activity, ConstantCandidate};
pub use significance::{by_significance, default_output_significances, label_circuit};
