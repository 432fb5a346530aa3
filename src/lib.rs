//! Approximate logic synthesis by netlist pruning
//!
//! This crate removes logic from a gate-level netlist while keeping the error of its outputs
//! below a user-given bound. The pruned circuit is smaller and cheaper, at the cost of accuracy.
//!
//! # Usage
//!
//! Axprune works on gate-level netlists. At the moment, .bench files can be read,
//! and pruned netlists can be written as .bench or structural Verilog.
//!
//! ```bash
//! # Show available commands
//! axprune help
//! # Rank nodes by significance
//! axprune rank mydesign.bench
//! # Prune with constant inputs, bit by bit, with a mean error distance of at most 4
//! axprune prune mydesign.bench --method inconst --max-error 4 -o pruned.v
//! # Carve cuts of low significance, evaluating 8 candidates in parallel
//! axprune prune mydesign.bench --method ccarving --max-error 16 -j 8 -o pruned.v
//! ```
//!
//! # Development
//!
//! ## Datastructures
//!
//! [`Netlist`] is an immutable graph of cell instances connected by wires, with the usual
//! lookup indices: the node driving a wire, the nodes reading it, and a topological order.
//! Pruning never modifies the structure. Instead, each node carries marks: deleted or not,
//! an optional replacement constant, its switching activity and its significance. Copies of a
//! netlist share the structure and only duplicate the marks, so that many tentative versions
//! can be explored at once.
//!
//! Here is a full adder built from generic cells:
//! ```
//! # use axprune::NetlistBuilder;
//! let mut b = NetlistBuilder::new();
//! b.add_input("a").add_input("b").add_input("cin");
//! b.add_output("s").add_output("cout");
//! b.add_gate("XOR", "p", &["a", "b"]);
//! b.add_gate("XOR", "s", &["p", "cin"]);
//! b.add_gate("MAJ", "cout", &["a", "b", "cin"]);
//! let netlist = b.build().unwrap();
//! assert_eq!(netlist.nb_nodes(), 3);
//! ```
//!
//! ## Algorithms
//!
//! Strategies in [`prune`] propose nodes to remove: constant propagation from inputs or outputs,
//! significance labeling, cut carving and activity ranking. The [`driver`] applies the candidates
//! and keeps them if the error reported by an evaluator stays within bounds; [`sim`] provides an
//! evaluator based on bit-parallel simulation.

#![warn(missing_docs)]

pub mod driver;
mod error;
pub mod io;
pub mod netlist;
pub mod prune;
pub mod sim;

pub use error::{ConfigError, EvalError, FileError, NetlistError, PruneError};
pub use netlist::{Netlist, NetlistBuilder};
