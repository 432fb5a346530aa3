//! Representation and handling of gate-level netlists

mod builder;
mod emission;
pub mod generators;
mod netlist;
mod node;
pub mod stats;

pub use builder::NetlistBuilder;
pub use emission::Emission;
pub use netlist::Netlist;
pub use node::{
    bit_index, cell_family, default_input_port, Activity, AssignSource, Assignment, Driver, Node,
    NodeId, Port, WireId, DEFAULT_OUTPUT_PORT,
};
