//! View of a pruned netlist, as it should be written out
//!
//! Deleted nodes disappear from the emitted netlist. Their output wires either disappear as well,
//! when nothing reads them anymore, or are driven by the constant replacing the node.

use crate::netlist::node::{Assignment, NodeId, WireId};
use crate::Netlist;

/// Content of a pruned netlist, ready to be written
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    /// Nodes that are kept, in declaration order
    pub nodes: Vec<NodeId>,
    /// Internal wires that are kept: neither primary inputs nor primary outputs
    pub wires: Vec<WireId>,
    /// Wires that disappear with the deleted nodes
    pub removed_wires: Vec<WireId>,
    /// Wires now driven by a constant in place of a deleted node
    pub constants: Vec<(WireId, bool)>,
    /// Assignments, all kept
    pub assignments: Vec<Assignment>,
}

impl Netlist {
    /// Compute what remains of the netlist after pruning
    pub fn emission(&self) -> Emission {
        let mut ret = Emission {
            assignments: self.assignments().to_vec(),
            ..Emission::default()
        };
        let mut removed = vec![false; self.nb_wires()];
        for n in self.node_ids() {
            if !self.is_deleted(n) {
                ret.nodes.push(n);
                continue;
            }
            let value = self.replacement_value(n);
            for w in self.node(n).output_wires() {
                if self.is_wire_unused(w) {
                    removed[w.index()] = true;
                    ret.removed_wires.push(w);
                } else {
                    ret.constants.push((w, value));
                }
            }
        }
        ret.removed_wires.sort();
        ret.constants.sort();
        for i in 0..self.nb_wires() {
            let w = WireId::from_index(i);
            if removed[i] || self.is_primary_input(w) || self.outputs().contains(&w) {
                continue;
            }
            ret.wires.push(w);
        }
        ret
    }
}
