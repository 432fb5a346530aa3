use core::fmt;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::netlist::node::{Activity, AssignSource, Assignment, Driver, Node, NodeId, WireId};

/// Structure of a netlist, shared between all copies made during pruning
#[derive(Debug, Clone, Default)]
pub(crate) struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) wire_names: Vec<String>,
    pub(crate) wire_ids: FxHashMap<String, WireId>,
    pub(crate) node_ids: FxHashMap<String, NodeId>,
    pub(crate) inputs: Vec<WireId>,
    pub(crate) outputs: Vec<WireId>,
    pub(crate) assignments: Vec<Assignment>,
    /// Direct driver of each wire
    pub(crate) drivers: Vec<Driver>,
    /// Wire each wire is a copy of, after following assignments
    pub(crate) roots: Vec<WireId>,
    /// Nodes reading each wire, directly or through assignments
    pub(crate) consumers: Vec<Vec<NodeId>>,
    /// Primary output positions reached by each wire, directly or through assignments
    pub(crate) output_positions: Vec<Vec<usize>>,
    /// Distinct nodes driving the inputs of each node
    pub(crate) parents: Vec<Vec<NodeId>>,
    /// Distinct nodes reading the outputs of each node
    pub(crate) children: Vec<Vec<NodeId>>,
    /// Nodes in topological order
    pub(crate) order: Vec<NodeId>,
}

/// A gate-level netlist with pruning annotations
///
/// The structure (nodes, ports, wires, primary inputs and outputs, assignments) is immutable once
/// built and shared between copies. Each copy carries its own annotations: deletion marks,
/// constant overrides and significance labels. Cloning a netlist is therefore cheap, and a copy
/// can be modified and evaluated without affecting the original.
#[derive(Debug, Clone)]
pub struct Netlist {
    topo: Arc<Topology>,
    deleted: Vec<bool>,
    constant: Vec<Option<bool>>,
    activity: Arc<Vec<Option<Activity>>>,
    significance: Vec<Option<f64>>,
    output_significance: Vec<f64>,
}

impl Netlist {
    pub(crate) fn from_topology(topo: Topology) -> Netlist {
        let n = topo.nodes.len();
        Netlist {
            topo: Arc::new(topo),
            deleted: vec![false; n],
            constant: vec![None; n],
            activity: Arc::new(vec![None; n]),
            significance: vec![None; n],
            output_significance: Vec::new(),
        }
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.topo.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.topo.outputs.len()
    }

    /// Return the number of nodes, deleted or not
    pub fn nb_nodes(&self) -> usize {
        self.topo.nodes.len()
    }

    /// Return the number of wires
    pub fn nb_wires(&self) -> usize {
        self.topo.wire_names.len()
    }

    /// Get the primary input at index i
    pub fn input(&self, i: usize) -> WireId {
        self.topo.inputs[i]
    }

    /// Get the primary output at index i
    pub fn output(&self, i: usize) -> WireId {
        self.topo.outputs[i]
    }

    /// Primary inputs, in declaration order
    pub fn inputs(&self) -> &[WireId] {
        &self.topo.inputs
    }

    /// Primary outputs, in declaration order
    pub fn outputs(&self) -> &[WireId] {
        &self.topo.outputs
    }

    /// Continuous assignments, in declaration order
    pub fn assignments(&self) -> &[Assignment] {
        &self.topo.assignments
    }

    /// Get the node with this index
    pub fn node(&self, n: NodeId) -> &Node {
        &self.topo.nodes[n.index()]
    }

    /// Iterate over all node indices in declaration order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nb_nodes()).map(NodeId::from_index)
    }

    /// Iterate over the nodes that are not deleted, in declaration order
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|n| !self.is_deleted(*n))
    }

    /// Find a node by instance name
    pub fn node_id(&self, var: &str) -> Option<NodeId> {
        self.topo.node_ids.get(var).copied()
    }

    /// Instance name of a node
    pub fn var(&self, n: NodeId) -> &str {
        &self.node(n).var
    }

    /// Find a wire by name
    pub fn wire(&self, name: &str) -> Option<WireId> {
        self.topo.wire_ids.get(name).copied()
    }

    /// Name of a wire
    pub fn wire_name(&self, w: WireId) -> &str {
        &self.topo.wire_names[w.index()]
    }

    /// Direct driver of a wire
    pub fn driver(&self, w: WireId) -> Driver {
        self.topo.drivers[w.index()]
    }

    /// Wire that a wire copies, following assignments; the wire itself if it is not assigned
    pub fn root(&self, w: WireId) -> WireId {
        self.topo.roots[w.index()]
    }

    /// Node driving a wire, following assignments
    ///
    /// Returns None for wires driven by a primary input or a constant.
    pub fn drivers_of(&self, w: WireId) -> Option<NodeId> {
        match self.driver(self.root(w)) {
            Driver::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Nodes reading a wire, directly or through assignments, in declaration order
    pub fn consumers_of(&self, w: WireId) -> &[NodeId] {
        &self.topo.consumers[w.index()]
    }

    /// Distinct nodes driving the inputs of a node, in declaration order
    pub fn parents(&self, n: NodeId) -> &[NodeId] {
        &self.topo.parents[n.index()]
    }

    /// Distinct nodes reading the outputs of a node, in declaration order
    pub fn children(&self, n: NodeId) -> &[NodeId] {
        &self.topo.children[n.index()]
    }

    /// Parents that are not deleted
    pub fn live_parents(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.parents(n).iter().copied().filter(|p| !self.is_deleted(*p))
    }

    /// Children that are not deleted
    pub fn live_children(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(n).iter().copied().filter(|c| !self.is_deleted(*c))
    }

    /// Primary output positions a wire reaches, directly or through assignments
    pub fn output_positions(&self, w: WireId) -> &[usize] {
        &self.topo.output_positions[w.index()]
    }

    /// Returns whether the wire is a primary input
    pub fn is_primary_input(&self, w: WireId) -> bool {
        matches!(self.driver(w), Driver::Input(_))
    }

    /// Returns whether the wire is a primary output, directly or through assignments
    pub fn is_primary_output(&self, w: WireId) -> bool {
        !self.output_positions(w).is_empty()
    }

    /// Returns whether one of the node outputs is a primary output
    pub fn drives_output(&self, n: NodeId) -> bool {
        self.node(n)
            .output_wires()
            .any(|w| self.is_primary_output(w))
    }

    /// Returns whether one of the node inputs comes from a primary input
    pub fn reads_primary_input(&self, n: NodeId) -> bool {
        self.node(n)
            .input_wires()
            .any(|w| self.is_primary_input(self.root(w)))
    }

    /// Nodes in topological order: every node comes after the nodes driving it
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo.order
    }

    /// Returns whether a node is marked as deleted
    pub fn is_deleted(&self, n: NodeId) -> bool {
        self.deleted[n.index()]
    }

    /// Return the number of deleted nodes
    pub fn nb_deleted(&self) -> usize {
        self.deleted.iter().filter(|d| **d).count()
    }

    /// Deleted nodes, in declaration order
    pub fn deleted_nodes(&self) -> Vec<NodeId> {
        self.node_ids().filter(|n| self.is_deleted(*n)).collect()
    }

    /// Mark a node as deleted. Returns whether the mark changed
    pub fn delete_node(&mut self, n: NodeId) -> bool {
        let was_deleted = self.deleted[n.index()];
        self.deleted[n.index()] = true;
        !was_deleted
    }

    /// Clear the deletion mark of a node. Returns whether the mark changed
    pub fn undelete_node(&mut self, n: NodeId) -> bool {
        let was_deleted = self.deleted[n.index()];
        self.deleted[n.index()] = false;
        was_deleted
    }

    /// Mark a node as deleted by instance name
    ///
    /// Returns false, with a warning, if no node has this name.
    pub fn delete(&mut self, var: &str) -> bool {
        match self.node_id(var) {
            Some(n) => {
                self.delete_node(n);
                true
            }
            None => {
                log::warn!("cannot delete {}: no such instance", var);
                false
            }
        }
    }

    /// Clear the deletion mark of a node by instance name
    ///
    /// Returns false, with a warning, if no node has this name.
    pub fn undelete(&mut self, var: &str) -> bool {
        match self.node_id(var) {
            Some(n) => {
                self.undelete_node(n);
                true
            }
            None => {
                log::warn!("cannot undelete {}: no such instance", var);
                false
            }
        }
    }

    /// Clear all deletion marks
    pub fn undelete_all(&mut self) {
        self.deleted.fill(false);
    }

    /// Force the value used in place of a node when it is deleted
    pub fn set_constant(&mut self, n: NodeId, value: Option<bool>) {
        self.constant[n.index()] = value;
    }

    /// Forced replacement value of a node, if any
    pub fn constant_override(&self, n: NodeId) -> Option<bool> {
        self.constant[n.index()]
    }

    /// Switching activity of a node, if it was annotated
    pub fn activity(&self, n: NodeId) -> Option<Activity> {
        self.activity[n.index()]
    }

    /// Annotate the switching activity of a node
    pub fn set_activity(&mut self, n: NodeId, activity: Option<Activity>) {
        Arc::make_mut(&mut self.activity)[n.index()] = activity;
    }

    /// Constant suggested by switching activity: 1 if the node is 1 more often than 0, otherwise 0
    ///
    /// Without activity data, this is 0.
    pub fn constant_replacement_value(&self, n: NodeId) -> bool {
        self.activity(n).map(|a| a.majority()).unwrap_or(false)
    }

    /// Value that replaces the outputs of a deleted node
    pub fn replacement_value(&self, n: NodeId) -> bool {
        self.constant_override(n)
            .unwrap_or_else(|| self.constant_replacement_value(n))
    }

    /// Returns whether a node can be removed without a constant in its place
    ///
    /// This is the case if none of its outputs is a primary output and every node reading them is deleted.
    pub fn is_node_deletable(&self, n: NodeId) -> bool {
        self.node(n).output_wires().all(|w| self.is_wire_unused(w))
    }

    /// Returns whether no primary output and no live node reads the wire
    pub fn is_wire_unused(&self, w: WireId) -> bool {
        !self.is_primary_output(w) && self.consumers_of(w).iter().all(|c| self.is_deleted(*c))
    }

    /// Constant value carried by a wire, if it is driven by a constant or by a deleted node
    pub fn constant_value(&self, w: WireId) -> Option<bool> {
        match self.driver(self.root(w)) {
            Driver::Constant(b) => Some(b),
            Driver::Node(n) if self.is_deleted(n) => Some(self.replacement_value(n)),
            _ => None,
        }
    }

    /// Significance label of a node, if labeled
    pub fn significance(&self, n: NodeId) -> Option<f64> {
        self.significance[n.index()]
    }

    pub(crate) fn set_significance(&mut self, n: NodeId, value: f64) {
        self.significance[n.index()] = Some(value);
    }

    /// Significance of the primary output at index i, if labeled
    pub fn output_significance(&self, i: usize) -> Option<f64> {
        self.output_significance.get(i).copied()
    }

    pub(crate) fn set_output_significances(&mut self, sigs: Vec<f64>) {
        assert_eq!(sigs.len(), self.nb_outputs());
        self.output_significance = sigs;
    }

    /// Returns whether significance labels are present on the outputs and all nodes
    pub fn is_labeled(&self) -> bool {
        self.output_significance.len() == self.nb_outputs()
            && self.significance.iter().all(|s| s.is_some())
    }

    /// Remove all significance labels
    pub fn clear_significance(&mut self) {
        self.significance.fill(None);
        self.output_significance.clear();
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Netlist with {} inputs, {} outputs, {} nodes ({} deleted):",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_nodes(),
            self.nb_deleted()
        )?;
        for n in self.node_ids() {
            let node = self.node(n);
            let ports = node
                .inputs()
                .iter()
                .chain(node.outputs())
                .map(|p| format!(".{}({})", p.name, self.wire_name(p.wire)))
                .collect::<Vec<_>>()
                .join(", ");
            let mark = if self.is_deleted(n) { " (deleted)" } else { "" };
            writeln!(f, "\t{} {}({}){}", node.cell(), node.var(), ports, mark)?;
        }
        for a in self.assignments() {
            match a.source {
                AssignSource::Wire(s) => {
                    writeln!(f, "\t{} = {}", self.wire_name(a.target), self.wire_name(s))?
                }
                AssignSource::Constant(b) => {
                    writeln!(f, "\t{} = {}", self.wire_name(a.target), b as u8)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::netlist::node::{Activity, Driver};
    use crate::NetlistBuilder;

    fn and_or() -> crate::Netlist {
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_input("b").add_input("c").add_output("y");
        b.add_node("AND2_X1", "g1", &[("A1", "a"), ("A2", "b")], &[("ZN", "n1")]);
        b.add_node("OR2_X1", "g2", &[("A1", "n1"), ("A2", "c")], &[("ZN", "y")]);
        b.build().unwrap()
    }

    #[test]
    fn test_basic() {
        let nl = and_or();
        assert_eq!(nl.nb_inputs(), 3);
        assert_eq!(nl.nb_outputs(), 1);
        assert_eq!(nl.nb_nodes(), 2);
        let g1 = nl.node_id("g1").unwrap();
        let g2 = nl.node_id("g2").unwrap();
        let n1 = nl.wire("n1").unwrap();
        let y = nl.wire("y").unwrap();
        assert_eq!(nl.drivers_of(n1), Some(g1));
        assert_eq!(nl.consumers_of(n1), &[g2]);
        assert_eq!(nl.drivers_of(nl.wire("a").unwrap()), None);
        assert!(nl.is_primary_output(y));
        assert!(!nl.is_primary_output(n1));
        assert_eq!(nl.parents(g2), &[g1]);
        assert_eq!(nl.children(g1), &[g2]);
        assert_eq!(nl.topological_order(), &[g1, g2]);
        assert_eq!(nl.driver(y), Driver::Node(g2));
    }

    #[test]
    fn test_delete_undelete() {
        let mut nl = and_or();
        let g1 = nl.node_id("g1").unwrap();
        assert!(nl.delete("g1"));
        assert!(nl.delete("g1"));
        assert!(nl.is_deleted(g1));
        assert_eq!(nl.nb_deleted(), 1);
        assert!(nl.undelete("g1"));
        assert!(nl.undelete("g1"));
        assert!(!nl.is_deleted(g1));

        // Unknown names leave the netlist untouched
        assert!(!nl.delete("nope"));
        assert!(!nl.undelete("nope"));
        assert_eq!(nl.nb_deleted(), 0);
    }

    #[test]
    fn test_deletable() {
        let mut nl = and_or();
        let g1 = nl.node_id("g1").unwrap();
        let g2 = nl.node_id("g2").unwrap();
        // g1 feeds a live node; g2 drives an output
        assert!(!nl.is_node_deletable(g1));
        assert!(!nl.is_node_deletable(g2));
        nl.delete_node(g2);
        assert!(nl.is_node_deletable(g1));
        assert!(!nl.is_node_deletable(g2));
    }

    #[test]
    fn test_copies_are_independent() {
        let nl = and_or();
        let mut copy = nl.clone();
        copy.delete("g2");
        assert_eq!(nl.nb_deleted(), 0);
        assert_eq!(copy.nb_deleted(), 1);
    }

    #[test]
    fn test_replacement_value() {
        let mut nl = and_or();
        let g1 = nl.node_id("g1").unwrap();
        let n1 = nl.wire("n1").unwrap();
        assert!(!nl.constant_replacement_value(g1));
        nl.set_activity(
            g1,
            Some(Activity {
                t0: 30,
                t1: 70,
                toggles: 5,
            }),
        );
        assert!(nl.constant_replacement_value(g1));
        assert_eq!(nl.constant_value(n1), None);
        nl.delete_node(g1);
        assert_eq!(nl.constant_value(n1), Some(true));
        nl.set_constant(g1, Some(false));
        assert_eq!(nl.constant_value(n1), Some(false));
    }
}
