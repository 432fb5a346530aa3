//! Find the logic made useless by constant wires
//!
//! Forward propagation starts from wires forced to a constant, typically primary inputs: a node
//! whose inputs are all constant computes a constant, so it can be removed and its outputs are
//! constant in turn. Backward propagation starts from wires whose value does not matter anymore,
//! typically primary outputs forced to a constant: a node whose outputs are only read by such
//! logic is useless, and so are its own drivers in turn.

use crate::netlist::{Driver, NodeId, WireId};
use crate::Netlist;

/// Returns whether the wire carries a constant, given the wires tied so far
fn is_tied(netlist: &Netlist, tied: &[bool], wire: WireId) -> bool {
    let mut w = wire;
    loop {
        if tied[w.index()] {
            return true;
        }
        match netlist.driver(w) {
            Driver::Alias(s) => w = s,
            Driver::Constant(_) => return true,
            Driver::Node(n) => return netlist.is_deleted(n),
            Driver::Input(_) => return false,
        }
    }
}

/// Nodes that compute a constant once the given wires are tied to a constant
///
/// The nodes are returned in dependency order: a node comes after the nodes it reads from.
/// Deleted nodes are never returned, but their outputs are treated as constant.
pub fn propagate_from_constant_inputs(netlist: &Netlist, wires: &[WireId]) -> Vec<NodeId> {
    let mut tied = vec![false; netlist.nb_wires()];
    for w in wires {
        tied[w.index()] = true;
    }
    let mut visited = vec![false; netlist.nb_nodes()];
    let mut path = Vec::new();
    let mut to_visit: Vec<NodeId> = Vec::new();
    for w in wires.iter().rev() {
        to_visit.extend(netlist.consumers_of(*w).iter().rev());
    }
    while let Some(n) = to_visit.pop() {
        if visited[n.index()] {
            continue;
        }
        let node = netlist.node(n);
        if !netlist.is_deleted(n) {
            if !node.input_wires().all(|w| is_tied(netlist, &tied, w)) {
                continue;
            }
            path.push(n);
        }
        visited[n.index()] = true;
        let outputs: Vec<WireId> = node.output_wires().collect();
        for w in &outputs {
            tied[w.index()] = true;
        }
        for w in outputs.iter().rev() {
            to_visit.extend(netlist.consumers_of(*w).iter().rev());
        }
    }
    log::debug!(
        "forward propagation from {} wires: {} nodes",
        wires.len(),
        path.len()
    );
    path
}

/// Nodes whose value does not matter anymore once the given wires are forced to a constant
///
/// A node is useless if every output is either forced or only read by useless or deleted nodes,
/// and is not otherwise a primary output. The nodes are returned in discovery order, from the
/// forced wires towards the inputs. Deleted nodes are never returned.
pub fn propagate_from_constant_outputs(netlist: &Netlist, wires: &[WireId]) -> Vec<NodeId> {
    let mut forced = vec![false; netlist.nb_wires()];
    let mut forced_outputs = vec![false; netlist.nb_outputs()];
    for w in wires {
        forced[w.index()] = true;
        for (i, o) in netlist.outputs().iter().enumerate() {
            if o == w {
                forced_outputs[i] = true;
            }
        }
    }
    let mut visited = vec![false; netlist.nb_nodes()];
    let mut path = Vec::new();
    let mut to_visit: Vec<NodeId> = wires
        .iter()
        .rev()
        .filter_map(|w| netlist.drivers_of(*w))
        .collect();
    while let Some(n) = to_visit.pop() {
        if visited[n.index()] {
            continue;
        }
        let node = netlist.node(n);
        if !netlist.is_deleted(n) {
            let unneeded = node.output_wires().all(|w| {
                forced[w.index()]
                    || (netlist
                        .output_positions(w)
                        .iter()
                        .all(|p| forced_outputs[*p])
                        && netlist
                            .consumers_of(w)
                            .iter()
                            .all(|c| visited[c.index()] || netlist.is_deleted(*c)))
            });
            if !unneeded {
                continue;
            }
            path.push(n);
        }
        visited[n.index()] = true;
        to_visit.extend(netlist.parents(n).iter().rev());
    }
    log::debug!(
        "backward propagation from {} wires: {} nodes",
        wires.len(),
        path.len()
    );
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::generators::{adder, testcases};
    use crate::NetlistBuilder;

    fn wires(nl: &Netlist, names: &[&str]) -> Vec<WireId> {
        names.iter().map(|n| nl.wire(n).unwrap()).collect()
    }

    fn vars(nl: &Netlist, path: &[NodeId]) -> Vec<String> {
        path.iter().map(|n| nl.var(*n).to_owned()).collect()
    }

    #[test]
    fn test_single_input_is_not_enough() {
        let nl = testcases::and_or();
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["a"]));
        assert!(path.is_empty());
    }

    #[test]
    fn test_dependency_order() {
        let nl = testcases::and_or();
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["a", "b"]));
        assert_eq!(vars(&nl, &path), vec!["g1"]);
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["a", "b", "c"]));
        assert_eq!(vars(&nl, &path), vec!["g1", "g2"]);
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["c", "b", "a"]));
        assert_eq!(vars(&nl, &path), vec!["g1", "g2"]);
    }

    #[test]
    fn test_forward_fixed_point() {
        let nl = adder::ripple_carry(4);
        let start = wires(&nl, &["a[0]", "b[0]", "a[1]", "b[1]"]);
        let path = propagate_from_constant_inputs(&nl, &start);
        assert!(!path.is_empty());

        let mut extended = start.clone();
        for n in &path {
            extended.extend(nl.node(*n).output_wires());
        }
        let again = propagate_from_constant_inputs(&nl, &extended);
        for n in &again {
            assert!(path.contains(n));
        }
    }

    #[test]
    fn test_forward_through_deleted() {
        let mut nl = testcases::and_or();
        nl.delete("g1");
        // g1 is already gone, and its output is constant
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["a", "b", "c"]));
        assert_eq!(vars(&nl, &path), vec!["g2"]);
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["c"]));
        assert_eq!(vars(&nl, &path), vec!["g2"]);
    }

    #[test]
    fn test_forward_through_assignment() {
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_input("b").add_output("y");
        b.add_gate("NOT", "n1", &["a"]);
        b.add_assign("n2", "n1");
        b.add_gate("AND", "y", &["n2", "b"]);
        let nl = b.build().unwrap();
        let path = propagate_from_constant_inputs(&nl, &wires(&nl, &["a", "b"]));
        assert_eq!(vars(&nl, &path), vec!["n1", "y"]);
    }

    #[test]
    fn test_backward() {
        let nl = testcases::and_or();
        let path = propagate_from_constant_outputs(&nl, &wires(&nl, &["y"]));
        assert_eq!(vars(&nl, &path), vec!["g2", "g1"]);
        let path = propagate_from_constant_outputs(&nl, &wires(&nl, &["n1"]));
        assert_eq!(vars(&nl, &path), vec!["g1"]);
    }

    #[test]
    fn test_backward_shared_logic() {
        // The carry of bit 0 is shared with the higher bits: it is only useless once every output is forced
        let nl = adder::ripple_carry(2);
        let path = propagate_from_constant_outputs(&nl, &wires(&nl, &["s[0]"]));
        assert_eq!(vars(&nl, &path), vec!["xor0"]);
        let path = propagate_from_constant_outputs(&nl, &wires(&nl, &["s[0]", "s[1]", "s[2]"]));
        assert_eq!(path.len(), nl.nb_nodes());
    }

    #[test]
    fn test_backward_partial_output() {
        // A node driving both a forced and a free output stays
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_output("y").add_output("z");
        b.add_gate("NOT", "n", &["a"]);
        b.add_assign("y", "n");
        b.add_assign("z", "n");
        let nl = b.build().unwrap();
        assert!(propagate_from_constant_outputs(&nl, &wires(&nl, &["y"])).is_empty());
        assert_eq!(
            propagate_from_constant_outputs(&nl, &wires(&nl, &["y", "z"])).len(),
            1
        );
    }
}
