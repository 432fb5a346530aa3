//! Cut carving: find large closed sets of nodes that can be removed together
//!
//! A cut is closed when removing it leaves no orphan around it: every live node outside the cut
//! that feeds the cut still has a consumer outside the cut, and every live node outside the cut
//! that reads from the cut still has a producer outside the cut. Primary outputs count as
//! consumers outside the cut, primary inputs and constants as producers outside the cut.
//!
//! The difference of a cut estimates the error introduced by removing it. It is the significance
//! of the primary outputs driven by the cut, plus the significance of the live nodes reading from
//! the cut. A node reading from the cut that is itself downstream of another such node is not
//! counted twice, as its significance is already part of the upstream one. The difference only
//! depends on the set of nodes, not on the order in which they were added.
//!
//! Cuts are grown greedily from the most significant affordable nodes, keeping the largest cut
//! found (lowest difference on ties), until no node can be added anymore.

use std::collections::VecDeque;

use fxhash::FxHashSet;

use crate::netlist::NodeId;
use crate::{Netlist, PruneError};

/// A set of nodes to be removed together
#[derive(Clone, Debug)]
pub struct Cut {
    nodes: Vec<NodeId>,
    member: Vec<bool>,
    difference: f64,
}

impl Cut {
    fn new(nb_nodes: usize) -> Cut {
        Cut {
            nodes: Vec::new(),
            member: vec![false; nb_nodes],
            difference: 0.0,
        }
    }

    /// Nodes of the cut, in the order they were added
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of nodes in the cut
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the cut is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Estimated error introduced by removing the cut
    pub fn difference(&self) -> f64 {
        self.difference
    }

    /// Returns whether the node belongs to the cut
    pub fn contains(&self, n: NodeId) -> bool {
        self.member[n.index()]
    }

    fn push(&mut self, n: NodeId) {
        self.member[n.index()] = true;
        self.nodes.push(n);
    }

    /// Remove the nodes added after the first `len`, restoring the difference
    fn truncate(&mut self, len: usize, difference: f64) {
        for n in self.nodes.drain(len..) {
            self.member[n.index()] = false;
        }
        self.difference = difference;
    }

    /// Returns whether this cut is a better pick than another: larger, then lower difference
    fn is_better_than(&self, other: &Cut) -> bool {
        self.size() > other.size()
            || (self.size() == other.size() && self.difference < other.difference)
    }
}

/// Returns whether the node has a live consumer outside the cut, or drives a primary output
fn has_outside_consumer(netlist: &Netlist, member: &[bool], n: NodeId) -> bool {
    netlist.drives_output(n) || netlist.live_children(n).any(|c| !member[c.index()])
}

/// Returns whether the node has a live producer outside the cut, or reads a primary input or a constant
fn has_outside_producer(netlist: &Netlist, member: &[bool], n: NodeId) -> bool {
    netlist
        .node(n)
        .input_wires()
        .any(|w| netlist.drivers_of(w).is_none())
        || netlist.live_parents(n).any(|p| !member[p.index()])
}

/// Difference of a set of nodes
fn difference(netlist: &Netlist, cut: &Cut) -> Result<f64, PruneError> {
    let mut ret = 0.0;
    let mut boundary = Vec::new();
    let mut in_boundary = FxHashSet::default();
    for &n in &cut.nodes {
        for w in netlist.node(n).output_wires() {
            for p in netlist.output_positions(w) {
                ret += netlist
                    .output_significance(*p)
                    .ok_or(PruneError::Unlabeled)?;
            }
        }
        for c in netlist.live_children(n) {
            if !cut.contains(c) && in_boundary.insert(c) {
                boundary.push(c);
            }
        }
    }

    // Boundary nodes reachable from another boundary node outside the cut are already accounted for
    let mut shadowed = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut to_visit = VecDeque::new();
    for &b in &boundary {
        to_visit.extend(netlist.live_children(b));
    }
    while let Some(n) = to_visit.pop_front() {
        if cut.contains(n) || !visited.insert(n) {
            continue;
        }
        if in_boundary.contains(&n) {
            shadowed.insert(n);
        }
        to_visit.extend(netlist.live_children(n));
    }
    for b in boundary {
        if !shadowed.contains(&b) {
            ret += netlist.significance(b).ok_or(PruneError::Unlabeled)?;
        }
    }
    Ok(ret)
}

/// Nodes that must join the cut along with a new node to keep it closed
///
/// The cut must already contain the new node.
fn closure_requirements(netlist: &Netlist, cut: &Cut, n: NodeId) -> Vec<NodeId> {
    let mut ret = Vec::new();
    for p in netlist.live_parents(n) {
        if !cut.contains(p) && !has_outside_consumer(netlist, &cut.member, p) {
            ret.push(p);
        }
    }
    for c in netlist.live_children(n) {
        if !cut.contains(c) && !has_outside_producer(netlist, &cut.member, c) && !ret.contains(&c)
        {
            ret.push(c);
        }
    }
    ret
}

/// Returns whether a set of nodes is a closed cut
pub fn is_closed(netlist: &Netlist, nodes: &[NodeId]) -> bool {
    let mut member = vec![false; netlist.nb_nodes()];
    for n in nodes {
        member[n.index()] = true;
    }
    for &n in nodes {
        for p in netlist.live_parents(n) {
            if !member[p.index()] && !has_outside_consumer(netlist, &member, p) {
                return false;
            }
        }
        for c in netlist.live_children(n) {
            if !member[c.index()] && !has_outside_producer(netlist, &member, c) {
                return false;
            }
        }
    }
    true
}

struct Carver<'a> {
    netlist: &'a Netlist,
    threshold: f64,
    /// Nodes taken by previous cuts, which cannot join this one
    claimed: &'a [bool],
}

impl<'a> Carver<'a> {
    /// Add a node to the cut along with everything required for closure
    ///
    /// Fails if the difference reaches the threshold or if closure requires a claimed node.
    /// On failure, the cut is left exactly as it was.
    fn expand(&self, cut: &mut Cut, start: NodeId) -> Result<bool, PruneError> {
        let len = cut.size();
        let initial_difference = cut.difference;
        let mut to_add = vec![start];
        while let Some(n) = to_add.pop() {
            if cut.contains(n) {
                continue;
            }
            if self.claimed[n.index()] {
                cut.truncate(len, initial_difference);
                return Ok(false);
            }
            cut.push(n);
            let d = difference(self.netlist, cut)?;
            if d >= self.threshold {
                cut.truncate(len, initial_difference);
                return Ok(false);
            }
            cut.difference = d;
            let required = closure_requirements(self.netlist, cut, n);
            to_add.extend(required.into_iter().rev());
        }
        Ok(true)
    }

    /// Grow a single cut from nothing
    fn carve(&self, candidates: &[NodeId], harshness: usize) -> Result<Cut, PruneError> {
        let nb_nodes = self.netlist.nb_nodes();
        let mut best = Cut::new(nb_nodes);
        let mut banned = vec![false; nb_nodes];
        let mut rounds = 0;
        loop {
            let mut cut = best.clone();
            let mut round_best: Option<Cut> = None;
            for &n in candidates {
                if cut.contains(n) || banned[n.index()] {
                    continue;
                }
                let len = cut.size();
                let difference = cut.difference;
                if !self.expand(&mut cut, n)? {
                    banned[n.index()] = true;
                    continue;
                }
                let improves = match &round_best {
                    Some(b) => cut.is_better_than(b),
                    None => cut.is_better_than(&best),
                };
                if improves {
                    round_best = Some(cut.clone());
                }
                cut.truncate(len, difference);
            }
            match round_best {
                Some(c) => best = c,
                None => break,
            }
            rounds += 1;
            if harshness != 0 && rounds >= harshness {
                break;
            }
        }
        Ok(best)
    }
}

/// Find closed cuts whose difference stays below the threshold
///
/// Each round carves one cut from the live nodes not claimed by a previous cut, until no cut can
/// be found. `harshness` bounds the number of expansion rounds per cut, 0 meaning unbounded.
/// The circuit must be labeled.
pub fn find_cuts(
    netlist: &Netlist,
    diff_threshold: f64,
    harshness: usize,
) -> Result<Vec<Cut>, PruneError> {
    if !netlist.is_labeled() {
        return Err(PruneError::Unlabeled);
    }
    let mut claimed = vec![false; netlist.nb_nodes()];
    let mut cuts = Vec::new();
    loop {
        let mut candidates: Vec<(NodeId, f64)> = netlist
            .live_nodes()
            .filter(|n| !claimed[n.index()])
            .filter_map(|n| netlist.significance(n).map(|s| (n, s)))
            .filter(|(_, s)| *s < diff_threshold)
            .collect();
        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        let candidates: Vec<NodeId> = candidates.into_iter().map(|(n, _)| n).collect();

        let carver = Carver {
            netlist,
            threshold: diff_threshold,
            claimed: &claimed,
        };
        let cut = carver.carve(&candidates, harshness)?;
        if cut.is_empty() {
            break;
        }
        log::debug!(
            "carved cut of {} nodes, difference {}",
            cut.size(),
            cut.difference()
        );
        for n in cut.nodes() {
            claimed[n.index()] = true;
        }
        cuts.push(cut);
    }
    Ok(cuts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::generators::{adder, testcases};
    use crate::prune::label_circuit;
    use crate::NetlistBuilder;

    fn labeled(mut nl: Netlist, sigs: Option<&[f64]>) -> Netlist {
        label_circuit(&mut nl, sigs, false).unwrap();
        nl
    }

    fn cut_of(nl: &Netlist, vars: &[&str]) -> Cut {
        let mut cut = Cut::new(nl.nb_nodes());
        for v in vars {
            cut.push(nl.node_id(v).unwrap());
        }
        cut
    }

    #[test]
    fn test_unlabeled() {
        let nl = adder::full_adder();
        assert_eq!(find_cuts(&nl, 10.0, 0).unwrap_err(), PruneError::Unlabeled);
    }

    #[test]
    fn test_threshold_below_every_node() {
        let nl = labeled(adder::ripple_carry(4), None);
        assert!(find_cuts(&nl, 0.5, 0).unwrap().is_empty());
        assert!(find_cuts(&nl, 1.0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_cuts_are_closed() {
        for len in [1, 2, 4, 8] {
            let nl = labeled(adder::ripple_carry(len), None);
            for threshold in [2.0, 3.5, 8.0, 100.0] {
                for harshness in [0, 1, 2] {
                    let cuts = find_cuts(&nl, threshold, harshness).unwrap();
                    for cut in &cuts {
                        assert!(!cut.is_empty());
                        assert!(is_closed(&nl, cut.nodes()));
                        assert!(cut.difference() < threshold);
                    }
                }
            }
        }
    }

    #[test]
    fn test_whole_circuit() {
        // Everything fits: the full adder is carved in one cut
        let nl = labeled(adder::full_adder(), None);
        let cuts = find_cuts(&nl, 100.0, 0).unwrap();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].size(), 5);
        assert_eq!(cuts[0].difference(), 3.0);
    }

    #[test]
    fn test_closure_pulls_parent() {
        // a1 only feeds o1: taking o1 requires taking a1 and a2
        let nl = labeled(adder::full_adder(), None);
        let claimed = vec![false; nl.nb_nodes()];
        let carver = Carver {
            netlist: &nl,
            threshold: 100.0,
            claimed: &claimed,
        };
        let mut cut = Cut::new(nl.nb_nodes());
        assert!(carver.expand(&mut cut, nl.node_id("o1").unwrap()).unwrap());
        let mut vars: Vec<&str> = cut.nodes().iter().map(|n| nl.var(*n)).collect();
        vars.sort();
        assert_eq!(vars, vec!["a1", "a2", "o1"]);
        assert!(is_closed(&nl, cut.nodes()));
        assert_eq!(cut.difference(), 2.0);
    }

    /// `y` reads only from `n`, drives an output and feeds `z`, which drives the heavy output
    fn exposed_output() -> Netlist {
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_output("y").add_output("z").add_output("w");
        b.add_gate("NOT", "n", &["a"]);
        b.add_gate("NOT", "y", &["n"]);
        b.add_gate("BUF", "z", &["y"]);
        b.add_gate("NOT", "w", &["a"]);
        labeled(b.build().unwrap(), Some(&[1.0, 8.0, 2.0]))
    }

    #[test]
    fn test_rollback() {
        let nl = exposed_output();
        let claimed = vec![false; nl.nb_nodes()];
        let carver = Carver {
            netlist: &nl,
            threshold: 4.0,
            claimed: &claimed,
        };
        let mut cut = Cut::new(nl.nb_nodes());
        assert!(carver.expand(&mut cut, nl.node_id("w").unwrap()).unwrap());
        assert_eq!(cut.difference(), 2.0);
        let before: Vec<NodeId> = cut.nodes().to_vec();

        // n fits, but closure then requires y, which exposes z
        assert!(!carver.expand(&mut cut, nl.node_id("n").unwrap()).unwrap());
        assert_eq!(cut.nodes(), &before[..]);
        assert_eq!(cut.difference(), 2.0);
        for n in nl.node_ids() {
            assert_eq!(cut.contains(n), before.contains(&n));
        }

        let cuts = find_cuts(&nl, 4.0, 0).unwrap();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].nodes(), &before[..]);
    }

    #[test]
    fn test_reconvergent_difference() {
        // n feeds l and r, which meet again in y
        let mut b = NetlistBuilder::new();
        b.add_input("a").add_input("b").add_output("y");
        b.add_gate("AND", "n", &["a", "b"]);
        b.add_gate("NOT", "l", &["n"]);
        b.add_gate("BUF", "r", &["n"]);
        b.add_gate("XOR", "y", &["l", "r"]);
        let nl = labeled(b.build().unwrap(), Some(&[4.0]));

        // Removing n exposes l and r, each worth 4: the error reaches y through both
        let cut = cut_of(&nl, &["n"]);
        assert_eq!(difference(&nl, &cut).unwrap(), 8.0);

        // Removing n and l exposes r and y, but y is downstream of r; order does not matter
        let nl_first = cut_of(&nl, &["n", "l"]);
        let l_first = cut_of(&nl, &["l", "n"]);
        assert_eq!(difference(&nl, &nl_first).unwrap(), 4.0);
        assert_eq!(difference(&nl, &l_first).unwrap(), 4.0);

        // Only the output remains exposed
        let all_but_y = cut_of(&nl, &["r", "l", "n"]);
        assert_eq!(difference(&nl, &all_but_y).unwrap(), 4.0);
    }

    #[test]
    fn test_closure_blocked_by_claimed() {
        // o1 needs a1, which belongs to a previous cut
        let nl = labeled(adder::full_adder(), None);
        let mut claimed = vec![false; nl.nb_nodes()];
        claimed[nl.node_id("a1").unwrap().index()] = true;
        let carver = Carver {
            netlist: &nl,
            threshold: 100.0,
            claimed: &claimed,
        };
        let mut cut = Cut::new(nl.nb_nodes());
        assert!(carver.expand(&mut cut, nl.node_id("x2").unwrap()).unwrap());
        let before: Vec<NodeId> = cut.nodes().to_vec();
        let difference = cut.difference();
        assert!(!carver.expand(&mut cut, nl.node_id("o1").unwrap()).unwrap());
        assert_eq!(cut.nodes(), &before[..]);
        assert_eq!(cut.difference(), difference);
        assert!(!cut.contains(nl.node_id("a2").unwrap()));
    }

    /// Random DAG of 2-input gates; every node without a consumer is a primary output
    fn random_dag(seed: u64, nb_inputs: usize, nb_nodes: usize) -> Netlist {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(seed);
        let cells = ["AND", "OR", "XOR", "NAND"];
        let mut b = NetlistBuilder::new();
        let mut pool: Vec<String> = (0..nb_inputs).map(|i| format!("i{}", i)).collect();
        for name in &pool {
            b.add_input(name);
        }
        let mut used = vec![false; nb_nodes];
        for k in 0..nb_nodes {
            let x = rng.gen_range(0..pool.len());
            let mut y = rng.gen_range(0..pool.len() - 1);
            if y >= x {
                y += 1;
            }
            for s in [x, y] {
                if s >= nb_inputs {
                    used[s - nb_inputs] = true;
                }
            }
            let cell = cells[rng.gen_range(0..cells.len())];
            let out = format!("n{}", k);
            b.add_gate(cell, &out, &[pool[x].as_str(), pool[y].as_str()]);
            pool.push(out);
        }
        for k in 0..nb_nodes {
            if !used[k] {
                b.add_output(&format!("n{}", k));
            }
        }
        labeled(b.build().unwrap(), None)
    }

    #[test]
    fn test_cuts_are_disjoint() {
        for seed in 0..400 {
            let nl = random_dag(seed, 3, 10);
            for threshold in [1.5, 3.0, 6.0, 20.0] {
                for harshness in [0, 1, 2] {
                    let cuts = find_cuts(&nl, threshold, harshness).unwrap();
                    let mut seen = vec![false; nl.nb_nodes()];
                    for cut in &cuts {
                        assert!(is_closed(&nl, cut.nodes()));
                        assert!(cut.difference() < threshold);
                        for n in cut.nodes() {
                            assert!(!seen[n.index()], "{} is in two cuts", nl.var(*n));
                            seen[n.index()] = true;
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_deleted_nodes_ignored() {
        let mut nl = labeled(testcases::and_or(), Some(&[1.0]));
        nl.delete("g2");
        let cuts = find_cuts(&nl, 10.0, 0).unwrap();
        for cut in &cuts {
            assert!(!cut.contains(nl.node_id("g2").unwrap()));
            assert!(is_closed(&nl, cut.nodes()));
        }
    }
}
