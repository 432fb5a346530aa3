//! Significance labeling
//!
//! Each primary output gets a weight modeling its numeric importance, by default `2^i` for output
//! `i`. The significance of a node is the sum, over its outputs, of the weight of the primary output
//! it drives or of the significances of the nodes reading it.

use crate::netlist::NodeId;
use crate::{Netlist, NetlistError, PruneError};

/// Default significance of the outputs: `2^i` for the i-th output
pub fn default_output_significances(nb_outputs: usize) -> Vec<f64> {
    (0..nb_outputs).map(|i| 2.0f64.powi(i as i32)).collect()
}

/// Label every node with its significance
///
/// Output significances default to `2^i`. Nodes that are already labeled keep their label unless
/// `overwrite` is set. Labels are structural: deletion marks are ignored.
pub fn label_circuit(
    netlist: &mut Netlist,
    output_significances: Option<&[f64]>,
    overwrite: bool,
) -> Result<(), NetlistError> {
    let sigs = match output_significances {
        Some(s) => {
            if s.len() != netlist.nb_outputs() {
                return Err(NetlistError::SignificanceLength {
                    expected: netlist.nb_outputs(),
                    got: s.len(),
                });
            }
            s.to_vec()
        }
        None => default_output_significances(netlist.nb_outputs()),
    };

    // Reverse topological order: consumers are labeled before their drivers
    let order: Vec<NodeId> = netlist.topological_order().iter().rev().copied().collect();
    for n in order {
        if !overwrite && netlist.significance(n).is_some() {
            continue;
        }
        let mut sig = 0.0;
        for w in netlist.node(n).output_wires() {
            if netlist.is_primary_output(w) {
                sig += netlist
                    .output_positions(w)
                    .iter()
                    .map(|p| sigs[*p])
                    .sum::<f64>();
            } else {
                sig += netlist
                    .consumers_of(w)
                    .iter()
                    .map(|c| netlist.significance(*c).unwrap_or(0.0))
                    .sum::<f64>();
            }
        }
        netlist.set_significance(n, sig);
    }
    netlist.set_output_significances(sigs);
    Ok(())
}

/// All nodes sorted by increasing significance; the first ones are the best deletion candidates
///
/// The circuit must be labeled. Nodes with the same significance stay in declaration order.
pub fn by_significance(netlist: &Netlist) -> Result<Vec<(NodeId, f64)>, PruneError> {
    let mut ret = Vec::with_capacity(netlist.nb_nodes());
    for n in netlist.node_ids() {
        match netlist.significance(n) {
            Some(s) => ret.push((n, s)),
            None => return Err(PruneError::Unlabeled),
        }
    }
    ret.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(ret)
}
