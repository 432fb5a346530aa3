//! Compute netlist statistics
//!
//! ```
//! # use axprune::netlist::generators::adder;
//! use axprune::netlist::stats::stats;
//! let mut netlist = adder::ripple_carry(4);
//! netlist.delete("and0");
//! let stats = stats(&netlist);
//!
//! assert_eq!(stats.nb_deleted, 1);
//! assert_eq!(stats.nb_constant_wires, 1);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::netlist::node::cell_family;
use crate::Netlist;

/// Number of inputs, outputs and cells in a pruned netlist
#[derive(Clone, Debug)]
pub struct NetlistStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of nodes, deleted or not
    pub nb_nodes: usize,
    /// Number of deleted nodes
    pub nb_deleted: usize,
    /// Number of wires tied to a constant in place of a deleted node
    pub nb_constant_wires: usize,
    /// Number of wires removed with the deleted nodes
    pub nb_removed_wires: usize,
    /// Number of remaining nodes per logic family
    pub families: BTreeMap<String, usize>,
}

impl NetlistStats {
    /// Number of remaining nodes
    pub fn nb_live(&self) -> usize {
        self.nb_nodes - self.nb_deleted
    }
}

impl fmt::Display for NetlistStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Cells: {}", self.nb_live())?;
        for (family, nb) in &self.families {
            writeln!(f, "      {}: {}", family, nb)?;
        }
        if self.nb_deleted != 0 {
            writeln!(f, "  Deleted: {}", self.nb_deleted)?;
            writeln!(f, "      constant wires: {}", self.nb_constant_wires)?;
            writeln!(f, "      removed wires: {}", self.nb_removed_wires)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the netlist
pub fn stats(a: &Netlist) -> NetlistStats {
    let emission = a.emission();
    let mut families = BTreeMap::new();
    for n in &emission.nodes {
        *families.entry(cell_family(a.node(*n).cell())).or_insert(0) += 1;
    }
    NetlistStats {
        nb_inputs: a.nb_inputs(),
        nb_outputs: a.nb_outputs(),
        nb_nodes: a.nb_nodes(),
        nb_deleted: a.nb_deleted(),
        nb_constant_wires: emission.constants.len(),
        nb_removed_wires: emission.removed_wires.len(),
        families,
    }
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::netlist::generators::adder;

    #[test]
    fn test_adder_stats() {
        let mut nl = adder::ripple_carry(4);
        let s = stats(&nl);
        assert_eq!(s.nb_inputs, 8);
        assert_eq!(s.nb_outputs, 5);
        assert_eq!(s.nb_live(), 17);
        assert_eq!(s.families["XOR"], 7);
        assert_eq!(s.families["AND"], 7);
        assert_eq!(s.families["OR"], 3);

        // The last carry drives an output: deleting it ties the output
        nl.delete("or3");
        let s = stats(&nl);
        assert_eq!(s.nb_deleted, 1);
        assert_eq!(s.nb_constant_wires, 1);
        assert_eq!(s.families["OR"], 2);
    }
}
