//! Rank nodes by how often they hold the same value

use crate::netlist::NodeId;
use crate::Netlist;

/// A node that could be replaced by the constant it holds most of the time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantCandidate {
    /// The node
    pub node: NodeId,
    /// Suggested replacement value
    pub value: bool,
    /// Percentage of time the node holds this value
    pub percent: u32,
}

/// Live nodes with activity data, most constant first
///
/// Nodes holding their value for the same percentage of time stay in declaration order.
pub fn rank_by_activity(netlist: &Netlist) -> Vec<ConstantCandidate> {
    let mut ret: Vec<ConstantCandidate> = netlist
        .live_nodes()
        .filter_map(|n| {
            netlist.activity(n).map(|a| ConstantCandidate {
                node: n,
                value: a.majority(),
                percent: a.majority_percent(),
            })
        })
        .collect();
    ret.sort_by(|a, b| b.percent.cmp(&a.percent));
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::generators::adder;
    use crate::netlist::Activity;

    #[test]
    fn test_ranking() {
        let mut nl = adder::full_adder();
        let act = |t0, t1| {
            Some(Activity {
                t0,
                t1,
                toggles: 0,
            })
        };
        nl.set_activity(nl.node_id("x1").unwrap(), act(50, 50));
        nl.set_activity(nl.node_id("a1").unwrap(), act(75, 25));
        nl.set_activity(nl.node_id("o1").unwrap(), act(10, 90));
        nl.set_activity(nl.node_id("a2").unwrap(), act(25, 75));
        nl.delete("a2");

        let ranked = rank_by_activity(&nl);
        let summary: Vec<(&str, bool, u32)> = ranked
            .iter()
            .map(|c| (nl.var(c.node), c.value, c.percent))
            .collect();
        assert_eq!(
            summary,
            vec![("o1", true, 90), ("a1", false, 75), ("x1", false, 50)]
        );
    }
}
