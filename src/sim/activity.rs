use crate::netlist::Activity;
use crate::sim::simple_sim::SimpleSimulator;
use crate::sim::Dataset;
use crate::{EvalError, Netlist};

#[derive(Clone, Copy, Debug, Default)]
struct Counter {
    ones: u64,
    toggles: u64,
    last: Option<bool>,
}

impl Counter {
    fn add_block(&mut self, value: u64, len: usize) {
        let mask = if len == 64 { !0 } else { (1u64 << len) - 1 };
        let value = value & mask;
        self.ones += value.count_ones() as u64;
        // Transitions inside the block, then with the previous block
        let shifted = value ^ (value >> 1);
        let inner_mask = mask >> 1;
        self.toggles += (shifted & inner_mask).count_ones() as u64;
        let first = value & 1 != 0;
        if let Some(l) = self.last {
            if l != first {
                self.toggles += 1;
            }
        }
        self.last = Some((value >> (len - 1)) & 1 != 0);
    }
}

/// Annotate every node with the activity of its first output over a dataset
///
/// Patterns are taken in dataset order, as consecutive time steps. The time
/// at 0 and at 1 is recorded as a percentage, rounded down.
pub fn annotate_activity(netlist: &mut Netlist, dataset: &Dataset) -> Result<(), EvalError> {
    if dataset.nb_inputs() != netlist.nb_inputs() {
        return Err(EvalError::DatasetMismatch {
            expected: netlist.nb_inputs(),
            got: dataset.nb_inputs(),
        });
    }
    let n = dataset.nb_patterns() as u64;
    if n == 0 {
        return Ok(());
    }
    let mut counters = vec![Counter::default(); netlist.nb_nodes()];
    {
        let mut sim = SimpleSimulator::from_netlist(netlist)?;
        for (k, block) in dataset.blocks().iter().enumerate() {
            sim.run_comb(block);
            for node in netlist.node_ids() {
                if let Some(w) = netlist.node(node).output_wires().next() {
                    counters[node.index()].add_block(sim.get_value(w), dataset.block_len(k));
                }
            }
        }
    }
    for node in netlist.node_ids().collect::<Vec<_>>() {
        let c = counters[node.index()];
        if c.last.is_none() {
            continue;
        }
        netlist.set_activity(
            node,
            Some(Activity {
                t0: ((n - c.ones) * 100 / n) as u32,
                t1: (c.ones * 100 / n) as u32,
                toggles: c.toggles,
            }),
        );
    }
    log::debug!("Annotated activity over {} patterns", n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::annotate_activity;
    use crate::netlist::generators::testcases;
    use crate::netlist::Activity;
    use crate::sim::Dataset;

    #[test]
    fn test_and_or() {
        let mut nl = testcases::and_or();
        let d = Dataset::exhaustive(3).unwrap();
        annotate_activity(&mut nl, &d).unwrap();
        let g1 = nl.node_id("g1").unwrap();
        let g2 = nl.node_id("g2").unwrap();
        // Patterns 0..8 with a = bit 0, b = bit 1, c = bit 2
        // g1: 0 0 0 1 0 0 0 1
        assert_eq!(
            nl.activity(g1),
            Some(Activity {
                t0: 75,
                t1: 25,
                toggles: 3
            })
        );
        // g2: 0 0 0 1 1 1 1 1
        assert_eq!(
            nl.activity(g2),
            Some(Activity {
                t0: 37,
                t1: 62,
                toggles: 1
            })
        );
        assert_eq!(nl.constant_replacement_value(g1), false);
        assert_eq!(nl.constant_replacement_value(g2), true);
    }

    #[test]
    fn test_across_blocks() {
        let mut nl = testcases::inverter_chain(1);
        // Alternate every pattern, across the block boundary
        let patterns: Vec<Vec<bool>> = (0..130).map(|p| vec![p % 2 == 0]).collect();
        let d = Dataset::from_patterns(1, &patterns).unwrap();
        annotate_activity(&mut nl, &d).unwrap();
        let act = nl.activity(nl.node_id("inv0").unwrap()).unwrap();
        assert_eq!(act.toggles, 129);
        assert_eq!((act.t0, act.t1), (50, 50));
    }
}
