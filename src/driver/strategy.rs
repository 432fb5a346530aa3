use std::collections::BTreeMap;

use crate::driver::{Candidate, Method, PruneConfig};
use crate::netlist::{bit_index, WireId};
use crate::prune::{
    by_significance, find_cuts, label_circuit, propagate_from_constant_inputs,
    propagate_from_constant_outputs, rank_by_activity,
};
use crate::{Netlist, PruneError};

/// Proposes rounds of candidates to the driver
///
/// Each round is computed on the committed netlist at the time it is requested.
pub trait Strategy {
    /// Next round of candidates, or None once the strategy has nothing left to propose
    ///
    /// `progressed` tells whether the previous round committed anything.
    fn next_round(
        &mut self,
        netlist: &Netlist,
        progressed: bool,
    ) -> Result<Option<Vec<Candidate>>, PruneError>;
}

/// Group wires by bit index, least significant bit first
///
/// A wire without a bit index, such as `cout`, uses its position in the list.
fn group_by_bit(netlist: &Netlist, wires: &[WireId]) -> Vec<Vec<WireId>> {
    let mut groups: BTreeMap<usize, Vec<WireId>> = BTreeMap::new();
    for (i, w) in wires.iter().enumerate() {
        let name = netlist.wire_name(*w);
        let (base, bit) = bit_index(name);
        let bit = if base.len() == name.len() { i } else { bit };
        groups.entry(bit).or_default().push(*w);
    }
    groups.into_values().collect()
}

/// Which side of the circuit is forced to constants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Primary inputs, propagated forward
    Inputs,
    /// Primary outputs, propagated backward
    Outputs,
}

/// Force primary inputs or outputs to constants one bit at a time
///
/// Each round tries the whole path made redundant by a bit, then its nodes one by one.
pub struct BitFlow {
    side: Side,
    bits: Vec<Vec<WireId>>,
    next: usize,
}

impl BitFlow {
    /// Prepare the bits of a netlist, keeping at most `max_bits`
    pub fn new(netlist: &Netlist, side: Side, max_bits: Option<usize>) -> BitFlow {
        let wires = match side {
            Side::Inputs => netlist.inputs(),
            Side::Outputs => netlist.outputs(),
        };
        let mut bits = group_by_bit(netlist, wires);
        if let Some(m) = max_bits {
            bits.truncate(m);
        }
        BitFlow {
            side,
            bits,
            next: 0,
        }
    }
}

impl Strategy for BitFlow {
    fn next_round(
        &mut self,
        netlist: &Netlist,
        _progressed: bool,
    ) -> Result<Option<Vec<Candidate>>, PruneError> {
        while self.next < self.bits.len() {
            let wires = &self.bits[self.next];
            self.next += 1;
            let path = match self.side {
                Side::Inputs => propagate_from_constant_inputs(netlist, wires),
                Side::Outputs => propagate_from_constant_outputs(netlist, wires),
            };
            if !path.is_empty() {
                return Ok(Some(vec![Candidate::group(path)]));
            }
        }
        Ok(None)
    }
}

/// Replace nodes by their majority value, most constant first
#[derive(Default)]
pub struct ActivityFlow {
    done: bool,
}

impl Strategy for ActivityFlow {
    fn next_round(
        &mut self,
        netlist: &Netlist,
        _progressed: bool,
    ) -> Result<Option<Vec<Candidate>>, PruneError> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let ranked = rank_by_activity(netlist);
        Ok(Some(
            ranked
                .into_iter()
                .map(|c| Candidate::single(c.node))
                .collect(),
        ))
    }
}

/// Label the circuit with default output significances unless it is labeled already
fn labeled(netlist: &Netlist) -> Result<Netlist, PruneError> {
    let mut ret = netlist.clone();
    if !ret.is_labeled() {
        label_circuit(&mut ret, None, false)?;
    }
    Ok(ret)
}

/// Remove nodes one by one, least significant first
#[derive(Default)]
pub struct SignificanceFlow {
    done: bool,
}

impl Strategy for SignificanceFlow {
    fn next_round(
        &mut self,
        netlist: &Netlist,
        _progressed: bool,
    ) -> Result<Option<Vec<Candidate>>, PruneError> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let labeled = labeled(netlist)?;
        let order = by_significance(&labeled)?;
        Ok(Some(
            order
                .into_iter()
                .filter(|(n, _)| !netlist.is_deleted(*n))
                .map(|(n, _)| Candidate::single(n))
                .collect(),
        ))
    }
}

/// Remove closed cuts, carving again as long as a round removes something
pub struct CarvingFlow {
    diff_threshold: f64,
    harshness: usize,
    started: bool,
}

impl CarvingFlow {
    /// Carve with a difference threshold and harshness
    pub fn new(diff_threshold: f64, harshness: usize) -> CarvingFlow {
        CarvingFlow {
            diff_threshold,
            harshness,
            started: false,
        }
    }
}

impl Strategy for CarvingFlow {
    fn next_round(
        &mut self,
        netlist: &Netlist,
        progressed: bool,
    ) -> Result<Option<Vec<Candidate>>, PruneError> {
        if self.started && !progressed {
            return Ok(None);
        }
        self.started = true;
        let labeled = labeled(netlist)?;
        let cuts = find_cuts(&labeled, self.diff_threshold, self.harshness)?;
        if cuts.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            cuts.iter()
                .map(|c| Candidate::group(c.nodes().to_vec()).without_split())
                .collect(),
        ))
    }
}

/// Create the strategy of a configuration
pub fn strategy_for(netlist: &Netlist, config: &PruneConfig) -> Box<dyn Strategy> {
    match config.method {
        Method::ConstantInputs => Box::new(BitFlow::new(netlist, Side::Inputs, config.max_bits)),
        Method::ConstantOutputs => Box::new(BitFlow::new(netlist, Side::Outputs, config.max_bits)),
        Method::Probabilistic => Box::<ActivityFlow>::default(),
        Method::Significance => Box::<SignificanceFlow>::default(),
        Method::Carving => Box::new(CarvingFlow::new(
            config.diff_threshold(),
            config.harshness,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::generators::adder;
    use crate::netlist::Activity;

    fn vars(nl: &Netlist, c: &Candidate) -> Vec<String> {
        c.nodes.iter().map(|n| nl.var(*n).to_owned()).collect()
    }

    #[test]
    fn test_bit_groups() {
        let nl = adder::ripple_carry(3);
        let groups = group_by_bit(&nl, nl.inputs());
        assert_eq!(groups.len(), 3);
        let names: Vec<&str> = groups[1].iter().map(|w| nl.wire_name(*w)).collect();
        assert_eq!(names, vec!["a[1]", "b[1]"]);
    }

    #[test]
    fn test_constant_inputs() {
        let nl = adder::ripple_carry(4);
        let mut flow = BitFlow::new(&nl, Side::Inputs, Some(1));
        let round = flow.next_round(&nl, false).unwrap().unwrap();
        assert_eq!(round.len(), 1);
        assert_eq!(vars(&nl, &round[0]), vec!["xor0", "and0"]);
        assert!(round[0].split_on_reject);
        assert!(flow.next_round(&nl, false).unwrap().is_none());
    }

    #[test]
    fn test_constant_outputs() {
        let nl = adder::full_adder();
        let mut flow = BitFlow::new(&nl, Side::Outputs, None);
        // Forcing s removes x2 only, since p is still needed by the carry
        let round = flow.next_round(&nl, false).unwrap().unwrap();
        assert_eq!(vars(&nl, &round[0]), vec!["x2"]);
    }

    #[test]
    fn test_activity() {
        let mut nl = adder::full_adder();
        let act = |t0, t1| {
            Some(Activity {
                t0,
                t1,
                toggles: 0,
            })
        };
        nl.set_activity(nl.node_id("a1").unwrap(), act(80, 20));
        nl.set_activity(nl.node_id("x1").unwrap(), act(10, 90));
        let mut flow = ActivityFlow::default();
        let round = flow.next_round(&nl, false).unwrap().unwrap();
        let order: Vec<Vec<String>> = round.iter().map(|c| vars(&nl, c)).collect();
        assert_eq!(order, vec![vec!["x1"], vec!["a1"]]);
        assert!(flow.next_round(&nl, true).unwrap().is_none());
    }

    #[test]
    fn test_significance() {
        let mut nl = adder::full_adder();
        nl.delete("x2");
        let mut flow = SignificanceFlow::default();
        let round = flow.next_round(&nl, false).unwrap().unwrap();
        let order: Vec<Vec<String>> = round.iter().map(|c| vars(&nl, c)).collect();
        assert_eq!(
            order,
            vec![vec!["a1"], vec!["a2"], vec!["o1"], vec!["x1"]]
        );
    }

    #[test]
    fn test_carving() {
        let nl = adder::full_adder();
        let mut flow = CarvingFlow::new(10.0, 0);
        let round = flow.next_round(&nl, false).unwrap().unwrap();
        assert_eq!(round.len(), 1);
        assert_eq!(round[0].nodes.len(), 5);
        assert!(!round[0].split_on_reject);
        // Nothing was committed: carving the same netlist again is pointless
        assert!(flow.next_round(&nl, false).unwrap().is_none());
    }
}
