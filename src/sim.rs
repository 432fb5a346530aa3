//! Simulation of a netlist with its deletion marks, and error measurement against the original.
//!
//! Simulation is bit-parallel: each word of a [`Dataset`] holds 64 input patterns.

mod activity;
mod evaluator;
mod metrics;
mod simple_sim;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{EvalError, Netlist};

pub use activity::annotate_activity;
pub use evaluator::SimulationEvaluator;
pub use metrics::Metric;

use simple_sim::SimpleSimulator;

/// Maximum number of inputs for an exhaustive dataset
pub const MAX_EXHAUSTIVE_INPUTS: usize = 20;

/// Maximum number of primary outputs that can be packed in an output word
pub const MAX_OUTPUTS: usize = 64;

/// Input patterns for simulation, stored 64 at a time
///
/// Block `k` holds one word per primary input; bit `j` of the words is pattern `64 * k + j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    nb_inputs: usize,
    nb_patterns: usize,
    blocks: Vec<Vec<u64>>,
}

impl Dataset {
    /// Generate uniformly random patterns from a seed
    pub fn random(nb_inputs: usize, nb_patterns: usize, seed: u64) -> Dataset {
        let mut rng = SmallRng::seed_from_u64(seed);
        let nb_blocks = (nb_patterns + 63) / 64;
        let mut blocks = Vec::with_capacity(nb_blocks);
        for _ in 0..nb_blocks {
            let block: Vec<u64> = (0..nb_inputs).map(|_| rng.gen::<u64>()).collect();
            blocks.push(block);
        }
        Dataset {
            nb_inputs,
            nb_patterns,
            blocks,
        }
    }

    /// Enumerate every input combination, or None if there are too many inputs
    ///
    /// Pattern `p` assigns bit `i` of `p` to input `i`.
    pub fn exhaustive(nb_inputs: usize) -> Option<Dataset> {
        if nb_inputs > MAX_EXHAUSTIVE_INPUTS {
            return None;
        }
        let nb_patterns = 1usize << nb_inputs;
        let patterns: Vec<Vec<bool>> = (0..nb_patterns)
            .map(|p| (0..nb_inputs).map(|i| (p >> i) & 1 != 0).collect())
            .collect();
        Dataset::from_patterns(nb_inputs, &patterns).ok()
    }

    /// Build a dataset from explicit patterns, one value per input
    ///
    /// Every pattern must have exactly `nb_inputs` values.
    pub fn from_patterns(nb_inputs: usize, patterns: &[Vec<bool>]) -> Result<Dataset, EvalError> {
        let mut blocks = Vec::new();
        for chunk in patterns.chunks(64) {
            let mut block = vec![0u64; nb_inputs];
            for (j, pattern) in chunk.iter().enumerate() {
                if pattern.len() != nb_inputs {
                    return Err(EvalError::DatasetMismatch {
                        expected: nb_inputs,
                        got: pattern.len(),
                    });
                }
                for (i, v) in pattern.iter().enumerate() {
                    if *v {
                        block[i] |= 1 << j;
                    }
                }
            }
            blocks.push(block);
        }
        Ok(Dataset {
            nb_inputs,
            nb_patterns: patterns.len(),
            blocks,
        })
    }

    /// Return the number of inputs of each pattern
    pub fn nb_inputs(&self) -> usize {
        self.nb_inputs
    }

    /// Return the number of patterns
    pub fn nb_patterns(&self) -> usize {
        self.nb_patterns
    }

    /// Return the 64-pattern blocks
    pub fn blocks(&self) -> &[Vec<u64>] {
        &self.blocks
    }

    /// Return the number of valid patterns in block `k`
    pub fn block_len(&self, k: usize) -> usize {
        (self.nb_patterns - 64 * k).min(64)
    }
}

/// Simulate a netlist on a dataset; return the output word of each pattern
///
/// Primary output `i` is bit `i` of the result.
pub fn simulate(netlist: &Netlist, dataset: &Dataset) -> Result<Vec<u64>, EvalError> {
    if dataset.nb_inputs() != netlist.nb_inputs() {
        return Err(EvalError::DatasetMismatch {
            expected: netlist.nb_inputs(),
            got: dataset.nb_inputs(),
        });
    }
    if netlist.nb_outputs() > MAX_OUTPUTS {
        return Err(EvalError::TooManyOutputs(netlist.nb_outputs()));
    }
    let mut sim = SimpleSimulator::from_netlist(netlist)?;
    let mut ret = Vec::with_capacity(dataset.nb_patterns());
    for (k, block) in dataset.blocks().iter().enumerate() {
        let outputs = sim.run_comb(block);
        for j in 0..dataset.block_len(k) {
            let mut word = 0u64;
            for (o, v) in outputs.iter().enumerate() {
                word |= ((v >> j) & 1) << o;
            }
            ret.push(word);
        }
    }
    Ok(ret)
}

/// Simulate a netlist on a single pattern; return the output values
pub fn simulate_comb(netlist: &Netlist, input_values: &[bool]) -> Result<Vec<bool>, EvalError> {
    if input_values.len() != netlist.nb_inputs() {
        return Err(EvalError::DatasetMismatch {
            expected: netlist.nb_inputs(),
            got: input_values.len(),
        });
    }
    let mut sim = SimpleSimulator::from_netlist(netlist)?;
    let words: Vec<u64> = input_values
        .iter()
        .map(|b| if *b { !0 } else { 0 })
        .collect();
    Ok(sim.run_comb(&words).iter().map(|v| *v != 0).collect())
}

#[cfg(test)]
mod tests {
    use super::{simulate, simulate_comb, Dataset};
    use crate::netlist::generators::{adder, testcases};
    use crate::EvalError;

    #[test]
    fn test_dataset() {
        let d = Dataset::random(3, 100, 1);
        assert_eq!(d.blocks().len(), 2);
        assert_eq!(d.block_len(0), 64);
        assert_eq!(d.block_len(1), 36);
        assert_eq!(d, Dataset::random(3, 100, 1));

        let e = Dataset::exhaustive(3).unwrap();
        assert_eq!(e.nb_patterns(), 8);
        assert_eq!(e.blocks()[0], vec![0b10101010, 0b11001100, 0b11110000]);
        assert!(Dataset::exhaustive(21).is_none());
    }

    #[test]
    fn test_from_patterns() {
        let patterns: Vec<Vec<bool>> = (0..70).map(|p| vec![p % 2 == 1, p % 3 == 0]).collect();
        let d = Dataset::from_patterns(2, &patterns).unwrap();
        assert_eq!(d.nb_patterns(), 70);
        assert_eq!(d.blocks().len(), 2);
        assert_eq!(d.block_len(1), 6);
        assert_eq!(d.blocks()[0][0] & 0b1111, 0b1010);
        assert_eq!(d.blocks()[0][1] & 0b1111, 0b1001);

        let ragged = vec![vec![true, false], vec![true]];
        assert_eq!(
            Dataset::from_patterns(2, &ragged),
            Err(EvalError::DatasetMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_adder() {
        let nl = adder::ripple_carry(4);
        let d = Dataset::exhaustive(8).unwrap();
        let out = simulate(&nl, &d).unwrap();
        assert_eq!(out.len(), 256);
        for p in 0..256u64 {
            // Inputs are interleaved: a[i] is input 2i, b[i] is input 2i+1
            let mut a = 0;
            let mut b = 0;
            for i in 0..4 {
                a |= ((p >> (2 * i)) & 1) << i;
                b |= ((p >> (2 * i + 1)) & 1) << i;
            }
            assert_eq!(out[p as usize], a + b);
        }
    }

    #[test]
    fn test_comb() {
        let nl = testcases::and_or();
        assert_eq!(simulate_comb(&nl, &[true, true, false]).unwrap(), vec![true]);
        assert_eq!(simulate_comb(&nl, &[true, false, false]).unwrap(), vec![false]);
        assert_eq!(simulate_comb(&nl, &[false, false, true]).unwrap(), vec![true]);
        assert!(matches!(
            simulate_comb(&nl, &[true]),
            Err(EvalError::DatasetMismatch { .. })
        ));
    }
}
