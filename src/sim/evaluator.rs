use crate::driver::Evaluator;
use crate::sim::{simulate, Dataset, Metric};
use crate::{EvalError, Netlist};

/// Scores a pruned netlist by simulating it against the outputs of the original
pub struct SimulationEvaluator {
    dataset: Dataset,
    metric: Metric,
    reference: Vec<u64>,
}

impl SimulationEvaluator {
    /// Simulate the original netlist once to obtain the reference outputs
    pub fn new(
        original: &Netlist,
        dataset: Dataset,
        metric: Metric,
    ) -> Result<SimulationEvaluator, EvalError> {
        let reference = simulate(original, &dataset)?;
        Ok(SimulationEvaluator {
            dataset,
            metric,
            reference,
        })
    }

    /// Return the metric used for scoring
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Return the dataset used for scoring
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl Evaluator for SimulationEvaluator {
    fn evaluate(&self, netlist: &Netlist) -> Result<f64, EvalError> {
        let outputs = simulate(netlist, &self.dataset)?;
        self.metric.compute(&self.reference, &outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationEvaluator;
    use crate::driver::Evaluator;
    use crate::netlist::generators::adder;
    use crate::sim::{Dataset, Metric};

    #[test]
    fn test_evaluate() {
        let nl = adder::ripple_carry(2);
        let eval =
            SimulationEvaluator::new(&nl, Dataset::exhaustive(4).unwrap(), Metric::Wce).unwrap();
        assert_eq!(eval.evaluate(&nl).unwrap(), 0.0);

        // The top carry is dropped: error of 4 when it is set
        let mut pruned = nl.clone();
        assert!(pruned.delete("or1"));
        assert_eq!(eval.evaluate(&pruned).unwrap(), 4.0);

        // Sum bit 0 replaced by 0
        let mut pruned = nl.clone();
        assert!(pruned.delete("xor0"));
        assert_eq!(eval.evaluate(&pruned).unwrap(), 1.0);
        let er = SimulationEvaluator::new(&nl, Dataset::exhaustive(4).unwrap(), Metric::Er)
            .unwrap();
        assert_eq!(er.evaluate(&pruned).unwrap(), 0.5);
    }
}
