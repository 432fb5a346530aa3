//! Error metrics between the outputs of the original and the pruned circuit
//!
//! Outputs are compared as unsigned integers, primary output `i` being bit `i`.

use std::fmt;

use crate::EvalError;

/// Error metric used to score a pruned circuit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Metric {
    /// Mean error distance
    #[default]
    Med,
    /// Worst-case error
    Wce,
    /// Mean relative error distance
    Mred,
    /// Mean squared error distance
    Msed,
    /// Error rate: fraction of patterns with a wrong output
    Er,
    /// Mean Hamming distance
    Hd,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Med => "med",
            Metric::Wce => "wce",
            Metric::Mred => "mred",
            Metric::Msed => "msed",
            Metric::Er => "er",
            Metric::Hd => "hd",
        };
        write!(f, "{}", name)
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

impl Metric {
    /// Compute the error between reference and approximate outputs
    ///
    /// Means are rounded to 3 decimals. An empty comparison has no error.
    pub fn compute(&self, reference: &[u64], approximate: &[u64]) -> Result<f64, EvalError> {
        if reference.len() != approximate.len() {
            return Err(EvalError::OutputCountMismatch {
                expected: reference.len(),
                got: approximate.len(),
            });
        }
        if reference.is_empty() {
            return Ok(0.0);
        }
        let n = reference.len() as f64;
        let distances = reference
            .iter()
            .zip(approximate)
            .map(|(r, a)| r.abs_diff(*a) as f64);
        let ret = match self {
            Metric::Med => round3(distances.sum::<f64>() / n),
            Metric::Wce => distances.fold(0.0, f64::max),
            Metric::Mred => {
                let sum: f64 = reference
                    .iter()
                    .zip(distances)
                    .map(|(r, d)| if *r == 0 { 0.0 } else { d / *r as f64 })
                    .sum();
                round3(sum / n)
            }
            Metric::Msed => round3(distances.map(|d| d * d).sum::<f64>() / n),
            Metric::Er => round3(distances.filter(|d| *d > 0.0).count() as f64 / n),
            Metric::Hd => {
                let sum: u64 = reference
                    .iter()
                    .zip(approximate)
                    .map(|(r, a)| (r ^ a).count_ones() as u64)
                    .sum();
                round3(sum as f64 / n)
            }
        };
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::Metric;
    use crate::EvalError;

    #[test]
    fn test_metrics() {
        let reference = [4, 0, 7, 2];
        let approx = [4, 1, 5, 6];
        assert_eq!(Metric::Med.compute(&reference, &approx).unwrap(), 1.75);
        assert_eq!(Metric::Wce.compute(&reference, &approx).unwrap(), 4.0);
        assert_eq!(Metric::Msed.compute(&reference, &approx).unwrap(), 5.25);
        assert_eq!(Metric::Er.compute(&reference, &approx).unwrap(), 0.75);
        // 0 + 0 (reference 0) + 2/7 + 2
        assert_eq!(Metric::Mred.compute(&reference, &approx).unwrap(), 0.571);
        // 0 + 1 + 1 + 1
        assert_eq!(Metric::Hd.compute(&reference, &approx).unwrap(), 0.75);
    }

    #[test]
    fn test_exact() {
        let values = [1, 2, 3];
        for m in [
            Metric::Med,
            Metric::Wce,
            Metric::Mred,
            Metric::Msed,
            Metric::Er,
            Metric::Hd,
        ] {
            assert_eq!(m.compute(&values, &values).unwrap(), 0.0);
            assert_eq!(m.compute(&[], &[]).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            Metric::Med.compute(&[1, 2, 3], &[1, 2]),
            Err(EvalError::OutputCountMismatch {
                expected: 3,
                got: 2
            })
        );
    }
}
