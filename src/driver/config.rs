use std::fmt;

use crate::ConfigError;

/// Strategy used to propose nodes for removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Method {
    /// Force primary inputs to constants, bit by bit, and remove the logic they determine
    #[value(name = "inconst")]
    ConstantInputs,
    /// Force primary outputs to constants, bit by bit, and remove the logic only they use
    #[value(name = "outconst")]
    ConstantOutputs,
    /// Replace nodes by the value they hold most of the time
    #[value(name = "probprun")]
    Probabilistic,
    /// Remove the least significant nodes first
    #[value(name = "significance")]
    Significance,
    /// Remove closed cuts of low significance
    #[value(name = "ccarving")]
    Carving,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::ConstantInputs => "inconst",
            Method::ConstantOutputs => "outconst",
            Method::Probabilistic => "probprun",
            Method::Significance => "significance",
            Method::Carving => "ccarving",
        };
        write!(f, "{}", name)
    }
}

/// What to do when a candidate cannot be evaluated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop the run
    #[default]
    Abort,
    /// Discard the candidate and continue
    Skip,
}

/// Configuration of a pruning run
#[derive(Clone, Debug, PartialEq)]
pub struct PruneConfig {
    /// Strategy proposing the candidates
    pub method: Method,
    /// Largest acceptable error; reaching it exactly ends the run
    pub max_error: f64,
    /// Maximum number of evaluations
    pub max_iterations: Option<usize>,
    /// Maximum number of bits explored by the bit-wise methods, starting from the least significant
    pub max_bits: Option<usize>,
    /// Number of candidates evaluated in parallel
    pub jobs: usize,
    /// Bound on the expansion rounds per cut during carving, 0 for unbounded
    pub harshness: usize,
    /// Difference threshold for carving; the error threshold is used if not given
    pub diff_threshold: Option<f64>,
    /// Policy on evaluation failures
    pub on_failure: FailurePolicy,
}

impl PruneConfig {
    /// Create a configuration with default limits
    pub fn new(method: Method, max_error: f64) -> PruneConfig {
        PruneConfig {
            method,
            max_error,
            max_iterations: None,
            max_bits: None,
            jobs: 1,
            harshness: 0,
            diff_threshold: None,
            on_failure: FailurePolicy::Abort,
        }
    }

    /// Difference threshold used for carving
    pub fn diff_threshold(&self) -> f64 {
        self.diff_threshold.unwrap_or(self.max_error)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(ConfigError::InvalidErrorThreshold(self.max_error));
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::ZeroIterations);
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        if self.method == Method::Carving {
            let t = self.diff_threshold();
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigError::InvalidDiffThreshold(t));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(PruneConfig::new(Method::ConstantInputs, 0.0).validate().is_ok());
        assert_eq!(
            PruneConfig::new(Method::Significance, -1.0).validate(),
            Err(ConfigError::InvalidErrorThreshold(-1.0))
        );
        assert!(PruneConfig::new(Method::Significance, f64::NAN)
            .validate()
            .is_err());

        let mut c = PruneConfig::new(Method::Probabilistic, 1.0);
        c.jobs = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroJobs));
        c.jobs = 4;
        c.max_iterations = Some(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroIterations));
    }

    #[test]
    fn test_carving_threshold() {
        let mut c = PruneConfig::new(Method::Carving, 0.0);
        assert_eq!(c.validate(), Err(ConfigError::InvalidDiffThreshold(0.0)));
        c.diff_threshold = Some(4.0);
        assert!(c.validate().is_ok());
        assert_eq!(c.diff_threshold(), 4.0);
        c.diff_threshold = None;
        c.max_error = 2.5;
        assert_eq!(c.diff_threshold(), 2.5);
        assert!(c.validate().is_ok());
    }
}
