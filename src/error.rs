//! Error types
//!
//! Construction problems are fatal and reported as [`NetlistError`]. Pruning strategies and the
//! driver report [`PruneError`]. A failing evaluation is an [`EvalError`], which is never confused
//! with an evaluation that succeeded with a large error.

use thiserror::Error;

/// Errors raised while building or labeling a netlist
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetlistError {
    /// Two nodes share the same instance name
    #[error("instance {0} is defined twice")]
    DuplicateInstance(String),

    /// A primary input is declared twice
    #[error("primary input {0} is declared twice")]
    DuplicateInput(String),

    /// A primary output is declared twice
    #[error("primary output {0} is declared twice")]
    DuplicateOutput(String),

    /// A port name is bound twice on the same node
    #[error("port {port} is bound twice on instance {var}")]
    DuplicatePort {
        /// Instance name
        var: String,
        /// Port name
        port: String,
    },

    /// A port or wire name is empty
    #[error("empty port binding on instance {0}")]
    EmptyBinding(String),

    /// A node does not drive anything
    #[error("instance {0} has no output port")]
    NoOutput(String),

    /// A wire has more than one driver
    #[error("wire {0} has multiple drivers")]
    MultipleDrivers(String),

    /// A node input is not driven by anything
    #[error("wire {wire} used by instance {var} is not driven anywhere")]
    DanglingWire {
        /// Wire name
        wire: String,
        /// Instance reading the wire
        var: String,
    },

    /// An assignment copies a wire that is not driven anywhere
    #[error("assignment to {target} reads {copied}, which is not driven anywhere")]
    DanglingAssignment {
        /// Assigned wire
        target: String,
        /// Copied wire
        copied: String,
    },

    /// A primary output is not driven by anything
    #[error("primary output {0} is not driven anywhere")]
    UndrivenOutput(String),

    /// Assignments form a cycle
    #[error("assignments form a cycle through {0}")]
    AssignmentCycle(String),

    /// Nodes form a combinational loop
    #[error("combinational loop through instance {0}")]
    CombinationalLoop(String),

    /// The list of output significances does not match the outputs
    #[error("got {got} output significances for {expected} primary outputs")]
    SignificanceLength {
        /// Number of primary outputs
        expected: usize,
        /// Number of significances given
        got: usize,
    },
}

/// Failure of an evaluation, as opposed to a successful evaluation with a large error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The cell has no known logic function
    #[error("no logic function known for cell {cell} (instance {var})")]
    UnsupportedCell {
        /// Cell type
        cell: String,
        /// Instance name
        var: String,
    },

    /// The output word does not fit the error metrics
    #[error("{0} primary outputs do not fit in a 64-bit word")]
    TooManyOutputs(usize),

    /// The dataset does not match the circuit
    #[error("dataset has {got} inputs, circuit has {expected}")]
    DatasetMismatch {
        /// Number of primary inputs of the circuit
        expected: usize,
        /// Number of inputs in the dataset
        got: usize,
    },

    /// Reference and approximate outputs cover a different number of patterns
    #[error("comparing {got} approximate outputs to {expected} reference outputs")]
    OutputCountMismatch {
        /// Number of reference outputs
        expected: usize,
        /// Number of approximate outputs
        got: usize,
    },

    /// An external collaborator failed
    #[error("evaluation failed: {0}")]
    Failed(String),
}

/// Errors raised by pruning strategies and the pruning driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PruneError {
    /// The netlist is not valid for the operation
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    /// The configuration is not valid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Significance labels are required but missing
    #[error("significance labels are missing, label the circuit first")]
    Unlabeled,
}

/// Invalid pruning configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The error threshold is negative or not finite
    #[error("error threshold must be a non-negative number, got {0}")]
    InvalidErrorThreshold(f64),

    /// The difference threshold for cut carving is not positive
    #[error("difference threshold must be a positive number, got {0}")]
    InvalidDiffThreshold(f64),

    /// The iteration budget is zero
    #[error("iteration budget must be positive")]
    ZeroIterations,

    /// The number of parallel jobs is zero
    #[error("number of jobs must be positive")]
    ZeroJobs,

    /// The number of patterns is zero
    #[error("number of patterns must be positive")]
    ZeroPatterns,
}

/// Errors raised while reading or writing netlist files
#[derive(Debug, Error)]
pub enum FileError {
    /// Underlying IO failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Syntax error in the file
    #[error("line {line}: {message}")]
    Parse {
        /// Line number, starting at 1
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The file describes an invalid netlist
    #[error(transparent)]
    Netlist(#[from] NetlistError),

    /// The file extension is not supported
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// The netlist cannot be represented in the file format
    #[error("instance {0} has several outputs, which the format cannot represent")]
    MultipleOutputs(String),
}
