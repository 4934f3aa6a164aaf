//! Error types for densim

use thiserror::Error;

/// Errors that can occur while building, cloning or observing density states
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DensityError {
    /// Input array does not match the expanded per-qubit layout
    #[error("Shape mismatch: expected {expected}, got {actual:?}")]
    ShapeMismatch { expected: String, actual: Vec<usize> },

    /// Batch index past the end of the batch
    #[error("Batch index {index} out of range for batch of size {batch_size}")]
    BatchIndexOutOfRange { index: usize, batch_size: usize },

    /// Batch size must be at least one
    #[error("Invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    /// Buffer for this many qubits cannot be addressed
    #[error("Density buffer for {num_wires} qubits exceeds addressable memory")]
    StateTooLarge { num_wires: usize },

    /// No operator registered under this name
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    /// Wire index outside the register
    #[error("Invalid wire {wire}: device has only {num_wires} wires")]
    InvalidWire { wire: usize, num_wires: usize },

    /// Same wire listed twice for one operation
    #[error("Duplicate wire {0} in operation")]
    DuplicateWire(usize),

    /// Operator applied to the wrong number of wires
    #[error("Operator '{operator}' requires {expected} wires, but {actual} were provided")]
    WireCountMismatch {
        operator: String,
        expected: usize,
        actual: usize,
    },

    /// Operator parameter rejected
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Raised only by explicit noise model validation
    #[error("Invalid noise model: {0}")]
    InvalidNoiseModel(String),

    /// JSON export or import failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DensityError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: impl Into<String>, actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a wire count error
    pub fn wire_count_mismatch(operator: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::WireCountMismatch {
            operator: operator.into(),
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for DensityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
