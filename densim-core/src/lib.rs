//! Core types for batched density-matrix simulation
//!
//! This crate provides the configuration and bookkeeping shared by the
//! density state buffer and by channel operators:
//! - [`NoiseModel`]: named probability mixture consumed by channel operators
//! - [`OperationLedger`]: append-only history of dispatched operations
//! - [`DensityError`]: error type for every densim crate
//!
//! # Example
//! ```
//! use densim_core::{NoiseModel, OperationLedger, OperationRecord};
//!
//! let noise = NoiseModel::new([("Bitflip", 0.01)]);
//! let mut ledger = OperationLedger::new(true);
//! ledger.record(OperationRecord::new("bitflip", &[0], &[]));
//! assert_eq!(ledger.len(), 1);
//! assert!(noise.has_noise());
//! ```

pub mod error;
pub mod ledger;
pub mod noise;

pub use error::DensityError;
pub use ledger::{OperationLedger, OperationRecord};
pub use noise::{NoiseModel, BITFLIP, PHASEFLIP};

/// Type alias for results in densim
pub type Result<T> = std::result::Result<T, DensityError>;
