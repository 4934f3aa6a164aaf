//! Batched density-matrix state for noisy quantum simulation
//!
//! This crate holds the mixed state of an n-qubit register as a batch of
//! density matrices in expanded per-qubit layout, plus the device that drives
//! it through named operators.
//!
//! # Components
//!
//! - [`DensityStateBuffer`]: the batch, ground-state construction, cloning and
//!   the pure-state lift ρ = |ψ⟩⟨ψ|
//! - Views on the buffer: 2D matrices, probabilities and traces, always
//!   derived from the current contents
//! - [`Operator`] / [`OperatorRegistry`]: the extension point for gates and
//!   channels
//! - [`NoiseDevice`]: owns a buffer, a noise model and an operation ledger,
//!   and dispatches registered operators by name
//!
//! # Example
//!
//! ```
//! use densim_core::NoiseModel;
//! use densim_state::{DeviceConfig, NoiseDevice};
//! use ndarray::array;
//! use num_complex::Complex64;
//!
//! let mut device = NoiseDevice::new(1, DeviceConfig::default(), NoiseModel::default()).unwrap();
//! assert_eq!(device.probabilities(0).unwrap().to_vec(), vec![1.0, 0.0]);
//!
//! let excited = array![[Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]].into_dyn();
//! device.clone_from_states(&excited).unwrap();
//! assert_eq!(device.probabilities(0).unwrap().to_vec(), vec![0.0, 1.0]);
//! assert_eq!(device.trace(0).unwrap(), Complex64::new(1.0, 0.0));
//! ```

pub mod buffer;
pub mod config;
pub mod device;
pub mod operator;
pub mod views;

pub use buffer::{expanded_shape, DensityStateBuffer};
pub use config::{DeviceConfig, ExecutionTarget};
pub use device::NoiseDevice;
pub use operator::{Operator, OperatorContext, OperatorInfo, OperatorRegistry};
pub use views::{from_2d_matrices, from_2d_matrix};
