//! Noise device: a density buffer driven by named operators
//!
//! The device owns the density buffer, the operation ledger and the noise
//! model, and holds a shared [`OperatorRegistry`]. Operations are dispatched
//! by name; each successful dispatch is appended to the ledger when
//! recording is enabled.
//!
//! # Example
//!
//! ```
//! use densim_core::NoiseModel;
//! use densim_state::{DeviceConfig, NoiseDevice};
//!
//! let config = DeviceConfig::new().with_batch_size(2).with_record_op(true);
//! let device = NoiseDevice::new(2, config, NoiseModel::default()).unwrap();
//!
//! assert_eq!(device.batch_size(), 2);
//! assert_eq!(device.probabilities(0).unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
//! ```

use crate::buffer::DensityStateBuffer;
use crate::config::{DeviceConfig, ExecutionTarget};
use crate::operator::{OperatorContext, OperatorRegistry};
use densim_core::{DensityError, NoiseModel, OperationLedger, OperationRecord, Result};
use ndarray::{Array1, Array2, Array3, ArrayD, ArrayViewMutD};
use num_complex::Complex64;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Density-matrix simulator for noisy circuits
pub struct NoiseDevice {
    /// Device configuration
    config: DeviceConfig,

    /// Current batch of density matrices
    buffer: DensityStateBuffer,

    /// History of dispatched operations
    ledger: OperationLedger,

    /// Channel probabilities read by noise operators
    noise_model: NoiseModel,

    /// Operators callable by name
    registry: Arc<OperatorRegistry>,
}

impl NoiseDevice {
    /// Create a device of `num_wires` qubits in the ground state
    ///
    /// The registry starts empty; attach one with
    /// [`with_registry`](Self::with_registry).
    pub fn new(num_wires: usize, config: DeviceConfig, noise_model: NoiseModel) -> Result<Self> {
        config.validate()?;
        let buffer = DensityStateBuffer::new(num_wires, config.batch_size)?;
        let ledger = OperationLedger::new(config.record_op);

        debug!(
            device = %config.device_name,
            num_wires,
            batch_size = config.batch_size,
            target = %config.target,
            record_op = config.record_op,
            "created noise device"
        );

        Ok(Self {
            config,
            buffer,
            ledger,
            noise_model,
            registry: Arc::new(OperatorRegistry::new()),
        })
    }

    /// Attach a shared operator registry
    pub fn with_registry(mut self, registry: Arc<OperatorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Class name shown in the description
    pub fn name(&self) -> &'static str {
        "NoiseDevice"
    }

    pub fn device_name(&self) -> &str {
        &self.config.device_name
    }

    #[inline]
    pub fn num_wires(&self) -> usize {
        self.buffer.num_wires()
    }

    /// Current batch size; follows the last clone
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.buffer.batch_size()
    }

    pub fn target(&self) -> &ExecutionTarget {
        &self.config.target
    }

    /// The active configuration; `batch_size` follows the buffer
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn buffer(&self) -> &DensityStateBuffer {
        &self.buffer
    }

    /// Mutable view of the batch; the shape is locked
    pub fn densities_mut(&mut self) -> ArrayViewMutD<'_, Complex64> {
        self.buffer.densities_mut()
    }

    /// The batch in expanded layout
    pub fn densities(&self) -> &ArrayD<Complex64> {
        self.buffer.densities()
    }

    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Swap in a new noise model
    pub fn set_noise_model(&mut self, noise_model: NoiseModel) {
        self.noise_model = noise_model;
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &OperationLedger {
        &self.ledger
    }

    pub fn is_recording(&self) -> bool {
        self.ledger.is_recording()
    }

    /// Turn operation recording on or off
    pub fn set_record_op(&mut self, enabled: bool) {
        self.config.record_op = enabled;
        self.ledger.set_recording(enabled);
    }

    /// Clear the operation history; the densities are untouched
    pub fn reset_op_history(&mut self) {
        self.ledger.reset();
    }

    /// Restore every batch element to |0…0⟩⟨0…0|
    pub fn reset_state(&mut self) -> Result<()> {
        self.buffer.reset()?;
        self.sync_batch_size();
        Ok(())
    }

    /// Replace the batch with a deep copy of another device's densities
    pub fn clone_densities(&mut self, source: &ArrayD<Complex64>) -> Result<()> {
        self.buffer.clone_densities(source)?;
        self.sync_batch_size();
        Ok(())
    }

    /// Replace the batch with ρ = |ψ⟩⟨ψ| for each state in `states`
    pub fn clone_from_states(&mut self, states: &ArrayD<Complex64>) -> Result<()> {
        self.buffer.clone_from_states(states)?;
        self.sync_batch_size();
        Ok(())
    }

    pub fn as_2d_matrix(&self, index: usize) -> Result<Array2<Complex64>> {
        self.buffer.as_2d_matrix(index)
    }

    pub fn all_as_2d_matrices(&self) -> Result<Array3<Complex64>> {
        self.buffer.all_as_2d_matrices()
    }

    pub fn trace(&self, index: usize) -> Result<Complex64> {
        self.buffer.trace(index)
    }

    pub fn probabilities(&self, index: usize) -> Result<Array1<f64>> {
        self.buffer.probabilities(index)
    }

    pub fn all_probabilities(&self) -> Result<Array2<f64>> {
        self.buffer.all_probabilities()
    }

    /// Apply the operator registered as `name`
    pub fn apply(&mut self, name: &str, wires: &[usize], params: &[f64]) -> Result<()> {
        self.dispatch(OperationRecord::new(name, wires, params))
    }

    /// Apply the operator registered as `name` with explicit ledger flags
    pub fn apply_with(
        &mut self,
        name: &str,
        wires: &[usize],
        params: &[f64],
        inverse: bool,
        trainable: bool,
    ) -> Result<()> {
        self.dispatch(
            OperationRecord::new(name, wires, params)
                .with_inverse(inverse)
                .with_trainable(trainable),
        )
    }

    /// Apply the operation described by `op`, honoring its inverse flag
    ///
    /// On success `op` is appended to the ledger if recording is enabled.
    pub fn dispatch(&mut self, op: OperationRecord) -> Result<()> {
        let operator = self
            .registry
            .get(&op.name)
            .ok_or_else(|| DensityError::UnknownOperator(op.name.clone()))?;

        if op.wires.len() != operator.num_wires() {
            return Err(DensityError::wire_count_mismatch(
                &op.name,
                operator.num_wires(),
                op.wires.len(),
            ));
        }
        self.check_wires(&op.wires)?;

        trace!(op = %op, "dispatching operator");
        let mut ctx = OperatorContext {
            buffer: &mut self.buffer,
            noise_model: &self.noise_model,
            inverse: op.inverse,
        };
        let applied = operator.apply(&mut ctx, &op.wires, &op.params);
        self.sync_batch_size();
        applied?;

        self.ledger.record(op);
        Ok(())
    }

    /// Apply a sequence of recorded operations in order
    ///
    /// Stops at the first failure; earlier operations stay applied.
    pub fn replay<'a, I>(&mut self, ops: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a OperationRecord>,
    {
        for op in ops {
            self.dispatch(op.clone())?;
        }
        Ok(())
    }

    /// Keep the config's batch size equal to the buffer's
    fn sync_batch_size(&mut self) {
        self.config.batch_size = self.buffer.batch_size();
    }

    fn check_wires(&self, wires: &[usize]) -> Result<()> {
        let num_wires = self.num_wires();
        for (i, &wire) in wires.iter().enumerate() {
            if wire >= num_wires {
                return Err(DensityError::InvalidWire { wire, num_wires });
            }
            if wires[..i].contains(&wire) {
                return Err(DensityError::DuplicateWire(wire));
            }
        }
        Ok(())
    }
}

impl fmt::Display for NoiseDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " class: {}", self.name())?;
        writeln!(f, " device name: {}", self.config.device_name)?;
        writeln!(f, " number of qubits: {}", self.num_wires())?;
        writeln!(f, " batch size: {}", self.batch_size())?;
        writeln!(f, " current computing device: {}", self.config.target)?;
        writeln!(f, " recording op history: {}", self.is_recording())?;
        match self.all_probabilities() {
            Ok(probs) => {
                let rows: Vec<Vec<f64>> = probs.outer_iter().map(|p| p.to_vec()).collect();
                write!(f, " current states: {:?}", rows)
            }
            Err(err) => write!(f, " current states: <{}>", err),
        }
    }
}

impl fmt::Debug for NoiseDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseDevice")
            .field("device_name", &self.config.device_name)
            .field("buffer", &self.buffer)
            .field("noise_model", &self.noise_model)
            .field("ledger_len", &self.ledger.len())
            .field("operators", &self.registry.len())
            .finish()
    }
}
