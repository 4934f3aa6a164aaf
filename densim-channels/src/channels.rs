//! Channel operators for noise devices
//!
//! [`BitFlip`] and [`PhaseFlip`] are the two channels of the default noise
//! model. Their probability comes from the first call parameter when one is
//! given, otherwise from the device's noise model entry for the channel; a
//! channel missing from the model fires with probability zero.
//!
//! # Example
//!
//! ```
//! use densim_channels::standard_registry;
//! use densim_core::NoiseModel;
//! use densim_state::{DeviceConfig, NoiseDevice};
//! use std::sync::Arc;
//!
//! let noise = NoiseModel::new([("Bitflip", 0.25), ("Phaseflip", 0.0)]);
//! let mut device = NoiseDevice::new(1, DeviceConfig::default(), noise)
//!     .unwrap()
//!     .with_registry(Arc::new(standard_registry()));
//!
//! device.apply("bitflip", &[0], &[]).unwrap();
//! let probs = device.probabilities(0).unwrap();
//! assert!((probs[1] - 0.25).abs() < 1e-12);
//! ```

use crate::kraus::{apply_single_wire_kraus, KrausOperator};
use densim_core::{DensityError, NoiseModel, Result, BITFLIP, PHASEFLIP};
use densim_state::{Operator, OperatorContext};

/// Probability from `params[0]`, falling back to the noise model entry
fn resolve_probability(params: &[f64], noise_model: &NoiseModel, channel: &str) -> Result<f64> {
    let p = match params.first() {
        Some(&p) => p,
        None => noise_model.probability(channel).unwrap_or(0.0),
    };

    if !(0.0..=1.0).contains(&p) {
        return Err(DensityError::invalid_parameter(
            channel,
            format!("probability must be in [0,1], got {}", p),
        ));
    }
    Ok(p)
}

/// The single target wire of a one-wire operator
fn target_wire(operator: &str, wires: &[usize]) -> Result<usize> {
    match wires {
        [wire] => Ok(*wire),
        _ => Err(DensityError::wire_count_mismatch(operator, 1, wires.len())),
    }
}

/// Noise channels have no inverse
fn reject_inverse(ctx: &OperatorContext<'_>, channel: &str) -> Result<()> {
    if ctx.inverse {
        return Err(DensityError::invalid_parameter(
            "inverse",
            format!("{} channel is not invertible", channel),
        ));
    }
    Ok(())
}

/// Bit flip channel
///
/// With probability p the qubit undergoes an X error. Requesting the inverse
/// fails with [`DensityError::InvalidParameter`].
///
/// # Kraus Operators
/// ```text
/// K₀ = √(1-p) I
/// K₁ = √p X
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BitFlip;

impl BitFlip {
    /// Kraus operators for flip probability `p`
    pub fn kraus_operators(p: f64) -> Vec<KrausOperator> {
        vec![
            KrausOperator::identity().scaled((1.0 - p).sqrt()),
            KrausOperator::pauli_x().scaled(p.sqrt()),
        ]
    }
}

impl Operator for BitFlip {
    fn name(&self) -> &str {
        "bitflip"
    }

    fn num_wires(&self) -> usize {
        1
    }

    fn apply(&self, ctx: &mut OperatorContext<'_>, wires: &[usize], params: &[f64]) -> Result<()> {
        let wire = target_wire(self.name(), wires)?;
        reject_inverse(ctx, self.name())?;
        let p = resolve_probability(params, ctx.noise_model, BITFLIP)?;
        apply_single_wire_kraus(ctx.buffer, wire, &Self::kraus_operators(p))
    }
}

/// Phase flip channel
///
/// With probability p the qubit undergoes a Z error, damping the
/// off-diagonal terms by a factor 1 - 2p. Requesting the inverse fails with
/// [`DensityError::InvalidParameter`].
///
/// # Kraus Operators
/// ```text
/// K₀ = √(1-p) I
/// K₁ = √p Z
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseFlip;

impl PhaseFlip {
    /// Kraus operators for flip probability `p`
    pub fn kraus_operators(p: f64) -> Vec<KrausOperator> {
        vec![
            KrausOperator::identity().scaled((1.0 - p).sqrt()),
            KrausOperator::pauli_z().scaled(p.sqrt()),
        ]
    }
}

impl Operator for PhaseFlip {
    fn name(&self) -> &str {
        "phaseflip"
    }

    fn num_wires(&self) -> usize {
        1
    }

    fn apply(&self, ctx: &mut OperatorContext<'_>, wires: &[usize], params: &[f64]) -> Result<()> {
        let wire = target_wire(self.name(), wires)?;
        reject_inverse(ctx, self.name())?;
        let p = resolve_probability(params, ctx.noise_model, PHASEFLIP)?;
        apply_single_wire_kraus(ctx.buffer, wire, &Self::kraus_operators(p))
    }
}

/// A fixed single-wire channel given by its Kraus operators
///
/// With the inverse flag set, the adjoint operators are applied instead,
/// which undoes a unitary.
#[derive(Debug, Clone)]
pub struct KrausChannel {
    name: String,
    operators: Vec<KrausOperator>,
}

impl KrausChannel {
    /// Create a channel; completeness is not checked
    pub fn new(name: impl Into<String>, operators: Vec<KrausOperator>) -> Self {
        Self {
            name: name.into(),
            operators,
        }
    }

    /// A channel with a single unitary operator
    pub fn unitary(name: impl Into<String>, matrix: KrausOperator) -> Self {
        Self::new(name, vec![matrix])
    }

    pub fn operators(&self) -> &[KrausOperator] {
        &self.operators
    }
}

impl Operator for KrausChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_wires(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        format!("1-wire channel '{}' with {} Kraus operators", self.name, self.operators.len())
    }

    fn apply(&self, ctx: &mut OperatorContext<'_>, wires: &[usize], _params: &[f64]) -> Result<()> {
        let wire = target_wire(&self.name, wires)?;
        if ctx.inverse {
            let adjoints: Vec<KrausOperator> = self.operators.iter().map(|k| k.adjoint()).collect();
            apply_single_wire_kraus(ctx.buffer, wire, &adjoints)
        } else {
            apply_single_wire_kraus(ctx.buffer, wire, &self.operators)
        }
    }
}
