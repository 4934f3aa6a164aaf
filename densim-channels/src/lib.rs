//! Kraus channel operators for densim
//!
//! Noise channels and fixed single-wire operations that plug into a
//! [`NoiseDevice`](densim_state::NoiseDevice) through its operator registry.
//!
//! - [`BitFlip`] / [`PhaseFlip`]: channels parameterized by the noise model
//! - [`KrausChannel`]: any fixed set of single-wire Kraus operators
//! - [`apply_single_wire_kraus`]: the contraction they share

pub mod channels;
pub mod kraus;

pub use channels::{BitFlip, KrausChannel, PhaseFlip};
pub use kraus::{apply_single_wire_kraus, is_trace_preserving, KrausOperator};

use densim_state::OperatorRegistry;

/// Registry with the default noise model's channels as "bitflip" and "phaseflip"
pub fn standard_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::with_capacity(2);
    registry.register("bitflip", BitFlip);
    registry.register("phaseflip", PhaseFlip);
    registry
}
