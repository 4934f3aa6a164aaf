//! Noise model describing a mixture of named channels
//!
//! A [`NoiseModel`] maps a channel name (e.g. `"Bitflip"`) to the probability
//! with which that channel fires. The model is pure configuration: channel
//! operators look their probability up by name when they are applied, and
//! nothing in the density buffer interprets the mapping itself.
//!
//! # Example
//!
//! ```
//! use densim_core::NoiseModel;
//!
//! let model = NoiseModel::new([("Bitflip", 0.1), ("Phaseflip", 0.05)]);
//! assert_eq!(model.probability("Bitflip"), Some(0.1));
//! assert_eq!(model.probability("Depolarizing"), None);
//! ```

use crate::{DensityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Channel name used by bit flip operators
pub const BITFLIP: &str = "Bitflip";

/// Channel name used by phase flip operators
pub const PHASEFLIP: &str = "Phaseflip";

/// An immutable mapping from channel name to probability
///
/// Construction stores the mapping as given. Whether the implied channel is
/// trace preserving is not checked unless [`NoiseModel::validate`] is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseModel {
    kraus_dict: BTreeMap<String, f64>,
}

impl NoiseModel {
    /// Create a noise model from `(name, probability)` pairs
    pub fn new<I, K>(kraus_dict: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            kraus_dict: kraus_dict.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }

    /// A model in which every channel has probability zero
    pub fn noiseless() -> Self {
        Self::new([(BITFLIP, 0.0), (PHASEFLIP, 0.0)])
    }

    /// The stored channel mapping
    #[inline]
    pub fn kraus_dict(&self) -> &BTreeMap<String, f64> {
        &self.kraus_dict
    }

    /// Probability registered for `channel`, if any
    #[inline]
    pub fn probability(&self, channel: &str) -> Option<f64> {
        self.kraus_dict.get(channel).copied()
    }

    /// Number of channels in the mixture
    pub fn len(&self) -> usize {
        self.kraus_dict.len()
    }

    /// Whether the mixture names no channels
    pub fn is_empty(&self) -> bool {
        self.kraus_dict.is_empty()
    }

    /// Whether any channel has a non-zero probability
    pub fn has_noise(&self) -> bool {
        self.kraus_dict.values().any(|&p| p != 0.0)
    }

    /// Check that the mixture describes a valid channel
    ///
    /// Every probability must be finite and in `[0, 1]`, and the total must
    /// not exceed 1. Never called implicitly.
    pub fn validate(&self) -> Result<()> {
        for (name, &p) in &self.kraus_dict {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(DensityError::InvalidNoiseModel(format!(
                    "probability for '{}' must be in [0,1], got {}",
                    name, p
                )));
            }
        }

        let total: f64 = self.kraus_dict.values().sum();
        if total > 1.0 + 1e-12 {
            return Err(DensityError::InvalidNoiseModel(format!(
                "channel probabilities sum to {}, exceeding 1",
                total
            )));
        }

        Ok(())
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::noiseless()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, p)) in self.kraus_dict.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, p)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_noiseless() {
        let model = NoiseModel::default();
        assert_eq!(model.len(), 2);
        assert_eq!(model.probability(BITFLIP), Some(0.0));
        assert_eq!(model.probability(PHASEFLIP), Some(0.0));
        assert!(!model.has_noise());
    }

    #[test]
    fn test_construction_is_permissive() {
        // Out of range values are stored untouched
        let model = NoiseModel::new([("Bitflip", 1.5), ("Phaseflip", -0.2)]);
        assert_eq!(model.probability("Bitflip"), Some(1.5));
        assert_eq!(model.probability("Phaseflip"), Some(-0.2));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(NoiseModel::new([("Bitflip", 0.5), ("Phaseflip", 0.5)])
            .validate()
            .is_ok());
        assert!(NoiseModel::new([("Bitflip", 0.7), ("Phaseflip", 0.5)])
            .validate()
            .is_err());
        assert!(NoiseModel::new([("Bitflip", f64::NAN)]).validate().is_err());
    }

    #[test]
    fn test_display() {
        let model = NoiseModel::new([("Phaseflip", 0.25), ("Bitflip", 0.5)]);
        assert_eq!(model.to_string(), "{Bitflip: 0.5, Phaseflip: 0.25}");
    }

    #[test]
    fn test_json_round_trip() {
        let model = NoiseModel::new([("Bitflip", 0.125)]);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#"{"Bitflip":0.125}"#);
        let back: NoiseModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
