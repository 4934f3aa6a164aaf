//! Noise device configuration

use densim_core::{DensityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the machine the buffers live on
///
/// The simulator never interprets it; it is carried through for display and
/// for operators that dispatch to an accelerator themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionTarget(String);

impl ExecutionTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The local CPU
    pub fn cpu() -> Self {
        Self::new("cpu")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExecutionTarget {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionTarget {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Configuration for a [`NoiseDevice`](crate::NoiseDevice)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name shown in the device description
    ///
    /// Default: "noisedevice"
    pub device_name: String,

    /// Number of density matrices simulated side by side
    ///
    /// A device keeps this equal to its buffer, so it follows clones.
    ///
    /// Default: 1
    pub batch_size: usize,

    /// Where the buffers live
    ///
    /// Default: "cpu"
    pub target: ExecutionTarget,

    /// Record every dispatched operation in the ledger
    ///
    /// Default: false
    pub record_op: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: "noisedevice".to_string(),
            batch_size: 1,
            target: ExecutionTarget::default(),
            record_op: false,
        }
    }
}

impl DeviceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_target(mut self, target: impl Into<ExecutionTarget>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_record_op(mut self, enabled: bool) -> Self {
        self.record_op = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DensityError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
