//! Named operators applied to a density buffer
//!
//! Gates and noise channels live outside this crate. They plug in by
//! implementing [`Operator`] and being registered under a name in an
//! [`OperatorRegistry`]; a [`NoiseDevice`](crate::NoiseDevice) then dispatches
//! calls by that name.
//!
//! # Example
//!
//! ```
//! use densim_core::Result;
//! use densim_state::{Operator, OperatorContext, OperatorRegistry};
//!
//! #[derive(Debug)]
//! struct Identity;
//!
//! impl Operator for Identity {
//!     fn name(&self) -> &str { "identity" }
//!     fn num_wires(&self) -> usize { 1 }
//!     fn apply(&self, _ctx: &mut OperatorContext<'_>, _wires: &[usize], _params: &[f64]) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = OperatorRegistry::new();
//! registry.register("i", Identity);
//! assert!(registry.contains("i"));
//! ```

use crate::buffer::DensityStateBuffer;
use densim_core::{NoiseModel, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything an operator may read or write while it runs
pub struct OperatorContext<'a> {
    /// The batch to transform in place
    pub buffer: &'a mut DensityStateBuffer,
    /// Channel probabilities of the dispatching device
    pub noise_model: &'a NoiseModel,
    /// Whether the inverse operation was requested
    pub inverse: bool,
}

/// An operation that transforms a density buffer
///
/// Implementations must keep the buffer in expanded per-qubit layout. Wires
/// are range-checked and deduplicated by the device before `apply` runs, and
/// the device records the call in its ledger after `apply` succeeds.
pub trait Operator: Send + Sync + fmt::Debug {
    /// The operator name (e.g. "bitflip")
    fn name(&self) -> &str;

    /// Number of wires the operator acts on
    fn num_wires(&self) -> usize;

    /// Get a description of this operator
    fn description(&self) -> String {
        format!("{}-wire operator '{}'", self.num_wires(), self.name())
    }

    /// Transform `ctx.buffer` on `wires` with `params`
    fn apply(&self, ctx: &mut OperatorContext<'_>, wires: &[usize], params: &[f64]) -> Result<()>;
}

/// A registry mapping names to operators
///
/// Operators are stored behind `Arc` so one registry can be shared by many
/// devices.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// Create a registry with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            operators: HashMap::with_capacity(capacity),
        }
    }

    /// Register an operator
    ///
    /// If an operator with the same name already exists, it will be replaced.
    pub fn register(&mut self, name: impl Into<String>, operator: impl Operator + 'static) {
        self.operators.insert(name.into(), Arc::new(operator));
    }

    /// Register an operator already behind an Arc
    pub fn register_arc(&mut self, name: impl Into<String>, operator: Arc<dyn Operator>) {
        self.operators.insert(name.into(), operator);
    }

    /// Retrieve a registered operator
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operator>> {
        self.operators.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names in lexical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Operator>> {
        self.operators.remove(name)
    }

    pub fn clear(&mut self) {
        self.operators.clear();
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// List operators with their details, sorted by name
    pub fn list_operators(&self) -> Vec<OperatorInfo> {
        let mut infos: Vec<OperatorInfo> = self
            .operators
            .iter()
            .map(|(name, op)| OperatorInfo {
                name: name.clone(),
                num_wires: op.num_wires(),
                description: op.description(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

/// Information about a registered operator
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorInfo {
    pub name: String,
    pub num_wires: usize,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[derive(Debug)]
    struct ScaleFirst(f64);

    impl Operator for ScaleFirst {
        fn name(&self) -> &str {
            "scale"
        }

        fn num_wires(&self) -> usize {
            1
        }

        fn apply(&self, ctx: &mut OperatorContext<'_>, _wires: &[usize], _params: &[f64]) -> Result<()> {
            ctx.buffer
                .densities_mut()
                .mapv_inplace(|z| z * Complex64::new(self.0, 0.0));
            Ok(())
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = OperatorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_retrieve() {
        let mut registry = OperatorRegistry::with_capacity(4);
        registry.register("half", ScaleFirst(0.5));
        assert!(registry.contains("half"));
        assert_eq!(registry.get("half").unwrap().name(), "scale");
        assert!(registry.get("double").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = OperatorRegistry::new();
        registry.register("s", ScaleFirst(0.5));
        registry.register("s", ScaleFirst(2.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_and_clear() {
        let mut registry = OperatorRegistry::new();
        registry.register("a", ScaleFirst(1.0));
        registry.register_arc("b", Arc::new(ScaleFirst(1.0)));
        assert!(registry.unregister("a").is_some());
        assert_eq!(registry.names(), vec!["b"]);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_operators_sorted() {
        let mut registry = OperatorRegistry::new();
        registry.register("zeta", ScaleFirst(1.0));
        registry.register("alpha", ScaleFirst(1.0));
        let infos = registry.list_operators();
        assert_eq!(infos[0].name, "alpha");
        assert_eq!(infos[1].name, "zeta");
        assert_eq!(infos[0].description, "1-wire operator 'scale'");
    }

    #[test]
    fn test_operator_mutates_buffer() {
        let mut buffer = DensityStateBuffer::new(1, 1).unwrap();
        let noise = NoiseModel::default();
        let mut ctx = OperatorContext {
            buffer: &mut buffer,
            noise_model: &noise,
            inverse: false,
        };
        ScaleFirst(0.5).apply(&mut ctx, &[0], &[]).unwrap();
        assert_eq!(buffer.trace(0).unwrap(), Complex64::new(0.5, 0.0));
    }
}
