//! Operation history for static graph replay
//!
//! When recording is enabled every dispatched operation appends one
//! [`OperationRecord`]. The ledger is never read back by the simulator; it
//! exists so an external graph builder can replay the same sequence.

use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::trace;

/// Descriptor of one applied operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Registered operator name
    pub name: String,
    /// Wires the operator acted on, in call order
    pub wires: SmallVec<[usize; 2]>, // Most operations touch 1-2 wires
    /// Numeric parameters passed to the operator
    pub params: Vec<f64>,
    /// Whether the inverse was requested
    #[serde(default)]
    pub inverse: bool,
    /// Whether the parameters are trainable
    #[serde(default)]
    pub trainable: bool,
}

impl OperationRecord {
    pub fn new(name: impl Into<String>, wires: &[usize], params: &[f64]) -> Self {
        Self {
            name: name.into(),
            wires: SmallVec::from_slice(wires),
            params: params.to_vec(),
            inverse: false,
            trainable: false,
        }
    }

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    pub fn with_trainable(mut self, trainable: bool) -> Self {
        self.trainable = trainable;
        self
    }
}

impl fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.name, self.wires.as_slice())?;
        if !self.params.is_empty() {
            write!(f, "({:?})", self.params)?;
        }
        if self.inverse {
            write!(f, "†")?;
        }
        Ok(())
    }
}

/// Append-only log of applied operations
#[derive(Debug, Clone, Default)]
pub struct OperationLedger {
    recording: bool,
    entries: Vec<OperationRecord>,
}

impl OperationLedger {
    /// Create an empty ledger
    pub fn new(recording: bool) -> Self {
        Self {
            recording,
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Turn recording on or off; existing entries are kept
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Append `entry` if recording is enabled
    ///
    /// Returns whether the entry was stored.
    pub fn record(&mut self, entry: OperationRecord) -> bool {
        if !self.recording {
            return false;
        }
        trace!(op = %entry, index = self.entries.len(), "recording operation");
        self.entries.push(entry);
        true
    }

    /// Drop every entry
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[OperationRecord] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export entries in call order as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Rebuild a recording ledger from a JSON array of entries
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<OperationRecord> = serde_json::from_str(json)?;
        Ok(Self {
            recording: true,
            entries,
        })
    }
}

impl<'a> IntoIterator for &'a OperationLedger {
    type Item = &'a OperationRecord;
    type IntoIter = std::slice::Iter<'a, OperationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_ledger_ignores_records() {
        let mut ledger = OperationLedger::new(false);
        assert!(!ledger.record(OperationRecord::new("bitflip", &[0], &[])));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_records_in_call_order() {
        let mut ledger = OperationLedger::new(true);
        for wire in 0..4 {
            ledger.record(OperationRecord::new("phaseflip", &[wire], &[0.1]));
        }
        assert_eq!(ledger.len(), 4);
        let wires: Vec<usize> = ledger.iter().map(|r| r.wires[0]).collect();
        assert_eq!(wires, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_no_deduplication() {
        let mut ledger = OperationLedger::new(true);
        let op = OperationRecord::new("bitflip", &[1], &[0.5]);
        ledger.record(op.clone());
        ledger.record(op);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_reset_keeps_recording_flag() {
        let mut ledger = OperationLedger::new(true);
        ledger.record(OperationRecord::new("bitflip", &[0], &[]));
        ledger.reset();
        assert!(ledger.is_empty());
        assert!(ledger.is_recording());
    }

    #[test]
    fn test_toggle_recording() {
        let mut ledger = OperationLedger::new(false);
        ledger.set_recording(true);
        ledger.record(OperationRecord::new("a", &[0], &[]));
        ledger.set_recording(false);
        ledger.record(OperationRecord::new("b", &[0], &[]));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].name, "a");
    }

    #[test]
    fn test_record_display() {
        let op = OperationRecord::new("rx", &[0, 2], &[0.5]).with_inverse(true);
        assert_eq!(op.to_string(), "rx[0, 2]([0.5])†");
    }

    #[test]
    fn test_json_round_trip() {
        let mut ledger = OperationLedger::new(true);
        ledger.record(OperationRecord::new("bitflip", &[0], &[0.2]).with_trainable(true));
        ledger.record(OperationRecord::new("phaseflip", &[1], &[]));

        let json = ledger.to_json().unwrap();
        let back = OperationLedger::from_json(&json).unwrap();
        assert_eq!(back.entries(), ledger.entries());
    }

    #[test]
    fn test_json_defaults_flags() {
        let json = r#"[{"name":"bitflip","wires":[0],"params":[]}]"#;
        let ledger = OperationLedger::from_json(json).unwrap();
        assert!(!ledger.entries()[0].inverse);
        assert!(!ledger.entries()[0].trainable);
    }
}
