//! Prediction Provider Interface
//!
//! The fair-distribution distance metric weights contacts by externally
//! estimated behavior: how long contacts between a pair usually last, how
//! often they recur, and how much buffer tends to be free. Computing those
//! estimates (exponential moving averages in the adaptive router) is not this
//! crate's job; the search only consumes them through this interface, keyed
//! by the contact's endpoint pair id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-pair predictions consumed by the fairness metric.
pub trait PredictionProvider {
    /// Predicted duration of a contact between this pair, in seconds.
    fn contact_duration(&self, pair: &str) -> Option<f64>;

    /// Predicted interval between successive contacts of this pair, in
    /// seconds.
    fn time_between_contacts(&self, pair: &str) -> Option<f64>;

    /// Predicted free buffer capacity available to this pair, in capacity
    /// units.
    fn free_capacity(&self, pair: &str) -> Option<f64>;
}

/// One pair's prediction snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub contact_duration: f64,
    pub time_between_contacts: f64,
    pub free_capacity: f64,
}

impl PredictionEntry {
    pub fn new(contact_duration: f64, time_between_contacts: f64, free_capacity: f64) -> Self {
        Self {
            contact_duration,
            time_between_contacts,
            free_capacity,
        }
    }
}

/// A fixed table of predictions; useful for tests and for replaying
/// estimator snapshots captured elsewhere.
#[derive(Debug, Clone, Default)]
pub struct StaticPredictions {
    entries: BTreeMap<String, PredictionEntry>,
}

impl StaticPredictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: impl Into<String>, entry: PredictionEntry) {
        self.entries.insert(pair.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PredictionProvider for StaticPredictions {
    fn contact_duration(&self, pair: &str) -> Option<f64> {
        self.entries.get(pair).map(|e| e.contact_duration)
    }

    fn time_between_contacts(&self, pair: &str) -> Option<f64> {
        self.entries.get(pair).map(|e| e.time_between_contacts)
    }

    fn free_capacity(&self, pair: &str) -> Option<f64> {
        self.entries.get(pair).map(|e| e.free_capacity)
    }
}
