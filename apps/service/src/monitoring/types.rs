use std::fmt;

use crate::config::TargetEntry;

/// A monitored page, identified by its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Unique key of the target, the page URL
    pub identity: String,

    /// Human readable name used in logs and notifications
    pub display_name: String,
}

impl Target {
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { identity: identity.into(), display_name: display_name.into() }
    }
}

impl From<&TargetEntry> for Target {
    fn from(entry: &TargetEntry) -> Self {
        Self::new(entry.url.clone(), entry.name.clone())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Fields extracted from one fetch of one target
///
/// `None` means the field was not found, which is distinct from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    pub stock: Option<u64>,
    pub price: Option<f64>,
}

impl Observation {
    pub fn new(stock: Option<u64>, price: Option<f64>) -> Self {
        Self { stock, price }
    }

    /// Observation of a failed fetch
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when neither field was found
    pub fn is_empty(&self) -> bool {
        self.stock.is_none() && self.price.is_none()
    }
}

/// Last known values of a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    pub last_stock: Option<u64>,
    pub last_price: Option<f64>,
}

impl From<Observation> for TargetState {
    fn from(observation: Observation) -> Self {
        Self { last_stock: observation.stock, last_price: observation.price }
    }
}

impl TargetState {
    /// Whether `observation` carries the same values as this state
    pub fn matches(&self, observation: &Observation) -> bool {
        self.last_stock == observation.stock && self.last_price == observation.price
    }
}

/// Verdict of comparing a new observation against stored state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffResult {
    /// First usable observation, recorded silently
    Seeded,
    Unchanged,
    Changed {
        previous_stock: Option<u64>,
        previous_price: Option<f64>,
        new_stock: Option<u64>,
        new_price: Option<f64>,
    },
    /// Nothing known yet and nothing usable observed
    Indeterminate,
}

/// Tally of one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub seeded: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub indeterminate: usize,
    pub failed: usize,
}

impl CycleReport {
    pub fn record(&mut self, diff: &DiffResult) {
        match diff {
            DiffResult::Seeded => self.seeded += 1,
            DiffResult::Unchanged => self.unchanged += 1,
            DiffResult::Changed { .. } => self.changed += 1,
            DiffResult::Indeterminate => self.indeterminate += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.seeded + self.unchanged + self.changed + self.indeterminate + self.failed
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seeded, {} unchanged, {} changed, {} indeterminate, {} failed",
            self.seeded, self.unchanged, self.changed, self.indeterminate, self.failed
        )
    }
}
