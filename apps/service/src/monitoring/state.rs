use std::collections::HashMap;

use super::types::{DiffResult, Observation, Target, TargetState};

/// Last known observation of every target, keyed by target identity
///
/// An entry exists only once a target produced at least one usable field.
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct TargetStateStore {
    states: HashMap<String, TargetState>,
}

impl TargetStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&TargetState> {
        self.states.get(identity)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Compare `observation` against what is known about `target` and record it
    ///
    /// An observation with no fields at all never touches stored state, so a
    /// failed fetch cannot be mistaken for the stock running out.
    pub fn diff(&mut self, target: &Target, observation: &Observation) -> DiffResult {
        let Some(previous) = self.states.get_mut(&target.identity) else {
            if observation.is_empty() {
                return DiffResult::Indeterminate;
            }
            self.states.insert(target.identity.clone(), TargetState::from(*observation));
            return DiffResult::Seeded;
        };

        if observation.is_empty() || previous.matches(observation) {
            return DiffResult::Unchanged;
        }

        let diff = DiffResult::Changed {
            previous_stock: previous.last_stock,
            previous_price: previous.last_price,
            new_stock: observation.stock,
            new_price: observation.price,
        };
        *previous = TargetState::from(*observation);
        diff
    }
}
