use crate::classification::Classification;
use std::collections::HashMap;

/// Failed attempts of a single logical request, counted per classification.
///
/// Created empty when the request starts and dropped when it terminates, so budgets are never
/// shared between requests.
#[derive(Debug, Default, Clone)]
pub struct RetryState {
    attempts: HashMap<Classification, u32>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more failed attempt and return the total for that classification.
    pub fn record(&mut self, classification: Classification) -> u32 {
        let attempts = self.attempts.entry(classification).or_insert(0);
        *attempts += 1;
        *attempts
    }

    pub fn attempts(&self, classification: Classification) -> u32 {
        self.attempts.get(&classification).copied().unwrap_or(0)
    }

    /// Failed attempts across every classification.
    pub fn total(&self) -> u32 {
        self.attempts.values().sum()
    }
}
