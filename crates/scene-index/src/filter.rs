//! Month exclusion filter.

use explorer_common::Scene;
use std::collections::BTreeSet;

/// Set of excluded calendar months (1-12).
///
/// A scene whose timestamp carries no parseable month is always admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthFilter {
    excluded: BTreeSet<u8>,
}

impl MonthFilter {
    /// A filter admitting every scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter excluding the given months; values outside 1-12 are ignored.
    pub fn excluding(months: impl IntoIterator<Item = u8>) -> Self {
        let mut filter = Self::new();
        for month in months {
            filter.exclude(month);
        }
        filter
    }

    pub fn exclude(&mut self, month: u8) {
        if (1..=12).contains(&month) {
            self.excluded.insert(month);
        }
    }

    pub fn include(&mut self, month: u8) {
        self.excluded.remove(&month);
    }

    /// Flip one month; returns true when the month is now excluded.
    pub fn toggle(&mut self, month: u8) -> bool {
        if self.excluded.remove(&month) {
            false
        } else {
            self.exclude(month);
            self.excluded.contains(&month)
        }
    }

    pub fn is_excluded(&self, month: u8) -> bool {
        self.excluded.contains(&month)
    }

    pub fn excluded(&self) -> impl Iterator<Item = u8> + '_ {
        self.excluded.iter().copied()
    }

    /// Whether the scene passes the filter.
    pub fn admits(&self, scene: &Scene) -> bool {
        match scene.month() {
            Some(month) => !self.excluded.contains(&month),
            None => true,
        }
    }
}
