use std::collections::BTreeMap;

use super::document::{Collider, Stats};

/// Warnings and counters collected during an export.
///
/// Each GameObject build produces its own `Diagnostics`; the scanner merges
/// them into the run-wide one in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<String>,
    colliders: BTreeMap<String, usize>,
    levels: usize,
    game_objects: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a structural warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Count `collider` and every compound child beneath it.
    pub fn count_collider(&mut self, collider: &Collider) {
        collider.visit(&mut |c| {
            *self.colliders.entry(c.kind().to_string()).or_insert(0) += 1;
        });
    }

    pub fn count_game_object(&mut self) {
        self.game_objects += 1;
    }

    pub fn count_level(&mut self) {
        self.levels += 1;
    }

    pub fn collider_count(&self, kind: &str) -> usize {
        self.colliders.get(kind).copied().unwrap_or(0)
    }

    /// Append `other`'s warnings after ours and add its counters.
    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        for (kind, count) in other.colliders {
            *self.colliders.entry(kind).or_insert(0) += count;
        }
        self.levels += other.levels;
        self.game_objects += other.game_objects;
    }

    pub fn stats(&self) -> Stats {
        Stats {
            levels: self.levels,
            game_objects: self.game_objects,
            colliders: self.colliders.clone(),
        }
    }
}
