//! Exact set of consumed token nullifiers.
//!
//! A false positive here would refuse a legitimate transfer forever, so
//! the set is exact rather than probabilistic. It has no interior locking:
//! the owning ledger holds it under the same lock as the rest of the state
//! it mutates, which is what makes check-and-consume one atomic step.

use std::collections::HashSet;

use duin_types::Digest;

use crate::{NullifierError, Result};

/// Consumed token nullifiers.
#[derive(Debug, Clone, Default)]
pub struct SpentSet {
    spent: HashSet<Digest>,
}

impl SpentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the nullifier has been consumed.
    pub fn contains(&self, nullifier: &Digest) -> bool {
        self.spent.contains(nullifier)
    }

    /// Consume a nullifier, refusing reuse.
    ///
    /// # Errors
    ///
    /// - [`NullifierError::DoubleSpend`] if the nullifier was already consumed
    pub fn insert_checked(&mut self, nullifier: Digest) -> Result<()> {
        if !self.spent.insert(nullifier) {
            tracing::warn!(%nullifier, "spent set: replayed token nullifier refused");
            return Err(NullifierError::DoubleSpend(nullifier));
        }
        tracing::debug!(count = self.spent.len(), "spent set: nullifier consumed");
        Ok(())
    }

    /// Number of consumed nullifiers.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// Whether nothing has been consumed yet.
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Iterate over consumed nullifiers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Digest> {
        self.spent.iter()
    }
}

impl FromIterator<Digest> for SpentSet {
    fn from_iter<I: IntoIterator<Item = Digest>>(iter: I) -> Self {
        Self {
            spent: iter.into_iter().collect(),
        }
    }
}
