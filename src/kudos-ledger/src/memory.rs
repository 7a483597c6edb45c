//! In-memory ledger backend.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::{Direction, LedgerError, LedgerResult, ScoreLedger};

/// Ledger backed by a sharded concurrent map.
///
/// Updates lock only the shard holding the key, so unrelated users never
/// wait on each other beyond shard collisions.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    scores: DashMap<(String, String), i64>,
    closed: AtomicBool,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether no record has been written yet.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn ensure_open(&self) -> LedgerResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LedgerError::Closed);
        }
        Ok(())
    }
}

impl ScoreLedger for MemoryLedger {
    fn apply(&self, workspace: &str, user: &str, direction: Direction) -> LedgerResult<i64> {
        self.ensure_open()?;

        let key = (workspace.to_string(), user.to_string());
        let score = match self.scores.entry(key) {
            Entry::Occupied(mut entry) => {
                let next = entry.get().checked_add(direction.delta()).ok_or_else(|| {
                    LedgerError::Overflow {
                        workspace: workspace.to_string(),
                        user: user.to_string(),
                    }
                })?;
                *entry.get_mut() = next;
                next
            }
            Entry::Vacant(entry) => *entry.insert(direction.delta()),
        };

        debug!(workspace, user, score, "Score updated");
        Ok(score)
    }

    fn score(&self, workspace: &str, user: &str) -> LedgerResult<i64> {
        self.ensure_open()?;
        Ok(self
            .scores
            .get(&(workspace.to_string(), user.to_string()))
            .map(|entry| *entry.value())
            .unwrap_or(0))
    }

    fn close(&self) -> LedgerResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
