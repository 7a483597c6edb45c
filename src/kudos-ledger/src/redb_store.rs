//! redb-based ledger backend.

use std::path::Path;

use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use crate::{Direction, LedgerError, LedgerResult, ScoreLedger};

/// Key: (workspace, user). Value: score.
const SCORES_TABLE: TableDefinition<(&str, &str), i64> = TableDefinition::new("scores");

/// Ledger persisted in a redb file.
///
/// Each [`apply`](ScoreLedger::apply) runs in its own write transaction.
/// redb admits one writer at a time, so updates are serialized and every
/// read-modify-write observes the previous commit. This holds across keys
/// too: writers for unrelated users wait on each other.
pub struct RedbLedger {
    db: RwLock<Option<Database>>,
}

impl RedbLedger {
    /// Open or create a ledger at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path)?;

        // Ensure the scores table exists
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SCORES_TABLE)?;
        }
        write_txn.commit()?;

        info!(path = %path.display(), "Opened score ledger");
        Ok(Self {
            db: RwLock::new(Some(db)),
        })
    }
}

impl ScoreLedger for RedbLedger {
    fn apply(&self, workspace: &str, user: &str, direction: Direction) -> LedgerResult<i64> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(LedgerError::Closed)?;

        let write_txn = db.begin_write()?;
        let score = {
            let mut table = write_txn.open_table(SCORES_TABLE)?;
            let current = table.get((workspace, user))?.map(|v| v.value()).unwrap_or(0);
            let next = current
                .checked_add(direction.delta())
                .ok_or_else(|| LedgerError::Overflow {
                    workspace: workspace.to_string(),
                    user: user.to_string(),
                })?;
            table.insert((workspace, user), next)?;
            next
        };
        write_txn.commit()?;

        debug!(workspace, user, score, "Score updated");
        Ok(score)
    }

    fn score(&self, workspace: &str, user: &str) -> LedgerResult<i64> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(LedgerError::Closed)?;

        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(SCORES_TABLE)?;
        Ok(table.get((workspace, user))?.map(|v| v.value()).unwrap_or(0))
    }

    fn close(&self) -> LedgerResult<()> {
        // Waits for in-flight transactions holding the read guard.
        if self.db.write().take().is_some() {
            info!("Closed score ledger");
        }
        Ok(())
    }
}
