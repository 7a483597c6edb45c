//! Score ledger for Kudos.
//!
//! A ledger maps `(workspace, user)` to a signed score. Every mutation is a
//! single atomic read-modify-write, linearizable per key. Absent records read
//! as zero.
//!
//! Two backends are provided:
//! - [`MemoryLedger`]: sharded concurrent map, lost on restart
//! - [`RedbLedger`]: embedded redb file, one write transaction per update

mod error;
mod memory;
mod redb_store;

pub use error::{LedgerError, LedgerResult};
pub use memory::MemoryLedger;
pub use redb_store::RedbLedger;

/// Whether a change raises or lowers a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Add one.
    Increment,
    /// Subtract one.
    Decrement,
}

impl Direction {
    /// Signed amount this direction applies.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Increment => 1,
            Direction::Decrement => -1,
        }
    }
}

/// Atomic score storage.
///
/// Implementations must be safe to share across threads. Calls may block, so
/// async callers should run them on a blocking thread.
pub trait ScoreLedger: Send + Sync {
    /// Apply one change and return the resulting score.
    fn apply(&self, workspace: &str, user: &str, direction: Direction) -> LedgerResult<i64>;

    /// Current score, zero when no record exists.
    fn score(&self, workspace: &str, user: &str) -> LedgerResult<i64>;

    /// Release the underlying storage. Later calls fail with
    /// [`LedgerError::Closed`].
    fn close(&self) -> LedgerResult<()>;
}
