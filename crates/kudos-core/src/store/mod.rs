//! Ledger store abstraction.
//!
//! The honor ledger lives in a shared, eventually-consistent store that all
//! sessions write to concurrently. The only locking discipline available is a
//! per-field atomic read-modify-write, so the trait exposes exactly that: one
//! conditional transaction per ledger field, plus plain reads, additive entry
//! creation, and workspace subtree removal.

use crate::error::Result;
use crate::types::{HonorState, LedgerEntry};

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Result of a per-field transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOutcome {
    /// The closure produced a new value and it was committed.
    Committed,
    /// The closure declined to write; the field is unchanged.
    Aborted,
    /// No entry exists for the addressed member.
    NotInitialized,
}

/// Shared ledger store addressable by workspace and member id.
///
/// Implementations must serialize concurrent transactions on the same field:
/// each `transact_*` call observes a committed value and its write either
/// lands atomically or not at all. Transactions on *different* fields or
/// members are independent; the ledger deliberately never spans two fields
/// in one transaction.
pub trait LedgerStore: Send + Sync {
    /// Read one entry. `Ok(None)` when the member was never initialized.
    fn read_entry(&self, workspace: &str, member: &str) -> Result<Option<LedgerEntry>>;

    /// Create `entry` iff the member has none. Returns whether it was created.
    /// Existing entries are left untouched.
    fn create_entry_if_absent(
        &self,
        workspace: &str,
        member: &str,
        entry: &LedgerEntry,
    ) -> Result<bool>;

    /// Atomic read-modify-write of a member's `honorsRemaining` field.
    /// `apply` returns `Some(new)` to commit or `None` to abort.
    fn transact_remaining(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(u32) -> Option<u32>,
    ) -> Result<TxnOutcome>;

    /// Atomic read-modify-write of a member's `honoredBy` field.
    fn transact_honored_by(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(HonorState) -> Option<HonorState>,
    ) -> Result<TxnOutcome>;

    /// All entries in a workspace, in member-id order.
    fn list_workspace(&self, workspace: &str) -> Result<Vec<(String, LedgerEntry)>>;

    /// Delete the whole workspace subtree. Succeeds silently when empty.
    fn remove_workspace(&self, workspace: &str) -> Result<()>;
}
