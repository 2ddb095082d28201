//! Durable ledger store on redb.
//!
//! # Table design
//!
//! A single `LEDGER` table maps `"{workspace}/{member}"` to a JSON-encoded
//! `LedgerEntry`. Workspace and member ids come from the tracker as UUIDs and
//! URL slugs, neither of which contains `/`, so the separator is unambiguous.
//!
//! A workspace subtree is the key range `["{ws}/", "{ws}0")` — `'0'` is the
//! ASCII successor of `'/'`, so the half-open range covers exactly the keys
//! with that prefix. Listing and removal are single range operations.
//!
//! Each `transact_*` call is one redb write transaction. redb serializes
//! writers, which gives the per-field read-modify-write atomicity the ledger
//! protocol relies on.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{KudosError, Result};
use crate::types::{HonorState, LedgerEntry};

use super::{LedgerStore, TxnOutcome};

const LEDGER: TableDefinition<&str, &[u8]> = TableDefinition::new("ledger");

fn store_err(e: impl std::fmt::Display) -> KudosError {
    KudosError::StoreUnavailable(e.to_string())
}

fn entry_key(workspace: &str, member: &str) -> String {
    debug_assert!(
        !workspace.contains('/'),
        "workspace id must not contain '/'"
    );
    debug_assert!(!member.contains('/'), "member id must not contain '/'");
    format!("{workspace}/{member}")
}

/// Upper bound (exclusive) of a workspace's key range.
fn workspace_end(workspace: &str) -> String {
    format!("{workspace}0")
}

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(store_err)?;
        // Ensure the table exists before any reads
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(LEDGER).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }

    /// Atomic read-modify-write of one entry. `mutate` sees the current entry
    /// and returns `Some` to commit a changed copy or `None` to abort.
    fn transact_entry(
        &self,
        workspace: &str,
        member: &str,
        mutate: &dyn Fn(&mut LedgerEntry) -> bool,
    ) -> Result<TxnOutcome> {
        let key = entry_key(workspace, member);
        let wt = self.db.begin_write().map_err(store_err)?;
        let outcome;
        {
            let mut table = wt.open_table(LEDGER).map_err(store_err)?;
            let current = match table.get(key.as_str()).map_err(store_err)? {
                Some(raw) => Some(serde_json::from_slice::<LedgerEntry>(raw.value())?),
                None => None,
            };
            match current {
                None => outcome = TxnOutcome::NotInitialized,
                Some(mut entry) => {
                    if mutate(&mut entry) {
                        let value = serde_json::to_vec(&entry)?;
                        table
                            .insert(key.as_str(), value.as_slice())
                            .map_err(store_err)?;
                        outcome = TxnOutcome::Committed;
                    } else {
                        outcome = TxnOutcome::Aborted;
                    }
                }
            }
        }
        wt.commit().map_err(store_err)?;
        Ok(outcome)
    }
}

impl LedgerStore for RedbStore {
    fn read_entry(&self, workspace: &str, member: &str) -> Result<Option<LedgerEntry>> {
        let key = entry_key(workspace, member);
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(LEDGER).map_err(store_err)?;
        match table.get(key.as_str()).map_err(store_err)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    fn create_entry_if_absent(
        &self,
        workspace: &str,
        member: &str,
        entry: &LedgerEntry,
    ) -> Result<bool> {
        let key = entry_key(workspace, member);
        let wt = self.db.begin_write().map_err(store_err)?;
        let created;
        {
            let mut table = wt.open_table(LEDGER).map_err(store_err)?;
            if table.get(key.as_str()).map_err(store_err)?.is_some() {
                created = false;
            } else {
                let value = serde_json::to_vec(entry)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(store_err)?;
                created = true;
            }
        }
        wt.commit().map_err(store_err)?;
        Ok(created)
    }

    fn transact_remaining(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(u32) -> Option<u32>,
    ) -> Result<TxnOutcome> {
        self.transact_entry(workspace, member, &|entry| {
            match apply(entry.honors_remaining) {
                Some(new) => {
                    entry.honors_remaining = new;
                    true
                }
                None => false,
            }
        })
    }

    fn transact_honored_by(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(HonorState) -> Option<HonorState>,
    ) -> Result<TxnOutcome> {
        self.transact_entry(workspace, member, &|entry| {
            match apply(entry.honored_by.clone()) {
                Some(new) => {
                    entry.honored_by = new;
                    true
                }
                None => false,
            }
        })
    }

    fn list_workspace(&self, workspace: &str) -> Result<Vec<(String, LedgerEntry)>> {
        let start = entry_key(workspace, "");
        let end = workspace_end(workspace);
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(LEDGER).map_err(store_err)?;

        let mut result = Vec::new();
        for item in table
            .range(start.as_str()..end.as_str())
            .map_err(store_err)?
        {
            let (k, v) = item.map_err(store_err)?;
            let member = k.value()[start.len()..].to_string();
            let entry: LedgerEntry = serde_json::from_slice(v.value())?;
            result.push((member, entry));
        }
        Ok(result)
    }

    fn remove_workspace(&self, workspace: &str) -> Result<()> {
        let start = entry_key(workspace, "");
        let end = workspace_end(workspace);
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(LEDGER).map_err(store_err)?;
            let keys: Vec<String> = table
                .range(start.as_str()..end.as_str())
                .map_err(store_err)?
                .map(|item| item.map(|(k, _)| k.value().to_string()).map_err(store_err))
                .collect::<Result<_>>()?;
            for key in keys {
                table.remove(key.as_str()).map_err(store_err)?;
            }
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }
}
