use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{KudosError, Result};
use crate::types::{HonorState, LedgerEntry};

use super::{LedgerStore, TxnOutcome};

/// In-memory ledger store.
///
/// Backs the server's `--memory` mode and the test suites. The mutex gives
/// every operation the same field-level atomicity the durable store provides.
#[derive(Default)]
pub struct MemoryStore {
    workspaces: Mutex<HashMap<String, BTreeMap<String, LedgerEntry>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a transport outage: while offline, every operation fails
    /// with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(KudosError::StoreUnavailable("store is offline".into()));
        }
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn read_entry(&self, workspace: &str, member: &str) -> Result<Option<LedgerEntry>> {
        self.check_online()?;
        let workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        Ok(workspaces
            .get(workspace)
            .and_then(|ledger| ledger.get(member))
            .cloned())
    }

    fn create_entry_if_absent(
        &self,
        workspace: &str,
        member: &str,
        entry: &LedgerEntry,
    ) -> Result<bool> {
        self.check_online()?;
        let mut workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        let ledger = workspaces.entry(workspace.to_string()).or_default();
        if ledger.contains_key(member) {
            return Ok(false);
        }
        ledger.insert(member.to_string(), entry.clone());
        Ok(true)
    }

    fn transact_remaining(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(u32) -> Option<u32>,
    ) -> Result<TxnOutcome> {
        self.check_online()?;
        let mut workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        let Some(entry) = workspaces
            .get_mut(workspace)
            .and_then(|ledger| ledger.get_mut(member))
        else {
            return Ok(TxnOutcome::NotInitialized);
        };
        match apply(entry.honors_remaining) {
            Some(new) => {
                entry.honors_remaining = new;
                Ok(TxnOutcome::Committed)
            }
            None => Ok(TxnOutcome::Aborted),
        }
    }

    fn transact_honored_by(
        &self,
        workspace: &str,
        member: &str,
        apply: &dyn Fn(HonorState) -> Option<HonorState>,
    ) -> Result<TxnOutcome> {
        self.check_online()?;
        let mut workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        let Some(entry) = workspaces
            .get_mut(workspace)
            .and_then(|ledger| ledger.get_mut(member))
        else {
            return Ok(TxnOutcome::NotInitialized);
        };
        match apply(entry.honored_by.clone()) {
            Some(new) => {
                entry.honored_by = new;
                Ok(TxnOutcome::Committed)
            }
            None => Ok(TxnOutcome::Aborted),
        }
    }

    fn list_workspace(&self, workspace: &str) -> Result<Vec<(String, LedgerEntry)>> {
        self.check_online()?;
        let workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        Ok(workspaces
            .get(workspace)
            .map(|ledger| {
                ledger
                    .iter()
                    .map(|(member, entry)| (member.clone(), entry.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove_workspace(&self, workspace: &str) -> Result<()> {
        self.check_online()?;
        let mut workspaces = self.workspaces.lock().expect("ledger lock poisoned");
        workspaces.remove(workspace);
        Ok(())
    }
}
