//! The honor ledger: a bounded peer-recognition allocation.
//!
//! Every member starts with `MAX_HONORS` honors to give. Granting an honor
//! spends one unit of the giver's allowance and records the giver in the
//! recipient's `honoredBy` set. Re-honoring the same recipient is free and
//! changes nothing; an exhausted allowance makes further grants no-ops.
//!
//! The grant protocol runs as two independent per-field transactions against
//! the shared store (decrement giver, then credit recipient). A crash between
//! them leaves the giver one unit poorer with no matching credit. That window
//! is accepted: it is not detectable at grant time and never repaired
//! automatically, only surfaced by [`HonorLedger::audit_workspace`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{KudosError, Result};
use crate::store::{LedgerStore, TxnOutcome};
use crate::types::LedgerEntry;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a grant resolved. Every variant is a successful completion; the
/// no-op variants exist for logging and auditing, and presentation layers
/// must not distinguish them from `Granted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    /// The giver spent one honor and the recipient was credited.
    Granted,
    /// The giver had already honored this recipient; nothing changed.
    AlreadyHonored,
    /// Giver and recipient are the same member; nothing changed.
    SelfGrant,
    /// The giver's allowance is at zero; nothing changed.
    HonorsExhausted,
    /// The giver has no ledger entry (roster drift); nothing changed.
    GiverNotInitialized,
    /// The recipient has no ledger entry (roster drift); nothing changed.
    RecipientNotInitialized,
}

/// One giver whose spent honors don't match the credits found across the
/// workspace — the footprint of a grant interrupted between its two steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub member: String,
    pub honors_spent: u32,
    pub credits_found: u32,
}

/// A leaderboard row: member and distinct givers received from.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub member: String,
    pub honors_received: usize,
}

// ---------------------------------------------------------------------------
// HonorLedger
// ---------------------------------------------------------------------------

/// Per-workspace honor accounting over a shared [`LedgerStore`].
#[derive(Clone)]
pub struct HonorLedger {
    store: Arc<dyn LedgerStore>,
}

impl HonorLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Ensure an entry exists for every roster member. Additive only:
    /// members that already have an entry keep their accumulated state.
    ///
    /// On `StoreUnavailable` the caller must treat the whole workspace as
    /// uninitialized and retry; entries created before the failure are
    /// harmless (re-running skips them).
    pub fn initialize_workspace(&self, workspace: &str, roster: &[String]) -> Result<()> {
        for member in roster {
            let created = self
                .store
                .create_entry_if_absent(workspace, member, &LedgerEntry::new())?;
            if created {
                tracing::debug!(workspace, member = member.as_str(), "ledger entry created");
            }
        }
        Ok(())
    }

    /// Transfer one honor from `giver` to `recipient`.
    ///
    /// Safe to retry and safe under concurrent invocation from other
    /// sessions: the decrement is conditional on a positive allowance and
    /// the credit insert is idempotent. The two steps are deliberately NOT
    /// one atomic unit (see module docs).
    pub fn grant_honor(
        &self,
        giver: &str,
        recipient: &str,
        workspace: &str,
    ) -> Result<GrantOutcome> {
        // Members never honor themselves; presentation layers reject this
        // with user feedback, the ledger itself treats it as a no-op.
        if giver == recipient {
            return Ok(GrantOutcome::SelfGrant);
        }

        // Idempotence check: re-honoring the same member never costs a unit.
        let Some(recipient_entry) = self.store.read_entry(workspace, recipient)? else {
            tracing::warn!(workspace, recipient, "grant to uninitialized recipient");
            return Ok(GrantOutcome::RecipientNotInitialized);
        };
        if recipient_entry.honored_by.contains(giver) {
            return Ok(GrantOutcome::AlreadyHonored);
        }

        // Step 1: conditionally spend one unit of the giver's allowance.
        let spent = self
            .store
            .transact_remaining(workspace, giver, &|remaining| remaining.checked_sub(1))?;
        match spent {
            TxnOutcome::Committed => {}
            TxnOutcome::Aborted => return Ok(GrantOutcome::HonorsExhausted),
            TxnOutcome::NotInitialized => {
                tracing::warn!(workspace, giver, "grant from uninitialized giver");
                return Ok(GrantOutcome::GiverNotInitialized);
            }
        }

        // Step 2: credit the recipient. The insert is idempotent, so a
        // concurrent grant of the same pair cannot corrupt the set.
        let credited = self
            .store
            .transact_honored_by(workspace, recipient, &|state| {
                Some(state.with_giver(giver))
            })?;
        if credited == TxnOutcome::NotInitialized {
            // Recipient vanished (workspace reset raced us). The spent unit
            // is lost, exactly like the crash window; audit will surface it.
            tracing::warn!(workspace, giver, recipient, "credit lost: recipient gone");
        }

        tracing::info!(workspace, giver, recipient, "honor granted");
        Ok(GrantOutcome::Granted)
    }

    /// Distinct-giver counts for the requested members. Members with no
    /// entry (or the sentinel) report 0 — roster drift is not an error.
    pub fn honor_counts(
        &self,
        workspace: &str,
        members: &[String],
    ) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for member in members {
            let count = self
                .store
                .read_entry(workspace, member)?
                .map(|entry| entry.honored_by.count())
                .unwrap_or(0);
            counts.insert(member.clone(), count);
        }
        Ok(counts)
    }

    /// All workspace members ranked by honors received, descending;
    /// ties break by member id.
    pub fn leaderboard(&self, workspace: &str) -> Result<Vec<LeaderboardRow>> {
        let mut rows: Vec<LeaderboardRow> = self
            .store
            .list_workspace(workspace)?
            .into_iter()
            .map(|(member, entry)| LeaderboardRow {
                member,
                honors_received: entry.honored_by.count(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.honors_received
                .cmp(&a.honors_received)
                .then_with(|| a.member.cmp(&b.member))
        });
        Ok(rows)
    }

    /// Single entry read for admin/detail views.
    pub fn entry(&self, workspace: &str, member: &str) -> Result<LedgerEntry> {
        self.store
            .read_entry(workspace, member)?
            .ok_or_else(|| KudosError::EntryNotInitialized(member.to_string()))
    }

    /// Delete the workspace subtree. Test/admin utility; silent when empty.
    pub fn reset_workspace(&self, workspace: &str) -> Result<()> {
        self.store.remove_workspace(workspace)
    }

    /// Compare each giver's spent honors against the credits recorded for
    /// them across the workspace. A mismatch is the footprint of a grant
    /// that lost its second step. Reports only; never repairs.
    pub fn audit_workspace(&self, workspace: &str) -> Result<Vec<AuditFinding>> {
        let entries = self.store.list_workspace(workspace)?;

        let mut credits: BTreeMap<&str, u32> = BTreeMap::new();
        for (_, entry) in &entries {
            for giver in entry.honored_by.givers() {
                *credits.entry(giver).or_default() += 1;
            }
        }

        let mut findings = Vec::new();
        for (member, entry) in &entries {
            let spent = entry.honors_spent();
            let found = credits.get(member.as_str()).copied().unwrap_or(0);
            if spent != found {
                findings.push(AuditFinding {
                    member: member.clone(),
                    honors_spent: spent,
                    credits_found: found,
                });
            }
        }
        Ok(findings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RedbStore};
    use crate::types::{HonorState, MAX_HONORS};
    use tempfile::TempDir;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Run a scenario against every store backend. The grant protocol must
    /// behave identically on the in-memory store and the durable one.
    fn on_each_backend(scenario: &dyn Fn(&HonorLedger)) {
        let memory = HonorLedger::new(Arc::new(MemoryStore::new()));
        scenario(&memory);

        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("ledger.redb")).unwrap();
        let durable = HonorLedger::new(Arc::new(store));
        scenario(&durable);
    }

    fn init(ledger: &HonorLedger, roster: &[&str]) {
        ledger.initialize_workspace("ws", &ids(roster)).unwrap();
    }

    #[test]
    fn fresh_member_has_full_allowance_and_sentinel() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1"]);
            let entry = ledger.entry("ws", "u1").unwrap();
            assert_eq!(entry.honors_remaining, MAX_HONORS);
            assert_eq!(entry.honored_by, HonorState::NoHonors);
        });
    }

    #[test]
    fn single_grant_moves_one_unit() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2"]);
            let outcome = ledger.grant_honor("u1", "u2", "ws").unwrap();
            assert_eq!(outcome, GrantOutcome::Granted);

            let giver = ledger.entry("ws", "u1").unwrap();
            assert_eq!(giver.honors_remaining, 2);
            assert_eq!(giver.honored_by, HonorState::NoHonors);

            // honorsRemaining tracks honors to GIVE; receiving doesn't touch it.
            let recipient = ledger.entry("ws", "u2").unwrap();
            assert_eq!(recipient.honors_remaining, 3);
            assert!(recipient.honored_by.contains("u1"));
            assert_eq!(recipient.honored_by.count(), 1);
        });
    }

    #[test]
    fn double_grant_is_idempotent() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2"]);
            assert_eq!(
                ledger.grant_honor("u1", "u2", "ws").unwrap(),
                GrantOutcome::Granted
            );
            assert_eq!(
                ledger.grant_honor("u1", "u2", "ws").unwrap(),
                GrantOutcome::AlreadyHonored
            );

            let giver = ledger.entry("ws", "u1").unwrap();
            assert_eq!(giver.honors_remaining, 2);
            let recipient = ledger.entry("ws", "u2").unwrap();
            assert_eq!(recipient.honored_by.count(), 1);
        });
    }

    #[test]
    fn fourth_distinct_grant_is_a_complete_noop() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2", "u3", "u4", "u5"]);
            for recipient in ["u2", "u3", "u4"] {
                assert_eq!(
                    ledger.grant_honor("u1", recipient, "ws").unwrap(),
                    GrantOutcome::Granted
                );
            }
            assert_eq!(
                ledger.grant_honor("u1", "u5", "ws").unwrap(),
                GrantOutcome::HonorsExhausted
            );

            let giver = ledger.entry("ws", "u1").unwrap();
            assert_eq!(giver.honors_remaining, 0);
            for honored in ["u2", "u3", "u4"] {
                let entry = ledger.entry("ws", honored).unwrap();
                assert!(entry.honored_by.contains("u1"));
                assert_eq!(entry.honors_remaining, 3);
            }
            // u5 never got credited and stays at the sentinel.
            let u5 = ledger.entry("ws", "u5").unwrap();
            assert_eq!(u5.honored_by, HonorState::NoHonors);
        });
    }

    #[test]
    fn exhausted_giver_can_still_rehonor_existing_recipient() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2", "u3", "u4"]);
            for recipient in ["u2", "u3", "u4"] {
                ledger.grant_honor("u1", recipient, "ws").unwrap();
            }
            // Allowance is 0, but the idempotence check short-circuits first.
            assert_eq!(
                ledger.grant_honor("u1", "u2", "ws").unwrap(),
                GrantOutcome::AlreadyHonored
            );
        });
    }

    #[test]
    fn self_grant_is_a_complete_noop() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1"]);
            assert_eq!(
                ledger.grant_honor("u1", "u1", "ws").unwrap(),
                GrantOutcome::SelfGrant
            );
            let entry = ledger.entry("ws", "u1").unwrap();
            assert_eq!(entry.honors_remaining, MAX_HONORS);
            assert_eq!(entry.honored_by, HonorState::NoHonors);
        });
    }

    #[test]
    fn reinitialization_is_additive_only() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2"]);
            ledger.grant_honor("u1", "u2", "ws").unwrap();

            init(ledger, &["u1", "u2", "u3"]);

            let giver = ledger.entry("ws", "u1").unwrap();
            assert_eq!(giver.honors_remaining, 2);
            let recipient = ledger.entry("ws", "u2").unwrap();
            assert!(recipient.honored_by.contains("u1"));
            let added = ledger.entry("ws", "u3").unwrap();
            assert_eq!(added.honors_remaining, MAX_HONORS);
        });
    }

    #[test]
    fn counts_report_zero_for_fresh_and_missing_members() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2"]);
            ledger.grant_honor("u1", "u2", "ws").unwrap();

            let counts = ledger
                .honor_counts("ws", &ids(&["u1", "u2", "unknown"]))
                .unwrap();
            assert_eq!(counts["u1"], 0);
            assert_eq!(counts["u2"], 1);
            assert_eq!(counts["unknown"], 0);
        });
    }

    #[test]
    fn leaderboard_ranks_by_honors_received() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2", "u3"]);
            ledger.grant_honor("u1", "u3", "ws").unwrap();
            ledger.grant_honor("u2", "u3", "ws").unwrap();
            ledger.grant_honor("u1", "u2", "ws").unwrap();

            let board = ledger.leaderboard("ws").unwrap();
            assert_eq!(board[0].member, "u3");
            assert_eq!(board[0].honors_received, 2);
            assert_eq!(board[1].member, "u2");
            assert_eq!(board[1].honors_received, 1);
            assert_eq!(board[2].member, "u1");
            assert_eq!(board[2].honors_received, 0);
        });
    }

    #[test]
    fn grants_touching_uninitialized_members_are_noops() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1"]);
            assert_eq!(
                ledger.grant_honor("u1", "ghost", "ws").unwrap(),
                GrantOutcome::RecipientNotInitialized
            );
            assert_eq!(
                ledger.grant_honor("ghost", "u1", "ws").unwrap(),
                GrantOutcome::GiverNotInitialized
            );
            // Neither no-op spent anything.
            assert_eq!(ledger.entry("ws", "u1").unwrap().honors_remaining, 3);
        });
    }

    #[test]
    fn reset_clears_the_workspace() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2"]);
            ledger.grant_honor("u1", "u2", "ws").unwrap();
            ledger.reset_workspace("ws").unwrap();
            assert!(matches!(
                ledger.entry("ws", "u1"),
                Err(KudosError::EntryNotInitialized(_))
            ));
            // Resetting again is silent.
            ledger.reset_workspace("ws").unwrap();
        });
    }

    #[test]
    fn audit_is_clean_after_well_formed_grants() {
        on_each_backend(&|ledger| {
            init(ledger, &["u1", "u2", "u3"]);
            ledger.grant_honor("u1", "u2", "ws").unwrap();
            ledger.grant_honor("u1", "u3", "ws").unwrap();
            ledger.grant_honor("u2", "u3", "ws").unwrap();
            assert!(ledger.audit_workspace("ws").unwrap().is_empty());
        });
    }

    #[test]
    fn audit_surfaces_a_lost_credit() {
        let store = Arc::new(MemoryStore::new());
        let ledger = HonorLedger::new(store.clone());
        ledger
            .initialize_workspace("ws", &ids(&["u1", "u2"]))
            .unwrap();

        // Reproduce the crash window by hand: decrement without the credit.
        store
            .transact_remaining("ws", "u1", &|n| n.checked_sub(1))
            .unwrap();

        let findings = ledger.audit_workspace("ws").unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].member, "u1");
        assert_eq!(findings[0].honors_spent, 1);
        assert_eq!(findings[0].credits_found, 0);
    }

    #[test]
    fn store_outage_bubbles_to_the_caller() {
        let store = Arc::new(MemoryStore::new());
        let ledger = HonorLedger::new(store.clone());
        ledger.initialize_workspace("ws", &ids(&["u1"])).unwrap();

        store.set_offline(true);
        assert!(matches!(
            ledger.grant_honor("u1", "u2", "ws"),
            Err(KudosError::StoreUnavailable(_))
        ));
        assert!(matches!(
            ledger.initialize_workspace("ws", &ids(&["u2"])),
            Err(KudosError::StoreUnavailable(_))
        ));

        // Back online the retry succeeds from scratch.
        store.set_offline(false);
        ledger.initialize_workspace("ws", &ids(&["u2"])).unwrap();
        assert_eq!(
            ledger.grant_honor("u1", "u2", "ws").unwrap(),
            GrantOutcome::Granted
        );
    }
}
