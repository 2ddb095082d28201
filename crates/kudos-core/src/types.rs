use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Honors each member may give out, fixed per workspace lifetime.
pub const MAX_HONORS: u32 = 3;

// ---------------------------------------------------------------------------
// HonorState
// ---------------------------------------------------------------------------

/// Who has honored a member.
///
/// `NoHonors` is a distinct sentinel, not an empty set: it is the state of an
/// entry that has never received a grant. On the wire it is the JSON literal
/// `false`; a populated state is a map from giver id to `true`. Both shapes
/// are preserved exactly so ledgers written by older clients stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HonorStateRepr", into = "HonorStateRepr")]
pub enum HonorState {
    NoHonors,
    /// Invariant: the set is non-empty. An empty set normalizes to `NoHonors`.
    HonoredBy(BTreeSet<String>),
}

impl HonorState {
    pub fn contains(&self, giver: &str) -> bool {
        match self {
            HonorState::NoHonors => false,
            HonorState::HonoredBy(givers) => givers.contains(giver),
        }
    }

    /// Number of distinct givers. The sentinel counts as zero.
    pub fn count(&self) -> usize {
        match self {
            HonorState::NoHonors => 0,
            HonorState::HonoredBy(givers) => givers.len(),
        }
    }

    /// Return the state with `giver` recorded. Idempotent.
    pub fn with_giver(self, giver: &str) -> HonorState {
        let mut givers = match self {
            HonorState::NoHonors => BTreeSet::new(),
            HonorState::HonoredBy(givers) => givers,
        };
        givers.insert(giver.to_string());
        HonorState::HonoredBy(givers)
    }

    pub fn givers(&self) -> Vec<&str> {
        match self {
            HonorState::NoHonors => Vec::new(),
            HonorState::HonoredBy(givers) => givers.iter().map(String::as_str).collect(),
        }
    }
}

/// Wire shape: `false` for the sentinel, `{giver: true}` otherwise.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HonorStateRepr {
    Sentinel(bool),
    Givers(BTreeMap<String, bool>),
}

impl From<HonorStateRepr> for HonorState {
    fn from(repr: HonorStateRepr) -> Self {
        match repr {
            HonorStateRepr::Sentinel(_) => HonorState::NoHonors,
            HonorStateRepr::Givers(map) => {
                let givers: BTreeSet<String> =
                    map.into_iter().filter(|(_, v)| *v).map(|(k, _)| k).collect();
                if givers.is_empty() {
                    HonorState::NoHonors
                } else {
                    HonorState::HonoredBy(givers)
                }
            }
        }
    }
}

impl From<HonorState> for HonorStateRepr {
    fn from(state: HonorState) -> Self {
        match state {
            HonorState::NoHonors => HonorStateRepr::Sentinel(false),
            HonorState::HonoredBy(givers) => {
                HonorStateRepr::Givers(givers.into_iter().map(|g| (g, true)).collect())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerEntry
// ---------------------------------------------------------------------------

/// Per-member ledger record: honors left to give and givers received from.
///
/// Wire layout (one entry per member under `workspaces/{ws}/ledger/{member}`):
/// `{ "honorsRemaining": int, "honoredBy": false | { giver: true } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub honors_remaining: u32,
    pub honored_by: HonorState,
}

impl LedgerEntry {
    /// Fresh entry: full allowance, never honored.
    pub fn new() -> Self {
        Self {
            honors_remaining: MAX_HONORS,
            honored_by: HonorState::NoHonors,
        }
    }

    /// Honors this member has spent on others.
    pub fn honors_spent(&self) -> u32 {
        MAX_HONORS.saturating_sub(self.honors_remaining)
    }
}

impl Default for LedgerEntry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
