pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod session;
pub mod store;
pub mod tracker;
pub mod types;

pub use error::{KudosError, Result};
pub use ledger::{GrantOutcome, HonorLedger};
pub use types::{HonorState, LedgerEntry, MAX_HONORS};
