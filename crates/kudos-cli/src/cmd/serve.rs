use std::sync::Arc;

use kudos_core::config::Config;
use kudos_core::store::MemoryStore;
use kudos_core::HonorLedger;

/// Run the HTTP API until interrupted.
pub fn run(config: &Config, port: u16, memory: bool) -> anyhow::Result<()> {
    let ledger = if memory {
        // Volatile backend for demos and tests; state dies with the process.
        HonorLedger::new(Arc::new(MemoryStore::new()))
    } else {
        crate::cmd::open_ledger(config)?
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(kudos_server::serve(ledger, port))
}
