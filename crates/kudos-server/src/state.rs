use kudos_core::HonorLedger;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: HonorLedger,
}

impl AppState {
    pub fn new(ledger: HonorLedger) -> Self {
        Self { ledger }
    }
}
