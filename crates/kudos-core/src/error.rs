use thiserror::Error;

#[derive(Debug, Error)]
pub enum KudosError {
    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("ledger entry not initialized: {0}")]
    EntryNotInitialized(String),

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("tracker request failed: {0}")]
    Tracker(String),

    #[error("tracker returned {status} for {url}")]
    TrackerStatus { status: u16, url: String },

    #[error("not signed in: no API token configured")]
    NotSignedIn,

    #[error("no started iteration in the workspace")]
    NoActiveIteration,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KudosError>;
