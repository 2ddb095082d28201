pub mod honor;
pub mod login;
pub mod report;
pub mod serve;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;

use kudos_core::config::Config;
use kudos_core::session::Session;
use kudos_core::store::RedbStore;
use kudos_core::tracker::TrackerClient;
use kudos_core::HonorLedger;

pub(crate) fn open_ledger(config: &Config) -> anyhow::Result<HonorLedger> {
    let store = RedbStore::open(Path::new(&config.db_path))?;
    Ok(HonorLedger::new(Arc::new(store)))
}

pub(crate) fn tracker_client(config: &Config) -> anyhow::Result<TrackerClient> {
    let token = config.api_token()?;
    Ok(TrackerClient::with_base_url(&config.tracker_base_url, token))
}

pub(crate) fn establish_session(config: &Config) -> anyhow::Result<Session> {
    let client = tracker_client(config)?;
    let session = Session::establish(&client, config.member_id()?, config.workspace()?)?;
    Ok(session)
}

/// `--workspace` flag wins; otherwise the signed-in workspace from config.
pub(crate) fn resolve_workspace<'a>(
    flag: Option<&'a str>,
    config: &'a Config,
) -> anyhow::Result<&'a str> {
    match flag {
        Some(ws) => Ok(ws),
        None => Ok(config.workspace()?),
    }
}
