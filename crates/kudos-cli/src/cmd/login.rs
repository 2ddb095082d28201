use std::path::Path;

use kudos_core::config::Config;
use kudos_core::tracker::TrackerClient;

use crate::output;

/// Validate `api_token` against the tracker and persist the member's
/// identity (id, name, workspace slug) into the config file.
pub fn run(config_path: &Path, mut config: Config, api_token: &str, json: bool) -> anyhow::Result<()> {
    let client = TrackerClient::with_base_url(&config.tracker_base_url, api_token);
    let info = client.member_info()?;

    config.api_token = Some(api_token.to_string());
    config.member_id = Some(info.id.clone());
    config.member_name = Some(info.name.clone());
    config.workspace = Some(info.workspace2.url_slug.clone());
    config.save(config_path)?;

    if json {
        output::print_json(&serde_json::json!({
            "member_id": info.id,
            "name": info.name,
            "workspace": info.workspace2.url_slug,
        }))?;
    } else {
        println!(
            "signed in as {} ({}) in workspace {}",
            info.name, info.id, info.workspace2.url_slug
        );
    }
    Ok(())
}
