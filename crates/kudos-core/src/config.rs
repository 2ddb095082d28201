//! YAML config for the CLI and server.
//!
//! Sign-in (`kudos login`) persists the member's identity here; the API
//! token can also come from `KUDOS_API_TOKEN`, which wins over the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{KudosError, Result};
use crate::io::atomic_write;
use crate::tracker;

pub const TOKEN_ENV: &str = "KUDOS_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tracker_base_url")]
    pub tracker_base_url: String,

    /// API token from sign-in. Prefer [`Config::api_token`], which also
    /// consults the environment.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Workspace URL slug learned at sign-in.
    #[serde(default)]
    pub workspace: Option<String>,

    /// Signed-in member's id.
    #[serde(default)]
    pub member_id: Option<String>,

    #[serde(default)]
    pub member_name: Option<String>,
}

fn default_tracker_base_url() -> String {
    tracker::DEFAULT_BASE_URL.to_string()
}

fn default_db_path() -> String {
    "kudos.redb".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker_base_url: default_tracker_base_url(),
            api_token: None,
            db_path: default_db_path(),
            workspace: None,
            member_id: None,
            member_name: None,
        }
    }
}

impl Config {
    /// Load the config, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(path, data.as_bytes())
    }

    /// Resolve the API token: environment first, then the config file.
    pub fn api_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(token);
            }
        }
        self.api_token.clone().ok_or(KudosError::NotSignedIn)
    }

    /// The signed-in workspace slug.
    pub fn workspace(&self) -> Result<&str> {
        self.workspace.as_deref().ok_or(KudosError::NotSignedIn)
    }

    /// The signed-in member id.
    pub fn member_id(&self) -> Result<&str> {
        self.member_id.as_deref().ok_or(KudosError::NotSignedIn)
    }
}
