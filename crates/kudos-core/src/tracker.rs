//! Thin client for the issue tracker's v3 REST API.
//!
//! The tracker authenticates with a per-member API token passed as a query
//! parameter. The base URL is injectable so tests can point the client at a
//! local mock server.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KudosError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.clubhouse.io/api/v3";

/// Fallback avatar for members without a display icon.
pub const DEFAULT_ICON_URL: &str =
    "https://cdn.patchcdn.com/assets/layout/contribute/user-default.png";

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: u64,
    pub name: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at_override: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimate: Option<u32>,
    #[serde(default)]
    pub owner_ids: Vec<String>,
}

impl Story {
    /// Story points, with unestimated stories worth 0.
    pub fn points(&self) -> u32 {
        self.estimate.unwrap_or(0)
    }

    /// Completion time for ordering; a manual override wins over the
    /// tracker-recorded timestamp.
    pub fn effective_completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at_override.or(self.completed_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayIcon {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub display_icon: Option<DisplayIcon>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: String,
    pub profile: Profile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace2 {
    pub url_slug: String,
}

/// Identity of the token's owner, fetched during sign-in to validate the
/// token and learn the workspace slug.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberInfo {
    pub id: String,
    pub name: String,
    pub workspace2: Workspace2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Iteration {
    pub id: u64,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// TrackerClient
// ---------------------------------------------------------------------------

pub struct TrackerClient {
    base_url: String,
    token: String,
    http: reqwest::blocking::Client,
}

impl TrackerClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}?token={}", self.base_url, path, self.token);
        let res = self
            .http
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .map_err(|e| KudosError::Tracker(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(KudosError::TrackerStatus {
                status: status.as_u16(),
                url: path.to_string(),
            });
        }
        res.json().map_err(|e| KudosError::Tracker(e.to_string()))
    }

    /// All projects in the workspace.
    pub fn projects(&self) -> Result<Vec<Project>> {
        self.get_json("/projects")
    }

    /// All stories in one project.
    pub fn project_stories(&self, project_id: u64) -> Result<Vec<Story>> {
        self.get_json(&format!("/projects/{project_id}/stories"))
    }

    /// All stories across all projects, flattened. Projects without stories
    /// contribute nothing.
    pub fn stories(&self) -> Result<Vec<Story>> {
        let mut all = Vec::new();
        for project in self.projects()? {
            let mut stories = self.project_stories(project.id)?;
            all.append(&mut stories);
        }
        Ok(all)
    }

    /// The full member roster.
    pub fn members(&self) -> Result<Vec<Member>> {
        self.get_json("/members")
    }

    /// Identity of the member owning this client's token. Doubles as token
    /// validation during sign-in.
    pub fn member_info(&self) -> Result<MemberInfo> {
        self.get_json("/member")
    }

    /// All iterations in the workspace.
    pub fn iterations(&self) -> Result<Vec<Iteration>> {
        self.get_json("/iterations")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
