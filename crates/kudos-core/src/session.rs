//! Per-sign-in session state.
//!
//! The member map, stories, and current iteration live in an explicit
//! [`Session`] owned by the caller, resolved once after sign-in. The session
//! is also the member directory the honor ledger initializes from:
//! [`Session::current_member_id`] and [`Session::roster_member_ids`].

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::{KudosError, Result};
use crate::tracker::{Iteration, Member, Story, TrackerClient, DEFAULT_ICON_URL};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Optional filters over the workspace's stories.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoryFilter {
    /// Only stories assigned to the session's member.
    pub member_only: bool,
    pub incomplete_only: bool,
    pub complete_only: bool,
}

/// Display info for the signed-in member.
#[derive(Debug, Clone, Serialize)]
pub struct MemberDisplay {
    pub workspace: String,
    pub name: String,
    pub icon: String,
}

/// Story points completed vs total across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

/// Health-bar zone for the remaining work, by fifths of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthColor {
    Green,
    Yellow,
    Red,
}

impl Progress {
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.completed)
    }

    /// Green above 2/5 of total remaining, yellow above 1/5, red below.
    pub fn health_color(&self) -> HealthColor {
        let remaining = self.remaining() as u64 * 5;
        let total = self.total as u64;
        if remaining > 2 * total {
            HealthColor::Green
        } else if remaining > total {
            HealthColor::Yellow
        } else {
            HealthColor::Red
        }
    }
}

/// A leaderboard row ranked by completed story points.
#[derive(Debug, Clone, Serialize)]
pub struct Warrior {
    pub member: String,
    pub name: String,
    pub points: u32,
}

/// The currently started iteration's window.
#[derive(Debug, Clone, Serialize)]
pub struct SprintTimeline {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub remaining_days: u32,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    member_id: String,
    workspace: String,
    members: HashMap<String, Member>,
    stories: Vec<Story>,
    iterations: Vec<Iteration>,
}

impl Session {
    /// Fetch everything the session needs in one pass after sign-in.
    pub fn establish(client: &TrackerClient, member_id: &str, workspace: &str) -> Result<Self> {
        let stories = client.stories()?;
        let members = client
            .members()?
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();
        let iterations = client.iterations()?;
        tracing::debug!(workspace, member_id, "session established");
        Ok(Self {
            member_id: member_id.to_string(),
            workspace: workspace.to_string(),
            members,
            stories,
            iterations,
        })
    }

    pub fn current_member_id(&self) -> &str {
        &self.member_id
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Member ids of everyone in the workspace, in stable order.
    pub fn roster_member_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.members.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn member_name(&self, member_id: &str) -> Result<&str> {
        self.members
            .get(member_id)
            .map(|m| m.profile.name.as_str())
            .ok_or_else(|| KudosError::MemberNotFound(member_id.to_string()))
    }

    /// Display info for the signed-in member, with a default icon fallback.
    pub fn member_profile(&self) -> Result<MemberDisplay> {
        let member = self
            .members
            .get(&self.member_id)
            .ok_or_else(|| KudosError::MemberNotFound(self.member_id.clone()))?;
        let icon = member
            .profile
            .display_icon
            .as_ref()
            .map(|i| i.url.clone())
            .unwrap_or_else(|| DEFAULT_ICON_URL.to_string());
        Ok(MemberDisplay {
            workspace: self.workspace.clone(),
            name: member.profile.name.clone(),
            icon,
        })
    }

    /// Stories matching the filter flags; no flags means every story.
    pub fn stories(&self, filter: StoryFilter) -> Vec<&Story> {
        self.stories
            .iter()
            .filter(|s| !filter.member_only || s.owner_ids.iter().any(|id| id == &self.member_id))
            .filter(|s| !filter.incomplete_only || !s.completed)
            .filter(|s| !filter.complete_only || s.completed)
            .collect()
    }

    pub fn my_incomplete_stories(&self) -> Vec<&Story> {
        self.stories(StoryFilter {
            member_only: true,
            incomplete_only: true,
            ..Default::default()
        })
    }

    pub fn all_incomplete_stories(&self) -> Vec<&Story> {
        self.stories(StoryFilter {
            incomplete_only: true,
            ..Default::default()
        })
    }

    /// Completed stories, most recently completed first. Stories with a
    /// completion override sort by the override.
    pub fn battle_log(&self) -> Vec<&Story> {
        let mut log = self.stories(StoryFilter {
            complete_only: true,
            ..Default::default()
        });
        log.sort_by(|a, b| b.effective_completed_at().cmp(&a.effective_completed_at()));
        log
    }

    /// Workspace-wide completed vs total points. Unestimated stories count
    /// for neither side.
    pub fn progress(&self) -> Progress {
        let mut completed = 0;
        let mut total = 0;
        for story in &self.stories {
            let points = story.points();
            if story.completed {
                completed += points;
            }
            total += points;
        }
        Progress { completed, total }
    }

    /// Top `n` members by completed story points. Every owner of a story is
    /// credited its full estimate.
    pub fn top_warriors(&self, n: usize) -> Vec<Warrior> {
        let mut points: HashMap<&str, u32> = HashMap::new();
        for story in self.stories.iter().filter(|s| s.completed) {
            for owner in &story.owner_ids {
                *points.entry(owner.as_str()).or_default() += story.points();
            }
        }

        let mut warriors: Vec<Warrior> = self
            .members
            .values()
            .map(|m| Warrior {
                member: m.id.clone(),
                name: m.profile.name.clone(),
                points: points.get(m.id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        warriors.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.member.cmp(&b.member)));
        warriors.truncate(n);
        warriors
    }

    /// The started iteration's window relative to today.
    pub fn sprint_timeline(&self) -> Result<SprintTimeline> {
        self.sprint_timeline_at(Utc::now().date_naive())
    }

    /// Like [`Session::sprint_timeline`] with an explicit "today".
    /// Remaining days clamp at zero once the end date has passed.
    pub fn sprint_timeline_at(&self, today: NaiveDate) -> Result<SprintTimeline> {
        let current = self
            .iterations
            .iter()
            .find(|i| i.status == "started")
            .ok_or(KudosError::NoActiveIteration)?;
        let remaining_days = (current.end_date - today).num_days().max(0) as u32;
        Ok(SprintTimeline {
            start: current.start_date,
            end: current.end_date,
            remaining_days,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
