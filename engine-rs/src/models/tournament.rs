use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// The category that is only reachable through the VIP request workflow.
pub const VIP_CATEGORY: &str = "VIP Big Match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TournamentMode {
    #[default]
    Solo,
    Duo,
    Squad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub mode: TournamentMode,
    #[serde(default)]
    pub entry_fee: i64,
    #[serde(default)]
    pub prize_pool: i64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub max_teams: u32,
    #[serde(default)]
    registered_team_ids: Vec<String>,
    #[serde(default)]
    registered_teams: usize,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Admin-supplied fields for a new tournament.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDraft {
    pub name: String,
    pub game: String,
    pub category: String,
    pub mode: TournamentMode,
    pub entry_fee: i64,
    pub prize_pool: i64,
    pub start_date: DateTime<Utc>,
    pub max_teams: u32,
}

impl Tournament {
    pub fn from_draft(draft: TournamentDraft) -> Self {
        Self {
            id: new_id("tour"),
            name: draft.name,
            game: draft.game,
            category: draft.category,
            mode: draft.mode,
            entry_fee: draft.entry_fee,
            prize_pool: draft.prize_pool,
            start_date: draft.start_date,
            max_teams: draft.max_teams,
            registered_team_ids: Vec::new(),
            registered_teams: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_vip(&self) -> bool {
        self.category == VIP_CATEGORY
    }

    pub fn registrant_ids(&self) -> &[String] {
        &self.registered_team_ids
    }

    pub fn registered_count(&self) -> usize {
        self.registered_teams
    }

    pub fn is_registered(&self, registrant_id: &str) -> bool {
        self.registered_team_ids.iter().any(|id| id == registrant_id)
    }

    /// Adds a registrant, keeping the count in step. Returns false if the
    /// id was already present.
    pub(crate) fn register(&mut self, registrant_id: &str) -> bool {
        if self.is_registered(registrant_id) {
            return false;
        }
        self.registered_team_ids.push(registrant_id.to_string());
        self.registered_teams = self.registered_team_ids.len();
        true
    }

    /// Drops duplicate ids and re-derives the count from the id list.
    pub(crate) fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.registered_team_ids.retain(|id| seen.insert(id.clone()));
        self.registered_teams = self.registered_team_ids.len();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// What an organizer proposes; the admin sets the fee on review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerRequestDetails {
    pub tournament_name: String,
    pub game: String,
    #[serde(default)]
    pub mode: TournamentMode,
    pub proposed_date: DateTime<Utc>,
    #[serde(default)]
    pub max_teams: u32,
    #[serde(default)]
    pub prize_pool: i64,
    #[serde(default)]
    pub description: String,
}

impl OrganizerRequestDetails {
    pub fn validate(&self) -> Result<(), String> {
        if self.tournament_name.trim().is_empty() {
            return Err("Tournament name is required.".into());
        }
        if self.game.trim().is_empty() {
            return Err("Game is required.".into());
        }
        if self.prize_pool < 0 {
            return Err("Prize pool cannot be negative.".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRequest {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub tournament_details: OrganizerRequestDetails,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_fee: Option<i64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
