use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TournamentMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VipStatus {
    #[default]
    Pending,
    AcceptedWaitingPayment,
    PaymentSubmitted,
    Completed,
    Rejected,
}

impl VipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VipStatus::Pending => "pending",
            VipStatus::AcceptedWaitingPayment => "accepted_waiting_payment",
            VipStatus::PaymentSubmitted => "payment_submitted",
            VipStatus::Completed => "completed",
            VipStatus::Rejected => "rejected",
        }
    }

    /// Forward-only workflow; `rejected` is only reachable from `pending`.
    pub fn can_transition_to(&self, next: VipStatus) -> bool {
        matches!(
            (self, next),
            (VipStatus::Pending, VipStatus::AcceptedWaitingPayment)
                | (VipStatus::Pending, VipStatus::Rejected)
                | (VipStatus::AcceptedWaitingPayment, VipStatus::PaymentSubmitted)
                | (VipStatus::PaymentSubmitted, VipStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipPersonalDetails {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipGameDetails {
    pub in_game_name: String,
    pub game_uid: String,
    #[serde(rename = "type", default)]
    pub mode: TournamentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

/// Everything a player submits when asking for a VIP slot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipSubmission {
    pub personal_details: VipPersonalDetails,
    pub game_details: VipGameDetails,
    #[serde(default)]
    pub proofs: Vec<String>,
}

impl VipSubmission {
    pub fn validate(&self) -> Result<(), String> {
        if self.personal_details.full_name.trim().is_empty() {
            return Err("Full name is required.".into());
        }
        if self.personal_details.phone.trim().is_empty() {
            return Err("Phone number is required.".into());
        }
        if self.game_details.in_game_name.trim().is_empty()
            || self.game_details.game_uid.trim().is_empty()
        {
            return Err("In-game name and UID are required.".into());
        }
        if self.game_details.mode != TournamentMode::Solo
            && self
                .game_details
                .team_name
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
        {
            return Err("Team name is required for team modes.".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VipJoinRequest {
    pub id: String,
    pub user_id: String,
    pub tournament_id: String,
    pub tournament_name: String,
    #[serde(default)]
    pub tournament_fee: i64,
    pub personal_details: VipPersonalDetails,
    pub game_details: VipGameDetails,
    #[serde(default)]
    pub proofs: Vec<String>,
    #[serde(default)]
    pub status: VipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
