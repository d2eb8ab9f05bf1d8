use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{new_id, Notification, NotificationType, Wallet};
use crate::config::AdminConfig;

pub const DEFAULT_AVATAR: &str = "https://api.dicebear.com/7.x/bottts/svg?seed=gameport";
const FALLBACK_PASSWORD: &str = "123456";

/// Case-insensitive comparison for emails, names and login identifiers.
/// Folds full Unicode case so "Ñandu" and "ñandu" collide.
pub(crate) fn same_identity(a: &str, b: &str) -> bool {
    a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycData {
    pub full_name: String,
    pub id_number: String,
    pub front_url: String,
    pub back_url: String,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Joined,
    Completed,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedTournament {
    pub tournament_id: String,
    #[serde(default)]
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub from_id: String,
    pub from_name: String,
    #[serde(default)]
    pub from_avatar: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_password", deserialize_with = "lenient_password")]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub coins: i64,
    #[serde(default)]
    pub wallet: Wallet,
    #[serde(default)]
    pub joined_tournaments: Vec<JoinedTournament>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub friends: BTreeSet<String>,
    #[serde(default)]
    pub friend_requests: Vec<FriendRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub kyc_status: KycStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_data: Option<KycData>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

fn default_password() -> String {
    FALLBACK_PASSWORD.to_string()
}

fn default_level() -> u32 {
    1
}

/// Older records stored numeric passwords; null or missing falls back.
fn lenient_password<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => default_password(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

impl User {
    /// Fresh player account as created by sign-up.
    pub fn new_player(name: &str, email: &str, password: &str) -> Self {
        Self {
            id: new_id("user"),
            name: name.to_string(),
            avatar: default_avatar(),
            email: Some(email.to_string()),
            password: password.to_string(),
            role: Role::Player,
            level: default_level(),
            coins: 0,
            wallet: Wallet::default(),
            joined_tournaments: Vec::new(),
            notifications: vec![Notification::new(
                "welcome",
                "Welcome to GamePort! Complete KYC to join paid matches.",
                NotificationType::Info,
            )],
            friends: BTreeSet::new(),
            friend_requests: Vec::new(),
            team_id: None,
            kyc_status: KycStatus::None,
            kyc_data: None,
            is_banned: false,
            ban_reason: None,
            is_online: true,
            last_seen: None,
        }
    }

    /// The privileged identity. Never stored in the user collection.
    pub fn admin(cfg: &AdminConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            name: cfg.name.clone(),
            avatar: "https://cdn-icons-png.flaticon.com/512/2922/2922510.png".to_string(),
            email: Some(cfg.email.clone()),
            password: String::new(),
            role: Role::Admin,
            level: 99,
            coins: 9999,
            wallet: Wallet {
                balance: 999_999,
                transactions: Vec::new(),
            },
            joined_tournaments: Vec::new(),
            notifications: Vec::new(),
            friends: BTreeSet::new(),
            friend_requests: Vec::new(),
            team_id: None,
            kyc_status: KycStatus::Verified,
            kyc_data: None,
            is_banned: false,
            ban_reason: None,
            is_online: true,
            last_seen: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Loaded records always start offline.
    pub fn rehydrate(&mut self, now: DateTime<Utc>) {
        self.is_online = false;
        self.last_seen = Some(now);
    }

    pub fn matches_login(&self, identifier: &str) -> bool {
        self.has_email(identifier) || self.has_name(identifier) || same_identity(&self.id, identifier)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref().is_some_and(|e| same_identity(e, email))
    }

    pub fn has_name(&self, name: &str) -> bool {
        same_identity(&self.name, name)
    }

    pub fn has_joined(&self, tournament_id: &str) -> bool {
        self.joined_tournaments
            .iter()
            .any(|jt| jt.tournament_id == tournament_id)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile::from(self)
    }
}

/// What other players may see of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub level: u32,
    pub team_id: Option<String>,
    pub friend_count: usize,
    pub tournaments_joined: usize,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&User> for PublicProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            avatar: u.avatar.clone(),
            level: u.level,
            team_id: u.team_id.clone(),
            friend_count: u.friends.len(),
            tournaments_joined: u.joined_tournaments.len(),
            is_online: u.is_online,
            last_seen: u.last_seen,
        }
    }
}
