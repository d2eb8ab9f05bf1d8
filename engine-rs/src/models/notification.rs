use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationCategory {
    System,
    #[serde(rename = "Big Match")]
    BigMatch,
    Tournament,
    Wallet,
    Social,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
}

impl Notification {
    pub fn new(prefix: &str, message: impl Into<String>, kind: NotificationType) -> Self {
        Self {
            id: new_id(prefix),
            message: message.into(),
            date: Utc::now(),
            read: false,
            kind,
            category: None,
        }
    }

    pub fn with_category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_recent_broadcast(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        !self.read
            && self.category == Some(NotificationCategory::System)
            && (now - self.date).num_seconds() < window_secs
    }
}

/// One-shot announcement surfaced after auto-login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
}
