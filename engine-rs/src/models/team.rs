use serde::{Deserialize, Serialize};

use super::{new_id, User};

pub const DEFAULT_TEAM_AVATAR: &str = "https://via.placeholder.com/150";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl From<&User> for TeamMember {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            avatar: u.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub captain: TeamMember,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl Team {
    pub fn found(name: &str, avatar: &str, founder: &User) -> Self {
        let captain = TeamMember::from(founder);
        let avatar = if avatar.trim().is_empty() {
            DEFAULT_TEAM_AVATAR.to_string()
        } else {
            avatar.to_string()
        };
        Self {
            id: new_id("team"),
            name: name.to_string(),
            avatar,
            captain: captain.clone(),
            members: vec![captain],
        }
    }

    pub fn is_captain(&self, user_id: &str) -> bool {
        self.captain.id == user_id
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    /// Ensures the captain is listed among the members.
    pub(crate) fn normalize(&mut self) {
        if !self.has_member(&self.captain.id) {
            self.members.insert(0, self.captain.clone());
        }
    }
}
