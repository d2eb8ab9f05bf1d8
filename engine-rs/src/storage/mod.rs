//! Durable key → JSON document storage.
//!
//! Each logical collection lives under one key and is always rewritten as a
//! whole. Loading is tolerant: a missing key reads as `None` and a corrupt
//! document is reported so the caller can fall back.

pub mod file;
pub mod memory;
pub mod rehydrate;
pub mod sink;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sink::{PersistSink, WriteOp};

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageKey {
    Users,
    Tournaments,
    Teams,
    TournamentRequests,
    VipRequests,
    HeroSlides,
    LoginBanners,
    SystemStatus,
    Backup,
    Session,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Users => "gameport_users_db",
            StorageKey::Tournaments => "gameport_tournaments",
            StorageKey::Teams => "gameport_teams",
            StorageKey::TournamentRequests => "gameport_requests",
            StorageKey::VipRequests => "gameport_vip_requests",
            StorageKey::HeroSlides => "gameport_hero_slides",
            StorageKey::LoginBanners => "gameport_login_banners",
            StorageKey::SystemStatus => "gameport_system_status",
            StorageKey::Backup => "gameport_auto_recovery",
            StorageKey::Session => "gameport_session_user",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait DocumentStore: Send + Sync {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StorageError>;
    fn save(&self, key: StorageKey, document: &Value) -> Result<(), StorageError>;
    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}
