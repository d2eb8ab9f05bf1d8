//! Periodic user snapshots and startup recovery.

use chrono::{DateTime, Utc};

use crate::engine::Engine;
use crate::models::User;
use crate::storage::rehydrate::load_users;
use crate::storage::{DocumentStore, StorageKey, WriteOp};

#[derive(Debug)]
pub struct RecoveredUsers {
    pub users: Vec<User>,
    /// The primary entry was unusable and these rows came from the backup
    /// slot. The primary must be rewritten.
    pub from_backup: bool,
}

/// Loads the primary user collection, falling back to the backup slot when
/// the primary is absent, corrupt, or empty. Whatever the backup missed is
/// lost.
pub fn recover_users(store: &dyn DocumentStore, now: DateTime<Utc>) -> RecoveredUsers {
    match load_users(store, StorageKey::Users, now) {
        Some(users) if !users.is_empty() => {
            return RecoveredUsers {
                users,
                from_backup: false,
            }
        }
        Some(_) => tracing::info!("user collection is empty; checking backup"),
        None => tracing::warn!("user collection unavailable; checking backup"),
    }

    match load_users(store, StorageKey::Backup, now) {
        Some(users) if !users.is_empty() => {
            tracing::warn!(recovered = users.len(), "restored users from auto-recovery backup");
            RecoveredUsers {
                users,
                from_backup: true,
            }
        }
        _ => RecoveredUsers {
            users: Vec::new(),
            from_backup: false,
        },
    }
}

impl Engine {
    /// Copies the user collection into the backup slot. Skipped while the
    /// collection is empty so an empty run never clobbers a good backup.
    pub fn snapshot_backup(&self) -> bool {
        if self.users.is_empty() {
            return false;
        }
        match self.users_document() {
            Ok(doc) => {
                self.sink().submit(WriteOp::Save(StorageKey::Backup, doc));
                tracing::debug!(users = self.users.len(), "backup snapshot submitted");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to encode backup snapshot");
                false
            }
        }
    }
}
