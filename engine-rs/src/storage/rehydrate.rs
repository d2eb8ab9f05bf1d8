//! Turning stored documents back into typed records.
//!
//! Serde defaults on the models fill in fields that older records lack;
//! this module handles the collection-level cases: absent or corrupt
//! documents, individual malformed records, and the fix-ups that need the
//! load time.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{DocumentStore, StorageKey};
use crate::models::{Team, Tournament, User};

/// Reads an array document. `None` means absent or unreadable; records that
/// fail to parse are skipped individually.
pub fn load_records<T: DeserializeOwned>(store: &dyn DocumentStore, key: StorageKey) -> Option<Vec<T>> {
    let items = match load_raw(store, key)? {
        Value::Array(items) => items,
        other => {
            tracing::warn!(key = %key, found = json_type(&other), "expected an array; ignoring document");
            return None;
        }
    };

    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key = %key, index = i, error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(key = %key, kept = records.len(), total, "collection partially recovered");
    }
    Some(records)
}

/// Reads a single-object document, treating corruption like absence.
pub fn load_document<T: DeserializeOwned>(store: &dyn DocumentStore, key: StorageKey) -> Option<T> {
    let raw = load_raw(store, key)?;
    match serde_json::from_value(raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "malformed document; using defaults");
            None
        }
    }
}

pub fn load_users(store: &dyn DocumentStore, key: StorageKey, now: DateTime<Utc>) -> Option<Vec<User>> {
    let users: Vec<User> = load_records(store, key)?;
    Some(rehydrate_users(users, now))
}

pub fn rehydrate_users(users: Vec<User>, now: DateTime<Utc>) -> Vec<User> {
    users
        .into_iter()
        .filter(|u| {
            if u.is_admin() {
                tracing::warn!(user_id = %u.id, "dropping stored admin-role row");
            }
            !u.is_admin()
        })
        .map(|mut u| {
            u.rehydrate(now);
            u
        })
        .collect()
}

pub fn load_tournaments(store: &dyn DocumentStore) -> Vec<Tournament> {
    let mut tournaments: Vec<Tournament> =
        load_records(store, StorageKey::Tournaments).unwrap_or_default();
    for t in &mut tournaments {
        t.normalize();
    }
    tournaments
}

pub fn load_teams(store: &dyn DocumentStore) -> Vec<Team> {
    let mut teams: Vec<Team> = load_records(store, StorageKey::Teams).unwrap_or_default();
    for t in &mut teams {
        t.normalize();
    }
    teams
}

fn load_raw(store: &dyn DocumentStore, key: StorageKey) -> Option<Value> {
    match store.load(key) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to read document; treating as empty");
            None
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
