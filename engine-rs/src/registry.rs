use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::models::{Team, Tournament, TournamentRequest, User, VipJoinRequest};

pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed_by_id {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

keyed_by_id!(User, Tournament, Team, TournamentRequest, VipJoinRequest);

/// Ordered collection with an id index. Lookups and in-place updates are
/// O(1); removals and front inserts rebuild the index.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from stored order; later duplicates of an id are dropped.
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut registry = Self::new();
        for item in items {
            if registry.contains(item.key()) {
                tracing::warn!(id = item.key(), "duplicate id in stored collection; keeping first");
                continue;
            }
            registry.push(item);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.items[i]),
            None => None,
        }
    }

    /// Appends, or replaces in place when the id already exists.
    pub fn push(&mut self, item: T) {
        match self.index.get(item.key()) {
            Some(&i) => self.items[i] = item,
            None => {
                self.index.insert(item.key().to_string(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Newest-first collections insert at the front.
    pub fn push_front(&mut self, item: T) {
        if let Some(&i) = self.index.get(item.key()) {
            self.items.remove(i);
        }
        self.items.insert(0, item);
        self.reindex();
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let i = self.index.remove(id)?;
        let item = self.items.remove(i);
        self.reindex();
        Some(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable iteration. Keys must not be changed through this.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn find<P>(&self, mut pred: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().find(|item| pred(item))
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.key().to_string(), i))
            .collect();
    }
}

impl<T: Clone> Registry<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Team, TeamMember};

    fn team(id: &str) -> Team {
        let captain = TeamMember {
            id: format!("cap_{id}"),
            name: "Cap".into(),
            avatar: String::new(),
        };
        Team {
            id: id.to_string(),
            name: id.to_uppercase(),
            avatar: String::new(),
            captain: captain.clone(),
            members: vec![captain],
        }
    }

    #[test]
    fn lookups_survive_removal() {
        let mut reg = Registry::from_vec(vec![team("a"), team("b"), team("c")]);
        assert_eq!(reg.remove("a").map(|t| t.id), Some("a".to_string()));
        assert_eq!(reg.get("c").map(|t| t.name.as_str()), Some("C"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn push_replaces_existing_id() {
        let mut reg = Registry::new();
        reg.push(team("a"));
        let mut renamed = team("a");
        renamed.name = "Renamed".into();
        reg.push(renamed);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a").unwrap().name, "Renamed");
    }

    #[test]
    fn push_front_orders_newest_first() {
        let mut reg = Registry::new();
        reg.push_front(team("old"));
        reg.push_front(team("new"));
        let ids: Vec<_> = reg.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
        assert!(reg.get("old").is_some());
    }

    #[test]
    fn duplicates_in_storage_keep_first() {
        let mut second = team("a");
        second.name = "Second".into();
        let reg = Registry::from_vec(vec![team("a"), second]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a").unwrap().name, "A");
    }

    #[test]
    fn serializes_as_plain_array() {
        let reg = Registry::from_vec(vec![team("a")]);
        let v = serde_json::to_value(&reg).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["id"], "a");
    }
}
