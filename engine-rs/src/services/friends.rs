use chrono::Utc;

use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{FriendRequest, Notification, NotificationCategory, NotificationType, PublicProfile};
use crate::storage::StorageKey;

impl Engine {
    /// Sends a request from the session player. Repeats and requests to
    /// existing friends are ignored.
    pub fn send_friend_request(&mut self, to_id: &str) -> AppResult<()> {
        let from_id = self.player_id()?;
        if from_id == to_id {
            return Err(AppError::Validation("You cannot add yourself.".into()));
        }
        let sender = self.user(&from_id)?;
        let target = self
            .users
            .get(to_id)
            .ok_or_else(|| AppError::NotFound("User not found. Check Player ID.".into()))?;
        if sender.friends.contains(to_id) || target.friend_requests.iter().any(|r| r.from_id == from_id) {
            return Ok(());
        }
        let request = FriendRequest {
            from_id: sender.id.clone(),
            from_name: sender.name.clone(),
            from_avatar: sender.avatar.clone(),
            date: Utc::now(),
        };

        let message = format!("{} sent you a friend request.", request.from_name);
        let target = self.user_mut(to_id)?;
        target.friend_requests.push(request);
        target.notify(
            Notification::new("freq", message, NotificationType::Info).with_category(NotificationCategory::Social),
        );

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(from = %from_id, to = to_id, "friend request sent");
        Ok(())
    }

    /// Links both users in one commit and tells the requester.
    pub fn accept_friend_request(&mut self, from_id: &str) -> AppResult<()> {
        let me_id = self.player_id()?;
        let me = self.user(&me_id)?;
        if !me.friend_requests.iter().any(|r| r.from_id == from_id) {
            return Err(AppError::NotFound("Friend request not found.".into()));
        }
        let my_name = me.name.clone();
        if !self.users.contains(from_id) {
            // requester is gone; drop the stale request
            self.user_mut(&me_id)?.friend_requests.retain(|r| r.from_id != from_id);
            self.mark(StorageKey::Users);
            self.commit();
            return Err(AppError::NotFound("User not found.".into()));
        }

        let me = self.user_mut(&me_id)?;
        me.friend_requests.retain(|r| r.from_id != from_id);
        me.friends.insert(from_id.to_string());
        let requester = self.user_mut(from_id)?;
        requester.friends.insert(me_id.clone());
        requester.friend_requests.retain(|r| r.from_id != me_id);
        requester.notify(
            Notification::new(
                "facc",
                format!("{my_name} accepted your friend request!"),
                NotificationType::Success,
            )
            .with_category(NotificationCategory::Social),
        );

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %me_id, friend_id = from_id, "friend request accepted");
        Ok(())
    }

    pub fn reject_friend_request(&mut self, from_id: &str) -> AppResult<()> {
        let me_id = self.player_id()?;
        let me = self.user_mut(&me_id)?;
        let before = me.friend_requests.len();
        me.friend_requests.retain(|r| r.from_id != from_id);
        if me.friend_requests.len() != before {
            self.mark(StorageKey::Users);
            self.commit();
        }
        Ok(())
    }

    /// Removes the edge from both sides; the other side may no longer exist.
    pub fn unfriend(&mut self, friend_id: &str) -> AppResult<()> {
        let me_id = self.player_id()?;
        self.user_mut(&me_id)?.friends.remove(friend_id);
        if let Some(friend) = self.users.get_mut(friend_id) {
            friend.friends.remove(&me_id);
        }
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %me_id, friend_id, "unfriended");
        Ok(())
    }

    /// Exact id lookup for the "add by Player ID" box.
    pub fn search_user(&self, id: &str) -> AppResult<PublicProfile> {
        self.users
            .get(id.trim())
            .map(PublicProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found. Check Player ID.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use crate::models::User;

    fn symmetric(users: &[User]) -> bool {
        users.iter().all(|u| {
            u.friends.iter().all(|f| {
                users
                    .iter()
                    .find(|o| &o.id == f)
                    .map_or(true, |o| o.friends.contains(&u.id))
            })
        })
    }

    #[test]
    fn request_accept_is_symmetric() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Asmita", 0);
        let b = player(&mut engine, "Bibek", 0);

        engine.send_friend_request(&a).unwrap();
        engine.send_friend_request(&a).unwrap();
        let target = engine.find_user(&a).unwrap();
        assert_eq!(target.friend_requests.len(), 1);
        assert_eq!(target.notifications[0].message, "Bibek sent you a friend request.");

        act_as(&mut engine, &a);
        engine.accept_friend_request(&b).unwrap();
        let users = engine.users();
        assert!(symmetric(&users));
        assert!(engine.find_user(&a).unwrap().friends.contains(&b));
        assert!(engine.find_user(&a).unwrap().friend_requests.is_empty());
        let requester = engine.find_user(&b).unwrap();
        assert!(requester.friends.contains(&a));
        assert_eq!(requester.notifications[0].message, "Asmita accepted your friend request!");

        // already friends: no new request
        act_as(&mut engine, &b);
        engine.send_friend_request(&a).unwrap();
        assert!(engine.find_user(&a).unwrap().friend_requests.is_empty());
    }

    #[test]
    fn unfriend_removes_both_sides() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Chetan", 0);
        let b = player(&mut engine, "Deepa", 0);
        engine.send_friend_request(&a).unwrap();
        act_as(&mut engine, &a);
        engine.accept_friend_request(&b).unwrap();

        engine.unfriend(&b).unwrap();
        assert!(engine.find_user(&a).unwrap().friends.is_empty());
        assert!(engine.find_user(&b).unwrap().friends.is_empty());
    }

    #[test]
    fn unfriend_tolerates_missing_user() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Esha", 0);
        engine.users.get_mut(&a).unwrap().friends.insert("user_deleted".into());
        engine.unfriend("user_deleted").unwrap();
        assert!(engine.find_user(&a).unwrap().friends.is_empty());
    }

    #[test]
    fn self_and_unknown_targets() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Firoj", 0);
        assert!(matches!(engine.send_friend_request(&a), Err(AppError::Validation(_))));
        let err = engine.send_friend_request("user_nobody").unwrap_err();
        assert_eq!(err.to_string(), "User not found. Check Player ID.");
    }

    #[test]
    fn reject_drops_request() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Gopal", 0);
        let b = player(&mut engine, "Hema", 0);
        engine.send_friend_request(&a).unwrap();
        act_as(&mut engine, &a);
        engine.reject_friend_request(&b).unwrap();
        let user = engine.find_user(&a).unwrap();
        assert!(user.friend_requests.is_empty());
        assert!(user.friends.is_empty());
    }

    #[test]
    fn search_is_exact_id() {
        let (mut engine, _) = engine();
        let a = player(&mut engine, "Indra", 0);
        assert_eq!(engine.search_user(&a).unwrap().name, "Indra");
        assert!(engine.search_user("Indra").is_err());
    }
}
