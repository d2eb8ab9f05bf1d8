use chrono::{DateTime, Utc};
use rand::Rng;

use crate::engine::{Engine, PasswordReset, Session};
use crate::error::{AppError, AppResult};
use crate::models::user::same_identity;
use crate::models::{Popup, User};
use crate::storage::StorageKey;

const DEFAULT_BAN_REASON: &str = "Violation of rules";

impl Engine {
    pub fn login(&mut self, identifier: &str, secret: &str) -> AppResult<User> {
        let identifier = identifier.trim();
        let admin = &self.config.admin;
        if same_identity(identifier, &admin.email) || same_identity(identifier, &admin.identifier) {
            if secret != admin.password {
                tracing::warn!("rejected admin login");
                return Err(AppError::IncorrectAdminPassword);
            }
            self.admin_login();
            return Ok(User::admin(&self.config.admin));
        }

        let user = self
            .users
            .find(|u| u.matches_login(identifier))
            .ok_or(AppError::AccountNotFound)?;
        if user.password != secret {
            tracing::warn!(user_id = %user.id, "rejected login: wrong password");
            return Err(AppError::IncorrectPassword);
        }
        if user.is_banned {
            tracing::warn!(user_id = %user.id, "rejected login: account banned");
            let reason = user.ban_reason.clone().unwrap_or_else(|| DEFAULT_BAN_REASON.to_string());
            return Err(AppError::AccountBanned(reason));
        }
        let user_id = user.id.clone();

        self.end_player_session(Utc::now());
        let user = self.user_mut(&user_id)?;
        user.is_online = true;
        let user = user.clone();
        self.session = Session::Player(user_id);
        self.mark(StorageKey::Users);
        self.commit();

        tracing::info!(user_id = %user.id, "player logged in");
        Ok(user)
    }

    pub fn sign_up(&mut self, email: &str, secret: &str, name: &str) -> AppResult<User> {
        let email = email.trim();
        let name = name.trim();
        let limits = &self.config.limits;
        if email.is_empty() {
            return Err(AppError::Validation("Email is required.".into()));
        }
        if secret.chars().count() < limits.min_password_len {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters.",
                limits.min_password_len
            )));
        }
        if name.chars().count() < limits.min_username_len {
            return Err(AppError::Validation(format!(
                "Username must be at least {} characters.",
                limits.min_username_len
            )));
        }
        if self.users.iter().any(|u| u.has_email(email)) {
            return Err(AppError::DuplicateEmail);
        }
        if self.users.iter().any(|u| u.has_name(name)) {
            return Err(AppError::DuplicateUsername);
        }

        self.end_player_session(Utc::now());
        let user = User::new_player(name, email, secret);
        self.session = Session::Player(user.id.clone());
        self.users.push(user.clone());
        self.mark(StorageKey::Users);
        self.commit();

        tracing::info!(user_id = %user.id, "account created");
        Ok(user)
    }

    /// Starts an admin session without a credential check. Only the
    /// maintenance entry point calls this directly.
    pub fn admin_login(&mut self) {
        self.end_player_session(Utc::now());
        self.session = Session::Admin;
        self.mark(StorageKey::Session);
        self.commit();
        tracing::info!("admin session started");
    }

    pub fn logout(&mut self) {
        if self.session == Session::Anonymous {
            return;
        }
        self.end_player_session(Utc::now());
        self.session = Session::Anonymous;
        self.mark(StorageKey::Session);
        self.commit();
    }

    /// Issues a `GP-NNNN` code for the account. The code is returned to the
    /// caller to display; there is no delivery channel.
    pub fn forgot_password(&mut self, email: &str) -> AppResult<String> {
        let email = email.trim();
        if !self.users.iter().any(|u| u.has_email(email)) {
            return Err(AppError::NotFound("No account found with this email.".into()));
        }
        let code = format!("GP-{}", rand::thread_rng().gen_range(1000..=9999));
        self.pending_reset = Some(PasswordReset {
            email: email.to_string(),
            code: code.clone(),
        });
        tracing::info!("password reset code issued");
        Ok(code)
    }

    pub fn reset_password(&mut self, email: &str, code: &str, new_password: &str) -> AppResult<()> {
        let email = email.trim();
        let valid = self
            .pending_reset
            .as_ref()
            .is_some_and(|r| same_identity(&r.email, email) && r.code.eq_ignore_ascii_case(code.trim()));
        if !valid {
            return Err(AppError::InvalidVerificationCode);
        }
        let min = self.config.limits.min_password_len;
        if new_password.chars().count() < min {
            return Err(AppError::Validation(format!(
                "Password must be at least {min} characters."
            )));
        }
        let user = self
            .users
            .iter_mut()
            .find(|u| u.has_email(email))
            .ok_or(AppError::AccountNotFound)?;
        user.password = new_password.to_string();
        let user_id = user.id.clone();

        self.pending_reset = None;
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %user_id, "password reset");
        Ok(())
    }

    /// Auto-login from the stored session pointer. A pointer whose user is
    /// gone is discarded. A banned account is still restored; callers check
    /// `is_banned` on the returned user to show the ban screen.
    pub fn restore_session(&mut self, now: DateTime<Utc>) -> Option<User> {
        let user_id = self.saved_session.take()?;
        let window = self.config.limits.popup_window_secs;

        let Some(user) = self.users.get_mut(&user_id) else {
            tracing::info!(user_id = %user_id, "stale session pointer discarded");
            self.mark(StorageKey::Session);
            self.commit();
            return None;
        };
        user.is_online = true;
        let user = user.clone();

        self.popup = user
            .notifications
            .iter()
            .find(|n| n.is_recent_broadcast(now, window))
            .map(|n| Popup {
                title: "New Announcement".to_string(),
                message: n.message.clone(),
                kind: n.kind,
            });
        self.session = Session::Player(user_id);
        self.mark(StorageKey::Users);
        self.commit();

        tracing::info!(user_id = %user.id, "session restored");
        Some(user)
    }

    fn end_player_session(&mut self, now: DateTime<Utc>) {
        let Session::Player(id) = &self.session else {
            return;
        };
        let id = id.clone();
        if let Some(user) = self.users.get_mut(&id) {
            user.is_online = false;
            user.last_seen = Some(now);
            self.mark(StorageKey::Users);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testing::*;
    use crate::engine::Session;
    use crate::error::{AppError, ErrorKind};
    use crate::models::{Notification, NotificationCategory, NotificationType};
    use crate::storage::{DocumentStore, MemoryStore, StorageKey};
    use chrono::{Duration, Utc};

    #[test]
    fn sign_up_then_login_by_name() {
        let (mut engine, _) = engine();
        engine.sign_up("ram@mail.com", "secret1", "RamK").unwrap();
        engine.logout();
        let user = engine.login("  ramk ", "secret1").unwrap();
        assert!(user.is_online);
        assert!(engine.is_logged_in());
    }

    #[test]
    fn duplicate_email_is_case_insensitive() {
        let (mut engine, _) = engine();
        engine.sign_up("a@x.com", "secret1", "Alpha").unwrap();
        let before = engine.users().len();
        let err = engine.sign_up("A@X.com", "secret2", "Beta").unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(engine.users().len(), before);
    }

    #[test]
    fn non_ascii_duplicates_are_rejected() {
        let (mut engine, _) = engine();
        engine.sign_up("a@x.com", "secret1", "Ñandu").unwrap();
        engine.sign_up("ÉLAN@x.com", "secret1", "Elan").unwrap();
        engine.logout();

        let err = engine.sign_up("b@x.com", "secret2", "ñandu").unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        let err = engine.sign_up("élan@x.com", "secret2", "Other").unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(engine.users().len(), 2);

        let user = engine.login("ÑANDU", "secret1").unwrap();
        assert_eq!(user.name, "Ñandu");
        engine.logout();
        let code = engine.forgot_password("élan@X.com").unwrap();
        engine.reset_password("Élan@x.com", &code, "newpass").unwrap();
        assert!(engine.login("élan@x.com", "newpass").is_ok());
    }

    #[test]
    fn sign_up_validates_lengths() {
        let (mut engine, _) = engine();
        let short_pw = engine.sign_up("a@x.com", "12345", "Alpha").unwrap_err();
        assert_eq!(short_pw.kind(), ErrorKind::Validation);
        let short_name = engine.sign_up("a@x.com", "123456", "Al").unwrap_err();
        assert_eq!(short_name.kind(), ErrorKind::Validation);
        assert!(engine.users().is_empty());
    }

    #[test]
    fn login_failures_are_distinguished() {
        let (mut engine, _) = engine();
        let id = player(&mut engine, "Sita", 0);
        engine.logout();

        assert!(matches!(engine.login("nobody", "x"), Err(AppError::AccountNotFound)));
        assert!(matches!(engine.login("sita", "wrong"), Err(AppError::IncorrectPassword)));

        engine.users.get_mut(&id).unwrap().is_banned = true;
        let err = engine.login("sita", "secret1").unwrap_err();
        assert_eq!(err.to_string(), "Account Banned: Violation of rules");
    }

    #[test]
    fn admin_login_by_reserved_identifier() {
        let (mut engine, store) = engine();
        assert!(matches!(engine.login("ADMIN", "nope"), Err(AppError::IncorrectAdminPassword)));
        let admin = engine.login("admin", "admin").unwrap();
        assert!(admin.is_admin());
        assert_eq!(engine.session(), &Session::Admin);
        assert!(engine.users().is_empty());
        assert!(!store.contains(StorageKey::Session));
    }

    #[test]
    fn logout_marks_offline() {
        let (mut engine, _) = engine();
        let id = player(&mut engine, "Hari", 0);
        engine.logout();
        let user = engine.find_user(&id).unwrap();
        assert!(!user.is_online);
        assert!(user.last_seen.is_some());
        assert!(engine.current_user().is_none());
    }

    #[test]
    fn password_reset_flow() {
        let (mut engine, _) = engine();
        player(&mut engine, "Gita", 0);
        engine.logout();

        assert_eq!(engine.forgot_password("nobody@mail.com").unwrap_err().kind(), ErrorKind::NotFound);
        let code = engine.forgot_password("gita@mail.com").unwrap();
        assert!(code.starts_with("GP-"));
        let digits: u32 = code[3..].parse().unwrap();
        assert!((1000..=9999).contains(&digits));

        assert!(matches!(
            engine.reset_password("gita@mail.com", "GP-0000", "newpass"),
            Err(AppError::InvalidVerificationCode)
        ));
        engine
            .reset_password("gita@mail.com", &format!(" {} ", code.to_lowercase()), "newpass")
            .unwrap();
        assert!(engine.login("gita@mail.com", "newpass").is_ok());
    }

    #[test]
    fn restore_session_queues_recent_announcement() {
        let (mut engine, store) = engine();
        let id = player(&mut engine, "Maya", 0);
        let announcement = Notification::new("bc", "Finals at 5pm", NotificationType::Warning)
            .with_category(NotificationCategory::System);
        engine.users.get_mut(&id).unwrap().notify(announcement);
        engine.mark(StorageKey::Users);
        engine.commit();

        let snapshot = MemoryStore::new();
        for key in [StorageKey::Users, StorageKey::Session] {
            if let Some(doc) = store.load(key).unwrap() {
                snapshot.save(key, &doc).unwrap();
            }
        }
        let (mut reopened, _) = engine_with(snapshot);
        assert!(reopened.current_user().is_none());

        let user = reopened.restore_session(Utc::now()).unwrap();
        assert_eq!(user.id, id);
        let popup = reopened.take_popup().unwrap();
        assert_eq!(popup.title, "New Announcement");
        assert_eq!(popup.message, "Finals at 5pm");
        assert!(reopened.take_popup().is_none());
    }

    #[test]
    fn old_announcement_does_not_pop_up() {
        let (mut engine, _) = engine();
        let id = player(&mut engine, "Kiran", 0);
        let mut old = Notification::new("bc", "Yesterday", NotificationType::Info)
            .with_category(NotificationCategory::System);
        old.date = Utc::now() - Duration::hours(2);
        engine.users.get_mut(&id).unwrap().notify(old);

        let (mut reopened, _) = engine_with(MemoryStore::new());
        reopened.users = engine.users.clone();
        reopened.saved_session = Some(id);
        assert!(reopened.restore_session(Utc::now()).is_some());
        assert!(reopened.take_popup().is_none());
    }

    #[test]
    fn stale_pointer_is_cleared() {
        let (mut engine, store) = engine();
        engine.saved_session = Some("user_gone".into());
        assert!(engine.restore_session(Utc::now()).is_none());
        assert!(!store.contains(StorageKey::Session));
        assert!(!engine.is_logged_in());
    }

    #[test]
    fn banned_pointer_is_restored_for_ban_screen() {
        let (mut engine, _) = engine();
        let id = player(&mut engine, "Rekha", 0);
        engine.users.get_mut(&id).unwrap().is_banned = true;

        let (mut reopened, _) = engine_with(MemoryStore::new());
        reopened.users = engine.users.clone();
        reopened.saved_session = Some(id.clone());
        let user = reopened.restore_session(Utc::now()).unwrap();
        assert!(user.is_banned);
        assert_eq!(reopened.session(), &Session::Player(id));
    }
}
