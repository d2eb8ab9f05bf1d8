use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::registry::Registry;
use crate::scheduler::{self, Availability, OpeningWindow};
use crate::services::backup;
use crate::storage::rehydrate::{self, load_document, load_records};
use crate::storage::{DocumentStore, PersistSink, StorageKey, WriteOp};

/// Who is driving the engine right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Player(String),
    Admin,
}

#[derive(Debug, Clone)]
pub(crate) struct PasswordReset {
    pub email: String,
    pub code: String,
}

/// The authoritative in-memory state plus its persistence contract.
///
/// Every public mutating operation validates first, mutates, marks the
/// touched collections dirty, and ends with [`Engine::commit`]. Reads hand
/// out clones.
pub struct Engine {
    pub(crate) config: Arc<Config>,
    pub(crate) users: Registry<User>,
    pub(crate) tournaments: Registry<Tournament>,
    pub(crate) teams: Registry<Team>,
    pub(crate) tournament_requests: Registry<TournamentRequest>,
    pub(crate) vip_requests: Registry<VipJoinRequest>,
    pub(crate) hero_slides: Vec<HeroSlide>,
    pub(crate) login_banners: Vec<LoginBanner>,
    pub(crate) system: SystemStatusConfig,
    pub(crate) session: Session,
    pub(crate) pending_reset: Option<PasswordReset>,
    pub(crate) popup: Option<Popup>,
    /// User id from the stored session pointer, consumed by auto-login.
    pub(crate) saved_session: Option<String>,
    availability: Availability,
    window: OpeningWindow,
    dirty: BTreeSet<StorageKey>,
    sink: PersistSink,
}

impl Engine {
    /// Loads every collection from `store`, recovering users from the
    /// backup slot when the primary entry is missing, corrupt, or empty.
    /// The session is not restored here; see [`Engine::restore_session`].
    pub fn open(config: Arc<Config>, store: &dyn DocumentStore, sink: PersistSink) -> Self {
        let now = Utc::now();
        let recovered = backup::recover_users(store, now);
        let users = recovered.users;
        let tournaments = rehydrate::load_tournaments(store);
        let teams = rehydrate::load_teams(store);
        let tournament_requests: Vec<TournamentRequest> =
            load_records(store, StorageKey::TournamentRequests).unwrap_or_default();
        let vip_requests: Vec<VipJoinRequest> =
            load_records(store, StorageKey::VipRequests).unwrap_or_default();
        let hero_slides = load_records(store, StorageKey::HeroSlides).unwrap_or_default();
        let login_banners = load_records(store, StorageKey::LoginBanners).unwrap_or_default();
        let system: SystemStatusConfig =
            load_document(store, StorageKey::SystemStatus).unwrap_or_default();
        let saved_session = load_document::<User>(store, StorageKey::Session).map(|u| u.id);

        tracing::info!(
            users = users.len(),
            tournaments = tournaments.len(),
            teams = teams.len(),
            vip_requests = vip_requests.len(),
            "state loaded"
        );

        let window = OpeningWindow::from_config(&config.schedule);
        let availability = scheduler::evaluate(now, system.mode, &window);

        let engine = Self {
            config,
            users: Registry::from_vec(users),
            tournaments: Registry::from_vec(tournaments),
            teams: Registry::from_vec(teams),
            tournament_requests: Registry::from_vec(tournament_requests),
            vip_requests: Registry::from_vec(vip_requests),
            hero_slides,
            login_banners,
            system,
            session: Session::Anonymous,
            pending_reset: None,
            popup: None,
            saved_session,
            availability,
            window,
            dirty: BTreeSet::new(),
            sink,
        };
        if recovered.from_backup {
            // the session pointer stays untouched for restore_session
            match engine.users_document() {
                Ok(doc) => engine.sink.submit(WriteOp::Save(StorageKey::Users, doc)),
                Err(e) => tracing::error!(error = %e, "failed to rewrite recovered users"),
            }
        }
        engine
    }

    // --- persistence ---

    pub(crate) fn mark(&mut self, key: StorageKey) {
        self.dirty.insert(key);
    }

    /// Hands a full snapshot of each dirty collection to the sink. Does not
    /// wait for the write.
    pub fn commit(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let dirty = std::mem::take(&mut self.dirty);
        let session_touched = dirty.contains(&StorageKey::Users) || dirty.contains(&StorageKey::Session);

        for key in dirty {
            let doc = match key {
                StorageKey::Users => self.users_document(),
                StorageKey::Tournaments => serde_json::to_value(&self.tournaments),
                StorageKey::Teams => serde_json::to_value(&self.teams),
                StorageKey::TournamentRequests => serde_json::to_value(&self.tournament_requests),
                StorageKey::VipRequests => serde_json::to_value(&self.vip_requests),
                StorageKey::HeroSlides => serde_json::to_value(&self.hero_slides),
                StorageKey::LoginBanners => serde_json::to_value(&self.login_banners),
                StorageKey::SystemStatus => serde_json::to_value(&self.system),
                // written below / by the backup timer only
                StorageKey::Session | StorageKey::Backup => continue,
            };
            match doc {
                Ok(doc) => self.sink.submit(WriteOp::Save(key, doc)),
                Err(e) => tracing::error!(key = %key, error = %e, "failed to encode collection"),
            }
        }

        if session_touched {
            self.sync_session_pointer();
        }
        tracing::debug!("commit submitted");
    }

    /// Admin-role rows are never written.
    pub(crate) fn users_document(&self) -> serde_json::Result<serde_json::Value> {
        let players: Vec<&User> = self.users.iter().filter(|u| !u.is_admin()).collect();
        serde_json::to_value(players)
    }

    fn sync_session_pointer(&self) {
        let snapshot = match &self.session {
            Session::Player(id) => self.users.get(id),
            Session::Anonymous | Session::Admin => None,
        };
        match snapshot.map(serde_json::to_value) {
            Some(Ok(doc)) => self.sink.submit(WriteOp::Save(StorageKey::Session, doc)),
            Some(Err(e)) => tracing::error!(error = %e, "failed to encode session pointer"),
            None => self.sink.submit(WriteOp::Remove(StorageKey::Session)),
        }
    }

    pub(crate) fn sink(&self) -> &PersistSink {
        &self.sink
    }

    // --- session helpers ---

    pub(crate) fn player_id(&self) -> AppResult<String> {
        match &self.session {
            Session::Player(id) => Ok(id.clone()),
            Session::Admin => Err(AppError::Forbidden("Admins cannot do this as a player".into())),
            Session::Anonymous => Err(AppError::NotAuthenticated),
        }
    }

    pub(crate) fn require_admin(&self) -> AppResult<()> {
        match self.session {
            Session::Admin => Ok(()),
            _ => Err(AppError::Forbidden("Requires admin role".into())),
        }
    }

    pub(crate) fn user(&self, id: &str) -> AppResult<&User> {
        self.users
            .get(id)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    pub(crate) fn user_mut(&mut self, id: &str) -> AppResult<&mut User> {
        self.users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    // --- availability ---

    /// Re-runs the schedule. Returns true if the status changed.
    pub fn refresh_availability(&mut self, now: DateTime<Utc>) -> bool {
        let next = scheduler::evaluate(now, self.system.mode, &self.window);
        let changed = next.status != self.availability.status;
        if changed {
            tracing::info!(status = ?next.status, next_opening = ?next.next_opening, "service availability changed");
        }
        self.availability = next;
        changed
    }

    pub fn availability(&self) -> Availability {
        self.availability.clone()
    }

    /// Gate for presentation code. Admin sessions are always let through.
    pub fn is_access_open(&self) -> bool {
        self.session == Session::Admin || self.availability.is_online()
    }

    pub fn maintenance_message(&self) -> &str {
        &self.system.message
    }

    pub fn system_status(&self) -> SystemStatusConfig {
        self.system.clone()
    }

    // --- read snapshots ---

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session != Session::Anonymous
    }

    pub fn is_admin(&self) -> bool {
        self.session == Session::Admin
    }

    pub fn current_user(&self) -> Option<User> {
        match &self.session {
            Session::Player(id) => self.users.get(id).cloned(),
            Session::Admin => Some(User::admin(&self.config.admin)),
            Session::Anonymous => None,
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.users.to_vec()
    }

    pub fn find_user(&self, id: &str) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub fn tournaments(&self) -> Vec<Tournament> {
        self.tournaments.to_vec()
    }

    pub fn tournament(&self, id: &str) -> Option<Tournament> {
        self.tournaments.get(id).cloned()
    }

    pub fn teams(&self) -> Vec<Team> {
        self.teams.to_vec()
    }

    pub fn team(&self, id: &str) -> Option<Team> {
        self.teams.get(id).cloned()
    }

    pub fn tournament_requests(&self) -> Vec<TournamentRequest> {
        self.tournament_requests.to_vec()
    }

    pub fn vip_requests(&self) -> Vec<VipJoinRequest> {
        self.vip_requests.to_vec()
    }

    pub fn hero_slides(&self) -> Vec<HeroSlide> {
        self.hero_slides.clone()
    }

    pub fn login_banners(&self) -> Vec<LoginBanner> {
        self.login_banners.clone()
    }

    /// The announcement queued by auto-login, handed out once.
    pub fn take_popup(&mut self) -> Option<Popup> {
        self.popup.take()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            users: self.users.len(),
            online_users: self.users.iter().filter(|u| u.is_online).count(),
            tournaments: self.tournaments.len(),
            teams: self.teams.len(),
            pending_vip_requests: self
                .vip_requests
                .iter()
                .filter(|r| r.status == VipStatus::Pending)
                .count(),
            pending_tournament_requests: self
                .tournament_requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
        }
    }
}

/// Counters for the admin overview and the status log line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub users: usize,
    pub online_users: usize,
    pub tournaments: usize,
    pub teams: usize,
    pub pending_vip_requests: usize,
    pub pending_tournament_requests: usize,
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::storage::MemoryStore;

    /// Engine over a fresh in-memory store with inline writes.
    pub fn engine() -> (Engine, Arc<MemoryStore>) {
        engine_with(MemoryStore::new())
    }

    pub fn engine_with(store: MemoryStore) -> (Engine, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let sink = PersistSink::inline(store.clone());
        let engine = Engine::open(Arc::new(Config::default()), store.as_ref(), sink);
        (engine, store)
    }

    /// Signs up a player and leaves them logged in.
    pub fn player(engine: &mut Engine, name: &str, balance: i64) -> String {
        engine.logout();
        let user = engine
            .sign_up(&format!("{}@mail.com", name.to_lowercase()), "secret1", name)
            .unwrap();
        engine.users.get_mut(&user.id).unwrap().wallet.balance = balance;
        user.id
    }

    pub fn act_as(engine: &mut Engine, user_id: &str) {
        engine.session = Session::Player(user_id.to_string());
    }

    pub fn act_as_admin(engine: &mut Engine) {
        engine.session = Session::Admin;
    }

    pub fn tournament(engine: &mut Engine, mode: TournamentMode, category: &str, fee: i64) -> String {
        let t = Tournament::from_draft(TournamentDraft {
            name: format!("{category} {mode:?} Cup"),
            game: "Free Fire".into(),
            category: category.into(),
            mode,
            entry_fee: fee,
            prize_pool: fee * 10,
            start_date: Utc::now(),
            max_teams: 48,
        });
        let id = t.id.clone();
        engine.tournaments.push(t);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn commit_writes_only_dirty_collections() {
        let (mut engine, store) = engine();
        engine.mark(StorageKey::Teams);
        engine.commit();
        assert!(store.contains(StorageKey::Teams));
        assert!(!store.contains(StorageKey::Tournaments));
    }

    #[test]
    fn session_pointer_follows_login_state() {
        let (mut engine, store) = engine();
        player(&mut engine, "Asha", 0);
        assert!(store.contains(StorageKey::Session));

        engine.logout();
        assert!(!store.contains(StorageKey::Session));
    }

    #[test]
    fn admin_rows_are_filtered_from_user_document() {
        let (mut engine, _) = engine();
        engine.users.push(User::admin(&Config::default().admin));
        let doc = engine.users_document().unwrap();
        assert_eq!(doc, json!([]));
    }

    #[test]
    fn system_override_is_loaded() {
        let store = MemoryStore::new().with(
            StorageKey::SystemStatus,
            json!({ "override": "offline", "message": "Upgrading servers" }),
        );
        let (engine, _) = engine_with(store);
        assert_eq!(engine.system_status().mode, SystemOverride::Offline);
        assert_eq!(engine.maintenance_message(), "Upgrading servers");
        assert!(!engine.availability().is_online());
        assert!(!engine.is_access_open());
    }

    #[test]
    fn admin_bypasses_gate() {
        let store = MemoryStore::new().with(StorageKey::SystemStatus, json!({ "override": "offline" }));
        let (mut engine, _) = engine_with(store);
        act_as_admin(&mut engine);
        assert!(engine.is_access_open());
    }
}
