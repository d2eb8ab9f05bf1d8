use chrono::Utc;

use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{
    new_id, KycData, KycStatus, Notification, NotificationType, OrganizerRequestDetails, RequestStatus,
    TournamentRequest, User,
};
use crate::storage::StorageKey;

impl Engine {
    pub fn submit_kyc(
        &mut self,
        full_name: &str,
        id_number: &str,
        front_url: &str,
        back_url: &str,
    ) -> AppResult<User> {
        if full_name.trim().is_empty() || id_number.trim().is_empty() {
            return Err(AppError::Validation("Full name and ID number are required.".into()));
        }
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;
        if user.kyc_status == KycStatus::Verified {
            return Err(AppError::Validation("KYC is already verified.".into()));
        }
        user.kyc_status = KycStatus::Pending;
        user.kyc_data = Some(KycData {
            full_name: full_name.trim().to_string(),
            id_number: id_number.trim().to_string(),
            front_url: front_url.to_string(),
            back_url: back_url.to_string(),
            submitted_at: Utc::now(),
        });
        let user = user.clone();

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %user_id, "KYC submitted");
        Ok(user)
    }

    pub fn update_profile(&mut self, name: &str, avatar: Option<&str>) -> AppResult<User> {
        let name = name.trim();
        let min = self.config.limits.min_username_len;
        if name.chars().count() < min {
            return Err(AppError::Validation(format!(
                "Username must be at least {min} characters."
            )));
        }
        let user_id = self.player_id()?;
        if self
            .users
            .iter()
            .any(|u| u.id != user_id && u.has_name(name))
        {
            return Err(AppError::DuplicateUsername);
        }

        let user = self.user_mut(&user_id)?;
        user.name = name.to_string();
        if let Some(avatar) = avatar.filter(|a| !a.trim().is_empty()) {
            user.avatar = avatar.to_string();
        }
        let user = user.clone();

        // keep roster snapshots in step with the profile
        let mut teams_changed = false;
        for team in self.teams.iter_mut() {
            if team.captain.id == user.id {
                team.captain.name = user.name.clone();
                team.captain.avatar = user.avatar.clone();
                teams_changed = true;
            }
            for m in team.members.iter_mut().filter(|m| m.id == user.id) {
                m.name = user.name.clone();
                m.avatar = user.avatar.clone();
                teams_changed = true;
            }
        }

        self.mark(StorageKey::Users);
        if teams_changed {
            self.mark(StorageKey::Teams);
        }
        self.commit();
        Ok(user)
    }

    /// Files a proposal for the admin to review.
    pub fn organize_request(&mut self, details: OrganizerRequestDetails) -> AppResult<TournamentRequest> {
        details.validate().map_err(AppError::Validation)?;
        let user_id = self.player_id()?;
        let user = self.user(&user_id)?;

        let request = TournamentRequest {
            id: new_id("req"),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            tournament_details: details,
            status: RequestStatus::Pending,
            admin_fee: None,
            created_at: Utc::now(),
        };
        self.tournament_requests.push(request.clone());
        self.mark(StorageKey::TournamentRequests);
        self.commit();
        tracing::info!(request_id = %request.id, user_id = %user_id, "organizer request filed");
        Ok(request)
    }

    pub fn review_tournament_request(
        &mut self,
        request_id: &str,
        status: RequestStatus,
        admin_fee: Option<i64>,
    ) -> AppResult<TournamentRequest> {
        self.require_admin()?;
        if status == RequestStatus::Pending {
            return Err(AppError::Validation("Choose approve or reject.".into()));
        }
        if admin_fee.is_some_and(|fee| fee < 0) {
            return Err(AppError::Validation("Fee cannot be negative.".into()));
        }
        let request = self
            .tournament_requests
            .get_mut(request_id)
            .ok_or_else(|| AppError::NotFound("Request not found.".into()))?;
        if request.status != RequestStatus::Pending {
            return Err(AppError::Validation("Request has already been reviewed.".into()));
        }
        request.status = status;
        request.admin_fee = admin_fee;
        let request = request.clone();

        let (message, kind) = match status {
            RequestStatus::Approved => (
                match admin_fee {
                    Some(fee) => format!(
                        "Your tournament request \"{}\" was approved. Platform fee: रू{fee}.",
                        request.tournament_details.tournament_name
                    ),
                    None => format!(
                        "Your tournament request \"{}\" was approved.",
                        request.tournament_details.tournament_name
                    ),
                },
                NotificationType::Success,
            ),
            _ => (
                format!(
                    "Your tournament request \"{}\" was rejected.",
                    request.tournament_details.tournament_name
                ),
                NotificationType::Warning,
            ),
        };
        if let Some(user) = self.users.get_mut(&request.user_id) {
            user.notify(Notification::new("notif_req", message, kind));
            self.mark(StorageKey::Users);
        }

        self.mark(StorageKey::TournamentRequests);
        self.commit();
        tracing::info!(request_id, ?status, "organizer request reviewed");
        Ok(request)
    }

    pub fn mark_notification_read(&mut self, notification_id: &str) -> AppResult<()> {
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;
        let n = user
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| AppError::NotFound("Notification not found.".into()))?;
        n.read = true;
        self.mark(StorageKey::Users);
        self.commit();
        Ok(())
    }

    pub fn mark_all_notifications_read(&mut self) -> AppResult<usize> {
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;
        let mut changed = 0;
        for n in user.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        if changed > 0 {
            self.mark(StorageKey::Users);
            self.commit();
        }
        Ok(changed)
    }

    pub fn clear_notifications(&mut self) -> AppResult<()> {
        let user_id = self.player_id()?;
        self.user_mut(&user_id)?.notifications.clear();
        self.mark(StorageKey::Users);
        self.commit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use crate::models::{Team, TournamentMode};

    fn details() -> OrganizerRequestDetails {
        OrganizerRequestDetails {
            tournament_name: "College Clash".into(),
            game: "Free Fire".into(),
            mode: TournamentMode::Squad,
            proposed_date: Utc::now(),
            max_teams: 12,
            prize_pool: 3000,
            description: "Inter-college".into(),
        }
    }

    #[test]
    fn kyc_goes_pending() {
        let (mut engine, _) = engine();
        player(&mut engine, "Janak", 0);
        let user = engine.submit_kyc("Janak Shah", "12-01-77", "f.png", "b.png").unwrap();
        assert_eq!(user.kyc_status, KycStatus::Pending);
        assert_eq!(user.kyc_data.unwrap().id_number, "12-01-77");
        assert!(engine.submit_kyc(" ", "1", "", "").is_err());
    }

    #[test]
    fn profile_rename_updates_team_roster() {
        let (mut engine, _) = engine();
        let other = player(&mut engine, "Taken", 0);
        let uid = player(&mut engine, "Kamal", 0);
        let team = Team::found("Rhinos", "", &engine.find_user(&uid).unwrap());
        let team_id = team.id.clone();
        engine.teams.push(team);

        assert!(matches!(engine.update_profile("TAKEN", None), Err(AppError::DuplicateUsername)));
        engine.users.get_mut(&other).unwrap().name = "Ödön".into();
        assert!(matches!(engine.update_profile("öDÖN", None), Err(AppError::DuplicateUsername)));
        engine.users.get_mut(&other).unwrap().name = "Taken".into();
        let user = engine.update_profile("Kamal Pro", Some("me.png")).unwrap();
        assert_eq!(user.avatar, "me.png");

        let team = engine.team(&team_id).unwrap();
        assert_eq!(team.captain.name, "Kamal Pro");
        assert_eq!(team.members[0].avatar, "me.png");
        assert_eq!(engine.find_user(&other).unwrap().name, "Taken");
    }

    #[test]
    fn organizer_request_review() {
        let (mut engine, _) = engine();
        let uid = player(&mut engine, "Laxman", 0);
        let req = engine.organize_request(details()).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.user_name, "Laxman");

        assert!(engine
            .review_tournament_request(&req.id, RequestStatus::Approved, Some(500))
            .is_err());

        act_as_admin(&mut engine);
        let reviewed = engine
            .review_tournament_request(&req.id, RequestStatus::Approved, Some(500))
            .unwrap();
        assert_eq!(reviewed.admin_fee, Some(500));
        assert_eq!(engine.tournament_requests()[0].status, RequestStatus::Approved);
        assert!(engine.find_user(&uid).unwrap().notifications[0]
            .message
            .contains("College Clash"));

        assert!(engine
            .review_tournament_request(&req.id, RequestStatus::Rejected, None)
            .is_err());
    }

    #[test]
    fn organizer_details_are_validated() {
        let (mut engine, _) = engine();
        player(&mut engine, "Manoj", 0);
        let mut bad = details();
        bad.tournament_name = "  ".into();
        assert!(matches!(engine.organize_request(bad), Err(AppError::Validation(_))));
        assert!(engine.tournament_requests().is_empty());
    }

    #[test]
    fn notification_housekeeping() {
        let (mut engine, _) = engine();
        let uid = player(&mut engine, "Nisha", 0);
        let welcome = engine.find_user(&uid).unwrap().notifications[0].id.clone();
        engine
            .users
            .get_mut(&uid)
            .unwrap()
            .notify(Notification::new("n", "second", NotificationType::Info));

        engine.mark_notification_read(&welcome).unwrap();
        assert_eq!(engine.mark_all_notifications_read().unwrap(), 1);
        assert!(engine.find_user(&uid).unwrap().notifications.iter().all(|n| n.read));

        engine.clear_notifications().unwrap();
        assert!(engine.find_user(&uid).unwrap().notifications.is_empty());
        assert!(engine.mark_notification_read(&welcome).is_err());
    }
}
