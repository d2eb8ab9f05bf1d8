//! VIP Big Match admission: request, admin selection, payment proof,
//! verification.

use chrono::Utc;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{
    new_id, EntryStatus, JoinedTournament, Notification, NotificationCategory, NotificationType,
    TournamentMode, VipJoinRequest, VipStatus, VipSubmission,
};
use crate::storage::StorageKey;

/// What the payment prompt shows for a selected request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VipPaymentQuote {
    pub request_id: String,
    pub amount: i64,
    pub description: String,
}

impl Engine {
    pub fn request_vip_join(
        &mut self,
        tournament_id: &str,
        submission: VipSubmission,
    ) -> AppResult<VipJoinRequest> {
        let user_id = self.player_id()?;
        let user = self.user(&user_id)?;
        let tournament = self
            .tournaments
            .get(tournament_id)
            .ok_or_else(|| AppError::NotFound("Tournament not found.".into()))?;
        if !tournament.is_vip() {
            return Err(AppError::Validation("This match does not take VIP requests.".into()));
        }
        if user.has_joined(tournament_id) {
            return Err(AppError::AlreadyRegistered);
        }
        let open_request = self.vip_requests.iter().any(|r| {
            r.user_id == user_id && r.tournament_id == tournament_id && r.status != VipStatus::Rejected
        });
        if open_request {
            return Err(AppError::Validation("You already have a request for this match.".into()));
        }
        submission.validate().map_err(AppError::Validation)?;

        let request = VipJoinRequest {
            id: new_id("vip_req"),
            user_id: user_id.clone(),
            tournament_id: tournament.id.clone(),
            tournament_name: tournament.name.clone(),
            tournament_fee: tournament.entry_fee,
            personal_details: submission.personal_details,
            game_details: submission.game_details,
            proofs: submission.proofs,
            status: VipStatus::Pending,
            payment_proof: None,
            created_at: Utc::now(),
        };
        self.vip_requests.push_front(request.clone());
        self.mark(StorageKey::VipRequests);
        self.commit();
        tracing::info!(request_id = %request.id, user_id = %user_id, tournament_id, "VIP request submitted");
        Ok(request)
    }

    /// Admin moves a request along the workflow. The player-side step,
    /// `payment_submitted`, goes through [`Engine::confirm_vip_payment`].
    pub fn update_vip_join_request(&mut self, request_id: &str, status: VipStatus) -> AppResult<VipJoinRequest> {
        self.require_admin()?;
        let request = self
            .vip_requests
            .get(request_id)
            .ok_or_else(|| AppError::NotFound("Request not found.".into()))?;
        if status == VipStatus::PaymentSubmitted {
            return Err(AppError::Forbidden("Payment proof is submitted by the player.".into()));
        }
        if !request.status.can_transition_to(status) {
            return Err(AppError::InvalidTransition {
                from: request.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        let request = request.clone();

        match status {
            VipStatus::AcceptedWaitingPayment => self.notify_selected(&request),
            VipStatus::Completed => self.admit_vip_player(&request),
            _ => {}
        }

        let stored = self
            .vip_requests
            .get_mut(request_id)
            .ok_or_else(|| AppError::NotFound("Request not found.".into()))?;
        stored.status = status;
        let stored = stored.clone();

        self.mark(StorageKey::VipRequests);
        self.commit();
        tracing::info!(request_id, status = status.as_str(), "VIP request updated");
        Ok(stored)
    }

    pub fn vip_payment_quote(&self, tournament_id: &str) -> AppResult<VipPaymentQuote> {
        let user_id = self.player_id()?;
        let request = self.awaiting_payment(&user_id, tournament_id)?;
        let (amount, name) = match self.tournaments.get(tournament_id) {
            Some(t) => (t.entry_fee, t.name.as_str()),
            None => (request.tournament_fee, request.tournament_name.as_str()),
        };
        Ok(VipPaymentQuote {
            request_id: request.id.clone(),
            amount,
            description: format!("Fee for VIP Match: {name}"),
        })
    }

    /// Attaches the player's payment proof to their selected request.
    pub fn confirm_vip_payment(&mut self, tournament_id: &str, proof: &str) -> AppResult<VipJoinRequest> {
        let user_id = self.player_id()?;
        let proof = proof.trim();
        if proof.is_empty() {
            return Err(AppError::Validation("Payment proof is required.".into()));
        }
        let request_id = self.awaiting_payment(&user_id, tournament_id)?.id.clone();

        let request = self
            .vip_requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::NotFound("Request not found.".into()))?;
        request.status = VipStatus::PaymentSubmitted;
        request.payment_proof = Some(proof.to_string());
        let request = request.clone();

        self.mark(StorageKey::VipRequests);
        self.commit();
        tracing::info!(request_id = %request.id, user_id = %user_id, "VIP payment proof submitted");
        Ok(request)
    }

    fn awaiting_payment(&self, user_id: &str, tournament_id: &str) -> AppResult<&VipJoinRequest> {
        let request = self
            .vip_requests
            .find(|r| r.user_id == user_id && r.tournament_id == tournament_id && r.status != VipStatus::Rejected)
            .ok_or_else(|| AppError::NotFound("Request not found.".into()))?;
        if !request.status.can_transition_to(VipStatus::PaymentSubmitted) {
            return Err(AppError::InvalidTransition {
                from: request.status.as_str().to_string(),
                to: VipStatus::PaymentSubmitted.as_str().to_string(),
            });
        }
        Ok(request)
    }

    fn notify_selected(&mut self, request: &VipJoinRequest) {
        let Some(user) = self.users.get_mut(&request.user_id) else {
            return;
        };
        user.notify(
            Notification::new(
                "notif_vip",
                format!(
                    "Congratulations! Your request for {} is SELECTED. Please pay the entry fee to confirm your slot.",
                    request.tournament_name
                ),
                NotificationType::Success,
            )
            .with_category(NotificationCategory::BigMatch),
        );
        self.mark(StorageKey::Users);
    }

    /// Registers the requester once payment is verified. Team modes enter
    /// the requester's team when they have one.
    fn admit_vip_player(&mut self, request: &VipJoinRequest) {
        let Some(user) = self.users.get_mut(&request.user_id) else {
            return;
        };
        if user.has_joined(&request.tournament_id) {
            return;
        }
        let registrant_id = match (&request.game_details.mode, &user.team_id) {
            (TournamentMode::Solo, _) | (_, None) => user.id.clone(),
            (_, Some(team_id)) => team_id.clone(),
        };
        user.joined_tournaments.push(JoinedTournament {
            tournament_id: request.tournament_id.clone(),
            status: EntryStatus::Joined,
        });
        user.notify(
            Notification::new(
                "notif_vip_join",
                format!(
                    "Payment Verified! You have successfully JOINED {}. Good luck!",
                    request.tournament_name
                ),
                NotificationType::Success,
            )
            .with_category(NotificationCategory::BigMatch),
        );
        self.mark(StorageKey::Users);

        if let Some(t) = self.tournaments.get_mut(&request.tournament_id) {
            t.register(&registrant_id);
            self.mark(StorageKey::Tournaments);
        }
    }
}
