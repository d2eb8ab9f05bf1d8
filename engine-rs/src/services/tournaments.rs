use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{EntryStatus, JoinedTournament, Tournament, TournamentDraft, TournamentMode};
use crate::storage::StorageKey;

impl Engine {
    /// Registers the session player (Solo) or their team (Duo/Squad) and
    /// charges the entry fee to the player's wallet.
    pub fn join_tournament(&mut self, tournament_id: &str) -> AppResult<Tournament> {
        let user_id = self.player_id()?;
        let user = self.user(&user_id)?;
        let tournament = self
            .tournaments
            .get(tournament_id)
            .ok_or_else(|| AppError::NotFound("Tournament not found.".into()))?;

        if tournament.is_vip() {
            return Err(AppError::VipRequiresApproval);
        }
        if !user.wallet.can_afford(tournament.entry_fee) {
            return Err(AppError::InsufficientBalance);
        }
        if tournament.is_registered(&user.id) || user.has_joined(&tournament.id) {
            return Err(AppError::AlreadyRegistered);
        }

        let registrant_id = match tournament.mode {
            TournamentMode::Solo => user.id.clone(),
            TournamentMode::Duo | TournamentMode::Squad => {
                let team_id = user.team_id.as_deref().ok_or(AppError::NoTeam)?;
                let team = self.teams.get(team_id).ok_or_else(|| {
                    AppError::NotFound("Team error. Please leave and rejoin your team.".into())
                })?;
                if !team.is_captain(&user.id) {
                    return Err(AppError::NotCaptain(team.captain.name.clone()));
                }
                if tournament.is_registered(&team.id) {
                    return Err(AppError::TeamAlreadyRegistered);
                }
                team.id.clone()
            }
        };
        let fee = tournament.entry_fee;
        let description = format!("Joined {}", tournament.name);

        let user = self.user_mut(&user_id)?;
        user.wallet.debit(fee, description)?;
        user.joined_tournaments.push(JoinedTournament {
            tournament_id: tournament_id.to_string(),
            status: EntryStatus::Joined,
        });
        let tournament = self
            .tournaments
            .get_mut(tournament_id)
            .ok_or_else(|| AppError::NotFound("Tournament not found.".into()))?;
        tournament.register(&registrant_id);
        let tournament = tournament.clone();

        self.mark(StorageKey::Users);
        self.mark(StorageKey::Tournaments);
        self.commit();
        tracing::info!(
            user_id = %user_id,
            tournament_id = %tournament.id,
            registrant = %registrant_id,
            fee,
            "tournament joined"
        );
        Ok(tournament)
    }

    pub fn publish_tournament(&mut self, draft: TournamentDraft) -> AppResult<Tournament> {
        self.require_admin()?;
        if draft.name.trim().is_empty() {
            return Err(AppError::Validation("Tournament name is required.".into()));
        }
        if draft.entry_fee < 0 || draft.prize_pool < 0 {
            return Err(AppError::Validation("Fees cannot be negative.".into()));
        }
        if draft.max_teams == 0 {
            return Err(AppError::Validation("Max teams must be at least 1.".into()));
        }

        let tournament = Tournament::from_draft(draft);
        self.tournaments.push_front(tournament.clone());
        self.mark(StorageKey::Tournaments);
        self.commit();
        tracing::info!(tournament_id = %tournament.id, name = %tournament.name, "tournament published");
        Ok(tournament)
    }

    /// Deletes the listing. Fees already paid stay paid.
    pub fn remove_tournament(&mut self, tournament_id: &str) -> AppResult<()> {
        self.require_admin()?;
        self.tournaments
            .remove(tournament_id)
            .ok_or_else(|| AppError::NotFound("Tournament not found.".into()))?;
        self.mark(StorageKey::Tournaments);
        self.commit();
        tracing::info!(tournament_id, "tournament removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use crate::models::{Team, TeamMember, TxStatus, VIP_CATEGORY};
    use chrono::Utc;

    #[test]
    fn solo_join_debits_fee_and_registers_user() {
        let (mut engine, _) = engine();
        let uid = player(&mut engine, "Suman", 100);
        let tid = tournament(&mut engine, TournamentMode::Solo, "Classic", 50);

        let t = engine.join_tournament(&tid).unwrap();
        assert_eq!(t.registrant_ids(), &[uid.clone()]);
        assert_eq!(t.registered_count(), 1);

        let user = engine.find_user(&uid).unwrap();
        assert_eq!(user.wallet.balance, 50);
        let tx = &user.wallet.transactions[0];
        assert_eq!(tx.description, format!("Joined {}", t.name));
        assert_eq!(tx.status, TxStatus::Completed);
        assert!(user.has_joined(&tid));
    }

    #[test]
    fn second_join_is_rejected_without_side_effects() {
        let (mut engine, _) = engine();
        let uid = player(&mut engine, "Rita", 200);
        let tid = tournament(&mut engine, TournamentMode::Solo, "Classic", 50);
        engine.join_tournament(&tid).unwrap();

        assert!(matches!(engine.join_tournament(&tid), Err(AppError::AlreadyRegistered)));
        assert_eq!(engine.find_user(&uid).unwrap().wallet.balance, 150);
        assert_eq!(engine.tournament(&tid).unwrap().registered_count(), 1);
    }

    #[test]
    fn squad_without_team_is_refused() {
        let (mut engine, _) = engine();
        let uid = player(&mut engine, "Nirmal", 500);
        let tid = tournament(&mut engine, TournamentMode::Squad, "Classic", 100);

        assert!(matches!(engine.join_tournament(&tid), Err(AppError::NoTeam)));
        assert_eq!(engine.find_user(&uid).unwrap().wallet.balance, 500);
        assert_eq!(engine.tournament(&tid).unwrap().registered_count(), 0);
    }

    #[test]
    fn only_captain_registers_team() {
        let (mut engine, _) = engine();
        let captain = player(&mut engine, "Captain", 500);
        let team = Team::found("Wolves", "", &engine.find_user(&captain).unwrap());
        let team_id = team.id.clone();
        engine.teams.push(team);
        engine.users.get_mut(&captain).unwrap().team_id = Some(team_id.clone());

        let member = player(&mut engine, "Member", 500);
        let snapshot = TeamMember::from(&engine.find_user(&member).unwrap());
        engine.teams.get_mut(&team_id).unwrap().members.push(snapshot);
        engine.users.get_mut(&member).unwrap().team_id = Some(team_id.clone());
        let tid = tournament(&mut engine, TournamentMode::Duo, "Classic", 40);

        let err = engine.join_tournament(&tid).unwrap_err();
        assert_eq!(err.to_string(), "Only the Team Captain (Captain) can register for matches.");

        act_as(&mut engine, &captain);
        let t = engine.join_tournament(&tid).unwrap();
        assert_eq!(t.registrant_ids(), &[team_id]);
    }

    #[test]
    fn vip_and_insufficient_balance_checks() {
        let (mut engine, _) = engine();
        player(&mut engine, "Prem", 10);
        let vip = tournament(&mut engine, TournamentMode::Solo, VIP_CATEGORY, 0);
        let paid = tournament(&mut engine, TournamentMode::Solo, "Classic", 11);

        assert!(matches!(engine.join_tournament(&vip), Err(AppError::VipRequiresApproval)));
        assert!(matches!(engine.join_tournament(&paid), Err(AppError::InsufficientBalance)));
    }

    #[test]
    fn admin_publishes_and_removes() {
        let (mut engine, store) = engine();
        let draft = TournamentDraft {
            name: "Dashain Cup".into(),
            game: "PUBG".into(),
            category: "Classic".into(),
            mode: TournamentMode::Squad,
            entry_fee: 100,
            prize_pool: 5000,
            start_date: Utc::now(),
            max_teams: 25,
        };
        assert!(engine.publish_tournament(draft.clone()).is_err());

        act_as_admin(&mut engine);
        let t = engine.publish_tournament(draft).unwrap();
        assert_eq!(engine.tournaments()[0].id, t.id);
        assert!(store.contains(StorageKey::Tournaments));

        engine.remove_tournament(&t.id).unwrap();
        assert!(engine.tournament(&t.id).is_none());
        assert!(engine.remove_tournament(&t.id).is_err());
    }
}
