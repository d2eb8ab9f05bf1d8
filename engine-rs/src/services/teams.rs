use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{Team, TeamMember};
use crate::storage::StorageKey;

impl Engine {
    pub fn create_team(&mut self, name: &str, avatar: &str) -> AppResult<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Team name is required.".into()));
        }
        let user_id = self.player_id()?;
        let fee = self.config.fees.team_create;
        let user = self.user(&user_id)?;
        if user.team_id.is_some() {
            return Err(AppError::AlreadyInTeam);
        }
        if !user.wallet.can_afford(fee) {
            return Err(AppError::InsufficientBalance);
        }
        let team = Team::found(name, avatar, user);

        let user = self.user_mut(&user_id)?;
        user.wallet.debit(fee, format!("Created team {}", team.name))?;
        user.team_id = Some(team.id.clone());
        self.teams.push(team.clone());

        self.mark(StorageKey::Users);
        self.mark(StorageKey::Teams);
        self.commit();
        tracing::info!(team_id = %team.id, captain = %user_id, "team created");
        Ok(team)
    }

    pub fn join_team(&mut self, team_id: &str) -> AppResult<Team> {
        let user_id = self.player_id()?;
        let fee = self.config.fees.team_join;
        let max_members = self.config.limits.team_max_members;
        let user = self.user(&user_id)?;
        let team = self
            .teams
            .get(team_id)
            .ok_or_else(|| AppError::NotFound("Team not found.".into()))?;
        if user.team_id.is_some() {
            return Err(AppError::AlreadyInTeam);
        }
        if team.members.len() >= max_members {
            return Err(AppError::TeamFull);
        }
        if !user.wallet.can_afford(fee) {
            return Err(AppError::InsufficientBalance);
        }
        let member = TeamMember::from(user);
        let description = format!("Joined team {}", team.name);

        let user = self.user_mut(&user_id)?;
        user.wallet.debit(fee, description)?;
        user.team_id = Some(team_id.to_string());
        let team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| AppError::NotFound("Team not found.".into()))?;
        team.members.push(member);
        let team = team.clone();

        self.mark(StorageKey::Users);
        self.mark(StorageKey::Teams);
        self.commit();
        tracing::info!(team_id, user_id = %user_id, members = team.members.len(), "team joined");
        Ok(team)
    }

    /// A captain leaving dissolves the team for everyone. Fees are not
    /// refunded.
    pub fn leave_team(&mut self) -> AppResult<()> {
        let user_id = self.player_id()?;
        let team_id = self.user(&user_id)?.team_id.clone().ok_or(AppError::NoTeam)?;

        match self.teams.get(&team_id) {
            Some(team) if team.is_captain(&user_id) => {
                let members = team.member_ids();
                self.teams.remove(&team_id);
                for id in members.iter().chain(std::iter::once(&user_id)) {
                    if let Some(u) = self.users.get_mut(id) {
                        if u.team_id.as_deref() == Some(team_id.as_str()) {
                            u.team_id = None;
                        }
                    }
                }
                tracing::info!(team_id = %team_id, "team dissolved by captain");
            }
            Some(_) => {
                if let Some(team) = self.teams.get_mut(&team_id) {
                    team.members.retain(|m| m.id != user_id);
                }
                self.user_mut(&user_id)?.team_id = None;
                tracing::info!(team_id = %team_id, user_id = %user_id, "left team");
            }
            // dangling reference; just clear it
            None => self.user_mut(&user_id)?.team_id = None,
        }

        self.mark(StorageKey::Users);
        self.mark(StorageKey::Teams);
        self.commit();
        Ok(())
    }
}
