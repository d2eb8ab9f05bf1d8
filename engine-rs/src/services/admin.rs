//! Operations reserved for the admin session.

use crate::engine::{Engine, Session};
use crate::error::{AppError, AppResult};
use crate::models::{
    HeroSlide, KycStatus, LoginBanner, Notification, NotificationCategory, NotificationType, SystemOverride,
    Transaction, TxDirection, TxStatus,
};
use crate::storage::StorageKey;

use super::wallet::amount_too_large;

impl Engine {
    /// Prepends one announcement to every player. Returns how many got it.
    pub fn broadcast_notification(&mut self, message: &str, category: NotificationCategory) -> AppResult<usize> {
        self.require_admin()?;
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message is required.".into()));
        }
        let notification = Notification::new("b", message, NotificationType::Info).with_category(category);
        for user in self.users.iter_mut() {
            user.notify(notification.clone());
        }
        let reached = self.users.len();

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(reached, ?category, "broadcast sent");
        Ok(reached)
    }

    /// Hard-deletes a player and scrubs the references other records hold.
    pub fn delete_user(&mut self, user_id: &str) -> AppResult<()> {
        self.require_admin()?;
        if user_id == self.config.admin.id {
            return Err(AppError::Forbidden("The admin account cannot be deleted".into()));
        }
        let removed = self
            .users
            .remove(user_id)
            .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

        for user in self.users.iter_mut() {
            user.friends.remove(user_id);
            user.friend_requests.retain(|r| r.from_id != user_id);
        }

        if let Some(team_id) = removed.team_id.as_deref() {
            let captain_left = self.teams.get(team_id).is_some_and(|t| t.is_captain(user_id));
            if captain_left {
                let members = self.teams.remove(team_id).map(|t| t.member_ids()).unwrap_or_default();
                for id in &members {
                    if let Some(u) = self.users.get_mut(id) {
                        u.team_id = None;
                    }
                }
            } else if let Some(team) = self.teams.get_mut(team_id) {
                team.members.retain(|m| m.id != user_id);
            }
            self.mark(StorageKey::Teams);
        }

        if self.session == Session::Player(user_id.to_string()) {
            self.session = Session::Anonymous;
        }
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, name = %removed.name, "user deleted");
        Ok(())
    }

    pub fn ban_user(&mut self, user_id: &str, reason: &str) -> AppResult<()> {
        self.require_admin()?;
        let user = self.user_mut(user_id)?;
        user.is_banned = true;
        user.ban_reason = Some(reason.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        user.is_online = false;
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, "user banned");
        Ok(())
    }

    pub fn unban_user(&mut self, user_id: &str) -> AppResult<()> {
        self.require_admin()?;
        let user = self.user_mut(user_id)?;
        user.is_banned = false;
        user.ban_reason = None;
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, "user unbanned");
        Ok(())
    }

    /// Settles a pending ledger entry. Approving a deposit credits it,
    /// approving a withdrawal debits it; rejecting a prepaid entry refunds
    /// the amount.
    pub fn review_transaction(&mut self, user_id: &str, tx_id: &str, approve: bool) -> AppResult<Transaction> {
        self.require_admin()?;
        let user = self.user_mut(user_id)?;
        let idx = user
            .wallet
            .transactions
            .iter()
            .position(|t| t.id == tx_id)
            .ok_or_else(|| AppError::NotFound("Transaction not found.".into()))?;
        let tx = &user.wallet.transactions[idx];
        if tx.status != TxStatus::Pending {
            return Err(AppError::Validation("Transaction has already been settled.".into()));
        }
        let (amount, direction, prepaid) = (tx.amount, tx.direction, tx.prepaid);
        let balance_delta = match (approve, direction, prepaid) {
            (true, TxDirection::Credit, _) => amount,
            (true, TxDirection::Debit, false) => {
                if !user.wallet.can_afford(amount) {
                    return Err(AppError::InsufficientBalance);
                }
                -amount
            }
            (false, TxDirection::Debit, true) => amount,
            _ => 0,
        };

        user.wallet.balance = user
            .wallet
            .balance
            .checked_add(balance_delta)
            .ok_or_else(amount_too_large)?;
        user.wallet.transactions[idx].status = if approve { TxStatus::Completed } else { TxStatus::Rejected };
        let settled = user.wallet.transactions[idx].clone();
        let message = if approve {
            format!("Your transaction \"{}\" was approved.", settled.description)
        } else {
            format!("Your transaction \"{}\" was rejected.", settled.description)
        };
        let kind = if approve { NotificationType::Success } else { NotificationType::Error };
        user.notify(Notification::new("notif_tx", message, kind).with_category(NotificationCategory::Wallet));

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, tx_id, approve, balance_delta, "transaction reviewed");
        Ok(settled)
    }

    /// Manual balance correction, recorded as a completed ledger entry.
    /// Negative amounts debit and may not overdraw.
    pub fn adjust_balance(&mut self, user_id: &str, amount: i64, description: &str) -> AppResult<Transaction> {
        self.require_admin()?;
        if amount == 0 {
            return Err(AppError::Validation("Amount must not be zero.".into()));
        }
        let description = match description.trim() {
            "" => "Adjustment by admin",
            d => d,
        };
        let user = self.user_mut(user_id)?;
        let tx = if amount > 0 {
            user.wallet.credit(amount, description)?
        } else {
            let amount = amount.checked_neg().ok_or_else(amount_too_large)?;
            user.wallet.debit(amount, description)?
        };
        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, amount, "balance adjusted");
        Ok(tx)
    }

    pub fn review_kyc(&mut self, user_id: &str, approve: bool) -> AppResult<()> {
        self.require_admin()?;
        let user = self.user_mut(user_id)?;
        if user.kyc_status != KycStatus::Pending {
            return Err(AppError::Validation("No KYC submission to review.".into()));
        }
        let (status, message, kind) = if approve {
            (KycStatus::Verified, "Your KYC has been verified.", NotificationType::Success)
        } else {
            (KycStatus::Rejected, "Your KYC was rejected. Please resubmit.", NotificationType::Error)
        };
        user.kyc_status = status;
        user.notify(Notification::new("notif_kyc", message, kind).with_category(NotificationCategory::System));

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id, approve, "KYC reviewed");
        Ok(())
    }

    pub fn set_system_override(&mut self, mode: SystemOverride) -> AppResult<()> {
        self.require_admin()?;
        self.system.mode = mode;
        self.refresh_availability(chrono::Utc::now());
        self.mark(StorageKey::SystemStatus);
        self.commit();
        tracing::info!(?mode, "system override set");
        Ok(())
    }

    pub fn set_maintenance_message(&mut self, message: &str) -> AppResult<()> {
        self.require_admin()?;
        self.system.message = message.trim().to_string();
        self.mark(StorageKey::SystemStatus);
        self.commit();
        Ok(())
    }

    pub fn set_hero_slides(&mut self, slides: Vec<HeroSlide>) -> AppResult<()> {
        self.require_admin()?;
        self.hero_slides = slides;
        self.mark(StorageKey::HeroSlides);
        self.commit();
        Ok(())
    }

    pub fn set_login_banners(&mut self, banners: Vec<LoginBanner>) -> AppResult<()> {
        self.require_admin()?;
        self.login_banners = banners;
        self.mark(StorageKey::LoginBanners);
        self.commit();
        Ok(())
    }
}
