use crate::engine::Engine;
use crate::error::{AppError, AppResult};
use crate::models::{DiamondPackage, PaymentMethod, Transaction, TxDirection, TxStatus, Wallet};
use crate::storage::StorageKey;

impl Wallet {
    /// Applies a completed credit.
    pub(crate) fn credit(&mut self, amount: i64, description: impl Into<String>) -> AppResult<Transaction> {
        self.balance = self.balance.checked_add(amount).ok_or_else(amount_too_large)?;
        let tx = Transaction::new("tx", description, amount, TxDirection::Credit, TxStatus::Completed);
        self.record(tx.clone());
        Ok(tx)
    }

    /// Applies a completed debit. The balance never goes negative.
    pub(crate) fn debit(&mut self, amount: i64, description: impl Into<String>) -> AppResult<Transaction> {
        if !self.can_afford(amount) {
            return Err(AppError::InsufficientBalance);
        }
        self.balance = self.balance.checked_sub(amount).ok_or_else(amount_too_large)?;
        let tx = Transaction::new("tx", description, amount, TxDirection::Debit, TxStatus::Completed);
        self.record(tx.clone());
        Ok(tx)
    }
}

pub(crate) fn amount_too_large() -> AppError {
    AppError::Validation("Amount is too large.".into())
}

fn positive(amount: i64) -> AppResult<()> {
    if amount <= 0 {
        return Err(AppError::Validation("Amount must be greater than zero.".into()));
    }
    Ok(())
}

impl Engine {
    /// Records a deposit for admin verification. The balance is untouched
    /// until the request is approved.
    pub fn add_money_request(
        &mut self,
        amount: i64,
        method: PaymentMethod,
        proof: Option<String>,
    ) -> AppResult<Transaction> {
        positive(amount)?;
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;

        let mut tx = Transaction::new(
            "tx",
            format!("Deposit via {method}"),
            amount,
            TxDirection::Credit,
            TxStatus::Pending,
        );
        tx.screenshot_url = proof.filter(|p| !p.trim().is_empty());
        user.wallet.record(tx.clone());

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %user_id, amount, %method, "deposit requested");
        Ok(tx)
    }

    /// Records a withdrawal for admin processing; nothing is debited yet.
    pub fn withdraw_request(
        &mut self,
        amount: i64,
        method: PaymentMethod,
        account_id: &str,
    ) -> AppResult<Transaction> {
        positive(amount)?;
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(AppError::Validation("Account ID is required.".into()));
        }
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;
        if !user.wallet.can_afford(amount) {
            return Err(AppError::InsufficientBalance);
        }

        let tx = Transaction::new(
            "tx",
            format!("Withdraw to {method} ({account_id})"),
            amount,
            TxDirection::Debit,
            TxStatus::Pending,
        );
        user.wallet.record(tx.clone());

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(user_id = %user_id, amount, %method, "withdrawal requested");
        Ok(tx)
    }

    /// Buys diamonds for an in-game account. The price leaves the balance
    /// now; the ledger entry stays pending until the top-up is delivered.
    pub fn diamond_topup_request(
        &mut self,
        player_game_id: &str,
        package: DiamondPackage,
    ) -> AppResult<Transaction> {
        positive(package.price)?;
        if player_game_id.trim().is_empty() {
            return Err(AppError::Validation("Player game ID is required.".into()));
        }
        let user_id = self.player_id()?;
        let user = self.user_mut(&user_id)?;
        if !user.wallet.can_afford(package.price) {
            return Err(AppError::InsufficientBalance);
        }

        user.wallet.balance -= package.price;
        let mut tx = Transaction::new(
            "tx_dia",
            format!("Diamond Topup ({}D)", package.diamonds),
            package.price,
            TxDirection::Debit,
            TxStatus::Pending,
        );
        tx.prepaid = true;
        user.wallet.record(tx.clone());

        self.mark(StorageKey::Users);
        self.commit();
        tracing::info!(
            user_id = %user_id,
            game_id = player_game_id.trim(),
            diamonds = package.diamonds,
            "diamond top-up requested"
        );
        Ok(tx)
    }
}
