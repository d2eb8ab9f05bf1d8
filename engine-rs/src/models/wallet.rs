use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Esewa,
    Khalti,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Esewa => f.write_str("esewa"),
            PaymentMethod::Khalti => f.write_str("khalti"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub direction: TxDirection,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    /// A pending entry whose amount already left the balance.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prepaid: bool,
}

impl Transaction {
    pub fn new(
        prefix: &str,
        description: impl Into<String>,
        amount: i64,
        direction: TxDirection,
        status: TxStatus,
    ) -> Self {
        Self {
            id: new_id(prefix),
            description: description.into(),
            amount,
            direction,
            date: Utc::now(),
            status,
            screenshot_url: None,
            prepaid: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    /// Signed effect of every completed ledger entry.
    pub fn completed_net(&self) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.status == TxStatus::Completed)
            .map(|t| match t.direction {
                TxDirection::Credit => t.amount,
                TxDirection::Debit => -t.amount,
            })
            .sum()
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    pub(crate) fn record(&mut self, tx: Transaction) {
        self.transactions.insert(0, tx);
    }
}

/// An in-game currency bundle bought with wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiamondPackage {
    pub diamonds: u32,
    pub price: i64,
}
