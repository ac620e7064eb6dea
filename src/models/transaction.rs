use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sync state of a draft transaction; moves pending -> synced once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Synced,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Synced => "synced",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "synced" => Ok(TransactionStatus::Synced),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Draft expense awaiting confirmation by the app
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTransaction {
    pub id: i64,
    #[serde(skip)]
    pub owner_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub vendor: Option<String>,
    pub category: String,
    pub note: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Fields needed to create a draft transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub owner_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub vendor: Option<String>,
    pub category: String,
    pub note: Option<String>,
}
