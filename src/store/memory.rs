//! In-process store
//!
//! Keeps every table in one mutex-guarded struct. Each trait method takes the
//! lock once, so multi-step operations such as token consumption are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{LinkTokens, MessageLog, Store, Transactions, UserMappings};
use crate::error::{AppError, Result};
use crate::models::{
    LinkOutcome, LinkToken, NewLogEntry, NewTransaction, PendingTransaction, TransactionStatus,
    UserMapping,
};

/// Logged inbound message as kept in memory
#[derive(Debug, Clone)]
pub struct LoggedMessage {
    pub entry: NewLogEntry,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    link_tokens: HashMap<String, LinkToken>,
    mappings: HashMap<String, UserMapping>,
    transactions: Vec<PendingTransaction>,
    messages: Vec<LoggedMessage>,
    next_transaction_id: i64,
}

impl Tables {
    fn upsert_mapping(&mut self, phone: &str, owner_id: &str, now: DateTime<Utc>) -> UserMapping {
        let mapping = self
            .mappings
            .entry(phone.to_string())
            .and_modify(|m| {
                m.owner_id = owner_id.to_string();
                m.updated_at = now;
            })
            .or_insert_with(|| UserMapping {
                phone: phone.to_string(),
                owner_id: owner_id.to_string(),
                created_at: now,
                updated_at: now,
            });
        mapping.clone()
    }
}

/// Store backed by process memory, for tests and local experiments
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the message log, oldest first
    pub async fn logged_messages(&self) -> Vec<LoggedMessage> {
        self.tables.lock().await.messages.clone()
    }
}

#[async_trait]
impl LinkTokens for MemoryStore {
    async fn insert_link_token(&self, token: &LinkToken) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.link_tokens.contains_key(&token.token) {
            return Err(AppError::InvalidInput(
                "Link token already exists".to_string(),
            ));
        }
        tables.link_tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_link_token(&self, token: &str) -> Result<Option<LinkToken>> {
        Ok(self.tables.lock().await.link_tokens.get(token).cloned())
    }

    async fn consume_link_token(&self, token: &str, phone: &str, now: DateTime<Utc>) -> Result<LinkOutcome> {
        let mut tables = self.tables.lock().await;

        let Some(record) = tables.link_tokens.get_mut(token) else {
            return Ok(LinkOutcome::NotFound);
        };

        if let Err(rejection) = record.check_consumable(now) {
            return Ok(rejection.into());
        }

        record.mark_used(phone, now);
        let owner_id = record.owner_id.clone();
        tables.upsert_mapping(phone, &owner_id, now);

        Ok(LinkOutcome::Linked { owner_id })
    }
}

#[async_trait]
impl UserMappings for MemoryStore {
    async fn upsert_mapping(&self, phone: &str, owner_id: &str, now: DateTime<Utc>) -> Result<UserMapping> {
        Ok(self.tables.lock().await.upsert_mapping(phone, owner_id, now))
    }

    async fn find_mapping_by_phone(&self, phone: &str) -> Result<Option<UserMapping>> {
        Ok(self.tables.lock().await.mappings.get(phone).cloned())
    }

    async fn find_mapping_by_owner(&self, owner_id: &str) -> Result<Option<UserMapping>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .mappings
            .values()
            .filter(|m| m.owner_id == owner_id)
            .max_by_key(|m| m.updated_at)
            .cloned())
    }

    async fn delete_mappings_for_owner(&self, owner_id: &str) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.mappings.len();
        tables.mappings.retain(|_, m| m.owner_id != owner_id);
        Ok((before - tables.mappings.len()) as u64)
    }
}

#[async_trait]
impl Transactions for MemoryStore {
    async fn create_transaction(&self, txn: &NewTransaction, now: DateTime<Utc>) -> Result<i64> {
        let mut tables = self.tables.lock().await;
        tables.next_transaction_id += 1;
        let id = tables.next_transaction_id;

        tables.transactions.push(PendingTransaction {
            id,
            owner_id: txn.owner_id.clone(),
            amount: txn.amount,
            date: txn.date,
            vendor: txn.vendor.clone(),
            category: txn.category.clone(),
            note: txn.note.clone(),
            status: TransactionStatus::Pending,
            created_at: now,
            synced_at: None,
        });

        Ok(id)
    }

    async fn list_pending(&self, owner_id: &str, limit: i64) -> Result<Vec<PendingTransaction>> {
        let tables = self.tables.lock().await;
        let mut pending: Vec<PendingTransaction> = tables
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id && t.status == TransactionStatus::Pending)
            .cloned()
            .collect();

        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn confirm_transaction(&self, id: i64, owner_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let row = tables.transactions.iter_mut().find(|t| {
            t.id == id && t.owner_id == owner_id && t.status == TransactionStatus::Pending
        });

        match row {
            Some(txn) => {
                txn.status = TransactionStatus::Synced;
                txn.synced_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MessageLog for MemoryStore {
    async fn record_message(&self, entry: &NewLogEntry, now: DateTime<Utc>) -> Result<()> {
        self.tables.lock().await.messages.push(LoggedMessage {
            entry: entry.clone(),
            created_at: now,
        });
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
