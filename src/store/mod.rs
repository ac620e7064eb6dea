//! Persistence seams
//!
//! Each concern gets its own trait so handlers can name exactly what they
//! touch. `Store` bundles them for the shared application state.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{LinkOutcome, LinkToken, NewLogEntry, NewTransaction, PendingTransaction, UserMapping};

#[async_trait]
pub trait LinkTokens: Send + Sync {
    /// Persist a freshly issued token
    async fn insert_link_token(&self, token: &LinkToken) -> Result<()>;

    async fn find_link_token(&self, token: &str) -> Result<Option<LinkToken>>;

    /// Consume `token` for `phone` and map the phone to the token's owner
    ///
    /// Lookup, the used/expired checks, marking the token used and the
    /// mapping upsert happen as one unit; two concurrent calls for the same
    /// token never both return `Linked`.
    async fn consume_link_token(&self, token: &str, phone: &str, now: DateTime<Utc>) -> Result<LinkOutcome>;
}

#[async_trait]
pub trait UserMappings: Send + Sync {
    /// Insert or overwrite the mapping for `phone`
    async fn upsert_mapping(&self, phone: &str, owner_id: &str, now: DateTime<Utc>) -> Result<UserMapping>;

    async fn find_mapping_by_phone(&self, phone: &str) -> Result<Option<UserMapping>>;

    /// Most recently updated mapping for an owner
    async fn find_mapping_by_owner(&self, owner_id: &str) -> Result<Option<UserMapping>>;

    /// Remove every mapping of an owner, returning how many went
    async fn delete_mappings_for_owner(&self, owner_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait Transactions: Send + Sync {
    /// Insert a pending transaction and return its id
    async fn create_transaction(&self, txn: &NewTransaction, now: DateTime<Utc>) -> Result<i64>;

    /// Pending transactions of an owner, newest first
    async fn list_pending(&self, owner_id: &str, limit: i64) -> Result<Vec<PendingTransaction>>;

    /// Mark a pending transaction synced
    ///
    /// Returns false when no pending row matched id and owner; a missing row
    /// and an already synced one are not told apart.
    async fn confirm_transaction(&self, id: i64, owner_id: &str, now: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn record_message(&self, entry: &NewLogEntry, now: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait Store: LinkTokens + UserMappings + Transactions + MessageLog {
    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> Result<()>;
}
