use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{LinkTokens, MessageLog, Store, Transactions, UserMappings};
use crate::error::{AppError, Result};
use crate::models::{
    LinkOutcome, LinkToken, NewLogEntry, NewTransaction, PendingTransaction, TransactionStatus,
    UserMapping,
};

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of `pending_transactions`
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    owner_id: String,
    amount: Decimal,
    date: NaiveDate,
    vendor: Option<String>,
    category: String,
    note: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    synced_at: Option<DateTime<Utc>>,
}

impl TryFrom<TransactionRow> for PendingTransaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let status = row.status.parse::<TransactionStatus>().map_err(AppError::CorruptRecord)?;
        Ok(PendingTransaction {
            id: row.id,
            owner_id: row.owner_id,
            amount: row.amount,
            date: row.date,
            vendor: row.vendor,
            category: row.category,
            note: row.note,
            status,
            created_at: row.created_at,
            synced_at: row.synced_at,
        })
    }
}

const UPSERT_MAPPING_SQL: &str = r#"
    INSERT INTO user_mappings (phone, owner_id, created_at, updated_at)
    VALUES ($1, $2, $3, $3)
    ON CONFLICT (phone)
    DO UPDATE SET owner_id = EXCLUDED.owner_id, updated_at = EXCLUDED.updated_at
    RETURNING phone, owner_id, created_at, updated_at
"#;

#[async_trait]
impl LinkTokens for PgStore {
    async fn insert_link_token(&self, token: &LinkToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO link_tokens (token, owner_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.token)
        .bind(&token.owner_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_link_token(&self, token: &str) -> Result<Option<LinkToken>> {
        let record = sqlx::query_as::<_, LinkToken>(
            r#"
            SELECT token, owner_id, created_at, expires_at, used_at, phone
            FROM link_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn consume_link_token(&self, token: &str, phone: &str, now: DateTime<Utc>) -> Result<LinkOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent consumers of the same token
        let record = sqlx::query_as::<_, LinkToken>(
            r#"
            SELECT token, owner_id, created_at, expires_at, used_at, phone
            FROM link_tokens
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(LinkOutcome::NotFound);
        };

        if let Err(rejection) = record.check_consumable(now) {
            return Ok(rejection.into());
        }

        sqlx::query(
            r#"
            UPDATE link_tokens
            SET used_at = $1, phone = $2
            WHERE token = $3 AND used_at IS NULL
            "#,
        )
        .bind(now)
        .bind(phone)
        .bind(token)
        .execute(&mut *tx)
        .await?;

        sqlx::query(UPSERT_MAPPING_SQL)
            .bind(phone)
            .bind(&record.owner_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(LinkOutcome::Linked {
            owner_id: record.owner_id,
        })
    }
}

#[async_trait]
impl UserMappings for PgStore {
    async fn upsert_mapping(&self, phone: &str, owner_id: &str, now: DateTime<Utc>) -> Result<UserMapping> {
        let mapping = sqlx::query_as::<_, UserMapping>(UPSERT_MAPPING_SQL)
            .bind(phone)
            .bind(owner_id)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(mapping)
    }

    async fn find_mapping_by_phone(&self, phone: &str) -> Result<Option<UserMapping>> {
        let mapping = sqlx::query_as::<_, UserMapping>(
            r#"
            SELECT phone, owner_id, created_at, updated_at
            FROM user_mappings
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn find_mapping_by_owner(&self, owner_id: &str) -> Result<Option<UserMapping>> {
        let mapping = sqlx::query_as::<_, UserMapping>(
            r#"
            SELECT phone, owner_id, created_at, updated_at
            FROM user_mappings
            WHERE owner_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn delete_mappings_for_owner(&self, owner_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_mappings WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Transactions for PgStore {
    async fn create_transaction(&self, txn: &NewTransaction, now: DateTime<Utc>) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO pending_transactions
                (owner_id, amount, date, vendor, category, note, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&txn.owner_id)
        .bind(txn.amount)
        .bind(txn.date)
        .bind(&txn.vendor)
        .bind(&txn.category)
        .bind(&txn.note)
        .bind(TransactionStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_pending(&self, owner_id: &str, limit: i64) -> Result<Vec<PendingTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, owner_id, amount, date, vendor, category, note, status, created_at, synced_at
            FROM pending_transactions
            WHERE owner_id = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(owner_id)
        .bind(TransactionStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PendingTransaction::try_from).collect()
    }

    async fn confirm_transaction(&self, id: i64, owner_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pending_transactions
            SET status = $1, synced_at = $2
            WHERE id = $3 AND owner_id = $4 AND status = $5
            "#,
        )
        .bind(TransactionStatus::Synced.as_str())
        .bind(now)
        .bind(id)
        .bind(owner_id)
        .bind(TransactionStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageLog for PgStore {
    async fn record_message(&self, entry: &NewLogEntry, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_log (phone, kind, content, raw_payload, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&entry.phone)
        .bind(entry.kind.as_str())
        .bind(&entry.content)
        .bind(&entry.raw_payload)
        .bind(&entry.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Run against the database named by `DATABASE_URL`. Every test uses fresh
/// tokens, phones and owners, so they can share one database.
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, SubsecRound};

    use super::*;
    use crate::db::{create_pool, init_schema};
    use crate::linking::generate_token;
    use crate::models::MessageKind;

    async fn test_store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        };
        let pool = create_pool(&url).await.unwrap();
        init_schema(&pool).await.unwrap();
        Some(PgStore::new(pool))
    }

    /// Postgres keeps microseconds
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, generate_token())
    }

    async fn insert_token(store: &PgStore, owner_id: &str, issued: DateTime<Utc>) -> LinkToken {
        let token = LinkToken::issue(generate_token(), owner_id.to_string(), issued, Duration::minutes(10));
        store.insert_link_token(&token).await.unwrap();
        token
    }

    fn new_transaction(owner_id: &str, amount: &str, vendor: &str) -> NewTransaction {
        NewTransaction {
            owner_id: owner_id.to_string(),
            amount: amount.parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            vendor: Some(vendor.to_string()),
            category: "Food".to_string(),
            note: None,
        }
    }

    // =========================================================================
    // Link tokens
    // =========================================================================

    #[tokio::test]
    async fn test_consume_twice_reports_already_used() {
        let Some(store) = test_store().await else { return };
        let owner = unique("owner");
        let (first, second) = (unique("+1"), unique("+1"));
        let now = now();
        let token = insert_token(&store, &owner, now).await;

        let outcome = store.consume_link_token(&token.token, &first, now).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Linked { owner_id: owner.clone() });

        let again = store.consume_link_token(&token.token, &second, now).await.unwrap();
        assert_eq!(again, LinkOutcome::AlreadyUsed);

        let stored = store.find_link_token(&token.token).await.unwrap().unwrap();
        assert_eq!(stored.used_at, Some(now));
        assert_eq!(stored.phone.as_deref(), Some(first.as_str()));

        let mapping = store.find_mapping_by_phone(&first).await.unwrap().unwrap();
        assert_eq!(mapping.owner_id, owner);
        assert!(store.find_mapping_by_phone(&second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_left_untouched() {
        let Some(store) = test_store().await else { return };
        let owner = unique("owner");
        let phone = unique("+1");
        let now = now();
        let token = insert_token(&store, &owner, now - Duration::minutes(30)).await;

        let outcome = store.consume_link_token(&token.token, &phone, now).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Expired);

        let stored = store.find_link_token(&token.token).await.unwrap().unwrap();
        assert!(stored.used_at.is_none());
        assert!(stored.phone.is_none());
        assert!(store.find_mapping_by_phone(&phone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let Some(store) = test_store().await else { return };

        let outcome = store
            .consume_link_token(&generate_token(), &unique("+1"), now())
            .await
            .unwrap();
        assert_eq!(outcome, LinkOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_consumers_link_exactly_once() {
        let Some(store) = test_store().await else { return };
        let store = Arc::new(store);
        let owner = unique("owner");
        let now = now();
        let token = insert_token(&store, &owner, now).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let token = token.token.clone();
            let phone = unique("+1");
            handles.push(tokio::spawn(async move {
                let outcome = store.consume_link_token(&token, &phone, now).await.unwrap();
                (phone, outcome)
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            let (phone, outcome) = handle.await.unwrap();
            match outcome {
                LinkOutcome::Linked { .. } => winners.push(phone),
                other => assert_eq!(other, LinkOutcome::AlreadyUsed),
            }
        }
        assert_eq!(winners.len(), 1);

        // The token and the mapping agree on the winner
        let stored = store.find_link_token(&token.token).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some(winners[0].as_str()));
        let mapping = store.find_mapping_by_owner(&owner).await.unwrap().unwrap();
        assert_eq!(mapping.phone, winners[0]);
    }

    // =========================================================================
    // User mappings
    // =========================================================================

    #[tokio::test]
    async fn test_upsert_moves_phone_and_keeps_created_at() {
        let Some(store) = test_store().await else { return };
        let phone = unique("+1");
        let (first_owner, second_owner) = (unique("owner"), unique("owner"));
        let created = now();
        let updated = created + Duration::seconds(5);

        let first = store.upsert_mapping(&phone, &first_owner, created).await.unwrap();
        assert_eq!(first.owner_id, first_owner);
        assert_eq!(first.created_at, created);

        let second = store.upsert_mapping(&phone, &second_owner, updated).await.unwrap();
        assert_eq!(second.phone, phone);
        assert_eq!(second.owner_id, second_owner);
        assert_eq!(second.created_at, created);
        assert_eq!(second.updated_at, updated);

        assert!(store.find_mapping_by_owner(&first_owner).await.unwrap().is_none());
        assert_eq!(store.delete_mappings_for_owner(&second_owner).await.unwrap(), 1);
        assert!(store.find_mapping_by_phone(&phone).await.unwrap().is_none());
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    #[tokio::test]
    async fn test_list_pending_is_newest_first_and_stable() {
        let Some(store) = test_store().await else { return };
        let owner = unique("owner");
        let t = now();

        let oldest = store
            .create_transaction(&new_transaction(&owner, "5.50", "Coffee"), t)
            .await
            .unwrap();
        let tied_first = store
            .create_transaction(&new_transaction(&owner, "15", "Lunch"), t + Duration::seconds(1))
            .await
            .unwrap();
        let tied_second = store
            .create_transaction(&new_transaction(&owner, "20", "Taxi"), t + Duration::seconds(1))
            .await
            .unwrap();
        store
            .create_transaction(&new_transaction(&unique("owner"), "1", "Elsewhere"), t)
            .await
            .unwrap();

        let first = store.list_pending(&owner, 50).await.unwrap();
        let ids: Vec<i64> = first.iter().map(|txn| txn.id).collect();
        assert_eq!(ids, vec![tied_second, tied_first, oldest]);
        assert_eq!(first, store.list_pending(&owner, 50).await.unwrap());

        let coffee = &first[2];
        assert_eq!(coffee.owner_id, owner);
        assert_eq!(coffee.amount, "5.50".parse::<Decimal>().unwrap());
        assert_eq!(coffee.vendor.as_deref(), Some("Coffee"));
        assert_eq!(coffee.status, TransactionStatus::Pending);
        assert_eq!(coffee.created_at, t);
        assert!(coffee.synced_at.is_none());

        assert_eq!(store.list_pending(&owner, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_confirm_is_owner_scoped_and_single_shot() {
        let Some(store) = test_store().await else { return };
        let owner = unique("owner");
        let id = store
            .create_transaction(&new_transaction(&owner, "9.99", "Books"), now())
            .await
            .unwrap();

        assert!(!store.confirm_transaction(id, &unique("owner"), now()).await.unwrap());
        assert_eq!(store.list_pending(&owner, 50).await.unwrap().len(), 1);

        assert!(store.confirm_transaction(id, &owner, now()).await.unwrap());
        assert!(!store.confirm_transaction(id, &owner, now()).await.unwrap());
        assert!(store.list_pending(&owner, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_message_and_ping() {
        let Some(store) = test_store().await else { return };

        store.ping().await.unwrap();
        store
            .record_message(
                &NewLogEntry {
                    phone: unique("+1"),
                    kind: MessageKind::Image,
                    content: "https://media.test/r.jpg".to_string(),
                    raw_payload: Some(serde_json::json!({ "content_type": "image/jpeg" })),
                    status: "pending_processing".to_string(),
                },
                now(),
            )
            .await
            .unwrap();
    }
}
