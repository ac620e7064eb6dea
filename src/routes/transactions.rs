use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::constants::PENDING_LIST_LIMIT;
use crate::error::{AppError, Result};
use crate::models::PendingTransaction;
use crate::routes::validation::{require_owner_id, OwnerQuery};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<PendingTransaction>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub status: &'static str,
}

/// List pending transactions of an owner, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
) -> Result<Json<TransactionsResponse>> {
    let owner_id = require_owner_id(&query, &headers)?;

    let transactions = state.store.list_pending(&owner_id, PENDING_LIST_LIMIT).await?;

    Ok(Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    }))
}

/// Mark a pending transaction as synced into the app
///
/// Unknown ids, other owners' rows and already synced rows all answer 404.
pub async fn confirm_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
) -> Result<Json<ConfirmResponse>> {
    let owner_id = require_owner_id(&query, &headers)?;

    if !state.store.confirm_transaction(id, &owner_id, Utc::now()).await? {
        return Err(AppError::TransactionNotFound);
    }

    tracing::info!("Transaction {} confirmed", id);

    Ok(Json(ConfirmResponse { status: "success" }))
}
