use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::ERR_OWNER_ID_REQUIRED;
use crate::error::{AppError, Result};
use crate::linking::issue_link_token;
use crate::routes::validation::{require_owner_id, to_rfc3339, OwnerQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkTokenRequest {
    #[serde(default, alias = "apple_user_id")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkTokenResponse {
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct LinkStatusResponse {
    pub linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnlinkResponse {
    pub message: String,
    pub removed: u64,
}

/// Issue a short-lived link token for the app
///
/// The app shows the user `link_<token>` to send over WhatsApp. The token
/// expires after the configured TTL (10 minutes by default) and can be
/// consumed once.
pub async fn create_link_token(
    State(state): State<AppState>,
    Json(payload): Json<LinkTokenRequest>,
) -> Result<Json<LinkTokenResponse>> {
    let owner_id = payload
        .owner_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput(ERR_OWNER_ID_REQUIRED.to_string()))?;

    let token = issue_link_token(
        state.store.as_ref(),
        &owner_id,
        Utc::now(),
        state.config.link_token_ttl(),
    )
    .await?;

    Ok(Json(LinkTokenResponse {
        token: token.token,
        expires_at: to_rfc3339(token.expires_at),
    }))
}

/// Whether the owner has a linked WhatsApp number
pub async fn link_status(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
) -> Result<Json<LinkStatusResponse>> {
    let owner_id = require_owner_id(&query, &headers)?;

    let response = match state.store.find_mapping_by_owner(&owner_id).await? {
        Some(mapping) => LinkStatusResponse {
            linked: true,
            phone: Some(mapping.phone),
            linked_at: Some(to_rfc3339(mapping.updated_at)),
        },
        None => LinkStatusResponse {
            linked: false,
            phone: None,
            linked_at: None,
        },
    };

    Ok(Json(response))
}

/// Remove every WhatsApp number linked to the owner
pub async fn unlink(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
) -> Result<Json<UnlinkResponse>> {
    let owner_id = require_owner_id(&query, &headers)?;
    let removed = state.store.delete_mappings_for_owner(&owner_id).await?;

    tracing::info!("Unlinked {} WhatsApp number(s) from an account", removed);

    Ok(Json(UnlinkResponse {
        message: "Account unlinked successfully".to_string(),
        removed,
    }))
}
