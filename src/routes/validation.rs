use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::constants::{ERR_OWNER_ID_REQUIRED, OWNER_ID_HEADER};
use crate::error::{AppError, Result};

/// Owner identity passed as a query parameter
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    #[serde(alias = "apple_user_id")]
    pub owner_id: Option<String>,
}

/// Resolve the owner identity from the query string, falling back to the header
pub fn require_owner_id(query: &OwnerQuery, headers: &HeaderMap) -> Result<String> {
    query
        .owner_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(OWNER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .ok_or_else(|| AppError::InvalidInput(ERR_OWNER_ID_REQUIRED.to_string()))
}

/// Format a timestamp the way every JSON response carries it
pub fn to_rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}
