use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binding of a WhatsApp phone number to an app account
///
/// One row per phone. Re-linking overwrites `owner_id` (last writer wins).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserMapping {
    pub phone: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
