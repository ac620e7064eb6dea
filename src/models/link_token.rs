use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single-use credential that binds a WhatsApp number to an app account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LinkToken {
    /// Opaque token value the user pastes into WhatsApp after `link_`
    pub token: String,
    /// App account the token was issued for
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, together with `phone`
    pub used_at: Option<DateTime<Utc>>,
    /// Phone number that consumed the token
    pub phone: Option<String>,
}

/// Why a token cannot be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    Expired,
    AlreadyUsed,
}

/// Result of a consume attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Token consumed, phone now mapped to `owner_id`
    Linked { owner_id: String },
    NotFound,
    Expired,
    AlreadyUsed,
}

impl From<LinkRejection> for LinkOutcome {
    fn from(rejection: LinkRejection) -> Self {
        match rejection {
            LinkRejection::Expired => LinkOutcome::Expired,
            LinkRejection::AlreadyUsed => LinkOutcome::AlreadyUsed,
        }
    }
}

impl LinkToken {
    /// Create a fresh, unused token
    pub fn issue(token: String, owner_id: String, now: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            token,
            owner_id,
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
            phone: None,
        }
    }

    /// Whether the token is past its expiry at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Check whether the token may be consumed at `now`
    ///
    /// Expiry is checked before use, so a used token that has since expired
    /// reports `Expired`.
    pub fn check_consumable(&self, now: DateTime<Utc>) -> Result<(), LinkRejection> {
        if self.is_expired(now) {
            return Err(LinkRejection::Expired);
        }
        if self.used_at.is_some() {
            return Err(LinkRejection::AlreadyUsed);
        }
        Ok(())
    }

    /// Mark the token used by `phone`
    pub fn mark_used(&mut self, phone: &str, now: DateTime<Utc>) {
        self.used_at = Some(now);
        self.phone = Some(phone.to_string());
    }
}
