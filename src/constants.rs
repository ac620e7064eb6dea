/// Default link token lifetime in seconds (10 minutes)
pub const DEFAULT_LINK_TOKEN_TTL_SECS: i64 = 600;

/// Maximum number of pending transactions returned to the app
pub const PENDING_LIST_LIMIT: i64 = 50;

/// Decimal places kept for amounts, matching the `NUMERIC(12,2)` column
pub const AMOUNT_SCALE: u32 = 2;

/// Category assigned to every transaction created over WhatsApp
/// The app recategorises after sync
pub const DEFAULT_CATEGORY: &str = "Food";

/// Vendor used when a message carries nothing but an amount and a date
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Prefix of a linking message, compared case-insensitively
pub const LINK_PREFIX: &str = "link_";

/// Channel prefix the provider puts in front of WhatsApp phone numbers
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Header carrying the provider's webhook signature
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Header carrying the owner identity on app-facing endpoints
pub const OWNER_ID_HEADER: &str = "x-owner-id";

/// Timeout for outbound provider calls, below the provider's 15s webhook timeout
pub const OUTBOUND_TIMEOUT_SECS: u64 = 10;

/// Empty TwiML acknowledgement returned for every inbound webhook
pub const TWIML_EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

// =============================================================================
// Message log
// =============================================================================

/// Log status for a text message that produced a transaction
pub const LOG_STATUS_PROCESSED: &str = "processed";

/// Log status for an image waiting for receipt processing
pub const LOG_STATUS_PENDING_PROCESSING: &str = "pending_processing";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a missing owner identity
pub const ERR_OWNER_ID_REQUIRED: &str = "owner_id is required";

/// Error message for a webhook without a sender
pub const ERR_MISSING_FROM: &str = "Missing From field";

/// Error message for a confirm that matched no pending row
pub const ERR_TRANSACTION_NOT_FOUND: &str = "Transaction not found or already synced";
