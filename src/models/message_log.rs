use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
        }
    }
}

/// Audit entry for an inbound message (write-only)
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub phone: String,
    pub kind: MessageKind,
    pub content: String,
    pub raw_payload: Option<Value>,
    pub status: String,
}
