use crate::constants::{ERR_MISSING_FROM, LINK_PREFIX};
use crate::error::{AppError, Result};
use crate::messenger::strip_channel_prefix;

/// Inbound WhatsApp message as delivered by the provider webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone without the `whatsapp:` prefix
    pub phone: String,
    pub body: String,
    pub num_media: u32,
    pub media_url: Option<String>,
    pub media_content_type: Option<String>,
}

impl InboundMessage {
    /// Build from the provider's form parameters
    ///
    /// A missing or empty `From` is a client error. An unparseable
    /// `NumMedia` counts as zero.
    pub fn from_params(params: &[(String, String)]) -> Result<Self> {
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let phone = get("From")
            .map(|from| strip_channel_prefix(from.trim()).to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput(ERR_MISSING_FROM.to_string()))?;

        Ok(Self {
            phone,
            body: get("Body").unwrap_or_default().trim().to_string(),
            num_media: get("NumMedia")
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(0),
            media_url: get("MediaUrl0").map(str::to_string),
            media_content_type: get("MediaContentType0").map(str::to_string),
        })
    }
}

/// What an inbound message asks for, decided once per message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Receipt photo or other attachment
    Media {
        url: Option<String>,
        content_type: Option<String>,
    },
    Help,
    /// `link_<token>`, token as typed after the prefix
    Link { token: String },
    /// Anything else is treated as an expense statement
    Transaction { text: String },
}

impl Command {
    pub fn classify(message: &InboundMessage) -> Self {
        if message.num_media > 0 {
            return Command::Media {
                url: message.media_url.clone(),
                content_type: message.media_content_type.clone(),
            };
        }

        let body = message.body.trim();
        let lower = body.to_lowercase();
        if matches!(lower.as_str(), "" | "help" | "hi" | "hello") {
            return Command::Help;
        }

        let has_link_prefix = body
            .get(..LINK_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(LINK_PREFIX));
        if has_link_prefix {
            return Command::Link {
                token: body[LINK_PREFIX.len()..].trim().to_string(),
            };
        }

        Command::Transaction {
            text: body.to_string(),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Media { .. } => "media",
            Command::Help => "help",
            Command::Link { .. } => "link",
            Command::Transaction { .. } => "transaction",
        }
    }
}
