//! Outbound WhatsApp messages

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::constants::{OUTBOUND_TIMEOUT_SECS, WHATSAPP_PREFIX};

#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("No message SID returned from provider")]
    MissingSid,
}

/// Sends a text reply to a phone number
#[async_trait]
pub trait Messenger: Send + Sync {
    /// `to` is a bare phone number, without the channel prefix
    async fn send_text(&self, to: &str, body: &str) -> Result<(), MessengerError>;
}

#[derive(Debug, Deserialize)]
struct CreateMessageResponse {
    sid: Option<String>,
}

/// Messenger backed by the Twilio REST API
#[derive(Debug, Clone)]
pub struct TwilioMessenger {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioMessenger {
    pub fn new(config: &Config) -> Result<Self, MessengerError> {
        Self::with_timeout(config, Duration::from_secs(OUTBOUND_TIMEOUT_SECS))
    }

    /// The webhook waits for the send, so `timeout` must stay below the
    /// provider's own webhook timeout
    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, MessengerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: config.twilio_api_base.clone(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from: with_channel_prefix(&config.twilio_whatsapp_number),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), MessengerError> {
        let to = with_channel_prefix(to);
        let form = [("To", to.as_str()), ("From", self.from.as_str()), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MessengerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateMessageResponse = response.json().await?;
        let sid = created.sid.ok_or(MessengerError::MissingSid)?;
        tracing::debug!("Sent WhatsApp message {}", sid);

        Ok(())
    }
}

/// Add the `whatsapp:` channel prefix unless already present
pub fn with_channel_prefix(phone: &str) -> String {
    if phone.starts_with(WHATSAPP_PREFIX) {
        phone.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, phone)
    }
}

/// Strip the `whatsapp:` channel prefix if present
pub fn strip_channel_prefix(phone: &str) -> &str {
    phone.strip_prefix(WHATSAPP_PREFIX).unwrap_or(phone)
}
