//! Conversation handling for inbound WhatsApp messages
//!
//! Every message yields exactly one reply. Store failures never escape: they
//! are logged here and replaced with an apology.

pub mod command;
pub mod replies;

pub use command::{Command, InboundMessage};

use std::future::Future;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::constants::{DEFAULT_CATEGORY, LOG_STATUS_PENDING_PROCESSING, LOG_STATUS_PROCESSED};
use crate::error::Result;
use crate::linking::consume_link_token;
use crate::models::{MessageKind, NewLogEntry, NewTransaction};
use crate::parser::parse_message_on;
use crate::store::Store;

/// Produce the reply for one inbound message
pub async fn handle_message(store: &dyn Store, message: &InboundMessage, now: DateTime<Utc>) -> String {
    let command = Command::classify(message);
    tracing::debug!("Inbound {} message from {}", command.name(), message.phone);

    match respond(store, message, &command, now).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(
                "Error handling {} message from {}: {}",
                command.name(),
                message.phone,
                e
            );
            apology(&command).to_string()
        }
    }
}

async fn respond(
    store: &dyn Store,
    message: &InboundMessage,
    command: &Command,
    now: DateTime<Utc>,
) -> Result<String> {
    match command {
        Command::Media { url, content_type } => {
            let entry = NewLogEntry {
                phone: message.phone.clone(),
                kind: MessageKind::Image,
                content: url.clone().unwrap_or_default(),
                raw_payload: Some(json!({ "url": url, "content_type": content_type })),
                status: LOG_STATUS_PENDING_PROCESSING.to_string(),
            };
            best_effort("image message log", store.record_message(&entry, now)).await;

            Ok(replies::RECEIPT_COMING_SOON.to_string())
        }

        Command::Help => Ok(replies::HELP.to_string()),

        Command::Link { token } => {
            let outcome = consume_link_token(store, token, &message.phone, now).await?;
            Ok(replies::link_reply(&outcome).to_string())
        }

        Command::Transaction { text } => record_transaction(store, message, text, now).await,
    }
}

async fn record_transaction(
    store: &dyn Store,
    message: &InboundMessage,
    text: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let Some(mapping) = store.find_mapping_by_phone(&message.phone).await? else {
        tracing::info!("Transaction from unlinked number {}", message.phone);
        return Ok(replies::NOT_LINKED.to_string());
    };

    let parsed = parse_message_on(text, now.date_naive());
    if !parsed.is_valid {
        tracing::debug!("Could not parse transaction from {}", message.phone);
        return Ok(replies::USAGE.to_string());
    }

    let txn = NewTransaction {
        owner_id: mapping.owner_id,
        amount: parsed.amount,
        date: parsed.date,
        vendor: Some(parsed.vendor.clone()),
        category: DEFAULT_CATEGORY.to_string(),
        note: parsed.note_opt().map(str::to_string),
    };
    let id = store.create_transaction(&txn, now).await?;
    tracing::info!("Created pending transaction {} for {}", id, message.phone);

    let entry = NewLogEntry {
        phone: message.phone.clone(),
        kind: MessageKind::Text,
        content: text.to_string(),
        raw_payload: None,
        status: LOG_STATUS_PROCESSED.to_string(),
    };
    best_effort("text message log", store.record_message(&entry, now)).await;

    Ok(replies::transaction_added(
        &parsed.vendor,
        parsed.amount,
        parsed.note_opt(),
    ))
}

/// Run a non-critical side effect; failure is logged and otherwise ignored
pub async fn best_effort<F>(what: &str, effect: F)
where
    F: Future<Output = Result<()>>,
{
    if let Err(e) = effect.await {
        tracing::warn!("Non-critical {} failed: {}", what, e);
    }
}

fn apology(command: &Command) -> &'static str {
    match command {
        Command::Link { .. } => replies::LINK_APOLOGY,
        Command::Transaction { .. } => replies::TRANSACTION_APOLOGY,
        Command::Media { .. } | Command::Help => replies::GENERIC_APOLOGY,
    }
}
