use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Form,
};
use chrono::Utc;

use crate::bot::{handle_message, InboundMessage};
use crate::constants::{SIGNATURE_HEADER, TWIML_EMPTY_RESPONSE};
use crate::error::{AppError, Result};
use crate::security::verify_webhook_signature;
use crate::AppState;

/// Inbound WhatsApp webhook
///
/// Verifies the provider signature, produces exactly one reply and sends it
/// back to the sender. Once the request is authentic the provider always gets
/// the empty TwiML acknowledgement; processing and delivery failures are only
/// logged.
pub async fn receive_message(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse> {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let url = match &state.config.public_base_url {
        Some(base) => format!("{}{}", base, path),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default();
            format!("https://{}{}", host, path)
        }
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|s| s.to_str().ok())
        .unwrap_or_default();

    if !verify_webhook_signature(&url, &params, signature, &state.config.twilio_auth_token) {
        tracing::warn!("Rejected webhook with invalid signature for {}", url);
        return Err(AppError::InvalidSignature);
    }

    let message = InboundMessage::from_params(&params)?;
    let reply = handle_message(state.store.as_ref(), &message, Utc::now()).await;

    if let Err(e) = state.messenger.send_text(&message.phone, &reply).await {
        tracing::error!("Error sending reply to {}: {}", message.phone, e);
    }

    Ok(([(header::CONTENT_TYPE, "text/xml")], TWIML_EMPTY_RESPONSE))
}
