//! WhatsApp front-end for the expense tracker
//!
//! This module exports the core types and functions for testing and reuse.

pub mod bot;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod linking;
pub mod messenger;
pub mod models;
pub mod parser;
pub mod routes;
pub mod security;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use messenger::Messenger;
use store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub messenger: Arc<dyn Messenger>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState from explicitly constructed dependencies
    pub fn new(store: Arc<dyn Store>, messenger: Arc<dyn Messenger>, config: Config) -> Self {
        Self {
            store,
            messenger,
            config,
        }
    }
}

/// Build the application router without transport layers (CORS, tracing)
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/whatsapp/link-token", post(create_link_token))
        .route("/api/whatsapp/status", get(link_status).delete(unlink))
        .route("/api/whatsapp/transactions", get(list_transactions))
        .route(
            "/api/whatsapp/transactions/:id/confirm",
            post(confirm_transaction),
        )
        .route("/api/whatsapp/webhook", post(receive_message))
        .with_state(state)
}
