use std::env;

use crate::constants::DEFAULT_LINK_TOKEN_TTL_SECS;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub twilio_account_sid: String,
    /// Provider API credential, also the key webhook signatures are computed with
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,
    pub twilio_api_base: String,
    /// Externally visible base URL, e.g. `https://bot.example.com`
    pub public_base_url: Option<String>,
    pub link_token_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let twilio_account_sid =
            env::var("TWILIO_ACCOUNT_SID").map_err(|_| "TWILIO_ACCOUNT_SID must be set")?;

        let twilio_auth_token = env::var("TWILIO_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or("TWILIO_AUTH_TOKEN must be set for webhook signature verification")?;

        let twilio_whatsapp_number = env::var("TWILIO_WHATSAPP_NUMBER")
            .map_err(|_| "TWILIO_WHATSAPP_NUMBER must be set")?;

        let twilio_api_base = env::var("TWILIO_API_BASE")
            .unwrap_or_else(|_| "https://api.twilio.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        let link_token_ttl_secs = env::var("LINK_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_LINK_TOKEN_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid LINK_TOKEN_TTL_SECS")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
            allowed_origins,
            environment,
            twilio_account_sid,
            twilio_auth_token,
            twilio_whatsapp_number,
            twilio_api_base,
            public_base_url,
            link_token_ttl_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Link token lifetime as a chrono duration
    pub fn link_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.link_token_ttl_secs)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
