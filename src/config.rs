use std::env;

use anyhow::{Context, Result};

/// Environment-driven configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL of the managed auth provider, e.g. `https://x.example.co/auth/v1`.
    pub auth_url: String,
    pub auth_api_key: String,
    /// Public origin of the app, used for provider redirect targets.
    pub site_url: String,
    /// Absent key means AI features answer with a configuration error
    /// instead of refusing to boot.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3050".to_string())
                .parse()
                .context("PORT must be a number")?,
            auth_url: env::var("AUTH_URL").context("AUTH_URL must be set")?,
            auth_api_key: env::var("AUTH_API_KEY").context("AUTH_API_KEY must be set")?,
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
        })
    }
}
