use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::GeminiClient;
use crate::auth::AuthClient;
use crate::config::Config;

/// Per-process handles shared by every request. Both clients pool their own
/// connections, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: Arc<AuthClient>,
    pub ai: Arc<GeminiClient>,
    pub site_url: String,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            auth: Arc::new(AuthClient::new(&config.auth_url, config.auth_api_key.clone())),
            ai: Arc::new(GeminiClient::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            )),
            site_url: config.site_url.trim_end_matches('/').to_string(),
        }
    }
}
