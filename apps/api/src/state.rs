use dashgate_application::OAuthLoginService;
use sqlx::PgPool;

use crate::api_config::ProxyFixSettings;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Present when the deployment signs users in through OAuth.
    pub oauth_login_service: Option<OAuthLoginService>,
    pub proxy_fix: ProxyFixSettings,
    pub postgres_pool: PgPool,
    pub redis_client: redis::Client,
}
