use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::api_config::RedisSettings;
use crate::redis_session_store::RedisSessionStore;

pub fn build_redis_session_layer(
    redis_client: redis::Client,
    settings: &RedisSettings,
    cookie_secure: bool,
) -> SessionManagerLayer<RedisSessionStore> {
    let session_store = RedisSessionStore::new(redis_client, settings.session_key_prefix());

    SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(session_same_site(cookie_secure))
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)))
}

/// Embedding hosts call from another site, which needs `SameSite=None`.
/// Browsers only accept that on secure cookies.
fn session_same_site(cookie_secure: bool) -> SameSite {
    if cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    }
}
