use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::X_FRAME_OPTIONS;
use axum::routing::{get, post};
use dashgate_core::AppError;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;

use crate::api_config::WebSettings;
use crate::redis_session_store::RedisSessionStore;
use crate::state::AppState;
use crate::{auth, handlers};

mod cors;

pub fn build_router(
    app_state: AppState,
    web: &WebSettings,
    session_layer: SessionManagerLayer<RedisSessionStore>,
) -> Result<Router, AppError> {
    let frame_options = HeaderValue::from_str(web.x_frame_options).map_err(|error| {
        AppError::Internal(format!("invalid X-Frame-Options value: {error}"))
    })?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/auth/oauth/{provider}/callback",
            post(auth::oauth_callback_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .layer(session_layer)
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            frame_options,
        ))
        .layer(cors::build_cors_layer(web.cors_supports_credentials))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
