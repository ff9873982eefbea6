//! Dashgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod redis_session_store;
mod state;

use std::env;

use dashgate_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    build_app_state, build_redis_client, build_redis_session_layer, connect, run_migrations,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = ApiCommand::from_arg(env::args().nth(1).as_deref())?;
    let config = ApiConfig::load()?;

    if command == ApiCommand::PrintConfig {
        println!("{}", config.render_redacted()?);
        return Ok(());
    }

    let pool = connect(&config.metadata_database).await?;
    run_migrations(&pool).await?;

    if command == ApiCommand::Migrate {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let redis_client = build_redis_client(&config.redis)?;
    let session_layer =
        build_redis_session_layer(redis_client.clone(), &config.redis, config.cookie_secure);
    let app_state = build_app_state(pool, redis_client, &config).await?;
    let app = build_router(app_state, &config.web, session_layer)?;

    let address = config.socket_address()?;
    info!(%address, auth_type = config.auth.auth_type, "dashgate-api listening");

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
