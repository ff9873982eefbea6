use std::sync::Arc;

use dashgate_application::{
    AuthEventService, AuthSettings, DirectoryAuthenticator, IdentityService,
    LoginRoleSynchronizer, OAuthLoginService, UserDirectory,
};
use dashgate_core::AppError;
use dashgate_domain::OAuthProvider;
use dashgate_infrastructure::{
    JwksIdTokenVerifier, PostgresAuthEventRepository, PostgresUserDirectory,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::{ApiConfig, AzureOAuthSettings};
use crate::state::AppState;

pub async fn build_app_state(
    pool: PgPool,
    redis_client: redis::Client,
    config: &ApiConfig,
) -> Result<AppState, AppError> {
    let directory = Arc::new(PostgresUserDirectory::new(pool.clone()));
    let referenced_roles = config.auth.referenced_roles();
    directory.ensure_roles(&referenced_roles).await?;
    info!(roles = referenced_roles.len(), "directory roles ensured");

    let oauth_login_service = config
        .auth
        .oauth
        .as_ref()
        .map(|oauth| {
            build_oauth_login_service(
                &pool,
                directory.clone(),
                Arc::new(config.auth.auth_settings()),
                oauth,
            )
        })
        .transpose()?;

    Ok(AppState {
        oauth_login_service,
        proxy_fix: config.web.proxy_fix,
        postgres_pool: pool,
        redis_client,
    })
}

fn build_oauth_login_service(
    pool: &PgPool,
    directory: Arc<dyn UserDirectory>,
    settings: Arc<AuthSettings>,
    oauth: &AzureOAuthSettings,
) -> Result<OAuthLoginService, AppError> {
    let endpoints = oauth.endpoints();
    let verifier = JwksIdTokenVerifier::new(OAuthProvider::Azure, oauth.client_id.clone())?
        .with_issuer(endpoints.issuer)
        .with_jwks_uri(endpoints.jwks_uri);

    let base = Arc::new(DirectoryAuthenticator::new(
        directory.clone(),
        settings.clone(),
    ));
    let auth_event_repository = Arc::new(PostgresAuthEventRepository::new(pool.clone()));

    Ok(OAuthLoginService::new(
        IdentityService::new(Arc::new(verifier)),
        LoginRoleSynchronizer::new(base, directory, settings),
        AuthEventService::new(auth_event_repository),
    ))
}
