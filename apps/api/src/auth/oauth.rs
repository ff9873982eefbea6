use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use dashgate_application::{OAuthLoginOutcome, TokenResponse};
use dashgate_core::{AppError, UserIdentity};
use dashgate_domain::User;
use tower_sessions::Session;
use tracing::info;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;
use super::session_helpers::extract_request_context;

pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    session: Session,
    Json(token_response): Json<TokenResponse>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let login_service = state
        .oauth_login_service
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("oauth sign-in is not enabled".to_owned()))?;

    let context = extract_request_context(&headers, &state.proxy_fix);
    let outcome = login_service
        .login(provider.as_str(), &token_response, context)
        .await?;
    let identity = identity_for_outcome(provider.as_str(), outcome)?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to rotate session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, identity.clone())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    info!(provider = provider.as_str(), subject = identity.subject(), "user signed in");

    Ok(Json(UserIdentityResponse::from(identity)))
}

fn identity_for_outcome(provider: &str, outcome: OAuthLoginOutcome) -> Result<UserIdentity, AppError> {
    match outcome {
        OAuthLoginOutcome::Authenticated(user) => Ok(session_identity(&user)),
        OAuthLoginOutcome::UnsupportedProvider => Err(AppError::Validation(format!(
            "oauth provider '{provider}' is not supported"
        ))),
        OAuthLoginOutcome::Failed => Err(AppError::Unauthorized(
            "sign-in was refused by the user directory".to_owned(),
        )),
    }
}

fn session_identity(user: &User) -> UserIdentity {
    let email = Some(user.email())
        .filter(|email| !email.is_empty())
        .map(ToOwned::to_owned);

    UserIdentity::new(
        user.id().to_string(),
        user.username(),
        user.display_name(),
        email,
        user.roles().iter().map(ToString::to_string).collect(),
    )
}
