//! OAuth callback sign-in: identity extraction, role synchronization and
//! auth event recording.

use tracing::{info, warn};

use dashgate_core::{AppError, AppResult};
use dashgate_domain::User;

use crate::{
    AuthEvent, AuthEventService, IdentityService, LoginOutcome, LoginRoleSynchronizer,
    TokenResponse,
};

/// Caller metadata recorded with auth events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller IP address if available.
    pub ip_address: Option<String>,
    /// Caller user-agent if available.
    pub user_agent: Option<String>,
}

/// Result of an OAuth sign-in attempt.
#[derive(Debug)]
pub enum OAuthLoginOutcome {
    /// The user was authenticated; roles are already synchronized.
    Authenticated(User),
    /// The provider has no identity extractor.
    UnsupportedProvider,
    /// The directory refused the identity.
    Failed,
}

/// Application service driving a complete OAuth sign-in.
#[derive(Clone)]
pub struct OAuthLoginService {
    identity_service: IdentityService,
    synchronizer: LoginRoleSynchronizer,
    auth_event_service: AuthEventService,
}

impl OAuthLoginService {
    /// Creates the sign-in service.
    #[must_use]
    pub fn new(
        identity_service: IdentityService,
        synchronizer: LoginRoleSynchronizer,
        auth_event_service: AuthEventService,
    ) -> Self {
        Self {
            identity_service,
            synchronizer,
            auth_event_service,
        }
    }

    /// Signs in through `provider` with the relayed token response.
    ///
    /// Token verification failures are recorded and returned as errors.
    pub async fn login(
        &self,
        provider: &str,
        response: &TokenResponse,
        context: RequestContext,
    ) -> AppResult<OAuthLoginOutcome> {
        let identity = match self.identity_service.extract_identity(provider, response).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.record(None, provider, LoginOutcome::UnsupportedProvider, context)
                    .await?;
                return Ok(OAuthLoginOutcome::UnsupportedProvider);
            }
            Err(error) => {
                warn!(provider, error = %error, "oauth token rejected");
                if matches!(error, AppError::Unauthorized(_)) {
                    self.record(None, provider, LoginOutcome::InvalidToken, context)
                        .await?;
                }
                return Err(error);
            }
        };

        let subject = identity.login_name().map(ToOwned::to_owned);
        let Some(user) = self.synchronizer.authenticate(&identity).await? else {
            info!(provider, subject = subject.as_deref(), "oauth sign-in refused");
            self.record(subject, provider, LoginOutcome::Failed, context)
                .await?;
            return Ok(OAuthLoginOutcome::Failed);
        };

        self.record(
            Some(user.id().to_string()),
            provider,
            LoginOutcome::Success,
            context,
        )
        .await?;

        Ok(OAuthLoginOutcome::Authenticated(user))
    }

    async fn record(
        &self,
        subject: Option<String>,
        provider: &str,
        outcome: LoginOutcome,
        context: RequestContext,
    ) -> AppResult<()> {
        self.auth_event_service
            .record_event(AuthEvent {
                subject,
                provider: provider.to_owned(),
                outcome,
                ip_address: context.ip_address,
                user_agent: context.user_agent,
            })
            .await
    }
}
