use std::sync::Arc;

use async_trait::async_trait;

use dashgate_core::AppResult;

/// Outcome labels of an OAuth sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The user was authenticated.
    Success,
    /// The directory refused the user (inactive, unregistered, no login name).
    Failed,
    /// No identity extractor exists for the provider.
    UnsupportedProvider,
    /// The provider response could not be verified.
    InvalidToken,
}

impl LoginOutcome {
    /// Returns the stable storage label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::UnsupportedProvider => "unsupported_provider",
            Self::InvalidToken => "invalid_token",
        }
    }
}

/// Authentication event payload for security analytics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    /// Login name or directory subject, if known.
    pub subject: Option<String>,
    /// Identity provider name as requested by the caller.
    pub provider: String,
    /// Attempt outcome.
    pub outcome: LoginOutcome,
    /// Caller IP address if available.
    pub ip_address: Option<String>,
    /// Caller user-agent if available.
    pub user_agent: Option<String>,
}

impl AuthEvent {
    /// Stable event type of OAuth sign-in attempts.
    pub const OAUTH_LOGIN: &'static str = "oauth_login";
}

/// Repository port for auth event persistence.
#[async_trait]
pub trait AuthEventRepository: Send + Sync {
    /// Appends an auth event entry.
    async fn append_event(&self, event: AuthEvent) -> AppResult<()>;
}

/// Application service for auth event recording.
#[derive(Clone)]
pub struct AuthEventService {
    repository: Arc<dyn AuthEventRepository>,
}

impl AuthEventService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthEventRepository>) -> Self {
        Self { repository }
    }

    /// Persists an auth event.
    pub async fn record_event(&self, event: AuthEvent) -> AppResult<()> {
        self.repository.append_event(event).await
    }
}
