//! Identity extraction from OAuth token responses.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use dashgate_core::{AppError, AppResult};
use dashgate_domain::{AzureIdTokenClaims, IdentityRecord, OAuthProvider, ProviderClaims};

/// Token endpoint response relayed by the OAuth callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    /// OpenID Connect id token (compact JWS).
    #[serde(default)]
    pub id_token: Option<String>,
    /// Access token for the provider's APIs.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Port that verifies an id token's signature and standard claims.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    /// Returns the verified claim set of `id_token`.
    ///
    /// Signature or claim validation failures are `AppError::Unauthorized`.
    async fn verify(&self, provider: OAuthProvider, id_token: &str) -> AppResult<Value>;
}

/// Application service that turns provider responses into identity records.
#[derive(Clone)]
pub struct IdentityService {
    verifier: Arc<dyn IdTokenVerifier>,
}

impl IdentityService {
    /// Creates a service backed by an id token verifier.
    #[must_use]
    pub fn new(verifier: Arc<dyn IdTokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Extracts the identity from a provider's token response.
    ///
    /// Unsupported providers yield `Ok(None)` so the caller can fall back to
    /// its default handling. A missing or invalid id token fails the sign-in.
    pub async fn extract_identity(
        &self,
        provider: &str,
        response: &TokenResponse,
    ) -> AppResult<Option<IdentityRecord>> {
        debug!(provider, "extracting identity from oauth response");

        let Some(oauth_provider) = OAuthProvider::from_name(provider) else {
            debug!(provider, "no identity extractor for provider");
            return Ok(None);
        };

        let id_token = response
            .id_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(format!(
                    "{} response does not contain an id token",
                    oauth_provider.as_str()
                ))
            })?;

        let claims = self.verifier.verify(oauth_provider, id_token).await?;
        let provider_claims = match oauth_provider {
            OAuthProvider::Azure => ProviderClaims::Azure(AzureIdTokenClaims::from_claims(&claims)),
        };

        let identity = provider_claims.into_identity();
        debug!(
            provider = oauth_provider.as_str(),
            username = identity.username.as_str(),
            role_keys = identity.role_keys.len(),
            "extracted identity"
        );

        Ok(Some(identity))
    }
}
