//! ID token verification against a provider's published signing keys.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use dashgate_application::IdTokenVerifier;
use dashgate_core::{AppError, AppResult};
use dashgate_domain::OAuthProvider;

const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const REFRESH_COOLDOWN: Duration = Duration::from_secs(60);
const CLOCK_SKEW_LEEWAY_SECONDS: u64 = 60;

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: Option<String>,
    e: Option<String>,
    alg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Clone)]
struct SigningKey {
    key: DecodingKey,
    algorithm: Algorithm,
}

/// Verifies ID token signatures, audience, issuer and expiry.
///
/// Keys are fetched from the JWKS endpoint on first use and refetched when a
/// token names an unknown key id, at most once per cooldown window.
pub struct JwksIdTokenVerifier {
    provider: OAuthProvider,
    audience: String,
    issuer: Option<String>,
    jwks_uri: Option<String>,
    client: reqwest::Client,
    keys: RwLock<HashMap<String, SigningKey>>,
    last_refresh: RwLock<Option<Instant>>,
}

impl JwksIdTokenVerifier {
    /// Creates a verifier for tokens issued by `provider` to `audience`.
    pub fn new(provider: OAuthProvider, audience: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build JWKS client: {error}")))?;

        Ok(Self {
            provider,
            audience: audience.into(),
            issuer: None,
            jwks_uri: None,
            client,
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
        })
    }

    /// Requires tokens to carry this `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Fetches signing keys from this JWKS endpoint.
    #[must_use]
    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(jwks_uri.into());
        self
    }

    /// Pins a signing key under `kid`.
    #[must_use]
    pub fn with_static_key(
        mut self,
        kid: impl Into<String>,
        key: DecodingKey,
        algorithm: Algorithm,
    ) -> Self {
        self.keys
            .get_mut()
            .insert(kid.into(), SigningKey { key, algorithm });
        self
    }

    async fn signing_key(&self, kid: &str) -> AppResult<SigningKey> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        self.refresh_keys(kid).await?;

        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(format!("unknown signing key '{kid}'")))
    }

    async fn refresh_keys(&self, kid: &str) -> AppResult<()> {
        let Some(jwks_uri) = self.jwks_uri.as_deref() else {
            return Ok(());
        };

        {
            let mut last_refresh = self.last_refresh.write().await;
            if let Some(previous) = *last_refresh
                && previous.elapsed() < REFRESH_COOLDOWN
            {
                debug!(kid, "jwks refresh throttled");
                return Ok(());
            }
            *last_refresh = Some(Instant::now());
        }

        info!(kid, jwks_uri, "fetching signing keys");
        let fetched = self.fetch_keys(jwks_uri).await?;
        self.keys.write().await.extend(fetched);

        Ok(())
    }

    async fn fetch_keys(&self, jwks_uri: &str) -> AppResult<HashMap<String, SigningKey>> {
        let document = self
            .client
            .get(jwks_uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| AppError::Internal(format!("failed to fetch signing keys: {error}")))?
            .json::<JwksDocument>()
            .await
            .map_err(|error| AppError::Internal(format!("invalid signing key document: {error}")))?;

        Ok(signing_keys(document))
    }
}

/// Builds the usable signing keys of a JWKS document. Non-RSA and malformed
/// keys are skipped.
fn signing_keys(document: JwksDocument) -> HashMap<String, SigningKey> {
    let mut keys = HashMap::new();
    for jwk in document.keys {
        if jwk.kty != "RSA" {
            continue;
        }
        let (Some(modulus), Some(exponent)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            warn!(kid = %jwk.kid, "skipping RSA key without components");
            continue;
        };
        let key = match DecodingKey::from_rsa_components(modulus, exponent) {
            Ok(key) => key,
            Err(error) => {
                warn!(kid = %jwk.kid, error = %error, "skipping malformed RSA key");
                continue;
            }
        };
        let algorithm = jwk
            .alg
            .as_deref()
            .and_then(|alg| alg.parse::<Algorithm>().ok())
            .unwrap_or(Algorithm::RS256);
        keys.insert(jwk.kid, SigningKey { key, algorithm });
    }

    keys
}

#[async_trait]
impl IdTokenVerifier for JwksIdTokenVerifier {
    async fn verify(&self, provider: OAuthProvider, id_token: &str) -> AppResult<Value> {
        if provider != self.provider {
            return Err(AppError::Unauthorized(format!(
                "no verifier configured for provider '{}'",
                provider.as_str()
            )));
        }

        let header = decode_header(id_token)
            .map_err(|error| AppError::Unauthorized(format!("malformed id token: {error}")))?;
        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("id token has no key id".to_owned()))?;
        let signing_key = self.signing_key(&kid).await?;

        if header.alg != signing_key.algorithm {
            return Err(AppError::Unauthorized(format!(
                "id token algorithm {:?} does not match key '{kid}'",
                header.alg
            )));
        }

        let mut validation = Validation::new(signing_key.algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECONDS;
        validation.set_audience(&[self.audience.as_str()]);
        if let Some(issuer) = self.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }

        decode::<Value>(id_token, &signing_key.key, &validation)
            .map(|data| data.claims)
            .map_err(|error| AppError::Unauthorized(format!("id token rejected: {error}")))
    }
}
