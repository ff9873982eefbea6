use dashgate_core::AppError;
use dashgate_domain::OAuthProvider;
use serde::Serialize;

use super::SettingsReader;

const AZURE_LOGIN_BASE: &str = "https://login.microsoftonline.com";
const AZURE_SCOPE: &str = "User.read openid profile email";

/// Azure AD application registration and the endpoints derived from its
/// tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AzureOAuthSettings {
    pub provider: &'static str,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub scope: &'static str,
}

impl AzureOAuthSettings {
    pub(super) fn from_reader(reader: &SettingsReader<'_>) -> Result<Self, AppError> {
        Ok(Self {
            provider: OAuthProvider::Azure.as_str(),
            client_id: reader.required("AUTH_OAUTH_CLIENTID")?,
            client_secret: reader.required("AUTH_OAUTH_CLIENTSECRET")?,
            tenant_id: reader.required("AUTH_OAUTH_TENANTID")?,
            scope: AZURE_SCOPE,
        })
    }

    /// Derives the tenant's endpoints.
    #[must_use]
    pub fn endpoints(&self) -> AzureEndpoints {
        let tenant = &self.tenant_id;
        let api_base_url = format!("{AZURE_LOGIN_BASE}/{tenant}/oauth2/v2.0");

        AzureEndpoints {
            authorize_url: format!("{api_base_url}/authorize"),
            access_token_url: format!("{api_base_url}/token"),
            api_base_url,
            server_metadata_url: format!(
                "{AZURE_LOGIN_BASE}/{tenant}/v2.0/.well-known/openid-configuration"
            ),
            jwks_uri: format!("{AZURE_LOGIN_BASE}/{tenant}/discovery/v2.0/keys"),
            issuer: format!("{AZURE_LOGIN_BASE}/{tenant}/v2.0"),
        }
    }
}

/// Endpoints of an Azure AD tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AzureEndpoints {
    pub authorize_url: String,
    pub access_token_url: String,
    pub api_base_url: String,
    pub server_metadata_url: String,
    pub jwks_uri: String,
    /// Issuer claim carried by v2.0 ID tokens of the tenant.
    pub issuer: String,
}
