//! Supported identity providers and their claim sets.

use serde_json::Value;

use crate::{IdentityRecord, PersonName};

/// Identity provider families with a claim extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    /// Azure AD / Microsoft Entra ID.
    Azure,
}

impl OAuthProvider {
    /// Resolves a configured provider name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "azure" | "microsoft" => Some(Self::Azure),
            _ => None,
        }
    }

    /// Returns the canonical provider name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "azure",
        }
    }
}

/// Claims read from an Azure AD id token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AzureIdTokenClaims {
    /// `name`
    pub name: String,
    /// `email`
    pub email: String,
    /// `sub`
    pub subject: String,
    /// `preferred_username`
    pub preferred_username: String,
    /// `given_name`
    pub given_name: String,
    /// `family_name`
    pub family_name: String,
    /// `roles` (app roles assigned to the principal)
    pub roles: Vec<String>,
}

impl AzureIdTokenClaims {
    /// Reads the claims from a verified claim set.
    ///
    /// Missing or non-string claims become empty strings. A `roles` claim that
    /// is not an array yields no roles; non-string entries are skipped.
    #[must_use]
    pub fn from_claims(claims: &Value) -> Self {
        let text = |key: &str| {
            claims
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        let roles = claims
            .get("roles")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: text("name"),
            email: text("email"),
            subject: text("sub"),
            preferred_username: text("preferred_username"),
            given_name: text("given_name"),
            family_name: text("family_name"),
            roles,
        }
    }
}

/// Provider-specific claims of one sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderClaims {
    /// Claims from an Azure AD id token.
    Azure(AzureIdTokenClaims),
}

impl ProviderClaims {
    /// Normalizes the claims into an identity record.
    #[must_use]
    pub fn into_identity(self) -> IdentityRecord {
        match self {
            Self::Azure(claims) => {
                let person =
                    PersonName::resolve(&claims.given_name, &claims.family_name, &claims.name);

                IdentityRecord {
                    name: claims.name,
                    email: claims.email,
                    external_id: claims.subject,
                    username: claims.preferred_username,
                    first_name: person.first,
                    last_name: person.last,
                    role_keys: claims.roles,
                }
            }
        }
    }
}
