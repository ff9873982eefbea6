use dashgate_domain::{RoleMapping, RoleName};

/// Authentication backend selected for the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// Username/password accounts stored in the metadata database.
    Database,
    /// Sign-in through an external OAuth / OpenID Connect provider.
    OAuth,
}

impl AuthType {
    /// Parses the `AUTH_TYPE_NAME` setting. Anything but `AUTH_OAUTH` selects
    /// database authentication.
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        if value == "AUTH_OAUTH" {
            Self::OAuth
        } else {
            Self::Database
        }
    }

    /// Returns the setting value for this backend.
    #[must_use]
    pub fn as_setting(&self) -> &'static str {
        match self {
            Self::Database => "AUTH_DB",
            Self::OAuth => "AUTH_OAUTH",
        }
    }
}

/// Settings that drive user registration and role assignment at sign-in.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Selected authentication backend.
    pub auth_type: AuthType,
    /// Whether unknown users are registered on their first sign-in.
    pub user_registration: bool,
    /// Role granted to self-registered users.
    pub registration_role: Option<RoleName>,
    /// Provider role keys to local role names; its keys are the managed roles.
    pub roles_mapping: RoleMapping,
    /// Whether managed roles are reconciled on every sign-in instead of only
    /// at registration.
    pub roles_sync_at_login: bool,
}
