//! Standard OAuth sign-in against the user directory.
//!
//! Finds or registers the directory user for a verified identity. Role
//! reconciliation beyond what this does lives in `LoginRoleSynchronizer`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use dashgate_core::AppResult;
use dashgate_domain::{IdentityRecord, User};

use crate::{AuthSettings, NewUser, RoleCalculator, UserDirectory};

/// Domain used for the placeholder email of users without one.
const MISSING_EMAIL_DOMAIN: &str = "email.notfound";

/// Host authentication capability the role synchronizer builds on.
#[async_trait]
pub trait BaseAuthenticator: Send + Sync {
    /// Finds or registers the user for `identity`.
    ///
    /// When `sync_roles_at_login` is set, an existing user's roles are
    /// replaced by the calculated roles. Returns `None` when sign-in is refused.
    async fn authenticate_base(
        &self,
        identity: &IdentityRecord,
        sync_roles_at_login: bool,
    ) -> AppResult<Option<User>>;
}

/// Directory-backed implementation of the standard OAuth sign-in.
#[derive(Clone)]
pub struct DirectoryAuthenticator {
    directory: Arc<dyn UserDirectory>,
    role_calculator: RoleCalculator,
    settings: Arc<AuthSettings>,
}

impl DirectoryAuthenticator {
    /// Creates an authenticator over a user directory.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, settings: Arc<AuthSettings>) -> Self {
        Self {
            role_calculator: RoleCalculator::new(directory.clone(), settings.clone()),
            directory,
            settings,
        }
    }
}

#[async_trait]
impl BaseAuthenticator for DirectoryAuthenticator {
    async fn authenticate_base(
        &self,
        identity: &IdentityRecord,
        sync_roles_at_login: bool,
    ) -> AppResult<Option<User>> {
        let Some(login_name) = identity.login_name() else {
            warn!("identity has no username, refusing sign-in");
            return Ok(None);
        };

        let existing = self.directory.find_user_by_username(login_name).await?;

        let user = match existing {
            Some(user) if !user.is_active() => {
                info!(username = login_name, "inactive user refused");
                return Ok(None);
            }
            Some(mut user) => {
                if sync_roles_at_login {
                    let roles = self.role_calculator.calculate(identity).await?;
                    self.directory.update_user_roles(user.id(), &roles).await?;
                    user.set_roles(roles);
                }
                user
            }
            None if !self.settings.user_registration => {
                debug!(username = login_name, "unknown user and registration is disabled");
                return Ok(None);
            }
            None => {
                let roles = self.role_calculator.calculate(identity).await?;
                let email = if identity.email.trim().is_empty() {
                    format!("{login_name}@{MISSING_EMAIL_DOMAIN}")
                } else {
                    identity.email.clone()
                };

                let user = self
                    .directory
                    .add_user(NewUser {
                        username: login_name.to_owned(),
                        first_name: identity.first_name.clone(),
                        last_name: identity.last_name.clone(),
                        email,
                        roles,
                    })
                    .await?;
                info!(username = login_name, user_id = %user.id(), "registered user on first sign-in");
                user
            }
        };

        self.directory.record_login(user.id()).await?;
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests;
