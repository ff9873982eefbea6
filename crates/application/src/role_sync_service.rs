//! Login-time role synchronization.
//!
//! Wraps the base authenticator so that roles owned by the identity provider
//! (the keys of the role mapping) are re-derived from its claims on every
//! sign-in while roles granted locally are left alone.

use std::sync::Arc;

use tracing::info;

use dashgate_core::AppResult;
use dashgate_domain::{IdentityRecord, User, reconcile_roles};

use crate::{AuthSettings, BaseAuthenticator, RoleCalculator, UserDirectory};

/// Authenticates provider identities and reconciles their managed roles.
#[derive(Clone)]
pub struct LoginRoleSynchronizer {
    base: Arc<dyn BaseAuthenticator>,
    directory: Arc<dyn UserDirectory>,
    role_calculator: RoleCalculator,
    settings: Arc<AuthSettings>,
}

impl LoginRoleSynchronizer {
    /// Creates a synchronizer on top of a base authenticator.
    #[must_use]
    pub fn new(
        base: Arc<dyn BaseAuthenticator>,
        directory: Arc<dyn UserDirectory>,
        settings: Arc<AuthSettings>,
    ) -> Self {
        Self {
            role_calculator: RoleCalculator::new(directory.clone(), settings.clone()),
            base,
            directory,
            settings,
        }
    }

    /// Returns whether managed roles are reconciled on every sign-in.
    #[must_use]
    pub fn roles_sync_at_login(&self) -> bool {
        self.settings.roles_sync_at_login
    }

    /// Authenticates `identity` and, when sync-at-login is enabled, replaces
    /// its managed roles with the ones the provider asserts.
    ///
    /// The base authenticator always runs with its own role sync disabled so
    /// that roles are only rewritten once, here. `None` from the base
    /// authenticator is returned unchanged.
    pub async fn authenticate(&self, identity: &IdentityRecord) -> AppResult<Option<User>> {
        let Some(mut user) = self.base.authenticate_base(identity, false).await? else {
            return Ok(None);
        };

        if !self.settings.roles_sync_at_login {
            return Ok(Some(user));
        }

        let provider_roles = self.role_calculator.calculate(identity).await?;
        let reconciled = reconcile_roles(user.roles(), &provider_roles, &self.settings.roles_mapping);

        let removed = user.roles().difference(&reconciled).count();
        let added = reconciled.difference(user.roles()).count();

        self.directory
            .update_user_roles(user.id(), &reconciled)
            .await?;

        info!(
            user_id = %user.id(),
            username = user.username(),
            added,
            removed,
            "synchronized managed roles at sign-in"
        );

        user.set_roles(reconciled);
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests;
