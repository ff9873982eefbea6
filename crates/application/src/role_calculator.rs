use std::collections::BTreeSet;
use std::sync::Arc;

use dashgate_core::AppResult;
use dashgate_domain::{IdentityRecord, RoleName};
use tracing::warn;

use crate::{AuthSettings, UserDirectory};

/// Computes the roles an identity provider asserts for a sign-in.
#[derive(Clone)]
pub struct RoleCalculator {
    directory: Arc<dyn UserDirectory>,
    settings: Arc<AuthSettings>,
}

impl RoleCalculator {
    /// Creates a calculator over the directory's known roles.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, settings: Arc<AuthSettings>) -> Self {
        Self {
            directory,
            settings,
        }
    }

    /// Maps the identity's role keys through the role mapping and adds the
    /// registration role when self-registration is on. Names that do not exist
    /// in the directory are dropped.
    pub async fn calculate(&self, identity: &IdentityRecord) -> AppResult<BTreeSet<RoleName>> {
        let mut wanted = BTreeSet::new();

        if !self.settings.roles_mapping.is_empty() {
            wanted.extend(
                self.settings
                    .roles_mapping
                    .roles_for_keys(identity.role_keys.iter().map(String::as_str)),
            );
        }

        let registration_role = self
            .settings
            .registration_role
            .as_ref()
            .filter(|_| self.settings.user_registration);
        if let Some(role) = registration_role {
            wanted.insert(role.clone());
        }

        let existing = self.directory.existing_roles(&wanted).await?;

        for missing in wanted.difference(&existing) {
            if registration_role == Some(missing) {
                warn!(role = %missing, "registration role does not exist");
            } else {
                warn!(role = %missing, "mapped role does not exist, skipping");
            }
        }

        Ok(existing)
    }
}
