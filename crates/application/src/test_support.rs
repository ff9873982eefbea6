use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use dashgate_core::{AppError, AppResult};
use dashgate_domain::{RoleMapping, RoleName, User, UserId};

use crate::{AuthSettings, AuthType, NewUser, UserDirectory};

pub(crate) fn role(name: &str) -> RoleName {
    match RoleName::new(name) {
        Ok(role) => role,
        Err(error) => panic!("invalid test role '{name}': {error}"),
    }
}

pub(crate) fn roles(names: &[&str]) -> BTreeSet<RoleName> {
    names.iter().map(|name| role(name)).collect()
}

pub(crate) fn deployment_settings(roles_sync_at_login: bool) -> AuthSettings {
    AuthSettings {
        auth_type: AuthType::OAuth,
        user_registration: true,
        registration_role: Some(role("Partner")),
        roles_mapping: RoleMapping::new([
            ("User", vec!["Gamma", "Alpha"]),
            ("Admin", vec!["Admin"]),
            ("Gamma", vec!["Gamma"]),
            ("Partner", vec!["Partner"]),
        ])
        .unwrap_or_default(),
        roles_sync_at_login,
    }
}

#[derive(Default)]
pub(crate) struct TestDirectory {
    pub(crate) roles: Mutex<BTreeSet<RoleName>>,
    pub(crate) users: Mutex<BTreeMap<String, User>>,
    pub(crate) role_updates: Mutex<Vec<(UserId, BTreeSet<RoleName>)>>,
    pub(crate) logins: Mutex<Vec<UserId>>,
}

impl TestDirectory {
    pub(crate) fn with_roles(names: &[&str]) -> Self {
        Self {
            roles: Mutex::new(roles(names)),
            ..Self::default()
        }
    }

    pub(crate) fn insert_user(&self, user: User) {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user.username().to_lowercase(), user);
        }
    }

    pub(crate) fn user(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .ok()
            .and_then(|users| users.get(&username.to_lowercase()).cloned())
    }

    pub(crate) fn role_update_count(&self) -> usize {
        self.role_updates
            .lock()
            .ok()
            .map(|updates| updates.len())
            .unwrap_or(0)
    }

    pub(crate) fn login_count(&self) -> usize {
        self.logins.lock().ok().map(|logins| logins.len()).unwrap_or(0)
    }
}

fn lock_error(error: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("failed to lock directory state: {error}"))
}

#[async_trait]
impl UserDirectory for TestDirectory {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .map_err(lock_error)?
            .get(&username.to_lowercase())
            .cloned())
    }

    async fn existing_roles(&self, names: &BTreeSet<RoleName>) -> AppResult<BTreeSet<RoleName>> {
        let known = self.roles.lock().map_err(lock_error)?;
        Ok(names.intersection(&known).cloned().collect())
    }

    async fn add_user(&self, user: NewUser) -> AppResult<User> {
        let created = User::new(
            UserId::new(),
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            user.roles,
        );
        self.users
            .lock()
            .map_err(lock_error)?
            .insert(created.username().to_lowercase(), created.clone());
        Ok(created)
    }

    async fn update_user_roles(
        &self,
        user_id: UserId,
        roles: &BTreeSet<RoleName>,
    ) -> AppResult<()> {
        let mut users = self.users.lock().map_err(lock_error)?;
        let user = users
            .values_mut()
            .find(|user| user.id() == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}'")))?;
        user.set_roles(roles.clone());
        drop(users);

        self.role_updates
            .lock()
            .map_err(lock_error)?
            .push((user_id, roles.clone()));
        Ok(())
    }

    async fn record_login(&self, user_id: UserId) -> AppResult<()> {
        self.logins.lock().map_err(lock_error)?.push(user_id);
        Ok(())
    }
}
