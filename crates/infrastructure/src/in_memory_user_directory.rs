use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dashgate_application::{NewUser, UserDirectory};
use dashgate_core::{AppError, AppResult};
use dashgate_domain::{RoleName, User, UserId};

/// Sign-in statistics tracked per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginStats {
    /// Number of successful sign-ins.
    pub login_count: u32,
    /// Time of the latest successful sign-in.
    pub last_login: Option<DateTime<Utc>>,
}

/// In-memory user directory implementation.
///
/// Usernames are matched case-insensitively, like the Postgres directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    roles: RwLock<BTreeSet<RoleName>>,
    users: RwLock<HashMap<String, User>>,
    login_stats: RwLock<HashMap<UserId, LoginStats>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory whose role table holds `roles`.
    #[must_use]
    pub fn with_roles(roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self {
            roles: RwLock::new(roles.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Creates any of `names` that do not exist yet.
    pub async fn ensure_roles(&self, names: &BTreeSet<RoleName>) {
        self.roles.write().await.extend(names.iter().cloned());
    }

    /// Stores a user as-is, replacing any user with the same username.
    pub async fn insert_user(&self, user: User) {
        self.users
            .write()
            .await
            .insert(username_key(user.username()), user);
    }

    /// Returns sign-in statistics for a user.
    pub async fn login_stats(&self, user_id: UserId) -> LoginStats {
        self.login_stats
            .read()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }
}

fn username_key(username: &str) -> String {
    username.to_lowercase()
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .get(&username_key(username))
            .cloned())
    }

    async fn existing_roles(&self, names: &BTreeSet<RoleName>) -> AppResult<BTreeSet<RoleName>> {
        let roles = self.roles.read().await;
        Ok(names.intersection(&roles).cloned().collect())
    }

    async fn add_user(&self, user: NewUser) -> AppResult<User> {
        let key = username_key(&user.username);
        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }

        let roles = self.existing_roles(&user.roles).await?;
        let created = User::new(
            UserId::new(),
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            roles,
        );
        users.insert(key, created.clone());

        Ok(created)
    }

    async fn update_user_roles(
        &self,
        user_id: UserId,
        roles: &BTreeSet<RoleName>,
    ) -> AppResult<()> {
        let assignable = self.existing_roles(roles).await?;
        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|user| user.id() == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;

        user.set_roles(assignable);
        Ok(())
    }

    async fn record_login(&self, user_id: UserId) -> AppResult<()> {
        let mut stats = self.login_stats.write().await;
        let entry = stats.entry(user_id).or_default();
        entry.login_count = entry.login_count.saturating_add(1);
        entry.last_login = Some(Utc::now());
        Ok(())
    }
}
