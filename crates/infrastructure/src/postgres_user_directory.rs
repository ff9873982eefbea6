//! PostgreSQL-backed user directory.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use dashgate_application::{NewUser, UserDirectory};
use dashgate_core::{AppError, AppResult};
use dashgate_domain::{RoleName, User, UserId};

/// PostgreSQL implementation of the user directory port.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    active: bool,
    roles: Vec<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .into_iter()
            .map(RoleName::new)
            .collect::<AppResult<BTreeSet<_>>>()?;

        Ok(User::new(
            UserId::from_uuid(row.id),
            row.username,
            row.first_name,
            row.last_name,
            row.email,
            roles,
        )
        .with_active(row.active))
    }
}

mod account;
mod lookup;
mod roles;

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_user_by_username_impl(username).await
    }

    async fn existing_roles(&self, names: &BTreeSet<RoleName>) -> AppResult<BTreeSet<RoleName>> {
        self.existing_roles_impl(names).await
    }

    async fn add_user(&self, user: NewUser) -> AppResult<User> {
        self.add_user_impl(user).await
    }

    async fn update_user_roles(
        &self,
        user_id: UserId,
        roles: &BTreeSet<RoleName>,
    ) -> AppResult<()> {
        self.update_user_roles_impl(user_id, roles).await
    }

    async fn record_login(&self, user_id: UserId) -> AppResult<()> {
        self.record_login_impl(user_id).await
    }
}

fn role_names(roles: &BTreeSet<RoleName>) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_owned()).collect()
}

fn username_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("a user with this username already exists".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
