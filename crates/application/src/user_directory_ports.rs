use std::collections::BTreeSet;

use async_trait::async_trait;

use dashgate_core::AppResult;
use dashgate_domain::{RoleName, User, UserId};

/// Fields of a user registered on first sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Initial role associations.
    pub roles: BTreeSet<RoleName>,
}

/// Repository port for directory users and roles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by login name, ignoring case.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Returns the subset of `names` that exist as roles.
    async fn existing_roles(&self, names: &BTreeSet<RoleName>) -> AppResult<BTreeSet<RoleName>>;

    /// Creates an active user with the given roles.
    async fn add_user(&self, user: NewUser) -> AppResult<User>;

    /// Replaces the role associations of a user.
    async fn update_user_roles(&self, user_id: UserId, roles: &BTreeSet<RoleName>)
    -> AppResult<()>;

    /// Records a successful sign-in (last login time and login count).
    async fn record_login(&self, user_id: UserId) -> AppResult<()>;
}
