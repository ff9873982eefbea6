//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod identity;
mod provider;
mod role;
mod user;

pub use identity::{IdentityRecord, PersonName, split_full_name};
pub use provider::{AzureIdTokenClaims, OAuthProvider, ProviderClaims};
pub use role::{RoleMapping, RoleName, reconcile_roles};
pub use user::{User, UserId};
