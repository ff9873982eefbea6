//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_event_service;
mod auth_settings;
mod base_authenticator;
mod identity_service;
mod oauth_login_service;
mod role_calculator;
mod role_sync_service;
mod user_directory_ports;

#[cfg(test)]
mod test_support;

pub use auth_event_service::{AuthEvent, AuthEventRepository, AuthEventService, LoginOutcome};
pub use auth_settings::{AuthSettings, AuthType};
pub use base_authenticator::{BaseAuthenticator, DirectoryAuthenticator};
pub use identity_service::{IdTokenVerifier, IdentityService, TokenResponse};
pub use oauth_login_service::{OAuthLoginOutcome, OAuthLoginService, RequestContext};
pub use role_calculator::RoleCalculator;
pub use role_sync_service::LoginRoleSynchronizer;
pub use user_directory_ports::{NewUser, UserDirectory};
