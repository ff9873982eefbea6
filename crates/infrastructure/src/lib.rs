//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_user_directory;
mod jwks_id_token_verifier;
mod postgres_auth_event_repository;
mod postgres_user_directory;

pub use in_memory_user_directory::{InMemoryUserDirectory, LoginStats};
pub use jwks_id_token_verifier::JwksIdTokenVerifier;
pub use postgres_auth_event_repository::PostgresAuthEventRepository;
pub use postgres_user_directory::PostgresUserDirectory;
