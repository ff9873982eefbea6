mod database;
mod redis;
mod sessions;
mod state_builder;

pub use database::{connect, run_migrations};
pub use redis::build_redis_client;
pub use sessions::build_redis_session_layer;
pub use state_builder::build_app_state;
