use dashgate_core::AppError;

use crate::api_config::RedisSettings;

pub fn build_redis_client(settings: &RedisSettings) -> Result<redis::Client, AppError> {
    redis::Client::open(settings.client_url()?).map_err(|error| {
        AppError::Validation(format!(
            "invalid redis settings for host '{}': {error}",
            settings.host
        ))
    })
}
