use super::*;

pub(super) async fn check_postgres(pool: &sqlx::PgPool) -> HealthDependencyStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthDependencyStatus::ok(),
        Err(error) => HealthDependencyStatus::error(format!("postgres check failed: {error}")),
    }
}

pub(super) async fn check_redis(redis_client: &redis::Client) -> HealthDependencyStatus {
    let mut connection = match redis_client.get_multiplexed_async_connection().await {
        Ok(connection) => connection,
        Err(error) => {
            return HealthDependencyStatus::error(format!("redis connection failed: {error}"));
        }
    };

    match redis::cmd("PING")
        .query_async::<String>(&mut connection)
        .await
    {
        Ok(value) if value.eq_ignore_ascii_case("pong") => HealthDependencyStatus::ok(),
        Ok(value) => {
            HealthDependencyStatus::error(format!("unexpected redis ping response: {value}"))
        }
        Err(error) => HealthDependencyStatus::error(format!("redis ping failed: {error}")),
    }
}
