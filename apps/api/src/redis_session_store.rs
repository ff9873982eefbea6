use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, Error as SessionStoreError};

/// Session store keeping one JSON record per session, expiring with it.
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisSessionStore {
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn session_key(&self, session_id: &Id) -> String {
        format!("{}:{session_id}", self.key_prefix)
    }

    async fn connection(&self) -> session_store::Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)
    }
}

fn backend_error(error: impl ToString) -> SessionStoreError {
    SessionStoreError::Backend(error.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let key = self.session_key(&record.id);
        let remaining_seconds = record.expiry_date.unix_timestamp() - Utc::now().timestamp();
        let mut connection = self.connection().await?;

        let Ok(ttl_seconds) = u64::try_from(remaining_seconds) else {
            connection.del::<_, i64>(key).await.map_err(backend_error)?;
            return Ok(());
        };
        if ttl_seconds == 0 {
            connection.del::<_, i64>(key).await.map_err(backend_error)?;
            return Ok(());
        }

        let encoded = serde_json::to_string(record)
            .map_err(|error| SessionStoreError::Encode(error.to_string()))?;

        connection
            .set_ex::<_, _, ()>(key, encoded, ttl_seconds)
            .await
            .map_err(backend_error)
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let key = self.session_key(session_id);
        let encoded: Option<String> = self
            .connection()
            .await?
            .get(key)
            .await
            .map_err(backend_error)?;

        encoded
            .map(|value| {
                serde_json::from_str::<Record>(&value)
                    .map_err(|error| SessionStoreError::Decode(error.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let key = self.session_key(session_id);
        self.connection()
            .await?
            .del::<_, i64>(key)
            .await
            .map_err(backend_error)?;

        Ok(())
    }
}
