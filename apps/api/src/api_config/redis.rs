use dashgate_core::AppError;
use serde::Serialize;
use url::Url;

use super::tasks::{BeatTask, CronSchedule, TaskQueueSettings};
use super::SettingsReader;

const CACHE_TYPE: &str = "RedisCache";
const CACHE_DEFAULT_TIMEOUT_SECONDS: u32 = 300;
const CACHE_KEY_PREFIX: &str = "superset_";
const RESULTS_KEY_PREFIX: &str = "superset_results";
const TASK_IMPORTS: [&str; 4] = [
    "superset.sql_lab",
    "superset.tasks.scheduler",
    "superset.tasks.thumbnails",
    "superset.tasks.cache",
];

/// Redis connection settings shared by caches, sessions and the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub celery_db: u32,
    pub results_db: u32,
    pub ssl: bool,
}

/// Cache backend configuration shared by the data, filter-state and
/// explore-form-data caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSettings {
    pub cache_type: &'static str,
    pub default_timeout_seconds: u32,
    pub key_prefix: &'static str,
    pub redis_url: String,
}

/// Query results backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsBackendSettings {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: u32,
    pub key_prefix: &'static str,
    pub ssl: bool,
}

impl RedisSettings {
    pub(super) fn from_reader(reader: &SettingsReader<'_>) -> Result<Self, AppError> {
        Ok(Self {
            host: reader.or_default("REDIS_HOST", "redis"),
            port: reader.parse_or("REDIS_PORT", 6379)?,
            user: reader.optional("REDIS_USER").unwrap_or_default(),
            password: reader.optional("REDIS_PASSWORD").unwrap_or_default(),
            celery_db: reader.parse_or("REDIS_CELERY_DB", 0)?,
            results_db: reader.parse_or("REDIS_RESULTS_DB", 1)?,
            ssl: reader.bool_or("REDIS_SSL", true)?,
        })
    }

    /// Returns `rediss` when TLS is enabled and `redis` otherwise.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.ssl { "rediss" } else { "redis" }
    }

    /// Returns the URL of logical database `db`.
    pub fn url(&self, db: u32) -> Result<String, AppError> {
        let invalid = |detail: &str| {
            AppError::Validation(format!(
                "invalid redis settings for host '{}': {detail}",
                self.host
            ))
        };

        let mut url = Url::parse(&format!("{}://{}:{}/{db}", self.scheme(), self.host, self.port))
            .map_err(|error| invalid(&error.to_string()))?;
        if !self.user.is_empty() {
            url.set_username(&self.user)
                .map_err(|()| invalid("user cannot be set"))?;
        }
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| invalid("password cannot be set"))?;
        }

        Ok(url.to_string())
    }

    /// Returns the URL used for this service's own connections. TLS
    /// certificates are not verified.
    pub fn client_url(&self) -> Result<String, AppError> {
        let url = self.url(self.results_db)?;
        Ok(if self.ssl {
            format!("{url}#insecure")
        } else {
            url
        })
    }

    pub fn cache(&self) -> Result<CacheSettings, AppError> {
        Ok(CacheSettings {
            cache_type: CACHE_TYPE,
            default_timeout_seconds: CACHE_DEFAULT_TIMEOUT_SECONDS,
            key_prefix: CACHE_KEY_PREFIX,
            redis_url: self.url(self.results_db)?,
        })
    }

    #[must_use]
    pub fn results_backend(&self) -> ResultsBackendSettings {
        ResultsBackendSettings {
            host: self.host.clone(),
            port: self.port,
            password: self.password.clone(),
            db: self.results_db,
            key_prefix: RESULTS_KEY_PREFIX,
            ssl: true,
        }
    }

    pub fn task_queue(&self) -> Result<TaskQueueSettings, AppError> {
        Ok(TaskQueueSettings {
            broker_url: self.url(self.celery_db)?,
            result_backend: self.url(self.results_db)?,
            verify_certificates: false,
            imports: TASK_IMPORTS.to_vec(),
            worker_prefetch_multiplier: 1,
            task_acks_late: false,
            beat_schedule: vec![
                BeatTask::new("reports.scheduler", CronSchedule::new("*", "*")?),
                BeatTask::new("reports.prune_log", CronSchedule::new("10", "0")?),
            ],
        })
    }

    /// Key prefix of sessions stored alongside the cache.
    #[must_use]
    pub fn session_key_prefix(&self) -> String {
        format!("{CACHE_KEY_PREFIX}session")
    }
}
