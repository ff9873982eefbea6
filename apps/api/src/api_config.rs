use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use dashgate_application::{AuthSettings, AuthType};
use dashgate_core::AppError;
use dashgate_domain::{RoleMapping, RoleName};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod database;
mod oauth;
mod redis;
mod reporting;
mod tasks;

pub use database::DatabaseSettings;
pub use oauth::{AzureEndpoints, AzureOAuthSettings};
pub use redis::{CacheSettings, RedisSettings, ResultsBackendSettings};
pub use reporting::{ProxyFixSettings, SmtpSettings, WebSettings};
pub use tasks::{BeatTask, CronSchedule, TaskQueueSettings};

const DEFAULT_ROLES_MAPPING: &str =
    r#"{"User":["Gamma","Alpha"],"Admin":["Admin"],"Gamma":["Gamma"],"Partner":["Partner"]}"#;
const REDACTED: &str = "***";

/// Subcommand selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    /// Run the HTTP server.
    Serve,
    /// Apply database migrations and exit.
    Migrate,
    /// Print the resolved settings and exit.
    PrintConfig,
}

impl ApiCommand {
    /// Parses the first command-line argument.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, AppError> {
        match arg {
            None | Some("serve") => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("config") => Ok(Self::PrintConfig),
            Some(other) => Err(AppError::Validation(format!(
                "unknown command '{other}', expected 'serve', 'migrate' or 'config'"
            ))),
        }
    }
}

/// Authentication settings as configured for the deployment.
#[derive(Debug, Clone, Serialize)]
pub struct AuthConfig {
    pub auth_type: &'static str,
    pub user_registration: bool,
    pub registration_role: Option<RoleName>,
    pub roles_sync_at_login: bool,
    pub roles_mapping: RoleMapping,
    pub guest_role: Option<RoleName>,
    pub oauth: Option<AzureOAuthSettings>,
}

impl AuthConfig {
    /// Returns the settings consumed by the sign-in services.
    #[must_use]
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            auth_type: AuthType::from_setting(self.auth_type),
            user_registration: self.user_registration,
            registration_role: self.registration_role.clone(),
            roles_mapping: self.roles_mapping.clone(),
            roles_sync_at_login: self.roles_sync_at_login,
        }
    }

    /// Returns every role name the settings refer to.
    #[must_use]
    pub fn referenced_roles(&self) -> std::collections::BTreeSet<RoleName> {
        self.roles_mapping
            .iter()
            .flat_map(|(_, roles)| roles.iter().cloned())
            .chain(self.registration_role.iter().cloned())
            .chain(self.guest_role.iter().cloned())
            .collect()
    }
}

/// Deployment settings resolved once at process start.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub metadata_database: DatabaseSettings,
    pub examples_database: Option<DatabaseSettings>,
    pub redis: RedisSettings,
    pub auth: AuthConfig,
    pub smtp: SmtpSettings,
    pub web: WebSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let reader = SettingsReader::new(&lookup);

        let metadata_database = DatabaseSettings::metadata(&reader)?;
        let examples_database = DatabaseSettings::examples(&reader, &metadata_database.dialect)?;
        let redis = RedisSettings::from_reader(&reader)?;

        let auth_type = AuthType::from_setting(&reader.or_default("AUTH_TYPE_NAME", "AUTH_DB"));
        let oauth = match auth_type {
            AuthType::OAuth => Some(AzureOAuthSettings::from_reader(&reader)?),
            AuthType::Database => None,
        };
        let roles_mapping = RoleMapping::from_json(
            &reader.or_default("AUTH_ROLES_MAPPING", DEFAULT_ROLES_MAPPING),
        )
        .map_err(|error| AppError::Validation(format!("invalid AUTH_ROLES_MAPPING: {error}")))?;
        let auth = AuthConfig {
            auth_type: auth_type.as_setting(),
            user_registration: reader.bool_or("AUTH_USER_REGISTRATION", true)?,
            registration_role: reader.role_or("AUTH_USER_REGISTRATION_ROLE", "Partner")?,
            roles_sync_at_login: reader.bool_or("AUTH_ROLES_SYNC_AT_LOGIN", true)?,
            roles_mapping,
            guest_role: reader.role_or("GUEST_ROLE_NAME", "Partner")?,
            oauth,
        };

        Ok(Self {
            api_host: reader.or_default("API_HOST", "127.0.0.1"),
            api_port: reader.parse_or("API_PORT", 8088)?,
            cookie_secure: reader.bool_or("SESSION_COOKIE_SECURE", false)?,
            metadata_database,
            examples_database,
            redis,
            auth,
            smtp: SmtpSettings::from_reader(&reader),
            web: WebSettings::from_reader(&reader),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Renders the settings and every derived value as JSON with secrets
    /// replaced by `***`.
    pub fn render_redacted(&self) -> Result<String, AppError> {
        let rendered = RenderedConfig {
            settings: self,
            sqlalchemy_database_uri: self.metadata_database.sqlalchemy_uri()?,
            sqlalchemy_examples_uri: self
                .examples_database
                .as_ref()
                .map(DatabaseSettings::sqlalchemy_uri)
                .transpose()?,
            cache: self.redis.cache()?,
            results_backend: self.redis.results_backend(),
            task_queue: self.redis.task_queue()?,
            oauth_endpoints: self.auth.oauth.as_ref().map(AzureOAuthSettings::endpoints),
        };

        let mut value = serde_json::to_value(&rendered)
            .map_err(|error| AppError::Internal(format!("failed to render settings: {error}")))?;
        redact(&mut value);

        serde_json::to_string_pretty(&value)
            .map_err(|error| AppError::Internal(format!("failed to render settings: {error}")))
    }
}

#[derive(Serialize)]
struct RenderedConfig<'a> {
    #[serde(flatten)]
    settings: &'a ApiConfig,
    sqlalchemy_database_uri: String,
    sqlalchemy_examples_uri: Option<String>,
    cache: CacheSettings,
    results_backend: ResultsBackendSettings,
    task_queue: TaskQueueSettings,
    oauth_endpoints: Option<AzureEndpoints>,
}

/// Replaces secret values and URL passwords in a rendered settings tree.
fn redact(value: &mut Value) {
    match value {
        Value::Object(entries) => {
            for (key, entry) in entries.iter_mut() {
                if is_secret_key(key) {
                    if let Value::String(secret) = entry
                        && !secret.is_empty()
                    {
                        *secret = REDACTED.to_owned();
                    }
                } else {
                    redact(entry);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        Value::String(text) => {
            if let Some(redacted) = redact_url_password(text) {
                *text = redacted;
            }
        }
        _ => {}
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("password") || key.contains("secret") || key.ends_with("api_key")
}

fn redact_url_password(text: &str) -> Option<String> {
    let mut url = url::Url::parse(text).ok()?;
    if url.password().is_none_or(str::is_empty) {
        return None;
    }
    url.set_password(Some(REDACTED)).ok()?;
    Some(url.to_string())
}

/// Typed access to settings through a lookup closure.
pub(crate) struct SettingsReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> SettingsReader<'a> {
    fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    pub(crate) fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    pub(crate) fn required(&self, name: &str) -> Result<String, AppError> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    pub(crate) fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }

    pub(crate) fn parse_or<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
            })
            .transpose()
            .map(|value| value.unwrap_or(default))
    }

    pub(crate) fn parse_required<T>(&self, name: &str) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.required(name)?
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
    }

    pub(crate) fn bool_or(&self, name: &str, default: bool) -> Result<bool, AppError> {
        match self.optional(name) {
            None => Ok(default),
            Some(value) if value.trim().eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.trim().eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(AppError::Validation(format!(
                "{name} must be 'true' or 'false', got '{value}'"
            ))),
        }
    }

    fn role_or(&self, name: &str, default: &str) -> Result<Option<RoleName>, AppError> {
        RoleName::new(self.or_default(name, default))
            .map(Some)
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
