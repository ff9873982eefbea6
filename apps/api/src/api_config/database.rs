use dashgate_core::AppError;
use serde::Serialize;
use url::Url;

use super::SettingsReader;

/// Connection settings of a SQL database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub dialect: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseSettings {
    pub(super) fn metadata(reader: &SettingsReader<'_>) -> Result<Self, AppError> {
        Ok(Self {
            dialect: reader.required("DATABASE_DIALECT")?,
            user: reader.required("DATABASE_USER")?,
            password: reader.optional("DATABASE_PASSWORD").unwrap_or_default(),
            host: reader.required("DATABASE_HOST")?,
            port: reader.parse_required("DATABASE_PORT")?,
            database: reader.required("DATABASE_DB")?,
        })
    }

    /// Reads the examples database, which shares the metadata dialect.
    ///
    /// The group is optional, but once any variable is set the rest are
    /// required.
    pub(super) fn examples(
        reader: &SettingsReader<'_>,
        dialect: &str,
    ) -> Result<Option<Self>, AppError> {
        const NAMES: [&str; 5] = [
            "EXAMPLES_USER",
            "EXAMPLES_PASSWORD",
            "EXAMPLES_HOST",
            "EXAMPLES_PORT",
            "EXAMPLES_DB",
        ];
        if NAMES.iter().all(|name| reader.optional(name).is_none()) {
            return Ok(None);
        }

        Ok(Some(Self {
            dialect: dialect.to_owned(),
            user: reader.required("EXAMPLES_USER")?,
            password: reader.optional("EXAMPLES_PASSWORD").unwrap_or_default(),
            host: reader.required("EXAMPLES_HOST")?,
            port: reader.parse_required("EXAMPLES_PORT")?,
            database: reader.required("EXAMPLES_DB")?,
        }))
    }

    /// Returns `{dialect}://{user}:{password}@{host}:{port}/{database}` with
    /// percent-encoded credentials.
    pub fn sqlalchemy_uri(&self) -> Result<String, AppError> {
        self.build_url(&self.dialect)
    }

    /// Returns a connection URL for the Postgres driver, dropping any
    /// `+driver` suffix from the dialect.
    pub fn postgres_url(&self) -> Result<String, AppError> {
        let scheme = self
            .dialect
            .split_once('+')
            .map_or(self.dialect.as_str(), |(scheme, _)| scheme);

        if !matches!(scheme, "postgres" | "postgresql") {
            return Err(AppError::Validation(format!(
                "DATABASE_DIALECT '{}' is not a Postgres dialect",
                self.dialect
            )));
        }

        self.build_url(scheme)
    }

    fn build_url(&self, scheme: &str) -> Result<String, AppError> {
        let invalid = |detail: String| {
            AppError::Validation(format!(
                "invalid database settings for host '{}': {detail}",
                self.host
            ))
        };

        let mut url = Url::parse(&format!("{scheme}://{}:{}", self.host, self.port))
            .map_err(|error| invalid(error.to_string()))?;
        url.set_username(&self.user)
            .map_err(|()| invalid("user cannot be set".to_owned()))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| invalid("password cannot be set".to_owned()))?;
        }
        url.set_path(&format!("/{}", self.database));

        Ok(url.to_string())
    }
}
