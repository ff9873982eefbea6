use serde::Serialize;

use super::SettingsReader;

const DEFAULT_MAIL_FROM: &str = "partners@crfusa.com";
const DEFAULT_SUBJECT_PREFIX: &str = "[Superset] ";
/// Public address used in report email links.
const DEFAULT_USER_FRIENDLY_BASEURL: &str = "https://superset.crfusa.com/";

/// Outgoing mail settings for alert and report delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub starttls: bool,
    pub ssl: bool,
    pub ssl_server_auth: bool,
    pub user: String,
    pub password: String,
    pub mail_from: String,
    pub subject_prefix: String,
}

impl SmtpSettings {
    pub(super) fn from_reader(reader: &SettingsReader<'_>) -> Self {
        Self {
            host: reader.or_default("SMTP_HOST", "smtp.sendgrid.net"),
            port: 587,
            starttls: true,
            ssl: false,
            ssl_server_auth: false,
            user: reader.or_default("SMTP_USER", "apikey"),
            password: reader.optional("SMTP_PASSWORD").unwrap_or_default(),
            mail_from: reader.or_default("SMTP_MAIL_FROM", DEFAULT_MAIL_FROM),
            subject_prefix: reader
                .optional("EMAIL_REPORTS_SUBJECT_PREFIX")
                .unwrap_or_else(|| DEFAULT_SUBJECT_PREFIX.to_owned()),
        }
    }
}

/// Number of trusted reverse proxies per forwarded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProxyFixSettings {
    pub x_for: usize,
    pub x_proto: usize,
    pub x_host: usize,
    pub x_port: usize,
    pub x_prefix: usize,
}

impl Default for ProxyFixSettings {
    fn default() -> Self {
        Self {
            x_for: 1,
            x_proto: 1,
            x_host: 1,
            x_port: 0,
            x_prefix: 1,
        }
    }
}

/// Web server, embedding and headless-browser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebSettings {
    pub hostname: String,
    pub webdriver_type: &'static str,
    pub webdriver_baseurl: String,
    pub webdriver_baseurl_user_friendly: String,
    pub screenshot_locate_wait_seconds: u32,
    pub screenshot_load_wait_seconds: u32,
    pub sqllab_ctas_no_limit: bool,
    pub mapbox_api_key: String,
    pub feature_flags: Vec<&'static str>,
    pub x_frame_options: &'static str,
    pub cors_supports_credentials: bool,
    pub proxy_fix: ProxyFixSettings,
}

impl WebSettings {
    pub(super) fn from_reader(reader: &SettingsReader<'_>) -> Self {
        let hostname = reader.or_default("CONTAINER_APP_HOSTNAME", "localhost");
        let webdriver_baseurl = format!("https://{hostname}/");

        Self {
            webdriver_type: "firefox",
            webdriver_baseurl_user_friendly: reader
                .optional("WEBDRIVER_BASEURL_USER_FRIENDLY")
                .unwrap_or_else(|| DEFAULT_USER_FRIENDLY_BASEURL.to_owned()),
            webdriver_baseurl,
            hostname,
            screenshot_locate_wait_seconds: 300,
            screenshot_load_wait_seconds: 600,
            sqllab_ctas_no_limit: true,
            mapbox_api_key: reader.optional("MAPBOX_API_KEY").unwrap_or_default(),
            feature_flags: vec!["ALERT_REPORTS", "EMBEDDED_SUPERSET", "DASHBOARD_RBAC"],
            x_frame_options: "ALLOWALL",
            cors_supports_credentials: true,
            proxy_fix: ProxyFixSettings::default(),
        }
    }
}
