//! Application configuration parsed once at startup.
//!
//! DESIGN
//! ======
//! `AppConfig` is built in `main` from environment variables (a `.env` file
//! is honored via `dotenvy`) and carried in `AppState`. Nothing here has a
//! compiled-in credential or sender address: mail settings must be supplied
//! by the deployment.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_LOGIN_URL: &str = "/login/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// What to do when the submission notice cannot be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifyFailurePolicy {
    /// Propagate the transport error; the request stays saved and the user
    /// sees a failure page.
    #[default]
    Strict,
    /// Log the transport error and continue to the redirect.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS.
    pub tls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    /// Write messages to the log only.
    Log,
    Smtp(SmtpConfig),
    Resend { api_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Sender address for every outgoing message.
    pub from: String,
    pub transport: MailTransport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub login_url: String,
    pub cookie_secure: bool,
    /// Emails promoted to staff on login.
    pub admin_emails: Vec<String>,
    pub notify_failure: NotifyFailurePolicy,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Build config from the process environment.
    ///
    /// Required: `DATABASE_URL`, `MAIL_FROM`.
    ///
    /// Optional:
    /// - `PORT` (3000), `DB_MAX_CONNECTIONS` (5), `LOGIN_URL` (`/login/`)
    /// - `COOKIE_SECURE` (false), `ADMIN_EMAILS` (comma separated)
    /// - `NOTIFY_FAILURE_POLICY`: `strict` (default) or `best_effort`
    /// - `MAIL_TRANSPORT`: `log` (default), `smtp`, or `resend`
    /// - `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_TLS` (true)
    /// - `RESEND_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or malformed setting.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup: &lookup };

        let database_url = vars.required("DATABASE_URL")?;
        let port = vars.parsed("PORT", DEFAULT_PORT)?;
        let db_max_connections = vars.parsed("DB_MAX_CONNECTIONS", crate::db::DEFAULT_DB_MAX_CONNECTIONS)?;
        let login_url = vars.optional("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_owned());
        let cookie_secure = vars.flag("COOKIE_SECURE", false)?;
        let admin_emails = vars
            .optional("ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();
        let notify_failure = parse_notify_policy(vars.optional("NOTIFY_FAILURE_POLICY").as_deref())?;
        let mail = MailConfig { from: vars.required("MAIL_FROM")?, transport: parse_transport(&vars)? };

        Ok(Self { port, database_url, db_max_connections, login_url, cookie_secure, admin_emails, notify_failure, mail })
    }

    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|admin| admin == email)
    }
}

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing { var: key })
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| ConfigError::Invalid { var: key, reason: format!("{raw:?}: {e}") }),
        }
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::Invalid { var: key, reason: format!("{raw:?} is not a boolean") }),
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(crate::services::email_auth::normalize_email)
        .collect()
}

fn parse_notify_policy(raw: Option<&str>) -> Result<NotifyFailurePolicy, ConfigError> {
    match raw.unwrap_or("strict") {
        "strict" => Ok(NotifyFailurePolicy::Strict),
        "best_effort" => Ok(NotifyFailurePolicy::BestEffort),
        other => Err(ConfigError::Invalid {
            var: "NOTIFY_FAILURE_POLICY",
            reason: format!("{other:?} (expected 'strict' or 'best_effort')"),
        }),
    }
}

fn parse_transport(vars: &Vars<'_>) -> Result<MailTransport, ConfigError> {
    match vars.optional("MAIL_TRANSPORT").as_deref().unwrap_or("log") {
        "log" => Ok(MailTransport::Log),
        "resend" => Ok(MailTransport::Resend { api_key: vars.required("RESEND_API_KEY")? }),
        "smtp" => {
            let username = vars.optional("SMTP_USERNAME");
            let password = vars.optional("SMTP_PASSWORD");
            if username.is_some() != password.is_some() {
                return Err(ConfigError::Invalid {
                    var: "SMTP_USERNAME",
                    reason: "SMTP_USERNAME and SMTP_PASSWORD must be set together".into(),
                });
            }
            Ok(MailTransport::Smtp(SmtpConfig {
                host: vars.required("SMTP_HOST")?,
                port: vars.parsed("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username,
                password,
                tls: vars.flag("SMTP_TLS", true)?,
            }))
        }
        other => Err(ConfigError::Invalid {
            var: "MAIL_TRANSPORT",
            reason: format!("{other:?} (expected 'log', 'smtp' or 'resend')"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
