//! Instance connection settings

use std::fmt;
use std::time::Duration;

/// Instance URL or bare instance name
pub const INSTANCE_ENV: &str = "SNOW_INSTANCE";
/// OAuth access token (preferred over basic auth)
pub const ACCESS_TOKEN_ENV: &str = "SNOW_ACCESS_TOKEN";
/// Basic auth user
pub const USERNAME_ENV: &str = "SNOW_USERNAME";
/// Basic auth password
pub const PASSWORD_ENV: &str = "SNOW_PASSWORD";
/// Request timeout in seconds
pub const TIMEOUT_ENV: &str = "SNOW_TIMEOUT_SECS";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic auth
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Connection settings for one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Normalized base URL, no trailing slash
    pub base_url: String,
    /// Authentication
    pub credentials: Credentials,
    /// Per-request timeout
    pub timeout: Duration,
}

impl InstanceConfig {
    /// Create config; the URL is normalized
    #[must_use]
    pub fn new(instance: &str, credentials: Credentials) -> Self {
        Self {
            base_url: normalize_instance_url(instance),
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read settings from the process environment
    ///
    /// # Errors
    /// Returns error if the instance or credentials are missing, or the
    /// timeout is not a positive integer.
    pub fn from_env() -> Result<Self, InstanceConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a key lookup
    ///
    /// Empty values count as unset. A token takes precedence over basic
    /// auth.
    ///
    /// # Errors
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, InstanceConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let instance = get(INSTANCE_ENV).ok_or(InstanceConfigError::MissingInstance)?;

        let credentials = match (get(ACCESS_TOKEN_ENV), get(USERNAME_ENV), get(PASSWORD_ENV)) {
            (Some(token), _, _) => Credentials::Bearer(token),
            (None, Some(username), Some(password)) => Credentials::Basic { username, password },
            _ => return Err(InstanceConfigError::MissingCredentials),
        };

        let timeout = match get(TIMEOUT_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(InstanceConfigError::InvalidTimeout(raw)),
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self::new(&instance, credentials).with_timeout(timeout))
    }
}

/// Instance configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceConfigError {
    /// No instance configured
    #[error("SNOW_INSTANCE is not set")]
    MissingInstance,

    /// Neither token nor user/password configured
    #[error("set SNOW_ACCESS_TOKEN, or both SNOW_USERNAME and SNOW_PASSWORD")]
    MissingCredentials,

    /// Timeout not a positive integer
    #[error("SNOW_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

/// Canonical base URL for an instance
///
/// Adds `https://` when no scheme is given, expands a bare instance name
/// to `<name>.service-now.com` and drops trailing slashes.
#[must_use]
pub fn normalize_instance_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.contains('.') || trimmed.contains(':') {
        format!("https://{trimmed}")
    } else {
        format!("https://{trimmed}.service-now.com")
    };
    with_scheme.trim_end_matches('/').to_string()
}
