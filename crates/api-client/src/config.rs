//! Configuration for the MES Office API client
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables, with sensible defaults for a local API instance.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default API base URL (local development instance)
const DEFAULT_BASE_URL: &str = "https://localhost:7272";

/// Identity the seeding service authenticates as
const DEFAULT_SEEDING_USER_ID: &str = "SEEDING_SERVICE";

/// Display name sent with every token request
const DEFAULT_SEEDING_USER_NAME: &str = "API Client Service";

/// Prefix marking records created by seeding/test runs
const DEFAULT_TEST_DATA_PREFIX: &str = "APITEST_";

/// Config files looked up when no explicit path is given
const CONFIG_CANDIDATES: [&str; 3] = [".mes-api.toml", "mes-api.toml", ".config/mes-api.toml"];

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the MES Office API
    pub base_url: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Attach bearer tokens to outgoing requests
    pub enable_authentication: bool,
    /// Token acquisition settings
    pub auth: AuthConfig,
    /// Prefix identifying seeded test records
    pub test_data_prefix: String,
}

/// Service identity and token cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// User id the token is requested for
    pub seeding_user_id: String,
    /// User name sent alongside the id
    pub seeding_user_name: String,
    /// Roles requested for the token
    pub seeding_roles: Vec<String>,
    /// Company used when a request does not carry `X-Company-Id`
    pub default_company_id: Option<i64>,
    /// How long before expiry a cached token is considered stale
    #[serde(with = "duration_secs")]
    pub token_refresh_buffer: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            enable_authentication: true,
            auth: AuthConfig::default(),
            test_data_prefix: DEFAULT_TEST_DATA_PREFIX.to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            seeding_user_id: DEFAULT_SEEDING_USER_ID.to_string(),
            seeding_user_name: DEFAULT_SEEDING_USER_NAME.to_string(),
            seeding_roles: vec!["SYSDEV".to_string()],
            default_company_id: None,
            token_refresh_buffer: Duration::from_secs(5 * 60),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `MES_API_URL`: Base URL of the API
    /// - `MES_TIMEOUT_SECS`: Request timeout in seconds
    /// - `MES_AUTH_ENABLED`: `false`/`0` disables bearer authentication
    /// - `MES_SEEDING_USER_ID`: Service identity for token requests
    /// - `MES_SEEDING_ROLES`: Comma-separated role list
    /// - `MES_DEFAULT_COMPANY_ID`: Default tenant for token requests
    /// - `MES_TOKEN_REFRESH_BUFFER_SECS`: Proactive refresh window
    /// - `MES_TEST_DATA_PREFIX`: Prefix of seeded test records
    pub fn from_env() -> ApiResult<Self> {
        Self::default().with_overrides(|name| env::var(name).ok())
    }

    /// Load configuration from a TOML file, then apply environment overrides
    ///
    /// Without an explicit path the standard locations are searched; if none
    /// exists the defaults are used.
    pub fn load(path: Option<&Path>) -> ApiResult<Self> {
        let found = path
            .map(Path::to_path_buf)
            .or_else(|| {
                CONFIG_CANDIDATES
                    .iter()
                    .map(Path::new)
                    .find(|p| p.exists())
                    .map(Path::to_path_buf)
            });

        let base = match found {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };

        base.with_overrides(|name| env::var(name).ok())
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content).map_err(|e| {
            ApiError::config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        if let Some(url) = lookup("MES_API_URL") {
            self.base_url = url;
        }

        if let Some(raw) = lookup("MES_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ApiError::invalid_env("MES_TIMEOUT_SECS", &raw))?;
            self.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("MES_AUTH_ENABLED") {
            self.enable_authentication = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ApiError::invalid_env("MES_AUTH_ENABLED", raw)),
            };
        }

        if let Some(user_id) = lookup("MES_SEEDING_USER_ID") {
            self.auth.seeding_user_id = user_id;
        }

        if let Some(raw) = lookup("MES_SEEDING_ROLES") {
            self.auth.seeding_roles = raw
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(raw) = lookup("MES_DEFAULT_COMPANY_ID") {
            let trimmed = raw.trim();
            self.auth.default_company_id = if trimmed.is_empty() {
                None
            } else {
                Some(
                    trimmed
                        .parse()
                        .map_err(|_| ApiError::invalid_env("MES_DEFAULT_COMPANY_ID", &raw))?,
                )
            };
        }

        if let Some(raw) = lookup("MES_TOKEN_REFRESH_BUFFER_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ApiError::invalid_env("MES_TOKEN_REFRESH_BUFFER_SECS", &raw))?;
            self.auth.token_refresh_buffer = Duration::from_secs(secs);
        }

        if let Some(prefix) = lookup("MES_TEST_DATA_PREFIX") {
            self.test_data_prefix = prefix;
        }

        Ok(self)
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to enable or disable authentication
    #[must_use]
    pub fn with_authentication(mut self, enabled: bool) -> Self {
        self.enable_authentication = enabled;
        self
    }

    /// Builder-style method to set the default company
    #[must_use]
    pub fn with_default_company_id(mut self, company_id: Option<i64>) -> Self {
        self.auth.default_company_id = company_id;
        self
    }

    /// Builder-style method to set the service identity
    #[must_use]
    pub fn with_seeding_identity(
        mut self,
        user_id: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.auth.seeding_user_id = user_id.into();
        self.auth.seeding_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style method to set the token refresh buffer
    #[must_use]
    pub fn with_token_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.auth.token_refresh_buffer = buffer;
        self
    }

    /// Builder-style method to set the test data prefix
    #[must_use]
    pub fn with_test_data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.test_data_prefix = prefix.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.enable_authentication && self.auth.seeding_user_id.trim().is_empty() {
            return Err(ApiError::config("auth.seeding_user_id cannot be empty"));
        }

        Ok(())
    }
}
