//! Process-wide gate configuration.
//!
//! Loaded once at start-up and shared read-only (behind `Arc`) by every
//! request afterwards.

use url::Url;

use crate::error::ConfigError;
use crate::psk::TrustedKeys;

/// Environment variable enabling the bypass switch (`"true"` enables).
pub const ENV_BYPASS: &str = "BYPASS_RBAC";
/// Environment variable holding the comma-separated trusted keys.
pub const ENV_PSKS: &str = "SOURCES_PSKS";
/// Environment variable holding the RBAC base URL.
pub const ENV_RBAC_URL: &str = "RBAC_URL";
/// Environment variable overriding the application name sent to RBAC.
pub const ENV_RBAC_APPLICATION: &str = "RBAC_APPLICATION";

/// Application name this service identifies itself as to RBAC.
pub const DEFAULT_RBAC_APPLICATION: &str = "sources";

/// Gate configuration.
///
/// # Examples
///
/// ```
/// use sources_authz::{AuthzConfig, TrustedKeys};
///
/// let config = AuthzConfig::new()
///     .with_trusted_keys(TrustedKeys::from_csv("abc,xyz"))
///     .with_rbac_url("http://rbac:8080/api/rbac/v1")
///     .unwrap();
///
/// assert!(!config.bypass());
/// assert_eq!(config.rbac_application(), "sources");
/// ```
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    bypass: bool,
    trusted_keys: TrustedKeys,
    rbac_url: Option<Url>,
    rbac_application: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            bypass: false,
            trusted_keys: TrustedKeys::new(),
            rbac_url: None,
            rbac_application: DEFAULT_RBAC_APPLICATION.to_string(),
        }
    }
}

impl AuthzConfig {
    /// Creates a configuration with every check enabled and no trusted keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRbacUrl`] when the URL does not parse.
    /// An unset `RBAC_URL` is not an error: the gate then has no RBAC client
    /// and user principals fail with [`RbacError::NotConfigured`].
    ///
    /// [`RbacError::NotConfigured`]: crate::RbacError::NotConfigured
    ///
    /// # Examples
    ///
    /// ```
    /// use sources_authz::AuthzConfig;
    ///
    /// let config = AuthzConfig::from_lookup(|key| match key {
    ///     "BYPASS_RBAC" => Some("true".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert!(config.bypass());
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bypass = lookup(ENV_BYPASS).is_some_and(|v| v.trim() == "true");
        let trusted_keys = lookup(ENV_PSKS)
            .map(|raw| TrustedKeys::from_csv(&raw))
            .unwrap_or_default();

        let mut config = Self::new()
            .with_bypass(bypass)
            .with_trusted_keys(trusted_keys);

        if let Some(app) = lookup(ENV_RBAC_APPLICATION).filter(|a| !a.trim().is_empty()) {
            config.rbac_application = app.trim().to_string();
        }

        match lookup(ENV_RBAC_URL).filter(|u| !u.trim().is_empty()) {
            Some(raw) => config = config.with_rbac_url(raw.trim())?,
            None if !bypass => {
                tracing::warn!("RBAC_URL not set, user principals cannot be authorized");
            }
            None => {}
        }

        tracing::debug!(
            bypass = config.bypass,
            trusted_keys = config.trusted_keys.len(),
            rbac_application = %config.rbac_application,
            "authorization config loaded"
        );

        Ok(config)
    }

    /// Enables or disables the bypass switch.
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// Replaces the trusted key set.
    pub fn with_trusted_keys(mut self, keys: TrustedKeys) -> Self {
        self.trusted_keys = keys;
        self
    }

    /// Sets the RBAC base URL (e.g. `http://rbac:8080/api/rbac/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRbacUrl`] if `url` does not parse.
    pub fn with_rbac_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|source| ConfigError::InvalidRbacUrl {
            url: url.to_string(),
            source,
        })?;
        self.rbac_url = Some(parsed);
        Ok(self)
    }

    /// Sets the application name sent to RBAC.
    pub fn with_rbac_application(mut self, application: impl Into<String>) -> Self {
        self.rbac_application = application.into();
        self
    }

    /// Whether all checks are disabled.
    pub fn bypass(&self) -> bool {
        self.bypass
    }

    /// The trusted pre-shared keys.
    pub fn trusted_keys(&self) -> &TrustedKeys {
        &self.trusted_keys
    }

    /// The RBAC base URL, if configured.
    pub fn rbac_url(&self) -> Option<&Url> {
        self.rbac_url.as_ref()
    }

    /// Application name sent to RBAC.
    pub fn rbac_application(&self) -> &str {
        &self.rbac_application
    }
}
