//! Configuration types for the WDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main WDNS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WdnsConfig {
    /// Backend API configuration
    pub backend: BackendConfig,

    /// Domains this provider is responsible for
    #[serde(default)]
    pub domain_filter: DomainFilter,

    /// Webhook server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl WdnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.backend.validate()?;
        self.domain_filter.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Backend API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every request path is resolved against
    pub url: String,

    /// Value of the `X-API-Token` header
    pub api_token: String,

    /// Value of the `X-API-Secret` header
    pub api_secret: String,

    /// Verify the backend's TLS certificate
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log mutating requests instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

// Secrets stay out of logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_token", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl BackendConfig {
    /// Create a backend configuration with defaults for the optional fields
    pub fn new(
        url: impl Into<String>,
        api_token: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_token: api_token.into(),
            api_secret: api_secret.into(),
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout_secs(),
            dry_run: false,
        }
    }

    /// Enable or disable TLS verification
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the backend configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Backend URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Backend URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.api_token.is_empty() {
            return Err(crate::Error::config("Backend API token cannot be empty"));
        }
        if self.api_secret.is_empty() {
            return Err(crate::Error::config("Backend API secret cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Backend timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Domains this provider manages
///
/// A name matches when it equals or is a subdomain of an `include` entry
/// (or `include` is empty) and of no `exclude` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl DomainFilter {
    /// Create a filter from include and exclude lists
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        let normalize = |list: Vec<String>| -> Vec<String> {
            list.into_iter()
                .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect()
        };
        Self {
            include: normalize(include),
            exclude: normalize(exclude),
        }
    }

    /// Whether `name` is managed by this provider
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim_end_matches('.').to_ascii_lowercase();
        let covered = |domain: &String| {
            name == *domain
                || name
                    .strip_suffix(domain.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        };

        (self.include.is_empty() || self.include.iter().any(covered))
            && !self.exclude.iter().any(covered)
    }

    /// Validate the filter entries
    pub fn validate(&self) -> Result<(), crate::Error> {
        for domain in self.include.iter().chain(self.exclude.iter()) {
            if domain.split('.').any(str::is_empty) {
                return Err(crate::Error::config(format!(
                    "Domain filter entry has an empty label: '{}'",
                    domain
                )));
            }
        }
        Ok(())
    }
}

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook listens on
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl ServerConfig {
    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.listen
            .parse::<std::net::SocketAddr>()
            .map(|_| ())
            .map_err(|e| crate::Error::config(format!("Invalid listen address '{}': {}", self.listen, e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8888".to_string()
}
