//! Configuration for the webhook registry

use crate::{Result, WebhookError};
use http::Method;
use std::time::Duration;

/// Prefix for environment variables read by [`WebhookConfig::from_env`]
pub const ENV_PREFIX: &str = "HOOK";

/// Configuration for verification and delivery requests
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Per-call timeout for verification and notification requests
    pub timeout: Duration,

    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// HTTP method used to deliver notifications
    pub notification_method: Method,

    /// Largest response body read from an endpoint, in bytes
    pub max_response_size: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            user_agent: format!("ironhook/{}", env!("CARGO_PKG_VERSION")),
            notification_method: Method::GET,
            max_response_size: crate::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl WebhookConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> WebhookConfigBuilder {
        WebhookConfigBuilder::new()
    }

    /// Load configuration from `HOOK_*` environment variables.
    ///
    /// - `HOOK_TIMEOUT_SECS`
    /// - `HOOK_USER_AGENT`
    /// - `HOOK_NOTIFICATION_METHOD`
    /// - `HOOK_MAX_RESPONSE_BYTES`
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(format!("{}_{}", ENV_PREFIX, key)).ok())
    }

    /// Load configuration through a key lookup. Keys are passed without the
    /// `HOOK_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = WebhookConfigBuilder::new();

        if let Some(raw) = lookup("TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                WebhookError::Config(format!("{}_TIMEOUT_SECS={:?}: {}", ENV_PREFIX, raw, e))
            })?;
            builder = builder.timeout_secs(secs);
        }

        if let Some(agent) = lookup("USER_AGENT") {
            builder = builder.user_agent(agent);
        }

        if let Some(raw) = lookup("NOTIFICATION_METHOD") {
            let method = Method::from_bytes(raw.trim().to_uppercase().as_bytes()).map_err(|e| {
                WebhookError::Config(format!(
                    "{}_NOTIFICATION_METHOD={:?}: {}",
                    ENV_PREFIX, raw, e
                ))
            })?;
            builder = builder.notification_method(method);
        }

        if let Some(raw) = lookup("MAX_RESPONSE_BYTES") {
            let size = raw.trim().parse::<usize>().map_err(|e| {
                WebhookError::Config(format!("{}_MAX_RESPONSE_BYTES={:?}: {}", ENV_PREFIX, raw, e))
            })?;
            builder = builder.max_response_size(size);
        }

        Ok(builder.build())
    }
}

/// Builder for WebhookConfig
#[derive(Debug, Clone, Default)]
pub struct WebhookConfigBuilder {
    config: WebhookConfig,
}

impl WebhookConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: WebhookConfig::default(),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the HTTP method for notification delivery
    pub fn notification_method(mut self, method: Method) -> Self {
        self.config.notification_method = method;
        self
    }

    /// Set the maximum response body size
    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    /// Build the configuration
    pub fn build(self) -> WebhookConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.notification_method, Method::GET);
        assert!(config.user_agent.starts_with("ironhook/"));
        assert_eq!(config.max_response_size, 1024 * 1024);
    }

    #[test]
    fn test_builder() {
        let config = WebhookConfig::builder()
            .timeout_secs(10)
            .user_agent("custom")
            .notification_method(Method::POST)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.user_agent, "custom");
        assert_eq!(config.notification_method, Method::POST);
    }

    #[test]
    fn test_from_lookup_empty_keeps_defaults() {
        let config = WebhookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.notification_method, Method::GET);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = WebhookConfig::from_lookup(lookup(&[
            ("TIMEOUT_SECS", "7"),
            ("USER_AGENT", "hooks-test"),
            ("NOTIFICATION_METHOD", "post"),
            ("MAX_RESPONSE_BYTES", "4096"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.user_agent, "hooks-test");
        assert_eq!(config.notification_method, Method::POST);
        assert_eq!(config.max_response_size, 4096);
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = WebhookConfig::from_lookup(lookup(&[("TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, WebhookError::Config(_)));
        assert!(err.to_string().contains("HOOK_TIMEOUT_SECS"));
    }

    #[test]
    fn test_from_lookup_bad_method() {
        let err =
            WebhookConfig::from_lookup(lookup(&[("NOTIFICATION_METHOD", "NOT A METHOD")]))
                .unwrap_err();
        assert!(matches!(err, WebhookError::Config(_)));
    }
}
