//! Tracer configuration
//!
//! Options can come from defaults, the builder, environment variables, or a
//! TOML/YAML document. The tag callback is not part of this struct since
//! closures are not serializable; it is registered on the `TracerBuilder`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tracer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// When false the tracer runs every phase without opening spans
    pub enabled: bool,

    /// Service reported on every span
    pub service_name: String,

    /// Prefix of span names, e.g. `graphql` gives `graphql.execute_query`
    pub span_prefix: String,

    /// Resource name used when no operation in a batch is named
    pub fallback_transaction_name: Option<String>,

    /// Log tag policy failures and keep going instead of failing the phase
    pub fail_open_tag_callback: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "graphql".to_string(),
            span_prefix: "graphql".to_string(),
            fallback_transaction_name: None,
            fail_open_tag_callback: false,
        }
    }
}

impl TracerConfig {
    /// Create a new config builder
    pub fn builder() -> TracerConfigBuilder {
        TracerConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    ///
    /// Unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            enabled: lookup("GRAPHQL_TRACE_ENABLED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enabled),
            service_name: lookup("GRAPHQL_TRACE_SERVICE_NAME").unwrap_or(defaults.service_name),
            span_prefix: lookup("GRAPHQL_TRACE_SPAN_PREFIX").unwrap_or(defaults.span_prefix),
            fallback_transaction_name: lookup("GRAPHQL_TRACE_FALLBACK_TRANSACTION_NAME")
                .filter(|v| !v.is_empty()),
            fail_open_tag_callback: lookup("GRAPHQL_TRACE_FAIL_OPEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fail_open_tag_callback),
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("service_name must not be empty".into()));
        }
        if self.span_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("span_prefix must not be empty".into()));
        }
        Ok(())
    }
}

/// Builder for TracerConfig
#[derive(Debug, Default)]
pub struct TracerConfigBuilder {
    config: TracerConfig,
}

impl TracerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    pub fn span_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.span_prefix = prefix.into();
        self
    }

    pub fn fallback_transaction_name(mut self, name: impl Into<String>) -> Self {
        self.config.fallback_transaction_name = Some(name.into());
        self
    }

    pub fn fail_open_tag_callback(mut self, fail_open: bool) -> Self {
        self.config.fail_open_tag_callback = fail_open;
        self
    }

    pub fn build(self) -> Result<TracerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
