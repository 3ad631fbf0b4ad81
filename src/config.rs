use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::types::Result;

/// Application configuration, passed explicitly to gateways and views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Gateway endpoint settings
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Directory layout
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// View behaviour
    #[serde(default)]
    pub views: ViewsConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of text
    pub structured_logging: bool,
}

/// Gateway endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Scheme and authority of the web server hosting the gateway
    pub base_url: String,
    /// Path of the CGI endpoint
    pub basecgi: String,
    /// Request timeout in seconds; unset waits forever
    pub timeout_seconds: Option<u64>,
}

/// Directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Search base for list views
    pub basedn: String,
}

/// View behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// How views navigate after add, update and delete
    #[serde(default)]
    pub mutation_policy: MutationPolicy,
}

/// Navigation policy for mutating views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPolicy {
    /// Navigate immediately; the request settles in the background
    #[default]
    Optimistic,
    /// Wait for the gateway to accept the request before navigating
    Confirmed,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            basecgi: "/cgi-bin/".to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            basedn: "dc=example,dc=com".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            general: GeneralConfig::default(),
            gateway: GatewayConfig::default(),
            directory: DirectoryConfig::default(),
            views: ViewsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// `path` overrides `CRANK_CONFIG`; without either, `config/default` and
    /// `config/<CRANK_ENV>` are read if present. Variables prefixed with
    /// `CRANK__` override file values (`CRANK__GATEWAY__BASE_URL`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        use config::{Config as ConfigBuilder, Environment, File};
        use std::env;

        // A missing .env file is not an error
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("general.log_level", defaults.general.log_level.clone())?
            .set_default("general.structured_logging", defaults.general.structured_logging)?
            .set_default("gateway.base_url", defaults.gateway.base_url.clone())?
            .set_default("gateway.basecgi", defaults.gateway.basecgi.clone())?
            .set_default("directory.basedn", defaults.directory.basedn.clone())?
            .set_default("views.mutation_policy", "optimistic")?;

        let explicit = path
            .map(|p| p.display().to_string())
            .or_else(|| env::var("CRANK_CONFIG").ok());

        if let Some(config_path) = explicit {
            debug!("Loading configuration from {}", config_path);
            builder = builder.add_source(File::with_name(&config_path));
        } else {
            builder = builder.add_source(File::with_name("config/default").required(false));

            let env = env::var("CRANK_ENV").unwrap_or_else(|_| "development".into());
            builder = builder.add_source(File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("CRANK").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse YAML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.gateway.base_url.is_empty() {
            return Err(Error::Config("Gateway base URL cannot be empty".into()));
        }

        if !self.gateway.basecgi.starts_with('/') {
            return Err(Error::Config(format!(
                "Gateway basecgi must be an absolute path: {}",
                self.gateway.basecgi
            )));
        }

        if self.directory.basedn.is_empty() {
            return Err(Error::Config("Directory basedn cannot be empty".into()));
        }

        if self.gateway.timeout_seconds == Some(0) {
            return Err(Error::Config("Gateway timeout cannot be zero".into()));
        }

        // Fails early on an unparseable base URL
        self.endpoint()?;

        Ok(())
    }

    /// Full URL of the gateway endpoint
    pub fn endpoint(&self) -> Result<Url> {
        let base = Url::parse(&self.gateway.base_url)?;
        Ok(base.join(&self.gateway.basecgi)?)
    }

    /// Request timeout, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.gateway.timeout_seconds.map(Duration::from_secs)
    }
}
