//! Configuration management for the Uniform Allocation client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with UOPS_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::Locale;

/// Default port of the allocation API
pub const DEFAULT_API_PORT: u16 = 8000;

/// Address under which an Android emulator reaches the host loopback
const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

/// Main client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// API endpoint configuration
    pub api: ApiConfig,

    /// Job polling configuration
    pub polling: PollingConfig,

    /// Initial UI language
    pub locale: Locale,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Explicit base URL; wins over platform discovery when set
    pub base_url: Option<String>,

    /// API port used by platform discovery
    pub port: u16,

    /// Runtime platform of the client
    pub platform: Platform,

    /// Dev server host URI (`host:port`) reported by the bundler
    pub host_uri: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Delay before the first status poll
    pub initial_delay_ms: u64,

    /// Delay between subsequent polls
    pub interval_ms: u64,
}

/// Platform the client runs on
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Ios,
    Android,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("UOPS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("api.port", i64::from(DEFAULT_API_PORT))?
            .set_default("api.platform", "web")?
            .set_default("api.timeout_secs", 30)?
            .set_default("polling.initial_delay_ms", 1000)?
            .set_default("polling.interval_ms", 2000)?
            .set_default("locale", "es")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (UOPS_ prefix)
            .add_source(
                Environment::with_prefix("UOPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolver for the configured target
    pub fn resolver(&self) -> Box<dyn BaseUrlResolver> {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => Box::new(StaticBaseUrl::new(url.clone())),
            _ => Box::new(PlatformBaseUrl {
                platform: self.platform,
                host_uri: self.host_uri.clone(),
                port: self.port,
            }),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            port: DEFAULT_API_PORT,
            platform: Platform::Web,
            host_uri: None,
            timeout_secs: 30,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            interval_ms: 2000,
        }
    }
}

/// Source of the API base URL
pub trait BaseUrlResolver: Send + Sync {
    fn base_url(&self) -> String;
}

/// A fixed base URL
#[derive(Debug, Clone)]
pub struct StaticBaseUrl(String);

impl StaticBaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into().trim_end_matches('/').to_string())
    }
}

impl BaseUrlResolver for StaticBaseUrl {
    fn base_url(&self) -> String {
        self.0.clone()
    }
}

/// Base URL derived from the platform and the dev host
///
/// Web targets use loopback. Native targets use the host part of the dev
/// server URI; without one, Android falls back to the emulator alias for the
/// host machine and everything else to loopback.
#[derive(Debug, Clone)]
pub struct PlatformBaseUrl {
    pub platform: Platform,
    pub host_uri: Option<String>,
    pub port: u16,
}

impl PlatformBaseUrl {
    fn dev_host(&self) -> Option<&str> {
        let uri = self.host_uri.as_deref()?.trim();
        let uri = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
        let host = uri.split(':').next().unwrap_or_default();
        let host = host.split('/').next().unwrap_or_default();
        if host.is_empty() || host == "localhost" {
            None
        } else {
            Some(host)
        }
    }
}

impl BaseUrlResolver for PlatformBaseUrl {
    fn base_url(&self) -> String {
        if self.platform == Platform::Web {
            return format!("http://localhost:{}", self.port);
        }

        match self.dev_host() {
            Some(host) => format!("http://{}:{}", host, self.port),
            None if self.platform == Platform::Android => {
                format!("http://{}:{}", ANDROID_EMULATOR_HOST, self.port)
            }
            None => format!("http://localhost:{}", self.port),
        }
    }
}
