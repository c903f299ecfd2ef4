//! # Gateway Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LENTE_GATEWAY_BASE_URL=https://api.bank.example/cobranca/v2        │
//! │     LENTE_GATEWAY_CLIENT_SECRET=...                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/lente/gateway.toml (Linux)                               │
//! │     ~/Library/Application Support/br.lente.lente/gateway.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sandbox environment, 30 s timeout                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # gateway.toml
//! base_url = "https://sandbox.bank.example/cobranca-bancaria/v2"
//! auth_url = "https://auth.bank.example/token"
//! client_id = "9b5e603e428cc477a2841e2683c92d21"
//! client_secret = "..."
//! cooperative_code = "3069"
//! post_code = "01"
//! beneficiary_code = "123456"
//! environment = "sandbox"
//! timeout_secs = 30
//! ```
//!
//! The cooperative, post and beneficiary codes are only ever read from here;
//! callers can't put their own beneficiary on a boleto.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Prefix for every environment override.
pub const ENV_PREFIX: &str = "LENTE_GATEWAY_";

// =============================================================================
// Environment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl fmt::Display for GatewayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEnvironment::Sandbox => write!(f, "sandbox"),
            GatewayEnvironment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for GatewayEnvironment {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sandbox" | "homologacao" | "test" => Ok(GatewayEnvironment::Sandbox),
            "production" | "producao" | "prod" => Ok(GatewayEnvironment::Production),
            other => Err(GatewayError::invalid_config(format!(
                "Unknown gateway environment: '{}'. Valid options: sandbox, production",
                other
            ))),
        }
    }
}

// =============================================================================
// Gateway Configuration
// =============================================================================

#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the boleto API (without the `/boletos` suffix).
    pub base_url: String,

    /// OAuth token endpoint for the client-credentials exchange.
    #[serde(default)]
    pub auth_url: Option<String>,

    pub client_id: String,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Static access token. When set, no token exchange happens.
    #[serde(default)]
    pub access_token: Option<String>,

    /// OAuth scope requested in the token exchange.
    #[serde(default)]
    pub scope: Option<String>,

    pub cooperative_code: String,
    pub post_code: String,
    pub beneficiary_code: String,

    #[serde(default)]
    pub environment: GatewayEnvironment,

    /// Request timeout (seconds).
    /// Default: 30
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long a static access token is cached before being re-read.
    /// Default: 24 hours
    #[serde(default = "default_static_token_lifetime")]
    pub static_token_lifetime_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

fn default_static_token_lifetime() -> u64 {
    24 * 60 * 60
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("cooperative_code", &self.cooperative_code)
            .field("post_code", &self.post_code)
            .field("beneficiary_code", &self.beneficiary_code)
            .field("environment", &self.environment)
            .field("timeout_secs", &self.timeout_secs)
            .field("static_token_lifetime_secs", &self.static_token_lifetime_secs)
            .finish()
    }
}

impl GatewayConfig {
    /// Loads configuration from file and environment, then validates.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Config file (gateway.toml)
    /// 2. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> GatewayResult<Self> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| GatewayError::invalid_config("No config path available"))?;

        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        info!(environment = %config.environment, "Gateway configuration loaded");
        Ok(config)
    }

    /// Parses a config file without environment overrides.
    pub fn from_file(path: &Path) -> GatewayResult<Self> {
        info!(?path, "Loading gateway config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> GatewayResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `LENTE_GATEWAY_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(url) = var("BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.base_url = url;
        }
        if let Some(url) = var("AUTH_URL") {
            self.auth_url = Some(url);
        }
        if let Some(id) = var("CLIENT_ID") {
            self.client_id = id;
        }
        if let Some(secret) = var("CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(token) = var("ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(scope) = var("SCOPE") {
            self.scope = Some(scope);
        }
        if let Some(code) = var("COOPERATIVE_CODE") {
            self.cooperative_code = code;
        }
        if let Some(code) = var("POST_CODE") {
            self.post_code = code;
        }
        if let Some(code) = var("BENEFICIARY_CODE") {
            self.beneficiary_code = code;
        }
        if let Some(env) = var("ENVIRONMENT") {
            match env.parse() {
                Ok(parsed) => self.environment = parsed,
                Err(_) => warn!(environment = %env, "Unknown gateway environment in environment"),
            }
        }
        if let Some(timeout) = var("TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.timeout_secs = t;
            }
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> GatewayResult<()> {
        validate_http_url("base_url", &self.base_url)?;

        if self.client_id.trim().is_empty() {
            return Err(GatewayError::invalid_config("client_id is required"));
        }

        if self.access_token.is_none() {
            let Some(auth_url) = &self.auth_url else {
                return Err(GatewayError::invalid_config(
                    "auth_url is required when no access_token is configured",
                ));
            };
            validate_http_url("auth_url", auth_url)?;

            if self.client_secret.as_deref().map_or(true, |s| s.is_empty()) {
                return Err(GatewayError::invalid_config(
                    "client_secret is required when no access_token is configured",
                ));
            }
        }

        for (field, value) in [
            ("cooperative_code", &self.cooperative_code),
            ("post_code", &self.post_code),
            ("beneficiary_code", &self.beneficiary_code),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::invalid_config(format!("{field} is required")));
            }
        }

        if self.timeout_secs == 0 {
            return Err(GatewayError::invalid_config(
                "timeout_secs must be greater than 0",
            ));
        }

        if self.environment == GatewayEnvironment::Production && self.base_url.starts_with("http://") {
            return Err(GatewayError::invalid_config(
                "production base_url must use https",
            ));
        }

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("br", "lente", "lente")
            .map(|dirs| dirs.config_dir().join("gateway.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn static_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.static_token_lifetime_secs)
    }

    /// `{base_url}/{path}` without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn validate_http_url(field: &str, value: &str) -> GatewayResult<()> {
    let url = Url::parse(value)
        .map_err(|e| GatewayError::invalid_config(format!("{field} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(GatewayError::invalid_config(format!(
            "{field} must use http or https, got: {other}"
        ))),
    }
}
