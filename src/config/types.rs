//! Runtime settings: environment preset, database pool, route prefix, API keys.

use crate::error::ConfigError;
use axum::http::Method;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment, selected by `API_ENVIRON`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Testing => "test",
            Environment::Production => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Testing),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                key: "API_ENVIRON",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Static API keys: a default plus optional per-method overrides.
#[derive(Clone, Debug, Default)]
pub struct ApiKeys {
    default: Option<String>,
    per_method: HashMap<Method, String>,
}

impl ApiKeys {
    pub fn new(default: impl Into<String>) -> Self {
        ApiKeys {
            default: Some(default.into()),
            per_method: HashMap::new(),
        }
    }

    pub fn with_method(mut self, method: Method, key: impl Into<String>) -> Self {
        self.per_method.insert(method, key.into());
        self
    }

    /// Key a request with this method must present. A per-method key overrides the default.
    pub fn key_for(&self, method: &Method) -> Option<&str> {
        self.per_method
            .get(method)
            .map(String::as_str)
            .or(self.default.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.per_method.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub environment: Environment,
    pub debug: bool,
    /// Test mode: the API-key middleware is not installed.
    pub testing: bool,
    /// Prefix entity routes are nested under, e.g. `/api/v1.0`.
    pub api_url: String,
    pub database: DatabaseSettings,
    pub api_keys: ApiKeys,
    /// Maximum accepted request body in bytes.
    pub body_limit: usize,
}

impl Settings {
    /// Log filter used when `RUST_LOG` is unset. `DEBUG` raises it to debug level.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "crudkit=debug,crudkit_server=debug,tower_http=debug"
        } else {
            "crudkit=info,crudkit_server=info,tower_http=info"
        }
    }
}
