//! Settings validation: pool bounds, route prefix, API keys outside test mode.

use crate::config::Settings;
use crate::error::ConfigError;

pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let db = &settings.database;
    if db.max_connections == 0 {
        return Err(ConfigError::Validation("DB_POOL_MAX must be at least 1".into()));
    }
    if db.min_connections > db.max_connections {
        return Err(ConfigError::Validation(format!(
            "DB_POOL_MIN ({}) exceeds DB_POOL_MAX ({})",
            db.min_connections, db.max_connections
        )));
    }
    if db.url.is_empty() {
        return Err(ConfigError::Missing("DATABASE_URL"));
    }
    if !settings.api_url.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "API_URL must start with '/': {}",
            settings.api_url
        )));
    }
    if !settings.testing && settings.api_keys.is_empty() {
        return Err(ConfigError::Validation(
            "API_KEY is required unless API_ENVIRON=test".into(),
        ));
    }
    Ok(())
}
