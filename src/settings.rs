//! Process settings from environment variables.

use crate::error::ConfigError;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/schemaforge";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
    /// Directory for the audit-only JSON mirror of model definitions.
    pub models_dir: PathBuf,
    pub jwt_secret: String,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            models_dir: lookup("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
            jwt_secret,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = Settings::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.models_dir, PathBuf::from("models"));
        assert_eq!(s.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn missing_secret_and_bad_numbers_are_rejected() {
        assert!(matches!(
            Settings::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        assert!(matches!(
            Settings::from_lookup(lookup(&[("JWT_SECRET", "x"), ("DB_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. })
        ));
    }
}
