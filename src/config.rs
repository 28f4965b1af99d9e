//! Environment-driven configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::metadata::FetchConfig;
use crate::utils::default_database_path;

pub const DB_PATH_VAR: &str = "VAULT_DB_PATH";
pub const FETCH_TIMEOUT_VAR: &str = "VAULT_FETCH_TIMEOUT_SECS";
pub const USER_AGENT_VAR: &str = "VAULT_USER_AGENT";

/// Runtime settings for the vault binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub fetch: FetchConfig,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `VAULT_DB_PATH` (path, default `{data_dir}/vault/vault.db`)
    /// - `VAULT_FETCH_TIMEOUT_SECS` (whole seconds, default 10): overall
    ///   budget for one metadata retrieval
    /// - `VAULT_USER_AGENT` (default `Mozilla/5.0 (compatible; Vault/1.0)`)
    ///
    /// Unset or blank variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is not a non-negative integer, or if
    /// no default data directory can be determined.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match var(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let mut fetch = FetchConfig::default();
        if let Some(raw) = var(FETCH_TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{FETCH_TIMEOUT_VAR} must be whole seconds, got {raw:?}"))?;
            fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = var(USER_AGENT_VAR) {
            fetch.user_agent = agent;
        }

        Ok(Self { db_path, fetch })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;
    use crate::metadata::{DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert!(config.db_path.ends_with("vault/vault.db"));
        assert_eq!(config.fetch.timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/custom.db"),
            (FETCH_TIMEOUT_VAR, " 3 "),
            (USER_AGENT_VAR, "TestAgent/2.0"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.fetch.timeout, Duration::from_secs(3));
        assert_eq!(config.fetch.user_agent, "TestAgent/2.0");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[(FETCH_TIMEOUT_VAR, "  ")])).unwrap();
        assert_eq!(config.fetch.timeout, DEFAULT_FETCH_TIMEOUT);
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let err = Config::from_lookup(lookup(&[(FETCH_TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(err.to_string().contains(FETCH_TIMEOUT_VAR));

        assert!(Config::from_lookup(lookup(&[(FETCH_TIMEOUT_VAR, "-1")])).is_err());
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        unsafe {
            std::env::set_var(DB_PATH_VAR, "/tmp/from-env.db");
            std::env::set_var(FETCH_TIMEOUT_VAR, "7");
        }

        let config = Config::from_env();

        unsafe {
            std::env::remove_var(DB_PATH_VAR);
            std::env::remove_var(FETCH_TIMEOUT_VAR);
        }

        let config = config.unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/from-env.db"));
        assert_eq!(config.fetch.timeout, Duration::from_secs(7));
    }

    #[test]
    #[serial]
    fn from_env_rejects_invalid_timeout() {
        unsafe {
            std::env::set_var(FETCH_TIMEOUT_VAR, "ten");
        }

        let result = Config::from_env();

        unsafe {
            std::env::remove_var(FETCH_TIMEOUT_VAR);
        }

        assert!(result.is_err());
    }
}
