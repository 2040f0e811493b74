//! Construction parameters for `PodargosClient`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 2;

const HOST_ENV: &str = "PODARGOS_HOST";
const PORT_ENV: &str = "PODARGOS_PORT";
const KEY_ENV: &str = "PODARGOS_KEY";
const TIMEOUT_ENV: &str = "PODARGOS_TIMEOUT";
const RETRIES_ENV: &str = "PODARGOS_RETRIES";

/// Where the device lives and how hard to try reaching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Access key embedded in every request path.
    pub key: String,

    /// Budget for a single attempt, in seconds. Each retry gets a fresh one.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transport failure or timeout.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl ClientConfig {
    pub fn new(host: &str, port: u16, key: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            key: key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read `PODARGOS_HOST`, `PODARGOS_PORT` and `PODARGOS_KEY`, plus the
    /// optional `PODARGOS_TIMEOUT` and `PODARGOS_RETRIES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let host = required(HOST_ENV)?;
        let port = parse(PORT_ENV, required(PORT_ENV)?)?;
        let key = required(KEY_ENV)?;

        let mut config = Self::new(&host, port, &key);
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout_secs = parse(TIMEOUT_ENV, raw)?;
        }
        if let Some(raw) = lookup(RETRIES_ENV) {
            config.retries = parse(RETRIES_ENV, raw)?;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
