use serde::Deserialize;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::DEFAULT_BATCH_SIZE;
use crate::DEFAULT_BUFFER_SIZE;
use crate::DEFAULT_FLUSH_INTERVAL_MS;
use crate::DEFAULT_HOST;
use crate::DEFAULT_NET_TIMEOUT_MS;
use crate::DEFAULT_PORT;
use crate::DEFAULT_READ_TIMEOUT_MS;
use crate::error::PktfeedError;

pub const CONFIG_ENV: &str = "PKTFEED_CONFIG";
pub const CONFIG_FILE: &str = "pktfeed.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture interface name.
    pub device: Option<String>,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub host: String,
    pub port: u16,
    pub promiscuous: bool,
    pub read_timeout_ms: u64,
    pub buffer_size: usize,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: None,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            promiscuous: true,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout_ms: DEFAULT_NET_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_NET_TIMEOUT_MS,
            log_level: String::from("info"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, PktfeedError> {
        let contents = fs::read_to_string(path)?;
        Config::parse(&contents)
    }
    pub fn parse(contents: &str) -> Result<Config, PktfeedError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
    /// `$PKTFEED_CONFIG` first, then `./pktfeed.yaml`.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(p) = env::var(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() { Some(local) } else { None }
    }
    pub fn validate(&self) -> Result<(), PktfeedError> {
        if self.batch_size == 0 {
            return Err(PktfeedError::InvalidConfig {
                e: String::from("batch_size must be at least 1"),
            });
        }
        if self.flush_interval_ms == 0 {
            return Err(PktfeedError::InvalidConfig {
                e: String::from("flush_interval_ms must be at least 1"),
            });
        }
        let timeouts = [
            ("read_timeout_ms", self.read_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ];
        // a zero socket timeout either blocks forever or fails with InvalidInput
        for (name, value) in timeouts {
            if value == 0 {
                return Err(PktfeedError::InvalidConfig {
                    e: format!("{} must be at least 1", name),
                });
            }
        }
        if self.host.trim().is_empty() {
            return Err(PktfeedError::InvalidConfig {
                e: String::from("host is empty"),
            });
        }
        Ok(())
    }
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
