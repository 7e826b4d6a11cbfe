use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::tls::{CERT_FILE, KEY_FILE};

/// Ports the server is allowed to listen on.
pub const PORT_RANGE: RangeInclusive<u16> = 1024..=65535;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port {0} is outside {lo}-{hi}", lo = PORT_RANGE.start(), hi = PORT_RANGE.end())]
    PortOutOfRange(u16),
    #[error("backup retention must keep at least one snapshot")]
    ZeroRetention,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root for static files and the `Record/` tree.
    pub base_dir: PathBuf,
    pub tls_enabled: bool,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    /// Backup snapshots kept per collection.
    pub backup_retention: usize,
    /// How many ports after a busy one are tried before giving up.
    pub port_scan_window: u16,
    pub browser_delay: Duration,
    pub open_browser: bool,
    pub check_requirements: bool,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = env::var("BASE_DIR")
            .map(PathBuf::from)
            .or_else(|_| env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", DEFAULT_PORT),
            tls_enabled: env_flag("TLS_ENABLED", false),
            cert_path: env::var("CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| base_dir.join(CERT_FILE)),
            key_path: env::var("KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| base_dir.join(KEY_FILE)),
            backup_retention: env_parse("BACKUP_RETENTION", 2),
            port_scan_window: env_parse("PORT_SCAN_WINDOW", 10),
            browser_delay: Duration::from_secs(env_parse("BROWSER_DELAY_SECS", 2)),
            open_browser: env_flag("OPEN_BROWSER", true),
            check_requirements: env_flag("CHECK_REQUIREMENTS", true),
            base_dir,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.port)?;
        if self.backup_retention == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        Ok(())
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls_enabled {
            "https"
        } else {
            "http"
        }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.base_dir.join("Record")
    }
}

pub fn validate_port(port: u16) -> Result<u16, ConfigError> {
    if PORT_RANGE.contains(&port) {
        Ok(port)
    } else {
        Err(ConfigError::PortOutOfRange(port))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
