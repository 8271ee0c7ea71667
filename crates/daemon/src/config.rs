//! Daemon configuration from `FUTON_*` environment variables

use anyhow::{Context, Result};
use futon_api_rpc::RpcServerConfig;
use futon_core::application::constants::DEFAULT_SWEEP_INTERVAL;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.futon/futon.db";
const DEFAULT_PICKUP_GRACE_MINUTES: i64 = 30;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Production: JSON structured logging
    Json,
    /// Development: pretty formatting with colors
    Pretty,
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rotated JSON log files are written here when set
    pub dir: Option<PathBuf>,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc: RpcServerConfig,
    /// `None` disables the in-process sweep trigger
    pub sweep_interval: Option<Duration>,
    pub pickup_grace_minutes: i64,
    pub reconcile_api_key: Option<String>,
    pub webhook_url: Option<String>,
    pub log: LogConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = RpcServerConfig::default();

        let db_path = get("FUTON_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = shellexpand::tilde(&db_path).into_owned();

        let rpc = RpcServerConfig {
            host: get("FUTON_RPC_HOST").unwrap_or(defaults.host),
            port: parse_or(get("FUTON_RPC_PORT"), "FUTON_RPC_PORT", defaults.port)?,
        };

        let interval_secs = parse_or(
            get("FUTON_SWEEP_INTERVAL_SECS"),
            "FUTON_SWEEP_INTERVAL_SECS",
            DEFAULT_SWEEP_INTERVAL.as_secs(),
        )?;
        let sweep_interval = (interval_secs > 0).then(|| Duration::from_secs(interval_secs));

        let pickup_grace_minutes = parse_or(
            get("FUTON_PICKUP_GRACE_MINUTES"),
            "FUTON_PICKUP_GRACE_MINUTES",
            DEFAULT_PICKUP_GRACE_MINUTES,
        )?;
        if pickup_grace_minutes < 0 {
            anyhow::bail!("FUTON_PICKUP_GRACE_MINUTES must not be negative");
        }

        let format = match get("FUTON_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            db_path,
            rpc,
            sweep_interval,
            pickup_grace_minutes,
            reconcile_api_key: get("FUTON_RECONCILE_API_KEY"),
            webhook_url: get("FUTON_NOTIFY_WEBHOOK_URL"),
            log: LogConfig {
                format,
                dir: get("FUTON_LOG_DIR")
                    .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned())),
            },
        })
    }

    pub fn pickup_grace_ms(&self) -> i64 {
        self.pickup_grace_minutes * 60 * 1000
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.db_path.ends_with(".futon/futon.db"));
        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.rpc.port, 9630);
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.pickup_grace_ms(), 30 * 60 * 1000);
        assert_eq!(config.reconcile_api_key, None);
        assert_eq!(config.webhook_url, None);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("FUTON_DB_PATH", "/tmp/futon-test.db"),
            ("FUTON_RPC_PORT", "9700"),
            ("FUTON_SWEEP_INTERVAL_SECS", "0"),
            ("FUTON_PICKUP_GRACE_MINUTES", "45"),
            ("FUTON_RECONCILE_API_KEY", "s3cret"),
            ("FUTON_NOTIFY_WEBHOOK_URL", "http://localhost:8080/hook"),
            ("FUTON_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.database_url(), "sqlite:///tmp/futon-test.db");
        assert_eq!(config.rpc.port, 9700);
        assert_eq!(config.sweep_interval, None);
        assert_eq!(config.pickup_grace_ms(), 45 * 60 * 1000);
        assert_eq!(config.reconcile_api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_secret_is_unset() {
        let config = config(&[("FUTON_RECONCILE_API_KEY", "")]).unwrap();
        assert_eq!(config.reconcile_api_key, None);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config(&[("FUTON_RPC_PORT", "not-a-port")]).is_err());
        assert!(config(&[("FUTON_PICKUP_GRACE_MINUTES", "-5")]).is_err());
    }
}
