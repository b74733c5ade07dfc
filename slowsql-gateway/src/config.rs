//! Gateway configuration, resolved once at startup.
//!
//! | Env var                            | Default            |
//! |------------------------------------|--------------------|
//! | `GATEWAY_ADDR`                     | `0.0.0.0:8080`     |
//! | `SLOWSQL_DATA_DIR`                 | `./slow_http`      |
//! | `SLOWSQL_INTERPRETER`              | `python`           |
//! | `SLOWSQL_SCRIPT`                   | `processlist.py`   |
//! | `SLOWSQL_MAX_CONCURRENT_ANALYZERS` | unbounded          |
//! | `SLOWSQL_ANALYZER_TIMEOUT_SECS`    | none               |
//! | `SLOWSQL_MAX_BODY_BYTES`           | `10485760`         |

use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be at most {max}, got {value}")]
    TooLarge { var: &'static str, value: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub bind_addr: String,
    /// Directory receiving `<unix_nanos>.json` batch files.
    pub data_dir: PathBuf,
    pub interpreter: String,
    pub script: PathBuf,
    /// `None` lets every request spawn its own analyzer immediately.
    pub max_concurrent_analyzers: Option<usize>,
    /// `None` waits for the analyzer however long it takes.
    pub analyzer_timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./slow_http"),
            interpreter: "python".to_string(),
            script: PathBuf::from("processlist.py"),
            max_concurrent_analyzers: None,
            analyzer_timeout: None,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("GATEWAY_ADDR") {
            cfg.bind_addr = v;
        }
        if let Some(v) = lookup("SLOWSQL_DATA_DIR") {
            cfg.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SLOWSQL_INTERPRETER") {
            cfg.interpreter = v;
        }
        if let Some(v) = lookup("SLOWSQL_SCRIPT") {
            cfg.script = PathBuf::from(v);
        }
        if let Some(v) = lookup("SLOWSQL_MAX_CONCURRENT_ANALYZERS") {
            let n = positive("SLOWSQL_MAX_CONCURRENT_ANALYZERS", &v)?;
            cfg.max_concurrent_analyzers = Some(at_most(
                "SLOWSQL_MAX_CONCURRENT_ANALYZERS",
                n,
                Semaphore::MAX_PERMITS,
            )?);
        }
        if let Some(v) = lookup("SLOWSQL_ANALYZER_TIMEOUT_SECS") {
            cfg.analyzer_timeout = Some(Duration::from_secs(positive(
                "SLOWSQL_ANALYZER_TIMEOUT_SECS",
                &v,
            )?));
        }
        if let Some(v) = lookup("SLOWSQL_MAX_BODY_BYTES") {
            let n = positive("SLOWSQL_MAX_BODY_BYTES", &v)?;
            cfg.max_body_bytes = at_most("SLOWSQL_MAX_BODY_BYTES", n, usize::MAX)?;
        }

        Ok(cfg)
    }
}

fn positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}

fn at_most(var: &'static str, value: u64, max: usize) -> Result<usize, ConfigError> {
    match usize::try_from(value) {
        Ok(n) if n <= max => Ok(n),
        _ => Err(ConfigError::TooLarge {
            var,
            value,
            max: max as u64,
        }),
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
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_unbounded_policy() {
        let cfg = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, GatewayConfig::default());
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.interpreter, "python");
        assert_eq!(cfg.max_concurrent_analyzers, None);
        assert_eq!(cfg.analyzer_timeout, None);
    }

    #[test]
    fn overrides_applied() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("GATEWAY_ADDR", "127.0.0.1:9000"),
            ("SLOWSQL_DATA_DIR", "/var/lib/slowsql"),
            ("SLOWSQL_INTERPRETER", "python3"),
            ("SLOWSQL_SCRIPT", "/opt/slowsql/processlist.py"),
            ("SLOWSQL_MAX_CONCURRENT_ANALYZERS", "4"),
            ("SLOWSQL_ANALYZER_TIMEOUT_SECS", "30"),
            ("SLOWSQL_MAX_BODY_BYTES", "1024"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/slowsql"));
        assert_eq!(cfg.interpreter, "python3");
        assert_eq!(cfg.script, PathBuf::from("/opt/slowsql/processlist.py"));
        assert_eq!(cfg.max_concurrent_analyzers, Some(4));
        assert_eq!(cfg.analyzer_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.max_body_bytes, 1024);
    }

    #[test]
    fn zero_and_garbage_numbers_rejected() {
        let err = GatewayConfig::from_lookup(lookup(&[("SLOWSQL_MAX_CONCURRENT_ANALYZERS", "0")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "SLOWSQL_MAX_CONCURRENT_ANALYZERS",
                value: "0".into()
            }
        );

        assert!(GatewayConfig::from_lookup(lookup(&[("SLOWSQL_ANALYZER_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn concurrency_limit_capped_at_semaphore_permits() {
        let too_many = (Semaphore::MAX_PERMITS as u64 + 1).to_string();
        let err = GatewayConfig::from_lookup(lookup(&[(
            "SLOWSQL_MAX_CONCURRENT_ANALYZERS",
            too_many.as_str(),
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooLarge { var: "SLOWSQL_MAX_CONCURRENT_ANALYZERS", .. }
        ));

        let max = Semaphore::MAX_PERMITS.to_string();
        let cfg = GatewayConfig::from_lookup(lookup(&[(
            "SLOWSQL_MAX_CONCURRENT_ANALYZERS",
            max.as_str(),
        )]))
        .unwrap();
        assert_eq!(cfg.max_concurrent_analyzers, Some(Semaphore::MAX_PERMITS));
    }
}
