use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::variants::Variant;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_GREETING_DELAY_MS: u64 = 3_000;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub variant: Variant,
    pub greeting_delay: Duration,
    pub mailbox_capacity: usize,
    /// Root of the SQLite data folder. The counter store is in memory when
    /// unset.
    pub workdir: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind: SocketAddr = parse(&lookup, "EDGE_BIND", DEFAULT_BIND.parse().ok())?;
        let variant: Variant = parse(&lookup, "EDGE_VARIANT", Some(Variant::Chat))?;
        let delay_ms: u64 = parse(&lookup, "EDGE_GREETING_DELAY_MS", Some(DEFAULT_GREETING_DELAY_MS))?;
        let mailbox_capacity: usize =
            parse(&lookup, "EDGE_MAILBOX_CAPACITY", Some(DEFAULT_MAILBOX_CAPACITY))?;

        if mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "EDGE_MAILBOX_CAPACITY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind,
            variant,
            greeting_delay: Duration::from_millis(delay_ms),
            mailbox_capacity,
            workdir: lookup("WORKDIR").filter(|dir| !dir.is_empty()),
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            variant: Variant::Chat,
            greeting_delay: Duration::from_millis(DEFAULT_GREETING_DELAY_MS),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            workdir: None,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => default.ok_or(ConfigError::Invalid {
            var,
            value: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.variant, Variant::Chat);
        assert_eq!(config.greeting_delay, Duration::from_secs(3));
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.workdir, None);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("EDGE_BIND", "0.0.0.0:9000"),
            ("EDGE_VARIANT", "visits-serialized"),
            ("EDGE_GREETING_DELAY_MS", "250"),
            ("WORKDIR", "/var/lib/edge"),
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.variant, Variant::SerializedVisits);
        assert_eq!(config.greeting_delay, Duration::from_millis(250));
        assert_eq!(config.workdir.as_deref(), Some("/var/lib/edge"));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            config(&[("EDGE_VARIANT", "pubsub")]).unwrap_err(),
            ConfigError::Invalid {
                var: "EDGE_VARIANT",
                value: "pubsub".to_string()
            }
        );
        assert!(config(&[("EDGE_GREETING_DELAY_MS", "soon")]).is_err());
        assert!(config(&[("EDGE_MAILBOX_CAPACITY", "0")]).is_err());
    }
}
