//! Process configuration
//!
//! All keys are read once at startup. Lookup is injectable so tests never
//! touch process-global environment variables.

use alloy_primitives::Address;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";

// Well-known first-deployment address on a local dev chain.
const DEV_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Startup configuration failures; all fatal
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("PRIVATE_KEY environment variable not set")]
    MissingPrivateKey,

    #[error("invalid CONTRACT_ADDRESS: {value}")]
    InvalidContractAddress { value: String },

    #[error("invalid {key}: {value} ({requirement})")]
    InvalidNumber {
        key: &'static str,
        value: String,
        requirement: &'static str,
    },

    #[error("invalid BIND_ADDR: {value}")]
    InvalidBindAddr { value: String },
}

/// Resolved process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub contract_address: Address,
    pub private_key: String,
    pub max_retries: u32,
    pub backoff: Duration,
    /// Raw comma-separated operator keys; absent means mock signing
    pub bls_keys: Option<String>,
    pub max_batch: usize,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        // Legacy deployments exported the address under the contract name.
        let contract_raw = lookup("CONTRACT_ADDRESS")
            .or_else(|| lookup("BATCH_SETTLEMENT_ADDRESS"))
            .unwrap_or_else(|| {
                warn!(
                    default = DEV_CONTRACT_ADDRESS,
                    "CONTRACT_ADDRESS not set, using dev default"
                );
                DEV_CONTRACT_ADDRESS.to_string()
            });
        let contract_address = contract_raw
            .parse::<Address>()
            .map_err(|_| ConfigError::InvalidContractAddress {
                value: contract_raw,
            })?;

        let private_key = lookup("PRIVATE_KEY").ok_or(ConfigError::MissingPrivateKey)?;

        let max_retries = parse_bounded(&lookup, "MAX_RETRIES", 5, 1, "must be a positive integer")?;
        let backoff_ms = parse_bounded(&lookup, "BACKOFF_MS", 200, 50, "must be an integer >= 50")?;
        let max_batch = parse_bounded(&lookup, "MAX_BATCH", 100, 1, "must be a positive integer")?;

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr { value: bind_raw })?;

        Ok(Self {
            rpc_url,
            contract_address,
            private_key,
            max_retries: max_retries as u32,
            backoff: Duration::from_millis(backoff_ms),
            bls_keys: lookup("BLS_KEYS").filter(|raw| !raw.trim().is_empty()),
            max_batch: max_batch as usize,
            bind_addr,
        })
    }
}

fn parse_bounded<F>(
    lookup: &F,
    key: &'static str,
    default: u64,
    floor: u64,
    requirement: &'static str,
) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value >= floor => Ok(value),
            _ => Err(ConfigError::InvalidNumber {
                key,
                value: raw,
                requirement,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_private_key() {
        let config = Config::from_lookup(lookup_from(&[("PRIVATE_KEY", "0xabc123")])).unwrap();

        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(
            config.contract_address.to_string().to_lowercase(),
            DEV_CONTRACT_ADDRESS.to_lowercase()
        );
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff, Duration::from_millis(200));
        assert_eq!(config.max_batch, 100);
        assert!(config.bls_keys.is_none());
        assert_eq!(config.bind_addr.port(), 8081);
    }

    #[test]
    fn test_missing_private_key_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingPrivateKey)));
    }

    #[test]
    fn test_legacy_contract_alias_is_accepted() {
        let config = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            (
                "BATCH_SETTLEMENT_ADDRESS",
                "0x000000000000000000000000000000000000dEaD",
            ),
        ]))
        .unwrap();
        assert_eq!(
            config.contract_address.to_string().to_lowercase(),
            "0x000000000000000000000000000000000000dead"
        );
    }

    #[test]
    fn test_invalid_contract_address_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            ("CONTRACT_ADDRESS", "not-an-address"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidContractAddress { .. })
        ));
    }

    #[test]
    fn test_retry_floor_enforced() {
        let result = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            ("MAX_RETRIES", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn test_backoff_floor_enforced() {
        let result = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            ("BACKOFF_MS", "10"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));

        let ok = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            ("BACKOFF_MS", "50"),
        ]))
        .unwrap();
        assert_eq!(ok.backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_blank_bls_keys_means_mock_mode() {
        let config = Config::from_lookup(lookup_from(&[
            ("PRIVATE_KEY", "0xabc"),
            ("BLS_KEYS", "   "),
        ]))
        .unwrap();
        assert!(config.bls_keys.is_none());
    }
}
