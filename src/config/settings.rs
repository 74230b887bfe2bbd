use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::blockchain::MULTICALL3_ADDRESS;
use crate::error::{EngineError, RetryConfig};
use crate::models::Chain;

/// Prefix of environment overrides, e.g. `BALANCES__DISPATCHER__MAX_BATCH_SIZE`.
pub const ENV_PREFIX: &str = "BALANCES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub blockchain: BlockchainSettings,
    #[serde(default)]
    pub dispatcher: DispatcherSettings,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainSettings {
    /// Endpoint per chain, keyed by chain name (`ethereum`, `arbitrum`, ...).
    pub rpc_urls: HashMap<String, String>,
    pub multicall_address: Address,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Calls per aggregate round trip
    pub max_batch_size: usize,
    /// Aggregates in flight at once
    pub max_concurrent_batches: usize,
    /// Upper bound of a whole resolution pass
    pub resolve_timeout_secs: u64,
    /// Clamp for enumerated sub-position counts reported by contracts
    pub max_enumerated_positions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for BlockchainSettings {
    fn default() -> Self {
        BlockchainSettings {
            rpc_urls: HashMap::new(),
            multicall_address: MULTICALL3_ADDRESS,
            request_timeout_secs: 30,
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        DispatcherSettings {
            max_batch_size: 200,
            max_concurrent_batches: 4,
            resolve_timeout_secs: 30,
            max_enumerated_positions: 256,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl BlockchainSettings {
    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        self.rpc_urls.get(chain.name()).map(String::as_str)
    }
}

impl DispatcherSettings {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}

impl Settings {
    /// Load from `.env`, `config/default.toml`, `config/local.toml` and
    /// `BALANCES__*` variables, in increasing precedence.
    pub fn new() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"))
    }

    /// Same layering as [`Settings::new`] with config files read from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self, EngineError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(dir.join("default.toml")).required(false))
            .add_source(config::File::from(dir.join("local.toml")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        tracing::debug!(
            chains = settings.blockchain.rpc_urls.len(),
            max_batch_size = settings.dispatcher.max_batch_size,
            max_concurrent_batches = settings.dispatcher.max_concurrent_batches,
            "Settings loaded"
        );

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.dispatcher.max_batch_size == 0 {
            return Err(EngineError::Config("dispatcher.max_batch_size must be positive".to_string()));
        }
        if self.dispatcher.max_concurrent_batches == 0 {
            return Err(EngineError::Config(
                "dispatcher.max_concurrent_batches must be positive".to_string(),
            ));
        }
        if self.dispatcher.resolve_timeout_secs == 0 {
            return Err(EngineError::Config(
                "dispatcher.resolve_timeout_secs must be positive".to_string(),
            ));
        }
        if self.blockchain.multicall_address == Address::ZERO {
            return Err(EngineError::Config(
                "blockchain.multicall_address must not be the zero address".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Config("retry.max_attempts must be at least 1".to_string()));
        }

        for (name, url) in &self.blockchain.rpc_urls {
            name.parse::<Chain>().map_err(EngineError::Config)?;
            let parsed = Url::parse(url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(EngineError::Config(format!(
                    "RPC URL for {} must use http or https, got {}",
                    name,
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.dispatcher.max_batch_size, 200);
        assert_eq!(settings.dispatcher.max_concurrent_batches, 4);
        assert_eq!(settings.dispatcher.max_enumerated_positions, 256);
        assert_eq!(settings.blockchain.multicall_address, MULTICALL3_ADDRESS);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.dispatcher.max_batch_size = 0;
        assert!(matches!(settings.validate(), Err(EngineError::Config(_))));

        let mut settings = Settings::default();
        settings.blockchain.multicall_address = Address::ZERO;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings
            .blockchain
            .rpc_urls
            .insert("ethereum".to_string(), "ws://localhost:8546".to_string());
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings
            .blockchain
            .rpc_urls
            .insert("solana".to_string(), "https://rpc.example".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[blockchain]
request_timeout_secs = 12

[blockchain.rpc_urls]
ethereum = "https://eth.example/rpc"

[dispatcher]
max_batch_size = 50
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("local.toml"),
            "[dispatcher]\nmax_concurrent_batches = 2\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).unwrap();

        assert_eq!(settings.blockchain.request_timeout_secs, 12);
        assert_eq!(settings.blockchain.rpc_url(Chain::Ethereum), Some("https://eth.example/rpc"));
        assert_eq!(settings.dispatcher.max_batch_size, 50);
        assert_eq!(settings.dispatcher.max_concurrent_batches, 2);
        // untouched keys keep their defaults
        assert_eq!(settings.dispatcher.max_enumerated_positions, 256);
        assert_eq!(settings.retry, RetryConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[dispatcher]\nmax_batch_size = 0\n").unwrap();

        assert!(matches!(Settings::load_from(dir.path()), Err(EngineError::Config(_))));
    }
}
