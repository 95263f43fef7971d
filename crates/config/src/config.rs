use std::collections::{HashMap, HashSet};
use std::ops::Deref;

use derive_more::{Display, From, Into};
use serde::Deserialize;
use serde_valid::yaml::FromYamlStr;
use serde_valid::{UniqueItemsError, Validate, ValidateUniqueItems};

// Config Type
#[derive(Debug, Clone)]
pub struct Config {
    // Backend routing service
    pub api: ApiConfig,
    // Freshness windows and retry budgets per query kind
    pub cache: CacheConfig,
    // Chains offered to the user, in display order
    pub chains: Vec<ChainConfig>,
    // Tokens offered to the user, in display order
    pub tokens: Vec<TokenConfig>,
    // Where the user's last token/chain selection is kept
    pub preferences: PreferencesConfig,
    // Number formatting for the list and detail views
    pub display: DisplayConfig,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&config_file_content)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        for chain in raw_config.chains.iter() {
            chain.validate()?;
        }

        let chain_ids: HashSet<&str> = raw_config.chains.iter().map(|c| c.id.as_str()).collect();

        // Every token address must point at a configured chain
        for token in raw_config.tokens.iter() {
            token.validate()?;
            for (chain_id, address) in token.addresses.iter() {
                if !chain_ids.contains(chain_id.as_str()) {
                    return Err(ConfigError::ChainNotFound(chain_id.clone(), token.symbol.clone()));
                }
                if !is_evm_address(address) {
                    return Err(ConfigError::InvalidTokenAddress(
                        token.symbol.clone(),
                        chain_id.clone(),
                    ));
                }
            }
        }

        let preferences = raw_config.preferences;
        match preferences.backend {
            StorageBackend::File if preferences.file_path.is_none() => {
                return Err(ConfigError::MissingStorageSetting("file_path"));
            }
            StorageBackend::Redis if preferences.redis_url.is_none() => {
                return Err(ConfigError::MissingStorageSetting("redis_url"));
            }
            _ => {}
        }

        Ok(Config {
            api: raw_config.api,
            cache: raw_config.cache,
            chains: raw_config.chains.0,
            tokens: raw_config.tokens.0,
            preferences,
            display: raw_config.display,
        })
    }
}

fn is_evm_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Chain {} referenced by token {} is not configured", _0, _1)]
    #[from(ignore)]
    ChainNotFound(String, String),

    #[display("Token {} has an invalid address on chain {}", _0, _1)]
    #[from(ignore)]
    InvalidTokenAddress(String, String),

    #[display("Preferences backend requires setting: {}", _0)]
    #[from(ignore)]
    MissingStorageSetting(&'static str),

    #[display("Validation Error: {}", _0)]
    ValidationError(serde_valid::validation::Errors),

    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

impl std::error::Error for ConfigError {}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, From, Into)]
pub struct Chains(Vec<ChainConfig>);

impl ValidateUniqueItems for Chains {
    fn validate_unique_items(&self) -> Result<(), UniqueItemsError> {
        self.iter().map(|c| c.id.clone()).collect::<Vec<_>>().validate_unique_items()
    }
}

impl Deref for Chains {
    type Target = Vec<ChainConfig>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize, From, Into)]
pub struct TokenConfigs(Vec<TokenConfig>);

impl ValidateUniqueItems for TokenConfigs {
    fn validate_unique_items(&self) -> Result<(), UniqueItemsError> {
        self.iter().map(|t| t.symbol.clone()).collect::<Vec<_>>().validate_unique_items()
    }
}

impl Deref for TokenConfigs {
    type Target = Vec<TokenConfig>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[validate]
    pub api: ApiConfig,
    #[validate]
    pub cache: CacheConfig,
    #[validate(unique_items)]
    pub chains: Chains,
    #[validate(unique_items)]
    pub tokens: TokenConfigs,
    pub preferences: PreferencesConfig,
    #[validate]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct ApiConfig {
    // The base URL of the routing backend, without a trailing /api
    #[validate(pattern = r"^https?://[-a-zA-Z0-9@:%._\+~#=]{1,256}(:[0-9]{1,5})?(/.*)?$")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CacheConfig {
    // How long a route search result may be reused
    #[validate(minimum = 1)]
    pub routes_stale_after_sec: u64,
    // How long a best-route result may be reused
    #[validate(minimum = 1)]
    pub best_route_stale_after_sec: u64,
    // How long a health status may be reused
    #[validate(minimum = 1)]
    pub health_stale_after_sec: u64,
    // Automatic retries for health checks only
    #[validate(maximum = 3)]
    pub health_retries: u32,
    // Background health polling interval
    #[validate(minimum = 5)]
    pub health_poll_interval_sec: u64,
}

#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub struct ChainConfig {
    // The numeric chain id, kept as a string
    #[validate(pattern = r"^[0-9]+$")]
    pub id: String,
    // Human readable name
    #[validate(min_length = 1)]
    pub label: String,
}

#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub struct TokenConfig {
    // The token symbol
    #[validate(min_length = 1)]
    pub symbol: String,
    // The number of decimals the token has, identical on every chain
    #[validate(maximum = 18)]
    pub decimals: u8,
    // Token contract address per chain id
    pub addresses: TokenAddressesByChain,
}

#[derive(Debug, Deserialize, Into, From, Clone, PartialEq, Default)]
pub struct TokenAddressesByChain(pub HashMap<String, String>);

impl Deref for TokenAddressesByChain {
    type Target = HashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[display("file")]
    File,
    #[display("redis")]
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreferencesConfig {
    pub backend: StorageBackend,
    // JSON file holding the key/value pairs, for the file backend
    pub file_path: Option<String>,
    // Redis connection string, for the redis backend
    pub redis_url: Option<String>,
    // Namespaced key the preferences are stored under
    #[serde(default = "default_preferences_key")]
    pub key: String,
}

fn default_preferences_key() -> String {
    "hydra-bridge-preferences".to_string()
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct DisplayConfig {
    // Fractional digits shown for output and fee in the route list
    #[validate(maximum = 18)]
    pub list_decimals: u8,
    // Fractional digits shown for amounts in the detail view
    #[validate(maximum = 18)]
    pub detail_decimals: u8,
}

pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}
