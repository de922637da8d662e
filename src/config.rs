use crate::chain_client::abi::{parse_address, parse_chain_id};
use alloy::primitives::Address;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://bsc-rpc.publicnode.com";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x76d12acfDdd69979A9f24BDaB07687731Cb78213";
pub const DEFAULT_CHAIN_ID: u64 = 56;
pub const DEFAULT_PAGE_SIZE: u64 = 15;
pub const DEFAULT_HISTORY_BLOCK_RANGE: u64 = 10_000;
pub const DEFAULT_CONFIRMATION_POLL_MS: u64 = 1_500;

/// Numeric variable: default when unset, error when present but not a
/// positive integer
fn positive_u64(name: &str, raw: Option<String>, default: u64) -> Result<u64, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(format!("{} must be greater than 0", name)),
        Ok(value) => Ok(value),
        Err(e) => Err(format!("Invalid {}: {} ({})", name, raw, e)),
    }
}

/// Metadata handed to a wallet when it has to register the network
#[derive(Debug, Clone)]
pub struct NetworkMetadata {
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
}

/// Fixed chain-side constants: endpoint, network and service address
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_address: Address,
    pub page_size: u64,
    pub history_block_range: u64,
    pub network: NetworkMetadata,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chain: ChainSettings,
    pub session_file: PathBuf,
    /// HTTP endpoint of the ambient signing agent, if one is running
    pub agent_url: Option<String>,
    pub agent_flags: Vec<String>,
    /// Namespace the ambient agent also announces itself under
    pub agent_rdns: Option<String>,
    pub confirmation_poll_ms: u64,
    pub log_level: String,
    pub environment: String,
}

impl ChainSettings {
    /// Create chain settings from environment variables
    pub fn from_env() -> Result<Self, String> {
        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());

        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => parse_chain_id(&raw).map_err(|e| e.to_string())?,
            Err(_) => DEFAULT_CHAIN_ID,
        };

        let contract_raw =
            env::var("CONTRACT_ADDRESS").unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string());
        let contract_address = parse_address(&contract_raw)
            .map_err(|e| format!("Invalid CONTRACT_ADDRESS: {}", e))?;

        let page_size = positive_u64("PAGE_SIZE", env::var("PAGE_SIZE").ok(), DEFAULT_PAGE_SIZE)?;

        let history_block_range = positive_u64(
            "HISTORY_BLOCK_RANGE",
            env::var("HISTORY_BLOCK_RANGE").ok(),
            DEFAULT_HISTORY_BLOCK_RANGE,
        )?;

        Ok(Self {
            network: NetworkMetadata::bnb_mainnet(&rpc_url),
            rpc_url,
            chain_id,
            contract_address,
            page_size,
            history_block_range,
        })
    }
}

impl NetworkMetadata {
    fn bnb_mainnet(rpc_url: &str) -> Self {
        Self {
            chain_name: "BNB Smart Chain Mainnet".to_string(),
            currency_name: "BNB".to_string(),
            currency_symbol: "BNB".to_string(),
            currency_decimals: 18,
            rpc_urls: vec![rpc_url.to_string()],
            explorer_urls: vec!["https://bscscan.com".to_string()],
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            contract_address: parse_address(DEFAULT_CONTRACT_ADDRESS).unwrap_or(Address::ZERO),
            page_size: DEFAULT_PAGE_SIZE,
            history_block_range: DEFAULT_HISTORY_BLOCK_RANGE,
            network: NetworkMetadata::bnb_mainnet(DEFAULT_RPC_URL),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let chain = ChainSettings::from_env()?;

        let session_file = env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./koi_session.json"));

        let agent_url = env::var("AGENT_URL").ok().filter(|s| !s.trim().is_empty());

        let agent_flags = env::var("AGENT_FLAGS")
            .map(|s| {
                s.split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let agent_rdns = env::var("AGENT_RDNS").ok().filter(|s| !s.trim().is_empty());

        let confirmation_poll_ms = positive_u64(
            "CONFIRMATION_POLL_MS",
            env::var("CONFIRMATION_POLL_MS").ok(),
            DEFAULT_CONFIRMATION_POLL_MS,
        )?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            chain,
            session_file,
            agent_url,
            agent_flags,
            agent_rdns,
            confirmation_poll_ms,
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Receipt polling cadence while waiting for confirmation
    pub fn confirmation_poll(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainSettings::default(),
            session_file: PathBuf::from("./koi_session.json"),
            agent_url: None,
            agent_flags: Vec::new(),
            agent_rdns: None,
            confirmation_poll_ms: DEFAULT_CONFIRMATION_POLL_MS,
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_settings_default() {
        let chain = ChainSettings::default();
        assert_eq!(chain.chain_id, 56);
        assert_eq!(chain.page_size, 15);
        assert_eq!(chain.history_block_range, 10_000);
        assert!(!chain.contract_address.is_zero());
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.confirmation_poll(), Duration::from_millis(1500));
    }

    #[test]
    fn test_numeric_values_are_validated() {
        assert_eq!(positive_u64("PAGE_SIZE", None, 15), Ok(15));
        assert_eq!(positive_u64("PAGE_SIZE", Some(" 20 ".to_string()), 15), Ok(20));
        assert!(positive_u64("PAGE_SIZE", Some("abc".to_string()), 15).is_err());
        assert!(positive_u64("HISTORY_BLOCK_RANGE", Some("-5".to_string()), 10_000).is_err());
        assert!(positive_u64("CONFIRMATION_POLL_MS", Some("0".to_string()), 1_500).is_err());
    }

    // Only test in the crate that touches these variables
    #[test]
    fn test_invalid_numeric_env_is_config_error() {
        env::set_var("PAGE_SIZE", "abc");
        let err = ChainSettings::from_env().unwrap_err();
        assert!(err.contains("PAGE_SIZE"));

        env::set_var("PAGE_SIZE", "20");
        env::set_var("HISTORY_BLOCK_RANGE", "-5");
        let err = ChainSettings::from_env().unwrap_err();
        assert!(err.contains("HISTORY_BLOCK_RANGE"));

        env::remove_var("HISTORY_BLOCK_RANGE");
        assert_eq!(ChainSettings::from_env().unwrap().page_size, 20);
        env::remove_var("PAGE_SIZE");
    }
}
