use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Protocol configuration snapshot. Fetched once per session and kept
/// until the process exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    pub token_address: Address,
    pub link677_address: Address,
    pub link_bep20_address: Address,
    pub peg_swap_address: Address,
    pub swap_router: Address,
    pub wrapped_native: Address,
    /// Raw token units, decimal string
    pub min_holding: String,
    /// Raw token units, decimal string
    pub full_reward_holding: String,
    pub lottery_interval: u64,
    pub max_holders: u64,
    pub callback_gas_limit: u64,
    pub token_set: bool,
    pub token_locked: bool,
    pub admin: Address,
    pub ownership_renounced: bool,
    pub admin_renounced: bool,
    /// Mirrors `token_locked`; the contract exposes no separate flag
    pub config_locked: bool,
}

impl ContractConfig {
    /// Whether token metadata can be looked up for this configuration
    pub fn has_token(&self) -> bool {
        self.token_set && !self.token_address.is_zero()
    }

    /// Minimum holding in raw token units; unparseable reads as zero
    pub fn min_holding_raw(&self) -> U256 {
        U256::from_str_radix(&self.min_holding, 10).unwrap_or(U256::ZERO)
    }
}

/// ERC-20 metadata of the protocol token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMeta {
    fn default() -> Self {
        Self {
            symbol: "TOKEN".to_string(),
            decimals: 18,
        }
    }
}
