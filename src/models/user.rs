use super::ContractConfig;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Account-scoped snapshot. Only present while an account is connected
/// and the protocol token is configured.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub registered: bool,
    /// Raw token units recorded by the contract
    pub current_balance: String,
    /// Raw token units held in the wallet right now
    pub wallet_balance: String,
    pub reward_percentage: u64,
    pub currently_valid: bool,
    pub total_won: String,
    pub win_count: u64,
    pub pending: String,
    pub triggers: u64,
    pub gas_rewards_collected: String,
    pub donations: String,
}

impl UserInfo {
    /// Wallet balance meets the configured minimum holding
    pub fn has_sufficient_balance(&self, config: &ContractConfig) -> bool {
        match (
            U256::from_str_radix(&self.wallet_balance, 10),
            U256::from_str_radix(&config.min_holding, 10),
        ) {
            (Ok(balance), Ok(min)) => balance >= min,
            _ => false,
        }
    }
}
