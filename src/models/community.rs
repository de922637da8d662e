use serde::{Deserialize, Serialize};

/// LINK reserve bookkeeping. All amounts ether-formatted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub erc677_balance: String,
    pub bep20_balance: String,
    pub subscription_balance: String,
    pub total_link_balance: String,
    pub available_eth_for_link: String,
    pub needs_buy: bool,
    pub needs_convert: bool,
    pub needs_top_up: bool,
    pub total_link_purchased: String,
    pub total_eth_spent: String,
    pub received: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasRewardStats {
    pub total_paid: String,
    pub current_bounty: String,
    pub base_reward: String,
    pub max_reward: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupProgress {
    pub remaining: u64,
    pub percent: u64,
}

/// Community view read-model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub link: LinkStats,
    /// Absent when the cleanup progress sub-read failed
    pub cleanup: Option<CleanupProgress>,
    pub gas_rewards: GasRewardStats,
}

/// Stuck pending reward of one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDetails {
    pub amount: String,
    pub since: i64,
    pub can_recycle: bool,
    pub recycle_time: i64,
}
