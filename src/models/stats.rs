use serde::{Deserialize, Serialize};

/// Why the selection round can or cannot be triggered right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReadiness {
    Ready,
    /// Token not configured yet
    Misconfigured,
    /// A selection is already running
    Busy,
    /// The interval since the last round has not elapsed
    Cooldown,
    NoParticipants,
    PoolTooSmall,
    /// Randomness subscription is out of LINK
    FuelDepleted,
}

impl TriggerReadiness {
    /// Map the contract's status code. Unknown codes read as cooldown.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => TriggerReadiness::Ready,
            1 => TriggerReadiness::Misconfigured,
            2 => TriggerReadiness::Busy,
            3 => TriggerReadiness::Cooldown,
            4 => TriggerReadiness::NoParticipants,
            5 => TriggerReadiness::PoolTooSmall,
            6 => TriggerReadiness::FuelDepleted,
            _ => TriggerReadiness::Cooldown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReadiness::Ready => "ready",
            TriggerReadiness::Misconfigured => "misconfigured",
            TriggerReadiness::Busy => "busy",
            TriggerReadiness::Cooldown => "cooldown",
            TriggerReadiness::NoParticipants => "no_participants",
            TriggerReadiness::PoolTooSmall => "pool_too_small",
            TriggerReadiness::FuelDepleted => "fuel_depleted",
        }
    }
}

impl Default for TriggerReadiness {
    fn default() -> Self {
        TriggerReadiness::Cooldown
    }
}

/// Global protocol statistics. Replaced as a whole on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub holder_count: u64,
    /// Ether-formatted amounts
    pub lottery_pool: String,
    pub actual_lottery_pool: String,
    /// Unix seconds of the next eligible round
    pub next_lottery_time: i64,
    pub total_lotteries: u64,
    pub total_rewards: String,
    pub total_pending: String,
    pub can_trigger: bool,
    pub in_progress: bool,
    /// Native balance held by the contract
    pub contract_total: String,
    pub readiness: TriggerReadiness,
}

impl ContractStats {
    /// Seconds until the next round, clamped at zero
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        (self.next_lottery_time - now).max(0)
    }
}
