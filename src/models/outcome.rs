use serde::{Deserialize, Serialize};

/// One completed selection round as recorded by the `WinnerSelected` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub outcome_id: String,
    pub winner_address: String,
    /// Ether-formatted
    pub reward_amount: String,
    pub weight_percentage: u64,
    pub block_number: u64,
    /// Hash of the transaction that emitted the record
    pub proof_hash: String,
}

/// Observer's relationship to a newly observed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealMode {
    Winner,
    Loser,
    Guest,
}

impl RevealMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevealMode::Winner => "winner",
            RevealMode::Loser => "loser",
            RevealMode::Guest => "guest",
        }
    }
}

/// One-shot notification that a new outcome appeared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSignal {
    pub mode: RevealMode,
    pub record: OutcomeRecord,
}

impl RevealSignal {
    pub fn is_winner(&self) -> bool {
        self.mode == RevealMode::Winner
    }
}
