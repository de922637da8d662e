use serde::{Deserialize, Serialize};

/// One row of the paginated holder roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderEntry {
    pub address: String,
    /// Raw token units, zero when the balance lookup failed
    pub balance: String,
    /// Balance meets the configured minimum holding
    pub is_valid: bool,
}
