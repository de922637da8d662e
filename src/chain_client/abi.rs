//! Contract interface and unit helpers.
//!
//! The protocol contract, its custom errors and the ERC-20 surface are
//! declared with `sol!`; call encoding and return decoding go through the
//! generated `SolCall` types.

use crate::error::{AppError, AppResult};
use alloy::primitives::utils::format_units as alloy_format_units;
use alloy::primitives::{Address, U256};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

alloy::sol! {
    interface ILuckyKoi {
        error LotteryNotReady();
        error AlreadyRegistered();
        error NotRegistered();
        error InsufficientBalance();
        error MaxHoldersReached();
        error NoPendingRewards();
        error InsufficientLink();
        error StillValid();
        error NoKoiInProgress();
        error TimeoutNotReached();
        error PendingTimeoutNotReached();
        error TokenNotSet();
        error TokenLocked();
        error TransferFailed();
        error KoiInProgress();
        error MaxHoldersTooLow();
        error InvalidParam();
        error NotLinkToken();

        event WinnerSelected(
            uint256 indexed lotteryId,
            address indexed winner,
            uint256 reward,
            uint256 percentage
        );

        function getConfig() external view returns (
            address token,
            address link677,
            address linkBep20,
            address pegSwap,
            address swapRouter,
            address wbnb,
            uint256 minHolding,
            uint256 fullRewardHolding,
            uint256 lotteryInterval,
            uint256 maxHolders,
            uint256 callbackGasLimit,
            bool tokenSet,
            bool tokenLocked,
            address admin,
            bool ownershipRenounced,
            bool adminRenounced
        );

        function getContractStats() external view returns (
            uint256 holderCount,
            uint256 pool,
            uint256 nextTime,
            uint256 lotteries,
            uint256 rewards,
            uint256 pendingTotal,
            bool canTrigger,
            bool inProgress
        );

        function getActualKoiPool() external view returns (uint256 pool);

        function getTriggerStatusDetails() external view returns (uint256 status);

        function getUserInfo(address user) external view returns (
            bool registered,
            uint256 balance,
            uint256 percentage,
            bool valid,
            uint256 totalWon,
            uint256 wins,
            uint256 pending
        );

        function getUserTriggerInfo(address user) external view returns (
            uint256 triggers,
            uint256 gasRewards,
            uint256 attempts,
            uint256 donations
        );

        function getLinkStats() external view returns (
            uint256 erc677Balance,
            uint256 bep20Balance,
            uint256 subscriptionBalance,
            uint256 totalLinkBalance,
            uint256 availableEthForLink,
            bool needsBuy,
            bool needsConvert,
            bool needsTopUp,
            uint256 totalLinkPurchased,
            uint256 totalEthSpent,
            uint256 received
        );

        function getCleanupProgress() external view returns (uint256 remaining, uint256 percent);

        function getGasRewardStats() external view returns (
            uint256 totalPaid,
            uint256 currentBounty,
            uint256 baseReward,
            uint256 maxReward
        );

        function getHolders(uint256 offset, uint256 limit) external view returns (address[] holders);

        function getPendingDetails(address holder) external view returns (
            uint256 amount,
            uint256 since,
            bool canRecycle,
            uint256 recycleTime
        );

        function register() external;
        function unregister() external;
        function claimPendingReward() external;
        function recycleStuckPending(address holder) external;
        function maintainLink() external;
        function unwrapAllWBNB() external;
        function convertLink() external;
        function triggerKoiStrict() external;
        function cleanup(uint256 batchSize) external;
        function cancelStuckKoi() external;
        function setHoldingRequirements(uint256 minHolding, uint256 fullRewardHolding) external;
        function reportInvalid(address holder) external;
    }

    interface IERC20 {
        function symbol() external view returns (string value);
        function decimals() external view returns (uint8 value);
        function balanceOf(address owner) external view returns (uint256 balance);
    }
}

/// Parse a hex address, checksummed or not
pub fn parse_address(s: &str) -> AppResult<Address> {
    Address::from_str(s.trim())
        .map_err(|e| AppError::Validation(format!("Invalid address {}: {}", s, e)))
}

/// Narrow a counter or timestamp word. Values past `u64::MAX` saturate.
pub fn small(value: U256) -> u64 {
    value.saturating_to::<u64>()
}

/// Fixed-point rendering of a raw integer amount, `"1.5"`, `"0.0"`.
pub fn format_units(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let Ok(formatted) = alloy_format_units(raw, decimals) else {
        return raw.to_string();
    };
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted,
    }
}

/// Native amount with 18 decimals
pub fn format_ether(raw: U256) -> String {
    format_units(raw, 18)
}

/// Two-decimal display of a raw token amount given as a decimal string.
/// Unparseable input renders as `"0.00"`.
pub fn format_tokens(raw: &str, decimals: u8) -> String {
    let Ok(value) = U256::from_str_radix(raw.trim(), 10) else {
        return "0.00".to_string();
    };
    let formatted = format_units(value, decimals);
    match Decimal::from_str(&formatted) {
        Ok(d) => {
            let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.2}", rounded)
        }
        // Beyond Decimal's 28 significant digits: keep the integer part only
        Err(_) => format!("{}.00", formatted.split('.').next().unwrap_or("0")),
    }
}

/// Parse a chain id in either `0x38` or `56` form
pub fn parse_chain_id(s: &str) -> AppResult<u64> {
    let trimmed = s.trim();
    let parsed = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<u64>()
    };
    parsed.map_err(|e| AppError::Validation(format!("Invalid chain id {}: {}", s, e)))
}

/// Chain id from a JSON value that may be a number or a string
pub fn chain_id_from_value(value: &Value) -> AppResult<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AppError::Validation(format!("Invalid chain id {}", n))),
        Value::String(s) => parse_chain_id(s),
        other => Err(AppError::Validation(format!("Invalid chain id {}", other))),
    }
}

/// Hex form expected by wallet network methods
pub fn chain_id_hex(id: u64) -> String {
    format!("0x{:x}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;
    use alloy::sol_types::{SolCall, SolError, SolEvent};

    #[test]
    fn test_selectors_match_signatures() {
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(
            ILuckyKoi::getHoldersCall::SIGNATURE,
            "getHolders(uint256,uint256)"
        );
        assert_eq!(
            ILuckyKoi::MaxHoldersReached::SELECTOR,
            keccak256("MaxHoldersReached()")[..4]
        );
        assert_eq!(
            ILuckyKoi::WinnerSelected::SIGNATURE,
            "WinnerSelected(uint256,address,uint256,uint256)"
        );
    }

    #[test]
    fn test_holder_page_call_layout() {
        let data = ILuckyKoi::getHoldersCall {
            offset: U256::from(30u64),
            limit: U256::from(15u64),
        }
        .abi_encode();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[4 + 31], 30);
        assert_eq!(data[4 + 63], 15);
    }

    #[test]
    fn test_wide_amounts_decode_in_full() {
        // 2^128 wei does not fit in 128 bits
        let wide = U256::from(1u8) << 128;
        let encoded = ILuckyKoi::getActualKoiPoolCall::abi_encode_returns(&(wide,));
        let decoded = ILuckyKoi::getActualKoiPoolCall::abi_decode_returns(&encoded, true).unwrap();
        assert_eq!(decoded.pool, wide);
        assert_eq!(decoded.pool.to_string(), "340282366920938463463374607431768211456");
        assert_eq!(small(wide), u64::MAX);
    }

    #[test]
    fn test_checksum_address() {
        let addr = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(addr.to_checksum(None), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(U256::from(1u8)), "0.000000000000000001");
        assert_eq!(format_units(U256::from(1234u64), 0), "1234");
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens("1234567000000000000000", 18), "1234.57");
        assert_eq!(format_tokens("not a number", 18), "0.00");
    }

    #[test]
    fn test_chain_id_hex_and_decimal_are_equal() {
        assert_eq!(parse_chain_id("0x38").unwrap(), parse_chain_id("56").unwrap());
        assert_eq!(chain_id_from_value(&serde_json::json!(56)).unwrap(), 56);
        assert_eq!(chain_id_from_value(&serde_json::json!("0x38")).unwrap(), 56);
        assert_eq!(chain_id_hex(56), "0x38");
        assert!(parse_chain_id("bsc").is_err());
    }
}
