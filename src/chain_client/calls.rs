//! State-changing calls the protocol contract accepts.

use super::abi::{parse_address, ILuckyKoi};
use crate::error::{AppError, AppResult};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

/// Typed write call
#[derive(Debug, Clone, PartialEq)]
pub enum ContractCall {
    Register,
    Unregister,
    ClaimPendingReward,
    RecycleStuckPending(Address),
    MaintainLinkReserve,
    UnwrapWrappedNative,
    ConvertLink,
    TriggerOutcomeSelection,
    RunCleanup { batch_size: u64 },
    CancelStuckSelection,
    /// Admin only; values in whole tokens
    SetHoldingThresholds { min: U256, full: U256 },
    ReportInvalid(Address),
}

impl ContractCall {
    /// Contract method name
    pub fn method_name(&self) -> &'static str {
        match self {
            ContractCall::Register => "register",
            ContractCall::Unregister => "unregister",
            ContractCall::ClaimPendingReward => "claimPendingReward",
            ContractCall::RecycleStuckPending(_) => "recycleStuckPending",
            ContractCall::MaintainLinkReserve => "maintainLink",
            ContractCall::UnwrapWrappedNative => "unwrapAllWBNB",
            ContractCall::ConvertLink => "convertLink",
            ContractCall::TriggerOutcomeSelection => "triggerKoiStrict",
            ContractCall::RunCleanup { .. } => "cleanup",
            ContractCall::CancelStuckSelection => "cancelStuckKoi",
            ContractCall::SetHoldingThresholds { .. } => "setHoldingRequirements",
            ContractCall::ReportInvalid(_) => "reportInvalid",
        }
    }

    /// Canonical signature used for the selector
    pub fn signature(&self) -> &'static str {
        match self {
            ContractCall::Register => ILuckyKoi::registerCall::SIGNATURE,
            ContractCall::Unregister => ILuckyKoi::unregisterCall::SIGNATURE,
            ContractCall::ClaimPendingReward => ILuckyKoi::claimPendingRewardCall::SIGNATURE,
            ContractCall::RecycleStuckPending(_) => ILuckyKoi::recycleStuckPendingCall::SIGNATURE,
            ContractCall::MaintainLinkReserve => ILuckyKoi::maintainLinkCall::SIGNATURE,
            ContractCall::UnwrapWrappedNative => ILuckyKoi::unwrapAllWBNBCall::SIGNATURE,
            ContractCall::ConvertLink => ILuckyKoi::convertLinkCall::SIGNATURE,
            ContractCall::TriggerOutcomeSelection => ILuckyKoi::triggerKoiStrictCall::SIGNATURE,
            ContractCall::RunCleanup { .. } => ILuckyKoi::cleanupCall::SIGNATURE,
            ContractCall::CancelStuckSelection => ILuckyKoi::cancelStuckKoiCall::SIGNATURE,
            ContractCall::SetHoldingThresholds { .. } => {
                ILuckyKoi::setHoldingRequirementsCall::SIGNATURE
            }
            ContractCall::ReportInvalid(_) => ILuckyKoi::reportInvalidCall::SIGNATURE,
        }
    }

    /// ABI-encoded calldata
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ContractCall::Register => ILuckyKoi::registerCall {}.abi_encode(),
            ContractCall::Unregister => ILuckyKoi::unregisterCall {}.abi_encode(),
            ContractCall::ClaimPendingReward => ILuckyKoi::claimPendingRewardCall {}.abi_encode(),
            ContractCall::RecycleStuckPending(holder) => {
                ILuckyKoi::recycleStuckPendingCall { holder: *holder }.abi_encode()
            }
            ContractCall::MaintainLinkReserve => ILuckyKoi::maintainLinkCall {}.abi_encode(),
            ContractCall::UnwrapWrappedNative => ILuckyKoi::unwrapAllWBNBCall {}.abi_encode(),
            ContractCall::ConvertLink => ILuckyKoi::convertLinkCall {}.abi_encode(),
            ContractCall::TriggerOutcomeSelection => ILuckyKoi::triggerKoiStrictCall {}.abi_encode(),
            ContractCall::RunCleanup { batch_size } => ILuckyKoi::cleanupCall {
                batchSize: U256::from(*batch_size),
            }
            .abi_encode(),
            ContractCall::CancelStuckSelection => ILuckyKoi::cancelStuckKoiCall {}.abi_encode(),
            ContractCall::SetHoldingThresholds { min, full } => {
                ILuckyKoi::setHoldingRequirementsCall {
                    minHolding: *min,
                    fullRewardHolding: *full,
                }
                .abi_encode()
            }
            ContractCall::ReportInvalid(holder) => {
                ILuckyKoi::reportInvalidCall { holder: *holder }.abi_encode()
            }
        }
    }

    /// Calls the contract refuses while a selection round is running
    pub fn is_roster_sensitive(&self) -> bool {
        matches!(
            self,
            ContractCall::Register
                | ContractCall::Unregister
                | ContractCall::ReportInvalid(_)
                | ContractCall::RunCleanup { .. }
        )
    }

    pub fn is_admin_only(&self) -> bool {
        matches!(self, ContractCall::SetHoldingThresholds { .. })
    }

    /// Build from a method name and string arguments
    pub fn from_method(name: &str, args: &[String]) -> AppResult<Self> {
        let arg = |i: usize| {
            args.get(i)
                .map(String::as_str)
                .ok_or_else(|| AppError::Validation(format!("{} expects argument {}", name, i + 1)))
        };
        let uint = |i: usize| -> AppResult<U256> {
            let raw = arg(i)?;
            U256::from_str_radix(raw.trim(), 10)
                .map_err(|e| AppError::Validation(format!("Invalid number {}: {}", raw, e)))
        };

        let call = match name {
            "register" => ContractCall::Register,
            "unregister" => ContractCall::Unregister,
            "claimPendingReward" => ContractCall::ClaimPendingReward,
            "recycleStuckPending" => ContractCall::RecycleStuckPending(parse_address(arg(0)?)?),
            "maintainLink" => ContractCall::MaintainLinkReserve,
            "unwrapAllWBNB" => ContractCall::UnwrapWrappedNative,
            "convertLink" => ContractCall::ConvertLink,
            "triggerKoiStrict" => ContractCall::TriggerOutcomeSelection,
            "cleanup" => ContractCall::RunCleanup {
                batch_size: u64::try_from(uint(0)?)
                    .map_err(|_| AppError::Validation("Batch size too large".to_string()))?,
            },
            "cancelStuckKoi" => ContractCall::CancelStuckSelection,
            "setHoldingRequirements" => ContractCall::SetHoldingThresholds {
                min: uint(0)?,
                full: uint(1)?,
            },
            "reportInvalid" => ContractCall::ReportInvalid(parse_address(arg(0)?)?),
            other => return Err(AppError::Validation(format!("Unknown method: {}", other))),
        };
        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures() {
        assert_eq!(ContractCall::Register.signature(), "register()");
        assert_eq!(
            ContractCall::RunCleanup { batch_size: 50 }.signature(),
            "cleanup(uint256)"
        );
        assert_eq!(
            ContractCall::SetHoldingThresholds {
                min: U256::from(1u64),
                full: U256::from(2u64)
            }
            .signature(),
            "setHoldingRequirements(uint256,uint256)"
        );
    }

    #[test]
    fn test_encoding_starts_with_selector() {
        let encoded = ContractCall::Register.encode();
        assert_eq!(encoded, ILuckyKoi::registerCall::SELECTOR.to_vec());

        let holder = Address::repeat_byte(0x42);
        let encoded = ContractCall::ReportInvalid(holder).encode();
        assert_eq!(encoded.len(), 36);
        assert_eq!(&encoded[16..], holder.as_slice());
    }

    #[test]
    fn test_from_method_parses_args() {
        let call = ContractCall::from_method("cleanup", &["50".to_string()]).unwrap();
        assert_eq!(call, ContractCall::RunCleanup { batch_size: 50 });
        assert_eq!(call.encode().len(), 36);

        let addr = "0x76d12acfDdd69979A9f24BDaB07687731Cb78213".to_string();
        let call = ContractCall::from_method("recycleStuckPending", &[addr]).unwrap();
        assert!(matches!(call, ContractCall::RecycleStuckPending(_)));

        // Thresholds above 128 bits are accepted as-is
        let huge = (U256::from(1u8) << 200usize).to_string();
        let call =
            ContractCall::from_method("setHoldingRequirements", &[huge.clone(), huge]).unwrap();
        assert!(matches!(call, ContractCall::SetHoldingThresholds { .. }));

        assert!(ContractCall::from_method("cleanup", &[]).is_err());
        assert!(ContractCall::from_method("cleanup", &["-1".to_string()]).is_err());
        assert!(ContractCall::from_method("selfDestruct", &[]).is_err());
    }

    #[test]
    fn test_roster_sensitivity() {
        assert!(ContractCall::Register.is_roster_sensitive());
        assert!(!ContractCall::ClaimPendingReward.is_roster_sensitive());
        assert!(ContractCall::SetHoldingThresholds {
            min: U256::from(1u64),
            full: U256::from(2u64)
        }
        .is_admin_only());
    }
}
