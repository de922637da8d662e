//! Chain client for the protocol contract.
//!
//! Reads go straight to the configured endpoint through an alloy provider;
//! writes are encoded here but submitted through a signing agent (see
//! `wallet`).

pub mod abi;
pub mod calls;
pub mod reader;

pub use abi::{IERC20, ILuckyKoi};
pub use calls::ContractCall;
pub use reader::{ContractReader, StateReader};
