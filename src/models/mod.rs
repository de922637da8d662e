//! Read-models for the Lucky Koi protocol client.
//!
//! Every snapshot here is produced by the chain reader with amounts already
//! normalised to decimal strings, and replaced wholesale on refresh.

pub mod community;
pub mod contract;
pub mod holder;
pub mod outcome;
pub mod stats;
pub mod user;
pub mod view;
pub mod wallet;

pub use community::{CleanupProgress, CommunityStats, GasRewardStats, LinkStats, PendingDetails};
pub use contract::{ContractConfig, TokenMeta};
pub use holder::HolderEntry;
pub use outcome::{OutcomeRecord, RevealMode, RevealSignal};
pub use stats::{ContractStats, TriggerReadiness};
pub use user::UserInfo;
pub use view::{ActiveView, ViewSelection};
pub use wallet::{WalletProviderDescriptor, SUPPORTED_WALLETS};
