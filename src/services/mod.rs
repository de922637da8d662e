pub mod countdown;
pub mod executor;
pub mod poller;
pub mod reconciler;

pub use countdown::{display_phase, Countdown, CountdownDeriver, DisplayPhase};
pub use executor::{TransactionExecutor, TxReceipt};
pub use poller::{AdaptivePoller, PollerHandle};
pub use reconciler::{EventReconciler, PollCycleState};
