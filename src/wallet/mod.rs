pub mod agent;
pub mod resolver;
pub mod session;
pub mod sources;

pub use agent::{AgentHandle, HttpAgent, SharedAgent};
pub use resolver::ProviderResolver;
pub use session::{ensure_network, Language, SessionStore, WalletSession};
pub use sources::{AgentEnvironment, AnnouncedProvider, LifecycleSignal, ProviderSource};
