//! Discovery mechanisms for signing agents.
//!
//! Each `ProviderSource` reports which catalog wallets it can see and,
//! given a wallet, the handle it would hand out. The resolver composes
//! them in priority order.

use super::agent::SharedAgent;
use crate::models::wallet::{foreign_flags, wallet_for_namespace, GENERIC_WALLET, LAST_RESORT_WALLET};
use crate::models::{WalletProviderDescriptor, SUPPORTED_WALLETS};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// An agent that announced itself with a namespace string
#[derive(Debug, Clone)]
pub struct AnnouncedProvider {
    pub uuid: String,
    /// Reverse-DNS style namespace, e.g. `io.metamask`
    pub rdns: String,
    pub handle: SharedAgent,
}

/// Passive host signals after which agents may have injected late
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    AgentInitialized,
    Loaded,
}

/// What the host exposes for agent discovery: an ambient agent, named
/// global bindings, an announcement channel and lifecycle signals.
///
/// Agents that announced once answer every later announcement request, so
/// a listener attached after the first announcement still sees them.
pub struct AgentEnvironment {
    ambient: RwLock<Option<SharedAgent>>,
    globals: RwLock<HashMap<String, SharedAgent>>,
    announcers: std::sync::RwLock<Vec<AnnouncedProvider>>,
    announce_tx: broadcast::Sender<AnnouncedProvider>,
    request_tx: broadcast::Sender<()>,
    lifecycle_tx: broadcast::Sender<LifecycleSignal>,
}

impl AgentEnvironment {
    pub fn new() -> Self {
        let (announce_tx, _) = broadcast::channel(32);
        let (request_tx, _) = broadcast::channel(8);
        let (lifecycle_tx, _) = broadcast::channel(8);
        Self {
            ambient: RwLock::new(None),
            globals: RwLock::new(HashMap::new()),
            announcers: std::sync::RwLock::new(Vec::new()),
            announce_tx,
            request_tx,
            lifecycle_tx,
        }
    }

    pub async fn ambient(&self) -> Option<SharedAgent> {
        self.ambient.read().await.clone()
    }

    pub async fn set_ambient(&self, agent: Option<SharedAgent>) {
        *self.ambient.write().await = agent;
    }

    pub async fn global(&self, name: &str) -> Option<SharedAgent> {
        self.globals.read().await.get(name).cloned()
    }

    pub async fn install_global(&self, name: impl Into<String>, agent: SharedAgent) {
        self.globals.write().await.insert(name.into(), agent);
    }

    /// Announce an agent to every listener. Nobody listening is fine; the
    /// agent is remembered and answers later requests.
    pub fn announce(&self, provider: AnnouncedProvider) {
        if let Ok(mut announcers) = self.announcers.write() {
            if !announcers.iter().any(|p| p.uuid == provider.uuid) {
                announcers.push(provider.clone());
            }
        }
        self.broadcast(provider);
    }

    /// Ask every agent that has announced to announce again
    pub fn request_announcements(&self) {
        let _ = self.request_tx.send(());
        let announcers = match self.announcers.read() {
            Ok(announcers) => announcers.clone(),
            Err(_) => return,
        };
        debug!("Announcement requested, {} agent(s) answering", announcers.len());
        for provider in announcers {
            self.broadcast(provider);
        }
    }

    fn broadcast(&self, provider: AnnouncedProvider) {
        if self.announce_tx.send(provider).is_err() {
            debug!("Provider announcement dropped: no listeners");
        }
    }

    pub fn subscribe_announcements(&self) -> broadcast::Receiver<AnnouncedProvider> {
        self.announce_tx.subscribe()
    }

    /// Announcement requests, for agents that answer them on their own
    pub fn subscribe_requests(&self) -> broadcast::Receiver<()> {
        self.request_tx.subscribe()
    }

    pub fn signal(&self, signal: LifecycleSignal) {
        let _ = self.lifecycle_tx.send(signal);
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleSignal> {
        self.lifecycle_tx.subscribe()
    }
}

impl Default for AgentEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait ProviderSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Catalog ids this source currently sees
    async fn detect(&self) -> Vec<&'static str>;

    /// Handle this source would use for the wallet
    async fn candidate(&self, wallet: &WalletProviderDescriptor) -> Option<SharedAgent>;
}

/// Collects announced providers, deduplicated by uuid, in arrival order
#[derive(Default)]
pub struct AnnouncementListener {
    providers: RwLock<Vec<AnnouncedProvider>>,
}

impl AnnouncementListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the uuid was already known
    pub async fn record(&self, provider: AnnouncedProvider) -> bool {
        let mut providers = self.providers.write().await;
        if providers.iter().any(|p| p.uuid == provider.uuid) {
            return false;
        }
        debug!("Provider announced: {} ({})", provider.rdns, provider.uuid);
        providers.push(provider);
        true
    }

    pub async fn providers(&self) -> Vec<AnnouncedProvider> {
        self.providers.read().await.clone()
    }
}

#[async_trait]
impl ProviderSource for AnnouncementListener {
    fn name(&self) -> &'static str {
        "announcement"
    }

    async fn detect(&self) -> Vec<&'static str> {
        let providers = self.providers.read().await;
        let mut ids: Vec<&'static str> = providers
            .iter()
            .filter_map(|p| wallet_for_namespace(&p.rdns).map(|w| w.id))
            .collect();
        if !providers.is_empty() {
            ids.push(GENERIC_WALLET);
        }
        ids
    }

    async fn candidate(&self, wallet: &WalletProviderDescriptor) -> Option<SharedAgent> {
        let keyword = wallet.keyword?;
        self.providers
            .read()
            .await
            .iter()
            .find(|p| p.rdns.to_lowercase().contains(keyword))
            .map(|p| p.handle.clone())
    }
}

/// Looks for well-known global bindings
pub struct GlobalBindingProbe {
    env: Arc<AgentEnvironment>,
}

impl GlobalBindingProbe {
    pub fn new(env: Arc<AgentEnvironment>) -> Self {
        Self { env }
    }

    /// TokenPocket may take over the ambient binding instead of its own
    async fn tokenpocket_ambient(&self) -> Option<SharedAgent> {
        self.env
            .ambient()
            .await
            .filter(|agent| agent.has_flag("isTokenPocket"))
    }
}

#[async_trait]
impl ProviderSource for GlobalBindingProbe {
    fn name(&self) -> &'static str {
        "global-binding"
    }

    async fn detect(&self) -> Vec<&'static str> {
        let mut ids = Vec::new();
        for wallet in SUPPORTED_WALLETS {
            if wallet.id == LAST_RESORT_WALLET && self.tokenpocket_ambient().await.is_some() {
                ids.push(wallet.id);
                continue;
            }
            if let Some(binding) = wallet.global_binding {
                if self.env.global(binding).await.is_some() {
                    ids.push(wallet.id);
                }
            }
        }
        ids
    }

    async fn candidate(&self, wallet: &WalletProviderDescriptor) -> Option<SharedAgent> {
        if wallet.id == LAST_RESORT_WALLET {
            if let Some(agent) = self.tokenpocket_ambient().await {
                return Some(agent);
            }
        }
        self.env.global(wallet.global_binding?).await
    }
}

/// Searches the multi-provider array some ambient agents expose
pub struct LegacyArrayProbe {
    env: Arc<AgentEnvironment>,
}

impl LegacyArrayProbe {
    pub fn new(env: Arc<AgentEnvironment>) -> Self {
        Self { env }
    }

    async fn providers(&self) -> Vec<SharedAgent> {
        match self.env.ambient().await {
            Some(ambient) => ambient.legacy_providers(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl ProviderSource for LegacyArrayProbe {
    fn name(&self) -> &'static str {
        "legacy-array"
    }

    async fn detect(&self) -> Vec<&'static str> {
        let providers = self.providers().await;
        SUPPORTED_WALLETS
            .iter()
            .filter(|w| providers.iter().any(|p| p.has_flag(w.detect_flag)))
            .map(|w| w.id)
            .collect()
    }

    async fn candidate(&self, wallet: &WalletProviderDescriptor) -> Option<SharedAgent> {
        let providers = self.providers().await;
        if wallet.id == "metamask" {
            // Other wallets often set isMetaMask too; prefer the real one
            let genuine = providers.iter().find(|p| {
                p.has_flag("isMetaMask") && !foreign_flags().any(|flag| p.has_flag(flag))
            });
            if let Some(agent) = genuine {
                return Some(agent.clone());
            }
        }
        providers
            .iter()
            .find(|p| p.has_flag(wallet.detect_flag))
            .cloned()
    }
}

/// Falls back to the single ambient agent when its flags match
pub struct AmbientProbe {
    env: Arc<AgentEnvironment>,
}

impl AmbientProbe {
    pub fn new(env: Arc<AgentEnvironment>) -> Self {
        Self { env }
    }
}

#[async_trait]
impl ProviderSource for AmbientProbe {
    fn name(&self) -> &'static str {
        "ambient"
    }

    async fn detect(&self) -> Vec<&'static str> {
        let Some(ambient) = self.env.ambient().await else {
            return Vec::new();
        };
        let mut ids = vec![GENERIC_WALLET];
        ids.extend(
            SUPPORTED_WALLETS
                .iter()
                .filter(|w| w.id != GENERIC_WALLET && ambient.has_flag(w.detect_flag))
                .map(|w| w.id),
        );
        ids
    }

    async fn candidate(&self, wallet: &WalletProviderDescriptor) -> Option<SharedAgent> {
        self.env
            .ambient()
            .await
            .filter(|ambient| wallet.id == GENERIC_WALLET || ambient.has_flag(wallet.detect_flag))
    }
}
