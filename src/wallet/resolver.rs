use super::agent::SharedAgent;
use super::sources::{
    AgentEnvironment, AmbientProbe, AnnouncedProvider, AnnouncementListener, GlobalBindingProbe,
    LegacyArrayProbe, ProviderSource,
};
use crate::error::{AppError, AppResult};
use crate::models::wallet::{find_wallet, LAST_RESORT_WALLET};
use crate::models::{WalletProviderDescriptor, SUPPORTED_WALLETS};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delay before the probe that catches agents injecting late
pub const LATE_PROBE_DELAY: Duration = Duration::from_secs(1);

/// Discovers signing agents and resolves a wallet id to a handle.
///
/// Sources are consulted in priority order: announcements, global
/// bindings, the legacy provider array, then the ambient agent.
pub struct ProviderResolver {
    env: Arc<AgentEnvironment>,
    announcements: Arc<AnnouncementListener>,
    sources: Vec<Arc<dyn ProviderSource>>,
    detected: RwLock<BTreeSet<&'static str>>,
    discovering: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ProviderResolver {
    pub fn new(env: Arc<AgentEnvironment>) -> Self {
        let announcements = Arc::new(AnnouncementListener::new());
        let sources: Vec<Arc<dyn ProviderSource>> = vec![
            announcements.clone(),
            Arc::new(GlobalBindingProbe::new(env.clone())),
            Arc::new(LegacyArrayProbe::new(env.clone())),
            Arc::new(AmbientProbe::new(env.clone())),
        ];
        Self {
            env,
            announcements,
            sources,
            detected: RwLock::new(BTreeSet::new()),
            discovering: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Register an extra discovery mechanism at the lowest priority
    pub fn with_source(mut self, source: Arc<dyn ProviderSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn environment(&self) -> &Arc<AgentEnvironment> {
        &self.env
    }

    /// Start passive discovery. Calling it again is a no-op.
    pub async fn discover(self: &Arc<Self>) {
        if self.discovering.swap(true, Ordering::SeqCst) {
            debug!("Discovery already running");
            return;
        }

        let mut announcements = self.env.subscribe_announcements();
        let mut lifecycle = self.env.subscribe_lifecycle();

        let resolver = self.clone();
        let listener = tokio::spawn(async move {
            loop {
                match announcements.recv().await {
                    Ok(provider) => resolver.record_announcement(provider).await,
                    Err(RecvError::Lagged(n)) => warn!("Missed {} provider announcements", n),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let resolver = self.clone();
        let late_probe = tokio::spawn(async move {
            tokio::time::sleep(LATE_PROBE_DELAY).await;
            resolver.probe().await;
        });

        let resolver = self.clone();
        let reprobe = tokio::spawn(async move {
            loop {
                match lifecycle.recv().await {
                    Ok(signal) => {
                        debug!("Re-probing agents after {:?}", signal);
                        resolver.probe().await;
                    }
                    Err(RecvError::Lagged(_)) => resolver.probe().await,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.tasks
            .lock()
            .await
            .extend([listener, late_probe, reprobe]);

        // Agents that announced before the listener existed answer this
        self.env.request_announcements();
        self.probe().await;
    }

    /// Stop the discovery listeners. The detected set is kept.
    pub async fn stop(&self) {
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
    }

    async fn record_announcement(&self, provider: AnnouncedProvider) {
        if self.announcements.record(provider).await {
            let ids = self.announcements.detect().await;
            self.merge(ids).await;
        }
    }

    /// Run every source's detection once and merge the results
    pub async fn probe(&self) {
        let mut found = Vec::new();
        for source in &self.sources {
            found.extend(source.detect().await);
        }
        self.merge(found).await;
    }

    async fn merge(&self, ids: Vec<&'static str>) {
        let mut detected = self.detected.write().await;
        for id in ids {
            if detected.insert(id) {
                info!("Wallet detected: {}", id);
            }
        }
    }

    /// Wallet ids seen so far. Only grows within a session.
    pub async fn detected(&self) -> BTreeSet<&'static str> {
        self.detected.read().await.clone()
    }

    pub async fn is_detected(&self, wallet_id: &str) -> bool {
        self.detected.read().await.contains(wallet_id)
    }

    pub async fn announced(&self) -> Vec<AnnouncedProvider> {
        self.announcements.providers().await
    }

    /// Catalog with detected wallets first, catalog order otherwise
    pub async fn sorted_wallets(&self) -> Vec<(&'static WalletProviderDescriptor, bool)> {
        let detected = self.detected.read().await;
        let mut wallets: Vec<_> = SUPPORTED_WALLETS
            .iter()
            .map(|w| (w, detected.contains(w.id)))
            .collect();
        wallets.sort_by_key(|(_, installed)| !*installed);
        wallets
    }

    /// Concrete handle for a wallet id
    pub async fn resolve(&self, wallet_id: &str) -> AppResult<SharedAgent> {
        let wallet = find_wallet(wallet_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown wallet: {}", wallet_id)))?;

        for source in &self.sources {
            if let Some(handle) = source.candidate(wallet).await {
                debug!("Wallet {} resolved via {}", wallet.id, source.name());
                return Ok(handle);
            }
        }

        if wallet.id == LAST_RESORT_WALLET {
            if let Some(ambient) = self.env.ambient().await {
                debug!("Wallet {} falling back to the ambient agent", wallet.id);
                return Ok(ambient);
            }
        }

        Err(AppError::NotFound(format!(
            "{} is not installed",
            wallet.display_name
        )))
    }
}
