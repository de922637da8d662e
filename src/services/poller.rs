use crate::chain_client::abi::parse_address;
use crate::chain_client::StateReader;
use crate::models::{ActiveView, ContractConfig, ContractStats, UserInfo};
use crate::services::reconciler::EventReconciler;
use crate::state_manager::SyncState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

pub const URGENT_DELAY: Duration = Duration::from_millis(3000);
pub const IDLE_DELAY: Duration = Duration::from_millis(10_000);
/// Seconds before the deadline from which polling speeds up
pub const URGENCY_WINDOW_SECS: i64 = 60;

/// Whether stale data is costly right now. No stats yet means not urgent.
pub fn is_urgent(stats: Option<&ContractStats>, now: i64) -> bool {
    match stats {
        Some(stats) => {
            let remaining = stats.next_lottery_time - now;
            stats.in_progress
                || stats.can_trigger
                || (0..URGENCY_WINDOW_SECS).contains(&remaining)
        }
        None => false,
    }
}

pub fn next_delay(stats: Option<&ContractStats>, now: i64) -> Duration {
    if is_urgent(stats, now) {
        URGENT_DELAY
    } else {
        IDLE_DELAY
    }
}

/// Drives the read side: repeated poll cycles with an urgency-driven delay
/// plus out-of-cadence refreshes for view changes and confirmed writes.
pub struct AdaptivePoller<R: StateReader> {
    reader: Arc<R>,
    state: Arc<SyncState>,
    reconciler: Mutex<EventReconciler>,
    alive: Arc<AtomicBool>,
}

impl<R: StateReader> AdaptivePoller<R> {
    pub fn new(reader: Arc<R>, state: Arc<SyncState>) -> Self {
        Self {
            reader,
            state,
            reconciler: Mutex::new(EventReconciler::new()),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn state(&self) -> &Arc<SyncState> {
        &self.state
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Stop committing results. In-flight fetches finish but are discarded.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Run one full cycle and return the delay before the next one
    pub async fn run_cycle(&self) -> Duration {
        if let Some(config) = self.ensure_config().await {
            let selection = self.state.view();
            let community = selection.view == ActiveView::Community;
            let holders = selection.view == ActiveView::Holders;

            tokio::join!(
                self.refresh_global(&config),
                self.refresh_history(),
                async {
                    if community {
                        self.refresh_community().await;
                    }
                },
                async {
                    if holders {
                        self.refresh_holders(selection.holders_page, &config).await;
                    }
                },
            );
        }

        let stats = self.state.stats().await;
        next_delay(stats.as_ref(), chrono::Utc::now().timestamp())
    }

    /// Out-of-cadence refresh of the global read-model and the active
    /// view's read-model. History is left to the main cadence.
    pub async fn refresh_now(&self) {
        let Some(config) = self.state.config().await else {
            debug!("Immediate refresh skipped: config not loaded");
            return;
        };
        tokio::join!(self.refresh_global(&config), self.refresh_view());
    }

    /// Fetch whatever the active view needs, if anything
    pub async fn refresh_view(&self) {
        let selection = self.state.view();
        match selection.view {
            ActiveView::Community => self.refresh_community().await,
            ActiveView::Holders => match self.state.config().await {
                Some(config) => self.refresh_holders(selection.holders_page, &config).await,
                None => debug!("Holder page skipped: config not loaded"),
            },
            _ => {}
        }
    }

    /// Config is fetched until it has been obtained once. Token metadata
    /// follows right after and its failure is absorbed.
    async fn ensure_config(&self) -> Option<ContractConfig> {
        if let Some(config) = self.state.config().await {
            return Some(config);
        }

        let config = match self.reader.fetch_config().await {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to fetch contract config: {}", e);
                return None;
            }
        };
        if !self.is_alive() {
            return None;
        }
        self.state.set_config(config.clone()).await;
        info!("Contract config loaded (token set: {})", config.token_set);

        if config.has_token() {
            match self.reader.fetch_token_meta(&config.token_address).await {
                Ok(meta) if self.is_alive() => {
                    debug!("Token metadata: {} / {} decimals", meta.symbol, meta.decimals);
                    self.state.set_token(meta).await;
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to fetch token metadata, using defaults: {}", e),
            }
        }
        Some(config)
    }

    /// User info is read only once global stats came back
    async fn refresh_global(&self, config: &ContractConfig) {
        let stats = match self.reader.fetch_global_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Failed to fetch global stats: {}", e);
                return;
            }
        };
        if !self.is_alive() {
            return;
        }
        self.state.set_stats(stats).await;

        let user = self.fetch_user(config).await;
        if !self.is_alive() {
            return;
        }
        self.state.set_user(user).await;
    }

    async fn fetch_user(&self, config: &ContractConfig) -> Option<UserInfo> {
        if !config.token_set {
            return None;
        }
        let account = self.state.account().await?;
        match parse_address(&account) {
            Ok(address) => Some(self.reader.fetch_user_info(&address, config).await),
            Err(e) => {
                warn!("Observer account {} is not an address: {}", account, e);
                None
            }
        }
    }

    async fn refresh_history(&self) {
        let records = match self.reader.fetch_outcome_history().await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to fetch outcome history: {}", e);
                return;
            }
        };
        if !self.is_alive() {
            return;
        }

        let observer = self.state.account().await;
        let signal = self
            .reconciler
            .lock()
            .await
            .observe(&records, observer.as_deref());
        self.state.set_history(records).await;

        if let Some(signal) = signal {
            info!(
                "New outcome #{} won by {} ({})",
                signal.record.outcome_id,
                signal.record.winner_address,
                signal.mode.as_str()
            );
            self.state.publish_reveal(signal);
        }
    }

    async fn refresh_community(&self) {
        match self.reader.fetch_community_stats().await {
            Ok(community) if self.is_alive() => self.state.set_community(community).await,
            Ok(_) => {}
            Err(e) => error!("Failed to fetch community stats: {}", e),
        }
    }

    async fn refresh_holders(&self, page: u64, config: &ContractConfig) {
        match self.reader.fetch_holder_page(page, config).await {
            Ok(holders) if self.is_alive() => self.state.set_holders(holders).await,
            Ok(_) => {}
            Err(e) => error!("Failed to fetch holder page {}: {}", page, e),
        }
    }

    /// Start the self-rescheduling cycle loop. The next cycle is scheduled
    /// only after the previous one completes.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let alive = self.alive.clone();
        let task = tokio::spawn(async move {
            info!("Adaptive poller started");
            while self.is_alive() {
                let delay = self.run_cycle().await;
                debug!("Next poll cycle in {:?}", delay);
                time::sleep(delay).await;
            }
            info!("Adaptive poller stopped");
        });
        PollerHandle { alive, task }
    }

    /// Follow view and page changes with an immediate view-specific fetch
    pub fn spawn_view_watcher(self: Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.state.subscribe_view();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if !self.is_alive() {
                    break;
                }
                let selection = *rx.borrow_and_update();
                debug!(
                    "View changed to {} (page {})",
                    selection.view.as_str(),
                    selection.holders_page
                );
                self.refresh_view().await;
            }
        })
    }
}

/// Handle to the running cycle loop
pub struct PollerHandle {
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Clear the liveness flag and cancel the scheduled cycle
    pub async fn stop(self) {
        self.alive.store(false, Ordering::SeqCst);
        self.task.abort();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Poller task failed: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
