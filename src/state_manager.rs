use crate::models::{
    ActiveView, CommunityStats, ContractConfig, ContractStats, HolderEntry, OutcomeRecord,
    RevealSignal, TokenMeta, UserInfo, ViewSelection,
};
use tokio::sync::{broadcast, watch, RwLock};
use tracing::debug;

/// All read-models, as seen by presentation
#[derive(Debug, Clone, Default)]
pub struct ReadModels {
    pub config: Option<ContractConfig>,
    pub token: TokenMeta,
    pub stats: Option<ContractStats>,
    pub user: Option<UserInfo>,
    pub history: Vec<OutcomeRecord>,
    pub community: Option<CommunityStats>,
    pub holders: Vec<HolderEntry>,
}

/// Single state holder for the synchronization core.
///
/// The poller, the executor and presentation all read the latest values
/// from here instead of capturing copies. Every setter replaces one
/// read-model as a whole.
pub struct SyncState {
    models: RwLock<ReadModels>,
    account: RwLock<Option<String>>,
    view_tx: watch::Sender<ViewSelection>,
    reveal_tx: broadcast::Sender<RevealSignal>,
}

impl SyncState {
    pub fn new() -> Self {
        let (view_tx, _) = watch::channel(ViewSelection::default());
        let (reveal_tx, _) = broadcast::channel(16);

        Self {
            models: RwLock::new(ReadModels::default()),
            account: RwLock::new(None),
            view_tx,
            reveal_tx,
        }
    }

    /// Clone of every read-model
    pub async fn snapshot(&self) -> ReadModels {
        self.models.read().await.clone()
    }

    pub async fn config(&self) -> Option<ContractConfig> {
        self.models.read().await.config.clone()
    }

    pub async fn stats(&self) -> Option<ContractStats> {
        self.models.read().await.stats.clone()
    }

    pub async fn history(&self) -> Vec<OutcomeRecord> {
        self.models.read().await.history.clone()
    }

    pub async fn set_config(&self, config: ContractConfig) {
        self.models.write().await.config = Some(config);
    }

    pub async fn set_token(&self, token: TokenMeta) {
        self.models.write().await.token = token;
    }

    pub async fn set_stats(&self, stats: ContractStats) {
        self.models.write().await.stats = Some(stats);
    }

    pub async fn set_user(&self, user: Option<UserInfo>) {
        self.models.write().await.user = user;
    }

    pub async fn set_history(&self, history: Vec<OutcomeRecord>) {
        self.models.write().await.history = history;
    }

    pub async fn set_community(&self, community: CommunityStats) {
        self.models.write().await.community = Some(community);
    }

    pub async fn set_holders(&self, holders: Vec<HolderEntry>) {
        self.models.write().await.holders = holders;
    }

    /// Connected account used as observer identity
    pub async fn account(&self) -> Option<String> {
        self.account.read().await.clone()
    }

    pub async fn set_account(&self, account: Option<String>) {
        debug!("Observer identity set to {:?}", account);
        *self.account.write().await = account;
    }

    pub fn view(&self) -> ViewSelection {
        *self.view_tx.borrow()
    }

    pub fn select_view(&self, view: ActiveView) {
        self.view_tx.send_if_modified(|current| {
            let changed = current.view != view;
            current.view = view;
            changed
        });
    }

    pub fn select_holders_page(&self, page: u64) {
        self.view_tx.send_if_modified(|current| {
            let changed = current.holders_page != page;
            current.holders_page = page;
            changed
        });
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ViewSelection> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_reveals(&self) -> broadcast::Receiver<RevealSignal> {
        self.reveal_tx.subscribe()
    }

    /// Publish a reveal. Having no subscriber is not an error.
    pub fn publish_reveal(&self, signal: RevealSignal) {
        if self.reveal_tx.send(signal).is_err() {
            debug!("Reveal signal dropped: no subscribers");
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
