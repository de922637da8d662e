#![allow(dead_code)]

use async_trait::async_trait;
use alloy::primitives::Address;
use koi_sync::chain_client::StateReader;
use koi_sync::error::{AgentError, AppError, AppResult};
use koi_sync::models::*;
use koi_sync::wallet::{AgentHandle, SessionStore, SharedAgent};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
pub const OTHER: &str = "0x2222222222222222222222222222222222222222";
pub const TOKEN: &str = "0x3333333333333333333333333333333333333333";

pub fn sample_config(token_set: bool) -> ContractConfig {
    let token = Address::from_str(TOKEN).unwrap();
    ContractConfig {
        token_address: if token_set { token } else { Address::ZERO },
        link677_address: Address::ZERO,
        link_bep20_address: Address::ZERO,
        peg_swap_address: Address::ZERO,
        swap_router: Address::ZERO,
        wrapped_native: Address::ZERO,
        min_holding: "1000".to_string(),
        full_reward_holding: "5000".to_string(),
        lottery_interval: 3600,
        max_holders: 100,
        callback_gas_limit: 500_000,
        token_set,
        token_locked: false,
        admin: Address::ZERO,
        ownership_renounced: false,
        admin_renounced: false,
        config_locked: false,
    }
}

/// Stats with a deadline relative to wall-clock now
pub fn sample_stats(secs_from_now: i64, in_progress: bool, can_trigger: bool) -> ContractStats {
    ContractStats {
        holder_count: 12,
        lottery_pool: "1.5".to_string(),
        actual_lottery_pool: "1.5".to_string(),
        next_lottery_time: chrono::Utc::now().timestamp() + secs_from_now,
        total_lotteries: 7,
        total_rewards: "10.0".to_string(),
        total_pending: "0.0".to_string(),
        can_trigger,
        in_progress,
        contract_total: "2.0".to_string(),
        readiness: if can_trigger {
            TriggerReadiness::Ready
        } else {
            TriggerReadiness::Cooldown
        },
    }
}

pub fn outcome(id: u64, winner: &str) -> OutcomeRecord {
    OutcomeRecord {
        outcome_id: id.to_string(),
        winner_address: winner.to_string(),
        reward_amount: "0.75".to_string(),
        weight_percentage: 100,
        block_number: 1_000 + id,
        proof_hash: format!("0x{:064x}", id),
    }
}

pub fn sample_community() -> CommunityStats {
    CommunityStats {
        link: LinkStats::default(),
        cleanup: Some(CleanupProgress {
            remaining: 3,
            percent: 40,
        }),
        gas_rewards: GasRewardStats::default(),
    }
}

/// In-memory `StateReader`. `None` results fail the call.
#[derive(Default)]
pub struct MockReader {
    pub config: Mutex<Option<ContractConfig>>,
    pub token: Mutex<Option<TokenMeta>>,
    pub stats: Mutex<Option<ContractStats>>,
    pub user: Mutex<UserInfo>,
    pub history: Mutex<Option<Vec<OutcomeRecord>>>,
    pub community: Mutex<Option<CommunityStats>>,
    pub holders: Mutex<Option<Vec<HolderEntry>>>,
    pub pending: Mutex<Option<PendingDetails>>,

    pub config_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub community_calls: AtomicUsize,
    pub holder_calls: AtomicUsize,
    pub last_holder_page: AtomicU64,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader with config, stats and an empty history available
    pub fn healthy() -> Self {
        let reader = Self::new();
        reader.set_config(Some(sample_config(true)));
        reader.set_stats(Some(sample_stats(100_000, false, false)));
        reader.set_history(Some(Vec::new()));
        reader
    }

    pub fn set_config(&self, config: Option<ContractConfig>) {
        *self.config.lock().unwrap() = config;
    }

    pub fn set_stats(&self, stats: Option<ContractStats>) {
        *self.stats.lock().unwrap() = stats;
    }

    pub fn set_history(&self, history: Option<Vec<OutcomeRecord>>) {
        *self.history.lock().unwrap() = history;
    }

    pub fn set_community(&self, community: Option<CommunityStats>) {
        *self.community.lock().unwrap() = community;
    }

    pub fn set_holders(&self, holders: Option<Vec<HolderEntry>>) {
        *self.holders.lock().unwrap() = holders;
    }

    pub fn set_pending(&self, pending: Option<PendingDetails>) {
        *self.pending.lock().unwrap() = pending;
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn fail(what: &str) -> AppError {
        AppError::Message(format!("{} unavailable", what))
    }
}

#[async_trait]
impl StateReader for MockReader {
    async fn fetch_config(&self) -> AppResult<ContractConfig> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        self.config.lock().unwrap().clone().ok_or_else(|| Self::fail("config"))
    }

    async fn fetch_token_meta(&self, _token: &Address) -> AppResult<TokenMeta> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().clone().ok_or_else(|| Self::fail("token"))
    }

    async fn fetch_global_stats(&self) -> AppResult<ContractStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.stats.lock().unwrap().clone().ok_or_else(|| Self::fail("stats"))
    }

    async fn fetch_user_info(&self, _account: &Address, _config: &ContractConfig) -> UserInfo {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.user.lock().unwrap().clone()
    }

    async fn fetch_outcome_history(&self) -> AppResult<Vec<OutcomeRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history.lock().unwrap().clone().ok_or_else(|| Self::fail("history"))
    }

    async fn fetch_community_stats(&self) -> AppResult<CommunityStats> {
        self.community_calls.fetch_add(1, Ordering::SeqCst);
        self.community.lock().unwrap().clone().ok_or_else(|| Self::fail("community"))
    }

    async fn fetch_holder_page(
        &self,
        page: u64,
        _config: &ContractConfig,
    ) -> AppResult<Vec<HolderEntry>> {
        self.holder_calls.fetch_add(1, Ordering::SeqCst);
        self.last_holder_page.store(page, Ordering::SeqCst);
        self.holders.lock().unwrap().clone().ok_or_else(|| Self::fail("holders"))
    }

    async fn fetch_pending_details(&self, _holder: &Address) -> AppResult<PendingDetails> {
        self.pending.lock().unwrap().clone().ok_or_else(|| Self::fail("pending"))
    }
}

/// Scripted signing agent. Each method has a queue of responses; the last
/// one repeats once the queue is down to it.
pub struct MockAgent {
    label: String,
    flags: Vec<String>,
    providers: Vec<SharedAgent>,
    responses: Mutex<HashMap<String, VecDeque<Result<Value, AgentError>>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockAgent {
    pub fn new(label: &str, flags: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            providers: Vec::new(),
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_providers(mut self, providers: Vec<SharedAgent>) -> Self {
        self.providers = providers;
        self
    }

    pub fn respond(&self, method: &str, response: Result<Value, AgentError>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<MockAgent> {
        Arc::new(self)
    }
}

#[async_trait]
impl AgentHandle for MockAgent {
    fn label(&self) -> &str {
        &self.label
    }

    fn flags(&self) -> &[String] {
        &self.flags
    }

    fn legacy_providers(&self) -> Vec<SharedAgent> {
        self.providers.clone()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AgentError> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(AgentError::with_code(-32601, format!("{} not supported", method))),
        }
    }
}

pub fn as_shared(agent: &Arc<MockAgent>) -> SharedAgent {
    agent.clone()
}

pub fn temp_session_path() -> PathBuf {
    std::env::temp_dir().join(format!("koi_session_test_{}.json", Uuid::new_v4()))
}

pub async fn temp_store() -> Arc<SessionStore> {
    Arc::new(SessionStore::load(temp_session_path()).await.unwrap())
}
