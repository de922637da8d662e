use super::agent::SharedAgent;
use super::resolver::ProviderResolver;
use crate::chain_client::abi::{chain_id_from_value, chain_id_hex};
use crate::config::ChainSettings;
use crate::error::{AgentError, AppError, AppResult, ErrorKind, TxError};
use crate::state_manager::SyncState;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Storage key of the "was connected last session" flag
pub const CONNECTED_KEY: &str = "lucky_protocol_connected";
pub const LANGUAGE_KEY: &str = "app_lang";

/// Agent error codes meaning the chain is unknown to the wallet
const UNKNOWN_CHAIN_CODES: [i64; 2] = [4902, -32603];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Default from a POSIX locale string such as `zh_CN.UTF-8`
    pub fn from_locale(locale: &str) -> Self {
        if locale.to_lowercase().starts_with("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(AppError::Validation(format!("Unsupported language: {}", other))),
        }
    }
}

/// Small persisted key/value file for client state
pub struct SessionStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl SessionStore {
    /// Open the store. A missing file is an empty store.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Session store loaded from {}", path.display());
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.into());
        self.persist(&entries).await
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    pub async fn was_connected(&self) -> bool {
        self.get(CONNECTED_KEY).await.as_deref() == Some("true")
    }

    pub async fn set_connected(&self, connected: bool) -> AppResult<()> {
        if connected {
            self.set(CONNECTED_KEY, "true").await
        } else {
            self.remove(CONNECTED_KEY).await
        }
    }

    /// Stored language, else derived from the locale
    pub async fn language(&self, locale: &str) -> Language {
        self.get(LANGUAGE_KEY)
            .await
            .and_then(|s| s.parse::<Language>().ok())
            .unwrap_or_else(|| Language::from_locale(locale))
    }

    pub async fn set_language(&self, language: Language) -> AppResult<()> {
        self.set(LANGUAGE_KEY, language.as_str()).await
    }
}

/// Current chain id of an agent, hex or decimal
pub async fn agent_chain_id(agent: &SharedAgent) -> Result<u64, TxError> {
    let raw = agent.request("eth_chainId", json!([])).await?;
    chain_id_from_value(&raw).map_err(|e| TxError::Rejected {
        kind: ErrorKind::Unknown,
        detail: e.to_string(),
    })
}

fn is_unknown_chain(err: &AgentError) -> bool {
    err.code.map_or(false, |c| UNKNOWN_CHAIN_CODES.contains(&c))
}

/// Make sure the agent is on the required network.
///
/// On mismatch: ask to switch; if the wallet does not know the chain,
/// register it and switch again. Fails with `NetworkMismatch` when the
/// agent still reports another chain afterwards.
pub async fn ensure_network(agent: &SharedAgent, chain: &ChainSettings) -> Result<(), TxError> {
    let current = agent_chain_id(agent).await?;
    if current == chain.chain_id {
        return Ok(());
    }

    info!(
        "Agent {} on chain {}, switching to {}",
        agent.label(),
        current,
        chain.chain_id
    );
    let target = chain_id_hex(chain.chain_id);
    let switch_params = json!([{ "chainId": target }]);

    match agent
        .request("wallet_switchEthereumChain", switch_params.clone())
        .await
    {
        Ok(_) => {}
        Err(e) if is_unknown_chain(&e) => {
            let add_params = json!([{
                "chainId": target,
                "chainName": chain.network.chain_name,
                "nativeCurrency": {
                    "name": chain.network.currency_name,
                    "symbol": chain.network.currency_symbol,
                    "decimals": chain.network.currency_decimals,
                },
                "rpcUrls": chain.network.rpc_urls,
                "blockExplorerUrls": chain.network.explorer_urls,
            }]);
            match agent.request("wallet_addEthereumChain", add_params).await {
                Ok(_) => {
                    if let Err(e) = agent
                        .request("wallet_switchEthereumChain", switch_params)
                        .await
                    {
                        warn!("Switch after adding network failed: {}", e);
                    }
                }
                Err(e) => warn!("Adding network failed: {}", e),
            }
        }
        Err(e) => warn!("Network switch failed: {}", e),
    }

    let actual = agent_chain_id(agent).await?;
    if actual == chain.chain_id {
        Ok(())
    } else {
        Err(TxError::NetworkMismatch {
            expected: chain.chain_id,
            actual,
        })
    }
}

fn first_account(value: &Value) -> Option<String> {
    value
        .as_array()
        .and_then(|accounts| accounts.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Connection state: the chosen agent and the persisted flag
pub struct WalletSession {
    resolver: Arc<ProviderResolver>,
    store: Arc<SessionStore>,
    state: Arc<SyncState>,
    chain: ChainSettings,
    handle: RwLock<Option<SharedAgent>>,
}

impl WalletSession {
    pub fn new(
        resolver: Arc<ProviderResolver>,
        store: Arc<SessionStore>,
        state: Arc<SyncState>,
        chain: ChainSettings,
    ) -> Self {
        Self {
            resolver,
            store,
            state,
            chain,
            handle: RwLock::new(None),
        }
    }

    pub fn chain(&self) -> &ChainSettings {
        &self.chain
    }

    /// Agent used for writes, if connected
    pub async fn handle(&self) -> Option<SharedAgent> {
        self.handle.read().await.clone()
    }

    pub async fn account(&self) -> Option<String> {
        self.state.account().await
    }

    /// Resolve the wallet, request accounts, ensure the network and
    /// remember the connection. Returns the connected account.
    pub async fn connect(&self, wallet_id: &str) -> Result<String, TxError> {
        let agent = self.resolver.resolve(wallet_id).await.map_err(|e| match e {
            AppError::NotFound(detail) => TxError::Rejected {
                kind: ErrorKind::WalletNotFound,
                detail,
            },
            other => TxError::Rejected {
                kind: ErrorKind::Unknown,
                detail: other.to_string(),
            },
        })?;

        let accounts = agent.request("eth_requestAccounts", json!([])).await?;
        let account = first_account(&accounts)
            .ok_or_else(|| AgentError::new("Agent returned no accounts"))?;

        *self.handle.write().await = Some(agent.clone());
        self.state.set_account(Some(account.clone())).await;

        ensure_network(&agent, &self.chain).await?;

        if let Err(e) = self.store.set_connected(true).await {
            warn!("Failed to persist connection flag: {}", e);
        }
        info!("Connected {} via {}", account, wallet_id);
        Ok(account)
    }

    /// Silently restore last session's account from the ambient agent.
    /// Clears the flag when nothing can be restored.
    pub async fn restore(&self) -> Option<String> {
        if !self.store.was_connected().await {
            return None;
        }
        let ambient = self.resolver.environment().ambient().await?;

        let restored = match ambient.request("eth_accounts", json!([])).await {
            Ok(accounts) => first_account(&accounts),
            Err(e) => {
                debug!("eth_accounts failed during restore: {}", e);
                None
            }
        };

        match restored {
            Some(account) => {
                *self.handle.write().await = Some(ambient);
                self.state.set_account(Some(account.clone())).await;
                info!("Restored session for {}", account);
                Some(account)
            }
            None => {
                if let Err(e) = self.store.set_connected(false).await {
                    warn!("Failed to clear connection flag: {}", e);
                }
                None
            }
        }
    }

    pub async fn disconnect(&self) {
        *self.handle.write().await = None;
        self.state.set_account(None).await;
        self.state.set_user(None).await;
        if let Err(e) = self.store.set_connected(false).await {
            warn!("Failed to clear connection flag: {}", e);
        }
    }
}
