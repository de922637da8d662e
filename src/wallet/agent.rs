//! Signing agents ("wallets") as callable EIP-1193 style handles.

use crate::error::AgentError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Symbolic code attached when the agent itself cannot be reached
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// A signing agent that accepts JSON-RPC style requests
#[async_trait]
pub trait AgentHandle: Send + Sync {
    /// Short label for logs
    fn label(&self) -> &str;

    /// Feature flags the agent advertises, e.g. `isMetaMask`
    fn flags(&self) -> &[String];

    fn has_flag(&self, flag: &str) -> bool {
        self.flags().iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// Sub-providers when several agents share one ambient binding
    fn legacy_providers(&self) -> Vec<SharedAgent> {
        Vec::new()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AgentError>;
}

pub type SharedAgent = Arc<dyn AgentHandle>;

impl fmt::Debug for dyn AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("label", &self.label())
            .field("flags", &self.flags())
            .finish()
    }
}

/// Agent reachable over HTTP JSON-RPC (a local signer daemon or a bridge
/// to a browser extension)
pub struct HttpAgent {
    http: reqwest::Client,
    url: String,
    label: String,
    flags: Vec<String>,
    providers: Vec<SharedAgent>,
    next_id: AtomicU64,
}

impl HttpAgent {
    pub fn new(url: impl Into<String>, flags: Vec<String>) -> Self {
        let url = url.into();
        Self {
            http: reqwest::Client::new(),
            label: url.clone(),
            url,
            flags,
            providers: Vec::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Expose a legacy multi-provider array behind this binding
    pub fn with_providers(mut self, providers: Vec<SharedAgent>) -> Self {
        self.providers = providers;
        self
    }
}

#[async_trait]
impl AgentHandle for HttpAgent {
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
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("agent {} -> {} (id {})", self.label, method, id);

        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::with_symbol(NETWORK_ERROR, e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::with_symbol(NETWORK_ERROR, e.to_string()))?;

        if let Some(err) = response.get("error") {
            return Err(AgentError::from_rpc_object(err));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}
