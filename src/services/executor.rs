use crate::chain_client::{ContractCall, StateReader};
use crate::error::{AgentError, ErrorKind, TxError};
use crate::services::poller::AdaptivePoller;
use crate::wallet::{ensure_network, SharedAgent, WalletSession};
use alloy::primitives::{Address, U64};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Runs one state-changing call through the connected agent.
///
/// Never retries. On confirmation the poller refreshes the global and
/// active view read-models out of cadence.
pub struct TransactionExecutor<R: StateReader> {
    session: Arc<WalletSession>,
    poller: Arc<AdaptivePoller<R>>,
    reader: Arc<R>,
    contract: Address,
    confirmation_poll: Duration,
}

impl<R: StateReader> TransactionExecutor<R> {
    pub fn new(
        session: Arc<WalletSession>,
        poller: Arc<AdaptivePoller<R>>,
        reader: Arc<R>,
    ) -> Self {
        let contract = session.chain().contract_address;
        Self {
            session,
            poller,
            reader,
            contract,
            confirmation_poll: Duration::from_millis(1500),
        }
    }

    /// Set receipt polling cadence
    pub fn with_confirmation_poll(mut self, interval: Duration) -> Self {
        self.confirmation_poll = interval;
        self
    }

    /// Execute by contract method name with string arguments
    pub async fn execute_method(&self, method: &str, args: &[String]) -> Result<TxReceipt, TxError> {
        let call = ContractCall::from_method(method, args).map_err(|e| TxError::Rejected {
            kind: ErrorKind::InvalidArgument,
            detail: e.to_string(),
        })?;
        self.execute(call).await
    }

    pub async fn execute(&self, call: ContractCall) -> Result<TxReceipt, TxError> {
        let agent = self.session.handle().await.ok_or(TxError::NeedsConnection)?;
        let account = self.session.account().await.ok_or(TxError::NeedsConnection)?;

        ensure_network(&agent, self.session.chain()).await?;
        self.precheck(&call).await?;

        let tx_hash = self.submit(&agent, &account, &call).await?;
        info!("Submitted {} as {}", call.method_name(), tx_hash);

        let receipt = self.wait_for_receipt(&agent, &tx_hash).await?;
        info!(
            "{} confirmed in block {:?}",
            call.method_name(),
            receipt.block_number
        );

        self.poller.refresh_now().await;
        Ok(receipt)
    }

    /// Refuse calls the contract would reject anyway, without submitting
    async fn precheck(&self, call: &ContractCall) -> Result<(), TxError> {
        if call.is_roster_sensitive() {
            let in_progress = self
                .poller
                .state()
                .stats()
                .await
                .map_or(false, |s| s.in_progress);
            if in_progress {
                return Err(TxError::Rejected {
                    kind: ErrorKind::SelectionInProgress,
                    detail: format!("{} refused while a selection is running", call.method_name()),
                });
            }
        }

        if let ContractCall::RecycleStuckPending(holder) = call {
            match self.reader.fetch_pending_details(holder).await {
                Ok(details) if !details.can_recycle => {
                    return Err(TxError::Rejected {
                        kind: ErrorKind::RecycleNotUnlocked,
                        detail: format!("pending for {} unlocks at {}", holder, details.recycle_time),
                    });
                }
                Ok(_) => {}
                Err(e) => warn!("Pending details lookup failed, submitting anyway: {}", e),
            }
        }
        Ok(())
    }

    async fn submit(
        &self,
        agent: &SharedAgent,
        account: &str,
        call: &ContractCall,
    ) -> Result<String, TxError> {
        let params = json!([{
            "from": account,
            "to": self.contract.to_checksum(None),
            "data": format!("0x{}", hex::encode(call.encode())),
        }]);

        let result = agent.request("eth_sendTransaction", params).await.map_err(|e| {
            error!("{} failed: {}", call.method_name(), e);
            e
        })?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AgentError::new(format!("Unexpected transaction hash: {}", result)).into())
    }

    /// Poll for the receipt until it shows up. No upper bound.
    async fn wait_for_receipt(&self, agent: &SharedAgent, tx_hash: &str) -> Result<TxReceipt, TxError> {
        loop {
            let receipt = agent
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if receipt.is_null() {
                debug!("Waiting for {}", tx_hash);
                time::sleep(self.confirmation_poll).await;
                continue;
            }

            let block_number = receipt
                .get("blockNumber")
                .and_then(Value::as_str)
                .and_then(|b| b.parse::<U64>().ok())
                .map(|n| n.to::<u64>());

            if receipt.get("status").and_then(Value::as_str) == Some("0x0") {
                error!("Transaction {} reverted", tx_hash);
                return Err(TxError::Reverted {
                    tx_hash: tx_hash.to_string(),
                });
            }

            return Ok(TxReceipt {
                tx_hash: tx_hash.to_string(),
                block_number,
            });
        }
    }
}
