//! Read side of the protocol contract.
//!
//! Each operation is a fresh fetch against the read-only endpoint and the
//! fixed contract address. Numeric values leave this module as decimal
//! strings (raw or ether-formatted) or plain integers.

use super::abi::{format_ether, small, IERC20, ILuckyKoi};
use crate::config::ChainSettings;
use crate::error::{AppError, AppResult};
use crate::models::{
    CleanupProgress, CommunityStats, ContractConfig, ContractStats, GasRewardStats, HolderEntry,
    LinkStats, OutcomeRecord, PendingDetails, TokenMeta, TriggerReadiness, UserInfo,
};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::eth::{Filter, Log, TransactionRequest};
use alloy::sol_types::{SolCall, SolEvent};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use futures::future::{join_all, try_join};
use tracing::{debug, warn};

/// Read operations the synchronization core depends on
#[async_trait]
pub trait StateReader: Send + Sync + 'static {
    async fn fetch_config(&self) -> AppResult<ContractConfig>;

    async fn fetch_token_meta(&self, token: &Address) -> AppResult<TokenMeta>;

    /// Stats, contract balance, actual pool and readiness, joined
    async fn fetch_global_stats(&self) -> AppResult<ContractStats>;

    /// Never fails on a single sub-read; failed parts read as zero
    async fn fetch_user_info(&self, account: &Address, config: &ContractConfig) -> UserInfo;

    /// Outcome records of the trailing block window, most recent first
    async fn fetch_outcome_history(&self) -> AppResult<Vec<OutcomeRecord>>;

    async fn fetch_community_stats(&self) -> AppResult<CommunityStats>;

    async fn fetch_holder_page(
        &self,
        page: u64,
        config: &ContractConfig,
    ) -> AppResult<Vec<HolderEntry>>;

    async fn fetch_pending_details(&self, holder: &Address) -> AppResult<PendingDetails>;
}

/// `StateReader` backed by an HTTP JSON-RPC provider
pub struct ContractReader {
    provider: RootProvider<Http<Client>>,
    contract: Address,
    page_size: u64,
    history_block_range: u64,
}

impl ContractReader {
    pub fn new(settings: &ChainSettings) -> AppResult<Self> {
        let url = settings
            .rpc_url
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid RPC_URL {}: {}", settings.rpc_url, e)))?;
        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
            contract: settings.contract_address,
            page_size: settings.page_size,
            history_block_range: settings.history_block_range,
        })
    }

    pub fn provider(&self) -> &RootProvider<Http<Client>> {
        &self.provider
    }

    /// `eth_call` at the latest block, decoded through the call's return type
    async fn call<C>(&self, to: Address, call: C) -> AppResult<C::Return>
    where
        C: SolCall + Send + Sync,
    {
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(Bytes::from(call.abi_encode()));
        let raw = self.provider.call(&request).await?;
        Ok(C::abi_decode_returns(raw.as_ref(), true)?)
    }

    async fn view<C>(&self, call: C) -> AppResult<C::Return>
    where
        C: SolCall + Send + Sync,
    {
        self.call(self.contract, call).await
    }

    async fn token_balance(&self, token: Address, owner: Address) -> AppResult<U256> {
        Ok(self.call(token, IERC20::balanceOfCall { owner }).await?.balance)
    }

    async fn actual_pool(&self) -> AppResult<U256> {
        Ok(self.view(ILuckyKoi::getActualKoiPoolCall {}).await?.pool)
    }

    async fn trigger_readiness(&self) -> AppResult<TriggerReadiness> {
        let status = self
            .view(ILuckyKoi::getTriggerStatusDetailsCall {})
            .await?
            .status;
        Ok(TriggerReadiness::from_code(small(status)))
    }

    async fn base_user_info(&self, user: Address) -> AppResult<UserInfo> {
        let info = self.view(ILuckyKoi::getUserInfoCall { user }).await?;
        Ok(UserInfo {
            registered: info.registered,
            current_balance: info.balance.to_string(),
            reward_percentage: small(info.percentage),
            currently_valid: info.valid,
            total_won: format_ether(info.totalWon),
            win_count: small(info.wins),
            pending: format_ether(info.pending),
            ..UserInfo::default()
        })
    }

    async fn link_stats(&self) -> AppResult<LinkStats> {
        let s = self.view(ILuckyKoi::getLinkStatsCall {}).await?;
        Ok(LinkStats {
            erc677_balance: format_ether(s.erc677Balance),
            bep20_balance: format_ether(s.bep20Balance),
            subscription_balance: format_ether(s.subscriptionBalance),
            total_link_balance: format_ether(s.totalLinkBalance),
            available_eth_for_link: format_ether(s.availableEthForLink),
            needs_buy: s.needsBuy,
            needs_convert: s.needsConvert,
            needs_top_up: s.needsTopUp,
            total_link_purchased: format_ether(s.totalLinkPurchased),
            total_eth_spent: format_ether(s.totalEthSpent),
            received: format_ether(s.received),
        })
    }

    async fn cleanup_progress(&self) -> AppResult<CleanupProgress> {
        let p = self.view(ILuckyKoi::getCleanupProgressCall {}).await?;
        Ok(CleanupProgress {
            remaining: small(p.remaining),
            percent: small(p.percent),
        })
    }

    async fn gas_reward_stats(&self) -> AppResult<GasRewardStats> {
        let g = self.view(ILuckyKoi::getGasRewardStatsCall {}).await?;
        Ok(GasRewardStats {
            total_paid: format_ether(g.totalPaid),
            current_bounty: format_ether(g.currentBounty),
            base_reward: format_ether(g.baseReward),
            max_reward: format_ether(g.maxReward),
        })
    }
}

/// Map a `WinnerSelected` log to an outcome record
pub fn decode_outcome_log(log: &Log) -> AppResult<OutcomeRecord> {
    let event = ILuckyKoi::WinnerSelected::decode_log_data(&log.inner.data, true)?;
    Ok(OutcomeRecord {
        outcome_id: event.lotteryId.to_string(),
        winner_address: event.winner.to_checksum(None),
        reward_amount: format_ether(event.reward),
        weight_percentage: small(event.percentage),
        block_number: log.block_number.unwrap_or_default(),
        proof_hash: log
            .transaction_hash
            .map(|h| format!("{:#x}", h))
            .unwrap_or_default(),
    })
}

#[async_trait]
impl StateReader for ContractReader {
    async fn fetch_config(&self) -> AppResult<ContractConfig> {
        let c = self.view(ILuckyKoi::getConfigCall {}).await?;
        Ok(ContractConfig {
            token_address: c.token,
            link677_address: c.link677,
            link_bep20_address: c.linkBep20,
            peg_swap_address: c.pegSwap,
            swap_router: c.swapRouter,
            wrapped_native: c.wbnb,
            min_holding: c.minHolding.to_string(),
            full_reward_holding: c.fullRewardHolding.to_string(),
            lottery_interval: small(c.lotteryInterval),
            max_holders: small(c.maxHolders),
            callback_gas_limit: small(c.callbackGasLimit),
            token_set: c.tokenSet,
            token_locked: c.tokenLocked,
            admin: c.admin,
            ownership_renounced: c.ownershipRenounced,
            admin_renounced: c.adminRenounced,
            config_locked: c.tokenLocked,
        })
    }

    async fn fetch_token_meta(&self, token: &Address) -> AppResult<TokenMeta> {
        let (symbol, decimals) = try_join(
            self.call(*token, IERC20::symbolCall {}),
            self.call(*token, IERC20::decimalsCall {}),
        )
        .await?;
        Ok(TokenMeta {
            symbol: symbol.value,
            decimals: decimals.value,
        })
    }

    async fn fetch_global_stats(&self) -> AppResult<ContractStats> {
        let (stats, balance, actual_pool, readiness) = tokio::join!(
            self.view(ILuckyKoi::getContractStatsCall {}),
            async { self.provider.get_balance(self.contract).await },
            self.actual_pool(),
            self.trigger_readiness(),
        );

        let stats = stats?;
        let balance = balance?;
        let readiness = readiness?;
        let actual_pool = actual_pool.unwrap_or_else(|e| {
            debug!("getActualKoiPool failed, using zero: {}", e);
            U256::ZERO
        });

        Ok(ContractStats {
            holder_count: small(stats.holderCount),
            lottery_pool: format_ether(stats.pool),
            actual_lottery_pool: format_ether(actual_pool),
            next_lottery_time: i64::try_from(small(stats.nextTime)).unwrap_or(i64::MAX),
            total_lotteries: small(stats.lotteries),
            total_rewards: format_ether(stats.rewards),
            total_pending: format_ether(stats.pendingTotal),
            can_trigger: stats.canTrigger,
            in_progress: stats.inProgress,
            contract_total: format_ether(balance),
            readiness,
        })
    }

    async fn fetch_user_info(&self, account: &Address, config: &ContractConfig) -> UserInfo {
        let (info, wallet_balance, trigger) = tokio::join!(
            self.base_user_info(*account),
            self.token_balance(config.token_address, *account),
            self.view(ILuckyKoi::getUserTriggerInfoCall { user: *account }),
        );

        let mut user = info.unwrap_or_else(|e| {
            warn!("getUserInfo failed for {}: {}", account, e);
            UserInfo {
                current_balance: "0".to_string(),
                total_won: format_ether(U256::ZERO),
                pending: format_ether(U256::ZERO),
                ..UserInfo::default()
            }
        });
        user.wallet_balance = wallet_balance.unwrap_or(U256::ZERO).to_string();
        match trigger {
            Ok(t) => {
                user.triggers = small(t.triggers);
                user.gas_rewards_collected = format_ether(t.gasRewards);
                user.donations = format_ether(t.donations);
            }
            Err(e) => {
                debug!("getUserTriggerInfo failed for {}: {}", account, e);
                user.gas_rewards_collected = format_ether(U256::ZERO);
                user.donations = format_ether(U256::ZERO);
            }
        }
        user
    }

    async fn fetch_outcome_history(&self) -> AppResult<Vec<OutcomeRecord>> {
        let latest = self.provider.get_block_number().await?;
        let from = latest.saturating_sub(self.history_block_range);
        let filter = Filter::new()
            .address(self.contract)
            .event_signature(ILuckyKoi::WinnerSelected::SIGNATURE_HASH)
            .from_block(from)
            .to_block(latest);
        let logs = self.provider.get_logs(&filter).await?;

        let mut records = logs
            .iter()
            .map(decode_outcome_log)
            .collect::<AppResult<Vec<_>>>()?;
        records.reverse();
        Ok(records)
    }

    async fn fetch_community_stats(&self) -> AppResult<CommunityStats> {
        let (link, cleanup, gas_rewards) = tokio::join!(
            self.link_stats(),
            self.cleanup_progress(),
            self.gas_reward_stats(),
        );

        Ok(CommunityStats {
            link: link?,
            cleanup: cleanup
                .map_err(|e| debug!("getCleanupProgress failed: {}", e))
                .ok(),
            gas_rewards: gas_rewards?,
        })
    }

    async fn fetch_holder_page(
        &self,
        page: u64,
        config: &ContractConfig,
    ) -> AppResult<Vec<HolderEntry>> {
        let offset = page.saturating_mul(self.page_size);
        let holders = self
            .view(ILuckyKoi::getHoldersCall {
                offset: U256::from(offset),
                limit: U256::from(self.page_size),
            })
            .await?
            .holders;

        let min_holding = config.min_holding_raw();
        let balances = join_all(
            holders
                .iter()
                .map(|holder| self.token_balance(config.token_address, *holder)),
        )
        .await;

        Ok(holders
            .iter()
            .zip(balances)
            .map(|(holder, balance)| {
                let balance = balance.unwrap_or(U256::ZERO);
                HolderEntry {
                    address: holder.to_checksum(None),
                    balance: balance.to_string(),
                    is_valid: balance >= min_holding,
                }
            })
            .collect())
    }

    async fn fetch_pending_details(&self, holder: &Address) -> AppResult<PendingDetails> {
        let d = self
            .view(ILuckyKoi::getPendingDetailsCall { holder: *holder })
            .await?;
        let timestamp = |v: U256| i64::try_from(small(v)).unwrap_or(i64::MAX);
        Ok(PendingDetails {
            amount: format_ether(d.amount),
            since: timestamp(d.since),
            can_recycle: d.canRecycle,
            recycle_time: timestamp(d.recycleTime),
        })
    }
}
