//! Lucky Koi Sync Runner
//!
//! Headless entry point for the protocol client's synchronization core:
//! - Adaptive polling of the contract's read-models
//! - Wallet discovery and session restore
//! - Outcome reveal detection and a live round countdown
//! - One-shot write execution (`exec`)

use anyhow::{anyhow, bail, Context};
use koi_sync::chain_client::ContractReader;
use koi_sync::config::AppConfig;
use koi_sync::error::{AppError, AppResult};
use koi_sync::models::{ActiveView, RevealMode};
use koi_sync::services::{
    display_phase, AdaptivePoller, CountdownDeriver, DisplayPhase, TransactionExecutor,
};
use koi_sync::state_manager::SyncState;
use koi_sync::wallet::{
    AgentEnvironment, AnnouncedProvider, HttpAgent, LifecycleSignal, ProviderResolver,
    SessionStore, SharedAgent, WalletSession,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// What the binary was asked to do
#[derive(Debug)]
enum Command {
    Watch { view: ActiveView, page: u64 },
    Exec { wallet: String, method: String, args: Vec<String> },
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("watch") => Ok(Command::Watch {
            view: ActiveView::Dashboard,
            page: 0,
        }),
        Some("view") => {
            let name = args.get(1).context("view expects a view name")?;
            let view = name.parse::<ActiveView>().map_err(|e| anyhow!(e))?;
            let page = match args.get(2) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("Invalid page index: {}", raw))?,
                None => 0,
            };
            Ok(Command::Watch { view, page })
        }
        Some("exec") => {
            if args.len() < 3 {
                bail!("usage: koi-sync exec <wallet-id> <method> [args...]");
            }
            Ok(Command::Exec {
                wallet: args[1].clone(),
                method: args[2].clone(),
                args: args[3..].to_vec(),
            })
        }
        Some(other) => bail!("Unknown command: {}", other),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("koi_sync={},alloy=warn,reqwest=warn", config.log_level).into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args).map_err(|e| AppError::Config(e.to_string()))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Lucky Koi Sync Starting                         ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("RPC endpoint: {}", config.chain.rpc_url);
    info!("Chain id: {}", config.chain.chain_id);
    info!("Contract: {}", config.chain.contract_address);

    // =========================================================================
    // CORE COMPONENTS
    // =========================================================================
    let state = Arc::new(SyncState::new());
    let reader = Arc::new(ContractReader::new(&config.chain)?);
    info!("✓ Chain reader initialized");

    let env = Arc::new(AgentEnvironment::new());
    let ambient: Option<SharedAgent> = config.agent_url.as_ref().map(|url| {
        Arc::new(HttpAgent::new(url.clone(), config.agent_flags.clone()).with_label("ambient"))
            as SharedAgent
    });
    if let Some(url) = &config.agent_url {
        info!("Ambient signing agent: {} (flags {:?})", url, config.agent_flags);
    } else {
        warn!("AGENT_URL not configured - read-only mode unless a wallet announces itself");
    }
    env.set_ambient(ambient.clone()).await;

    if let (Some(agent), Some(rdns)) = (ambient, config.agent_rdns.clone()) {
        env.announce(AnnouncedProvider {
            uuid: uuid::Uuid::new_v4().to_string(),
            rdns,
            handle: agent,
        });
    }
    let resolver = Arc::new(ProviderResolver::new(env.clone()));
    resolver.discover().await;
    env.signal(LifecycleSignal::Loaded);
    info!("✓ Wallet discovery started");

    let store = Arc::new(SessionStore::load(&config.session_file).await?);
    let locale = std::env::var("LANG").unwrap_or_default();
    info!("Language: {}", store.language(&locale).await.as_str());

    let session = Arc::new(WalletSession::new(
        resolver.clone(),
        store.clone(),
        state.clone(),
        config.chain.clone(),
    ));
    match session.restore().await {
        Some(account) => info!("✓ Session restored for {}", account),
        None => info!("No previous session to restore"),
    }

    let poller = Arc::new(AdaptivePoller::new(reader.clone(), state.clone()));

    match command {
        Command::Exec {
            wallet,
            method,
            args,
        } => {
            let executor = TransactionExecutor::new(session.clone(), poller.clone(), reader)
                .with_confirmation_poll(config.confirmation_poll());
            let result = run_exec(&session, &poller, &executor, &wallet, &method, &args).await;
            poller.shutdown();
            resolver.stop().await;
            result
        }
        Command::Watch { view, page } => {
            state.select_view(view);
            state.select_holders_page(page);
            run_watch(&config, state, poller, resolver).await
        }
    }
}

async fn run_exec(
    session: &WalletSession,
    poller: &AdaptivePoller<ContractReader>,
    executor: &TransactionExecutor<ContractReader>,
    wallet: &str,
    method: &str,
    args: &[String],
) -> AppResult<()> {
    // Load config and stats so prechecks see current state
    poller.run_cycle().await;

    if let Err(e) = session.connect(wallet).await {
        let kind = e.kind();
        error!("{}: {} ({})", kind.title(), kind.message(), e);
        return Err(AppError::Message(e.to_string()));
    }

    match executor.execute_method(method, args).await {
        Ok(receipt) => {
            info!(
                "✓ {} confirmed: {} (block {:?})",
                method, receipt.tx_hash, receipt.block_number
            );
            Ok(())
        }
        Err(e) => {
            let kind = e.kind();
            error!("{}: {} ({})", kind.title(), kind.message(), e);
            Err(AppError::Message(e.to_string()))
        }
    }
}

async fn run_watch(
    config: &AppConfig,
    state: Arc<SyncState>,
    poller: Arc<AdaptivePoller<ContractReader>>,
    resolver: Arc<ProviderResolver>,
) -> AppResult<()> {
    info!("Starting background tasks...");

    let poller_handle = poller.clone().spawn();
    info!("✓ Adaptive poller started (3s urgent / 10s idle)");

    let view_handle = poller.clone().spawn_view_watcher();
    info!("✓ View watcher started");

    let countdown = Arc::new(CountdownDeriver::new(state.clone()));
    let countdown_handle = countdown.clone().spawn();
    info!("✓ Countdown ticker started");

    let mut reveals = state.subscribe_reveals();
    let reveal_handle = tokio::spawn(async move {
        loop {
            match reveals.recv().await {
                Ok(signal) => match signal.mode {
                    RevealMode::Winner => info!(
                        "🎉 You won outcome #{}: {}",
                        signal.record.outcome_id, signal.record.reward_amount
                    ),
                    RevealMode::Loser => info!(
                        "Outcome #{} went to {}",
                        signal.record.outcome_id, signal.record.winner_address
                    ),
                    RevealMode::Guest => info!(
                        "Outcome #{}: {} won {}",
                        signal.record.outcome_id,
                        signal.record.winner_address,
                        signal.record.reward_amount
                    ),
                },
                Err(RecvError::Lagged(n)) => warn!("Missed {} reveal signals", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut ticks = countdown.subscribe();
    let phase_state = state.clone();
    let phase_handle = tokio::spawn(async move {
        let mut last: Option<DisplayPhase> = None;
        while ticks.changed().await.is_ok() {
            let current = ticks.borrow_and_update().clone();
            let stats = phase_state.stats().await;
            let phase = display_phase(stats.as_ref(), &current);
            if last != Some(phase) {
                info!(
                    "Round phase: {:?} ({}:{}:{})",
                    phase, current.hours, current.minutes, current.seconds
                );
                last = Some(phase);
            }
        }
    });

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Lucky Koi Sync Ready!                           ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  View:         {}", state.view().view.as_str());
    info!("║  Environment:  {}", config.environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = reveal_handle => {
            error!("Reveal logger exited unexpectedly");
        }
    }

    poller.shutdown();
    poller_handle.stop().await;
    view_handle.abort();
    countdown_handle.abort();
    phase_handle.abort();
    resolver.stop().await;

    info!("Lucky Koi sync shutdown complete");
    Ok(())
}
