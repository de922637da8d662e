mod helpers;

use helpers::*;
use koi_sync::models::{ActiveView, HolderEntry, RevealMode};
use koi_sync::services::poller::{AdaptivePoller, IDLE_DELAY, URGENT_DELAY};
use koi_sync::state_manager::SyncState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

fn setup(reader: MockReader) -> (Arc<MockReader>, Arc<SyncState>, Arc<AdaptivePoller<MockReader>>) {
    let reader = Arc::new(reader);
    let state = Arc::new(SyncState::new());
    let poller = Arc::new(AdaptivePoller::new(reader.clone(), state.clone()));
    (reader, state, poller)
}

#[tokio::test]
async fn test_config_never_loaded_blocks_dependent_fetches() {
    let reader = MockReader::healthy();
    reader.set_config(None);
    let (reader, state, poller) = setup(reader);
    state.select_view(ActiveView::Community);

    for _ in 0..3 {
        let delay = poller.run_cycle().await;
        assert_eq!(delay, IDLE_DELAY);
    }

    assert_eq!(MockReader::count(&reader.config_calls), 3);
    assert_eq!(MockReader::count(&reader.stats_calls), 0);
    assert_eq!(MockReader::count(&reader.history_calls), 0);
    assert_eq!(MockReader::count(&reader.community_calls), 0);
    assert!(state.config().await.is_none());
}

#[tokio::test]
async fn test_config_fetched_once() {
    let (reader, state, poller) = setup(MockReader::healthy());

    poller.run_cycle().await;
    poller.run_cycle().await;

    assert_eq!(MockReader::count(&reader.config_calls), 1);
    assert_eq!(MockReader::count(&reader.stats_calls), 2);
    assert!(state.config().await.is_some());
    // Token metadata failure falls back to defaults
    assert_eq!(MockReader::count(&reader.token_calls), 1);
    assert_eq!(state.snapshot().await.token.symbol, "TOKEN");
}

#[tokio::test]
async fn test_failed_stats_fetch_keeps_previous_value_and_cadence() {
    let reader = MockReader::healthy();
    reader.set_stats(Some(sample_stats(100_000, true, false)));
    let (reader, state, poller) = setup(reader);

    let first_delay = poller.run_cycle().await;
    let before = state.stats().await;
    assert!(before.is_some());
    assert_eq!(first_delay, URGENT_DELAY);

    reader.set_stats(None);
    let second_delay = poller.run_cycle().await;

    assert_eq!(state.stats().await, before);
    assert_eq!(second_delay, first_delay);
    // Sibling fetches still ran
    assert_eq!(MockReader::count(&reader.history_calls), 2);
}

#[tokio::test]
async fn test_urgency_from_fetched_stats() {
    let reader = MockReader::healthy();
    reader.set_stats(Some(sample_stats(30, false, false)));
    let (reader, _state, poller) = setup(reader);
    assert_eq!(poller.run_cycle().await, URGENT_DELAY);

    reader.set_stats(Some(sample_stats(3_600, false, false)));
    assert_eq!(poller.run_cycle().await, IDLE_DELAY);

    reader.set_stats(Some(sample_stats(3_600, false, true)));
    assert_eq!(poller.run_cycle().await, URGENT_DELAY);
}

#[tokio::test]
async fn test_reveal_emitted_once_per_new_outcome() {
    let reader = MockReader::healthy();
    reader.set_history(Some(vec![outcome(5, ACCOUNT)]));
    let (reader, state, poller) = setup(reader);
    state.set_account(Some(ACCOUNT.to_uppercase().replace("0X", "0x"))).await;
    let mut reveals = state.subscribe_reveals();

    // First fetch only seeds
    poller.run_cycle().await;
    assert!(matches!(reveals.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(state.history().await.len(), 1);

    poller.run_cycle().await;
    assert!(matches!(reveals.try_recv(), Err(TryRecvError::Empty)));

    reader.set_history(Some(vec![outcome(6, ACCOUNT), outcome(5, ACCOUNT)]));
    poller.run_cycle().await;
    let signal = reveals.try_recv().unwrap();
    assert_eq!(signal.record.outcome_id, "6");
    assert_eq!(signal.mode, RevealMode::Winner);

    poller.run_cycle().await;
    poller.run_cycle().await;
    assert!(matches!(reveals.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_failed_history_fetch_does_not_seed() {
    let reader = MockReader::healthy();
    reader.set_history(None);
    let (reader, state, poller) = setup(reader);
    let mut reveals = state.subscribe_reveals();

    poller.run_cycle().await;

    // The first successful fetch is still treated as the seeding one
    reader.set_history(Some(vec![outcome(9, OTHER)]));
    poller.run_cycle().await;
    assert!(matches!(reveals.try_recv(), Err(TryRecvError::Empty)));

    reader.set_history(Some(vec![outcome(10, OTHER), outcome(9, OTHER)]));
    poller.run_cycle().await;
    assert_eq!(reveals.try_recv().unwrap().mode, RevealMode::Guest);
}

#[tokio::test]
async fn test_view_specific_fetches_follow_active_view() {
    let reader = MockReader::healthy();
    reader.set_community(Some(sample_community()));
    reader.set_holders(Some(vec![HolderEntry {
        address: ACCOUNT.to_string(),
        balance: "2000".to_string(),
        is_valid: true,
    }]));
    let (reader, state, poller) = setup(reader);

    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.community_calls), 0);
    assert_eq!(MockReader::count(&reader.holder_calls), 0);

    state.select_view(ActiveView::Community);
    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.community_calls), 1);
    assert!(state.snapshot().await.community.is_some());

    state.select_view(ActiveView::Holders);
    state.select_holders_page(3);
    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.holder_calls), 1);
    assert_eq!(reader.last_holder_page.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(state.snapshot().await.holders.len(), 1);
}

#[tokio::test]
async fn test_user_info_requires_account_and_token() {
    let (reader, state, poller) = setup(MockReader::healthy());

    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.user_calls), 0);
    assert!(state.snapshot().await.user.is_none());

    state.set_account(Some(ACCOUNT.to_string())).await;
    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.user_calls), 1);
    assert!(state.snapshot().await.user.is_some());

    let reader = MockReader::healthy();
    reader.set_config(Some(sample_config(false)));
    let (reader, state, poller) = setup(reader);
    state.set_account(Some(ACCOUNT.to_string())).await;
    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.user_calls), 0);
    assert!(state.snapshot().await.user.is_none());
}

#[tokio::test]
async fn test_user_info_waits_for_global_stats() {
    let reader = MockReader::healthy();
    reader.set_stats(None);
    let (reader, state, poller) = setup(reader);
    state.set_account(Some(ACCOUNT.to_string())).await;

    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.user_calls), 0);
    assert!(state.snapshot().await.user.is_none());

    reader.set_stats(Some(sample_stats(3600, false, false)));
    poller.run_cycle().await;
    assert_eq!(MockReader::count(&reader.user_calls), 1);
    assert!(state.snapshot().await.user.is_some());
}

#[tokio::test]
async fn test_shutdown_discards_results() {
    let (reader, state, poller) = setup(MockReader::healthy());
    poller.shutdown();

    poller.run_cycle().await;

    assert_eq!(MockReader::count(&reader.config_calls), 1);
    assert!(state.config().await.is_none());
    assert!(state.stats().await.is_none());
}

#[tokio::test]
async fn test_refresh_now_skips_history() {
    let (reader, state, poller) = setup(MockReader::healthy());
    poller.run_cycle().await;
    state.select_view(ActiveView::Community);
    reader.set_community(Some(sample_community()));

    poller.refresh_now().await;

    assert_eq!(MockReader::count(&reader.stats_calls), 2);
    assert_eq!(MockReader::count(&reader.history_calls), 1);
    assert_eq!(MockReader::count(&reader.community_calls), 1);
}

#[tokio::test(start_paused = true)]
async fn test_idle_cadence_never_overlaps() {
    let (reader, _state, poller) = setup(MockReader::healthy());

    let handle = poller.clone().spawn();
    // Cycles at 0s, 10s and 20s
    tokio::time::sleep(Duration::from_secs(25)).await;
    handle.stop().await;

    assert_eq!(MockReader::count(&reader.stats_calls), 3);
}

#[tokio::test(start_paused = true)]
async fn test_urgent_cadence() {
    let reader = MockReader::healthy();
    reader.set_stats(Some(sample_stats(100_000, true, false)));
    let (reader, _state, poller) = setup(reader);

    let handle = poller.clone().spawn();
    // Cycles at 0s, 3s, 6s and 9s
    tokio::time::sleep(Duration::from_secs(10)).await;
    handle.stop().await;

    assert_eq!(MockReader::count(&reader.stats_calls), 4);
}

#[tokio::test(start_paused = true)]
async fn test_view_change_triggers_immediate_fetch() {
    let reader = MockReader::healthy();
    reader.set_community(Some(sample_community()));
    let (reader, state, poller) = setup(reader);

    poller.run_cycle().await;
    let watcher = poller.clone().spawn_view_watcher();

    state.select_view(ActiveView::Community);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(MockReader::count(&reader.community_calls), 1);

    state.select_view(ActiveView::Holders);
    reader.set_holders(Some(Vec::new()));
    tokio::time::sleep(Duration::from_millis(10)).await;
    state.select_holders_page(1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(MockReader::count(&reader.holder_calls), 2);

    watcher.abort();
}
