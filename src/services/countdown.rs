use crate::models::{ContractStats, TriggerReadiness};
use crate::state_manager::SyncState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

/// Sentinel total used before the first stats snapshot arrives; far from
/// the urgency window.
const UNKNOWN_TOTAL_SECONDS: i64 = 99_999;

/// Live countdown to the next round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub reached_zero: bool,
    pub total_seconds: i64,
}

impl Countdown {
    pub fn derive(deadline: i64, now: i64) -> Self {
        let remaining = (deadline - now).max(0);
        Self {
            hours: format!("{:02}", remaining / 3600),
            minutes: format!("{:02}", (remaining % 3600) / 60),
            seconds: format!("{:02}", remaining % 60),
            reached_zero: remaining == 0,
            total_seconds: remaining,
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self {
            hours: "00".to_string(),
            minutes: "00".to_string(),
            seconds: "00".to_string(),
            reached_zero: false,
            total_seconds: UNKNOWN_TOTAL_SECONDS,
        }
    }
}

/// What the round card shows.
///
/// `Syncing` is the window where the local timer already hit zero but the
/// contract still reports cooldown. It is kept as its own state rather
/// than hidden, since it reflects real endpoint latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPhase {
    Counting,
    Processing,
    Syncing,
    Readiness(TriggerReadiness),
}

pub fn display_phase(stats: Option<&ContractStats>, countdown: &Countdown) -> DisplayPhase {
    let in_progress = stats.map_or(false, |s| s.in_progress);
    let can_trigger = stats.map_or(false, |s| s.can_trigger);
    let readiness = stats.map_or(TriggerReadiness::Cooldown, |s| s.readiness);

    if !(in_progress || can_trigger || countdown.reached_zero) {
        return DisplayPhase::Counting;
    }
    if in_progress {
        return DisplayPhase::Processing;
    }
    if countdown.reached_zero && !can_trigger && readiness == TriggerReadiness::Cooldown {
        return DisplayPhase::Syncing;
    }
    DisplayPhase::Readiness(readiness)
}

/// Local one-second ticker over the last known deadline. Does no I/O.
pub struct CountdownDeriver {
    state: Arc<SyncState>,
    tx: watch::Sender<Countdown>,
}

impl CountdownDeriver {
    pub fn new(state: Arc<SyncState>) -> Self {
        let (tx, _) = watch::channel(Countdown::default());
        Self { state, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Countdown {
        self.tx.borrow().clone()
    }

    /// Recompute from the current stats snapshot. Nothing happens until
    /// stats exist.
    pub async fn tick(&self, now: i64) {
        if let Some(stats) = self.state.stats().await {
            self.tx
                .send_replace(Countdown::derive(stats.next_lottery_time, now));
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                self.tick(chrono::Utc::now().timestamp()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(in_progress: bool, can_trigger: bool, readiness: TriggerReadiness) -> ContractStats {
        ContractStats {
            holder_count: 3,
            lottery_pool: "1.0".to_string(),
            actual_lottery_pool: "1.0".to_string(),
            next_lottery_time: 1_000,
            total_lotteries: 0,
            total_rewards: "0.0".to_string(),
            total_pending: "0.0".to_string(),
            can_trigger,
            in_progress,
            contract_total: "1.0".to_string(),
            readiness,
        }
    }

    #[test]
    fn test_derive_pads_and_clamps() {
        let c = Countdown::derive(1_000 + 3_725, 1_000);
        assert_eq!((c.hours.as_str(), c.minutes.as_str(), c.seconds.as_str()), ("01", "02", "05"));
        assert!(!c.reached_zero);

        let past = Countdown::derive(1_000, 5_000);
        assert_eq!(past.total_seconds, 0);
        assert!(past.reached_zero);
        assert_eq!(past.seconds, "00");
    }

    #[test]
    fn test_default_is_not_zero() {
        let c = Countdown::default();
        assert!(!c.reached_zero);
        assert!(c.total_seconds >= 60);
    }

    #[test]
    fn test_transitional_syncing_phase() {
        let zero = Countdown::derive(0, 10);
        let s = stats(false, false, TriggerReadiness::Cooldown);
        assert_eq!(display_phase(Some(&s), &zero), DisplayPhase::Syncing);

        let s = stats(false, true, TriggerReadiness::Ready);
        assert_eq!(
            display_phase(Some(&s), &zero),
            DisplayPhase::Readiness(TriggerReadiness::Ready)
        );

        let s = stats(true, false, TriggerReadiness::Busy);
        assert_eq!(display_phase(Some(&s), &zero), DisplayPhase::Processing);

        let running = Countdown::derive(100, 10);
        let s = stats(false, false, TriggerReadiness::Cooldown);
        assert_eq!(display_phase(Some(&s), &running), DisplayPhase::Counting);

        let s = stats(false, false, TriggerReadiness::PoolTooSmall);
        assert_eq!(
            display_phase(Some(&s), &zero),
            DisplayPhase::Readiness(TriggerReadiness::PoolTooSmall)
        );
    }

    #[tokio::test]
    async fn test_tick_waits_for_stats() {
        let state = Arc::new(SyncState::new());
        let deriver = CountdownDeriver::new(state.clone());
        deriver.tick(500).await;
        assert_eq!(deriver.current(), Countdown::default());

        state.set_stats(stats(false, false, TriggerReadiness::Cooldown)).await;
        deriver.tick(940).await;
        assert_eq!(deriver.current().total_seconds, 60);
        assert_eq!(deriver.current().minutes, "01");
    }
}
