use crate::models::{OutcomeRecord, RevealMode, RevealSignal};

/// Reconciliation pointer carried across poll cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollCycleState {
    pub last_processed_outcome_id: Option<String>,
    pub has_seen_first_cycle: bool,
}

impl PollCycleState {
    /// Fold one successful history fetch (most recent first) into the pointer.
    ///
    /// The first fetch only seeds the pointer. Afterwards a reveal is emitted
    /// exactly once per newly observed newest id.
    pub fn reconcile(
        &self,
        records: &[OutcomeRecord],
        observer: Option<&str>,
    ) -> (PollCycleState, Option<RevealSignal>) {
        let newest = records.first();

        if !self.has_seen_first_cycle {
            let seeded = PollCycleState {
                last_processed_outcome_id: newest.map(|r| r.outcome_id.clone()),
                has_seen_first_cycle: true,
            };
            return (seeded, None);
        }

        match newest {
            Some(record)
                if self.last_processed_outcome_id.as_deref() != Some(record.outcome_id.as_str()) =>
            {
                let advanced = PollCycleState {
                    last_processed_outcome_id: Some(record.outcome_id.clone()),
                    has_seen_first_cycle: true,
                };
                let signal = RevealSignal {
                    mode: classify(record, observer),
                    record: record.clone(),
                };
                (advanced, Some(signal))
            }
            _ => (self.clone(), None),
        }
    }
}

/// Observer's relationship to an outcome. Address comparison ignores case.
pub fn classify(record: &OutcomeRecord, observer: Option<&str>) -> RevealMode {
    match observer.filter(|o| !o.is_empty()) {
        Some(account) if account.eq_ignore_ascii_case(&record.winner_address) => RevealMode::Winner,
        Some(_) => RevealMode::Loser,
        None => RevealMode::Guest,
    }
}

/// Owner of the reconciliation pointer
#[derive(Debug, Default)]
pub struct EventReconciler {
    state: PollCycleState,
}

impl EventReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PollCycleState {
        &self.state
    }

    pub fn observe(
        &mut self,
        records: &[OutcomeRecord],
        observer: Option<&str>,
    ) -> Option<RevealSignal> {
        let (next, signal) = self.state.reconcile(records, observer);
        self.state = next;
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINNER: &str = "0xAbCdEf0000000000000000000000000000000001";

    fn record(id: u64) -> OutcomeRecord {
        OutcomeRecord {
            outcome_id: id.to_string(),
            winner_address: WINNER.to_string(),
            reward_amount: "1.0".to_string(),
            weight_percentage: 100,
            block_number: id * 10,
            proof_hash: format!("0x{:02x}", id),
        }
    }

    #[test]
    fn test_first_fetch_only_seeds() {
        let mut reconciler = EventReconciler::new();
        let signal = reconciler.observe(&[record(5), record(4)], Some(WINNER));
        assert!(signal.is_none());
        assert_eq!(reconciler.state().last_processed_outcome_id.as_deref(), Some("5"));
        assert!(reconciler.state().has_seen_first_cycle);
    }

    #[test]
    fn test_first_fetch_empty_leaves_pointer_unset() {
        let mut reconciler = EventReconciler::new();
        assert!(reconciler.observe(&[], None).is_none());
        assert!(reconciler.state().has_seen_first_cycle);
        assert!(reconciler.state().last_processed_outcome_id.is_none());

        // Anything that shows up afterwards is new
        let signal = reconciler.observe(&[record(1)], None).unwrap();
        assert_eq!(signal.mode, RevealMode::Guest);
    }

    #[test]
    fn test_same_newest_emits_nothing_new_emits_once() {
        let mut reconciler = EventReconciler::new();
        reconciler.observe(&[record(5)], None);

        assert!(reconciler.observe(&[record(5)], None).is_none());

        let signal = reconciler.observe(&[record(6), record(5)], None).unwrap();
        assert_eq!(signal.record.outcome_id, "6");
        assert_eq!(reconciler.state().last_processed_outcome_id.as_deref(), Some("6"));

        assert!(reconciler.observe(&[record(6), record(5)], None).is_none());
        assert!(reconciler.observe(&[record(6), record(5)], None).is_none());
    }

    #[test]
    fn test_empty_list_after_seed_keeps_pointer() {
        let mut reconciler = EventReconciler::new();
        reconciler.observe(&[record(5)], None);
        assert!(reconciler.observe(&[], None).is_none());
        assert_eq!(reconciler.state().last_processed_outcome_id.as_deref(), Some("5"));
    }

    #[test]
    fn test_classification() {
        let r = record(1);
        assert_eq!(classify(&r, Some(&WINNER.to_lowercase())), RevealMode::Winner);
        assert_eq!(classify(&r, Some(&WINNER.to_uppercase().replace("0X", "0x"))), RevealMode::Winner);
        assert_eq!(
            classify(&r, Some("0x0000000000000000000000000000000000000002")),
            RevealMode::Loser
        );
        assert_eq!(classify(&r, None), RevealMode::Guest);
    }

    #[test]
    fn test_reconcile_is_pure() {
        let state = PollCycleState {
            last_processed_outcome_id: Some("5".to_string()),
            has_seen_first_cycle: true,
        };
        let (next, signal) = state.reconcile(&[record(6)], Some(WINNER));
        assert!(signal.unwrap().is_winner());
        assert_eq!(state.last_processed_outcome_id.as_deref(), Some("5"));
        assert_eq!(next.last_processed_outcome_id.as_deref(), Some("6"));
    }
}
