//! Traffic signal state machine

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

use crate::{CoordinationError, RepeatPolicy};

/// Signal aspect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    #[default]
    Red,
    Green,
}

/// What a confirmed event did to the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// RED -> GREEN, reversion scheduled
    Activated { generation: u64 },
    /// Already GREEN, pending reversion kept
    AlreadyGreen,
    /// Already GREEN, reversion rescheduled for a full dwell
    Extended { generation: u64 },
}

#[derive(Debug, Default)]
struct SignalSlot {
    state: SignalState,
    /// Bumped on every activation; a reversion only applies to its own generation
    generation: u64,
    reversion: Option<AbortHandle>,
}

type Slots = Arc<Mutex<HashMap<String, SignalSlot>>>;

/// Per-signal RED/GREEN machine.
///
/// All reads and writes go through one lock. Each GREEN activation spawns
/// exactly one reversion task that sleeps for the dwell time and writes RED
/// only if no newer activation superseded it.
#[derive(Debug, Clone)]
pub struct SignalStateMachine {
    slots: Slots,
    dwell: Duration,
    policy: RepeatPolicy,
}

impl SignalStateMachine {
    pub fn new(dwell: Duration, policy: RepeatPolicy) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            dwell,
            policy,
        }
    }

    /// Pre-create RED records
    pub fn seed<I, S>(&self, ids: I) -> Result<(), CoordinationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots = lock(&self.slots)?;
        for id in ids {
            slots.entry(id.into()).or_default();
        }
        Ok(())
    }

    /// Apply a confirmed event. Must be called from within a tokio runtime.
    pub fn activate(&self, signal_id: &str) -> Result<Activation, CoordinationError> {
        let mut slots = lock(&self.slots)?;
        let slot = slots.entry(signal_id.to_string()).or_insert_with(|| {
            info!("Registering new signal {}", signal_id);
            SignalSlot::default()
        });

        let activation = match (slot.state, self.policy) {
            (SignalState::Red, _) => {
                slot.state = SignalState::Green;
                slot.generation += 1;
                info!("Signal {} turned GREEN", signal_id);
                metrics::counter!("signal_activations_total").increment(1);
                Activation::Activated {
                    generation: slot.generation,
                }
            }
            (SignalState::Green, RepeatPolicy::Ignore) => {
                debug!("Signal {} already GREEN, keeping pending reversion", signal_id);
                return Ok(Activation::AlreadyGreen);
            }
            (SignalState::Green, RepeatPolicy::Extend) => {
                if let Some(pending) = slot.reversion.take() {
                    pending.abort();
                }
                slot.generation += 1;
                info!("Signal {} GREEN extended by {:?}", signal_id, self.dwell);
                Activation::Extended {
                    generation: slot.generation,
                }
            }
        };

        slot.reversion = Some(self.schedule_reversion(signal_id.to_string(), slot.generation));
        Ok(activation)
    }

    fn schedule_reversion(&self, signal_id: String, generation: u64) -> AbortHandle {
        let slots = Arc::clone(&self.slots);
        let dwell = self.dwell;

        let task = tokio::spawn(async move {
            tokio::time::sleep(dwell).await;

            let mut slots = match lock(&slots) {
                Ok(slots) => slots,
                Err(e) => {
                    error!("Reversion of {} skipped: {}", signal_id, e);
                    return;
                }
            };
            let Some(slot) = slots.get_mut(&signal_id) else {
                return;
            };

            if slot.generation != generation {
                debug!(
                    "Reversion of {} (gen {}) superseded by gen {}",
                    signal_id, generation, slot.generation
                );
                return;
            }

            slot.state = SignalState::Red;
            slot.reversion = None;
            metrics::counter!("signal_reversions_total").increment(1);
            info!("Signal {} reset to RED", signal_id);
        });

        task.abort_handle()
    }

    /// Current state of one signal, `None` if never seen
    pub fn state(&self, signal_id: &str) -> Result<Option<SignalState>, CoordinationError> {
        Ok(lock(&self.slots)?.get(signal_id).map(|slot| slot.state))
    }

    /// Snapshot of every known signal
    pub fn snapshot(&self) -> Result<BTreeMap<String, SignalState>, CoordinationError> {
        Ok(lock(&self.slots)?
            .iter()
            .map(|(id, slot)| (id.clone(), slot.state))
            .collect())
    }

    /// Number of reversions scheduled and not yet applied
    pub fn pending_reversions(&self, signal_id: &str) -> Result<usize, CoordinationError> {
        Ok(lock(&self.slots)?
            .get(signal_id)
            .and_then(|slot| slot.reversion.as_ref())
            .map_or(0, |handle| usize::from(!handle.is_finished())))
    }
}

fn lock(slots: &Slots) -> Result<MutexGuard<'_, HashMap<String, SignalSlot>>, CoordinationError> {
    slots
        .lock()
        .map_err(|e| CoordinationError::LockPoisoned(format!("signals: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(policy: RepeatPolicy) -> SignalStateMachine {
        let machine = SignalStateMachine::new(Duration::from_secs(10), policy);
        machine.seed(["SIG_01"]).unwrap();
        machine
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[test]
    fn test_seeded_signals_start_red() {
        let machine = machine(RepeatPolicy::Ignore);
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Red));
        assert_eq!(machine.state("SIG_99").unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_green_then_red_after_dwell() {
        let machine = machine(RepeatPolicy::Ignore);

        let activation = machine.activate("SIG_01").unwrap();
        assert_eq!(activation, Activation::Activated { generation: 1 });
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Green));
        assert_eq!(machine.pending_reversions("SIG_01").unwrap(), 1);

        advance(9).await;
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Green));

        advance(2).await;
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Red));
        assert_eq!(machine.pending_reversions("SIG_01").unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_while_green_keeps_single_reversion() {
        let machine = machine(RepeatPolicy::Ignore);

        machine.activate("SIG_01").unwrap();
        advance(6).await;
        assert_eq!(machine.activate("SIG_01").unwrap(), Activation::AlreadyGreen);
        assert_eq!(machine.pending_reversions("SIG_01").unwrap(), 1);

        // First reversion still applies
        advance(5).await;
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Red));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_policy_restarts_dwell() {
        let machine = machine(RepeatPolicy::Extend);

        machine.activate("SIG_01").unwrap();
        advance(6).await;
        assert_eq!(
            machine.activate("SIG_01").unwrap(),
            Activation::Extended { generation: 2 }
        );

        advance(5).await;
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Green));
        assert_eq!(machine.pending_reversions("SIG_01").unwrap(), 1);

        advance(6).await;
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Red));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_after_revert_gets_new_generation() {
        let machine = machine(RepeatPolicy::Ignore);

        machine.activate("SIG_01").unwrap();
        advance(11).await;
        assert_eq!(
            machine.activate("SIG_01").unwrap(),
            Activation::Activated { generation: 2 }
        );
        assert_eq!(machine.state("SIG_01").unwrap(), Some(SignalState::Green));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_signal_created_lazily() {
        let machine = machine(RepeatPolicy::Ignore);

        machine.activate("SIG_05").unwrap();
        let snapshot = machine.snapshot().unwrap();
        assert_eq!(snapshot.get("SIG_01"), Some(&SignalState::Red));
        assert_eq!(snapshot.get("SIG_05"), Some(&SignalState::Green));
    }

    #[test]
    fn test_state_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&SignalState::Green).unwrap(), "\"GREEN\"");
        assert_eq!(serde_json::to_string(&SignalState::Red).unwrap(), "\"RED\"");
    }
}
