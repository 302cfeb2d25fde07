//! Owned coordination state

use std::collections::BTreeMap;
use tracing::info;

use crate::{
    Activation, AlertRecord, AlertStateMachine, CoordinationConfig, CoordinationError,
    SignalState, SignalStateMachine,
};

/// Result of handling one confirmed sighting
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub signal_id: String,
    pub activation: Activation,
    pub signal_state: SignalState,
    pub alert: AlertRecord,
}

/// Signal and alert machines owned by the coordination service.
///
/// The signal map and the alert are independent critical sections; callers
/// only ever receive snapshots.
#[derive(Debug)]
pub struct CoordinationStore {
    signals: SignalStateMachine,
    alert: AlertStateMachine,
}

impl CoordinationStore {
    pub fn new(config: &CoordinationConfig) -> Result<Self, CoordinationError> {
        info!(
            "Creating coordination store: dwell {}s, policy {:?}, seeds {:?}",
            config.dwell_seconds, config.repeat_policy, config.seed_signals
        );
        let signals = SignalStateMachine::new(config.dwell(), config.repeat_policy);
        signals.seed(config.seed_signals.iter().cloned())?;

        Ok(Self {
            signals,
            alert: AlertStateMachine::new(config.alert.clone()),
        })
    }

    /// Confirmed sighting: turn the signal GREEN (if not already) and
    /// re-arm the hospital alert. Must be called from within a tokio runtime.
    pub fn on_detected(&self, signal_id: &str) -> Result<DetectionOutcome, CoordinationError> {
        info!("Ambulance detected at signal {}", signal_id);

        let activation = self.signals.activate(signal_id)?;
        let alert = self.alert.raise()?;
        let signal_state = self
            .signals
            .state(signal_id)?
            .unwrap_or(SignalState::Green);

        Ok(DetectionOutcome {
            signal_id: signal_id.to_string(),
            activation,
            signal_state,
            alert,
        })
    }

    pub fn acknowledge(&self) -> Result<AlertRecord, CoordinationError> {
        self.alert.acknowledge()
    }

    pub fn signal_snapshot(&self) -> Result<BTreeMap<String, SignalState>, CoordinationError> {
        self.signals.snapshot()
    }

    pub fn alert_snapshot(&self) -> Result<AlertRecord, CoordinationError> {
        self.alert.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlertStatus;
    use std::time::Duration;

    fn store() -> CoordinationStore {
        CoordinationStore::new(&CoordinationConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_drives_both_machines() {
        let store = store();

        let outcome = store.on_detected("SIG_01").unwrap();
        assert_eq!(outcome.activation, Activation::Activated { generation: 1 });
        assert_eq!(outcome.signal_state, SignalState::Green);
        assert_eq!(outcome.alert.status, AlertStatus::Incoming);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(
            store.signal_snapshot().unwrap().get("SIG_01"),
            Some(&SignalState::Red)
        );
        // Alert has no timed transition
        assert_eq!(store.alert_snapshot().unwrap().status, AlertStatus::Incoming);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_detection_still_realerts() {
        let store = store();

        store.on_detected("SIG_01").unwrap();
        store.acknowledge().unwrap();

        let outcome = store.on_detected("SIG_01").unwrap();
        assert_eq!(outcome.activation, Activation::AlreadyGreen);
        assert_eq!(outcome.alert.status, AlertStatus::Incoming);
        assert!(!outcome.alert.acknowledged);
    }

    #[tokio::test]
    async fn test_concurrent_ack_and_detection_stay_consistent() {
        let store = std::sync::Arc::new(store());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    store.on_detected("SIG_01").map(|o| o.alert)
                } else {
                    store.acknowledge()
                }
            }));
        }
        for handle in handles {
            let record = handle.await.unwrap().unwrap();
            assert_eq!(record.acknowledged, record.status == AlertStatus::Acknowledged);
        }

        let last = store.alert_snapshot().unwrap();
        assert_eq!(last.acknowledged, last.status == AlertStatus::Acknowledged);
    }
}
