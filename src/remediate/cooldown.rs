//! Per-anomaly-type dispatch cooldown.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::detect::AnomalyType;

/// Tracks, per anomaly type, when the last action was dispatched. A single
/// mutex guards the map so check-and-commit is one critical section: two
/// concurrent callers for the same type can never both acquire inside the
/// cooldown window.
pub struct CooldownRegistry {
    cooldown: Duration,
    last_dispatch: Mutex<HashMap<AnomalyType, Instant>>,
}

impl CooldownRegistry {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_dispatch: Mutex::new(HashMap::new()),
        }
    }

    /// Non-committing check used before the decision step. A `true` here can
    /// still lose the race to another caller; [`try_acquire`] is the
    /// authoritative gate.
    ///
    /// [`try_acquire`]: Self::try_acquire
    pub fn is_cooling(&self, anomaly_type: AnomalyType) -> bool {
        let map = self.last_dispatch.lock().unwrap_or_else(|e| e.into_inner());
        matches!(map.get(&anomaly_type), Some(last) if last.elapsed() < self.cooldown)
    }

    /// Atomically check the cooldown and, if clear, commit the dispatch
    /// timestamp. Returns false when the type is still cooling.
    pub fn try_acquire(&self, anomaly_type: AnomalyType) -> bool {
        let mut map = self.last_dispatch.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(map.get(&anomaly_type), Some(last) if last.elapsed() < self.cooldown) {
            return false;
        }
        map.insert(anomaly_type, Instant::now());
        true
    }
}
