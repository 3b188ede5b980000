//! Lock-protected telemetry snapshot store.
//!
//! A transport client (or a recording replayer) writes the latest value of
//! every key into a [`SnapshotStore`]; the fusion engine reads from it through
//! [`TelemetrySource`].  Writers and readers may live on different threads:
//! wrap the store in an [`Arc`][std::sync::Arc] and share it.
//!
//! # Example
//!
//! ```rust
//! use tagfusion_middleware::{SnapshotStore, TelemetrySource};
//!
//! let store = SnapshotStore::new();
//! store.publish_scalar("limelight-left/tv", 1.0);
//! store.publish_sequence("limelight-left/tcornxy", vec![0.0; 8]);
//!
//! assert_eq!(store.read_scalar("limelight-left/tv", 0.0), 1.0);
//! assert_eq!(store.read_sequence("limelight-left/tcornxy", &[]).len(), 8);
//! assert_eq!(store.read_scalar("limelight-right/tv", 0.0), 0.0);
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::source::TelemetrySource;

/// A value published on the telemetry bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Scalar(v)
    }
}

impl From<Vec<f64>> for TelemetryValue {
    fn from(v: Vec<f64>) -> Self {
        TelemetryValue::Sequence(v)
    }
}

struct Entry {
    value: TelemetryValue,
    stamp: Instant,
}

/// Thread-safe key → latest-value map with optional staleness cut-off.
///
/// Reads of a key whose value is older than `max_age` behave as if the key
/// were absent.  Reads of a key holding the wrong shape (a scalar read of a
/// sequence, or vice versa) also return the default.
#[derive(Default)]
pub struct SnapshotStore {
    entries: RwLock<HashMap<String, Entry>>,
    max_age: Option<Duration>,
}

impl SnapshotStore {
    /// Create an empty store whose values never go stale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that hides values older than `max_age`.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: RwLock::default(),
            max_age: Some(max_age),
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn publish(&self, key: impl Into<String>, value: impl Into<TelemetryValue>) {
        let key = key.into();
        trace!(key = %key, "telemetry publish");
        self.write().insert(
            key,
            Entry {
                value: value.into(),
                stamp: Instant::now(),
            },
        );
    }

    pub fn publish_scalar(&self, key: impl Into<String>, value: f64) {
        self.publish(key, TelemetryValue::Scalar(value));
    }

    pub fn publish_sequence(&self, key: impl Into<String>, values: Vec<f64>) {
        self.publish(key, TelemetryValue::Sequence(values));
    }

    /// Remove `key`.  Returns the previous value, if any.
    pub fn remove(&self, key: &str) -> Option<TelemetryValue> {
        self.write().remove(key).map(|e| e.value)
    }

    /// Drop every stored value.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Time since `key` was last published, or `None` when absent.
    pub fn age(&self, key: &str) -> Option<Duration> {
        self.read().get(key).map(|e| e.stamp.elapsed())
    }

    /// Clone the current value of `key`, honouring the staleness cut-off.
    pub fn get(&self, key: &str) -> Option<TelemetryValue> {
        let entries = self.read();
        let entry = entries.get(key)?;
        if self.is_stale(entry) {
            return None;
        }
        Some(entry.value.clone())
    }

    fn is_stale(&self, entry: &Entry) -> bool {
        self.max_age
            .is_some_and(|max_age| entry.stamp.elapsed() > max_age)
    }

    // A panicking writer cannot leave a half-written map behind (every write
    // is a single insert/remove), so poisoned guards are recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("telemetry store lock poisoned; recovering for read");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("telemetry store lock poisoned; recovering for write");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("entries", &self.len())
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl TelemetrySource for SnapshotStore {
    fn read_scalar(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(TelemetryValue::Scalar(v)) => v,
            _ => default,
        }
    }

    fn read_sequence(&self, key: &str, default: &[f64]) -> Vec<f64> {
        match self.get(key) {
            Some(TelemetryValue::Sequence(v)) => v,
            _ => default.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn absent_key_returns_default() {
        let store = SnapshotStore::new();
        assert_eq!(store.read_scalar("cam/tx", 4.5), 4.5);
        assert_eq!(store.read_sequence("cam/tcornxy", &[1.0, 2.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn publish_replaces_previous_value() {
        let store = SnapshotStore::new();
        store.publish_scalar("cam/tx", 1.0);
        store.publish_scalar("cam/tx", 2.0);
        assert_eq!(store.read_scalar("cam/tx", 0.0), 2.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn shape_mismatch_returns_default() {
        let store = SnapshotStore::new();
        store.publish_sequence("cam/tx", vec![1.0, 2.0]);
        store.publish_scalar("cam/tcornxy", 3.0);
        assert_eq!(store.read_scalar("cam/tx", -1.0), -1.0);
        assert!(store.read_sequence("cam/tcornxy", &[]).is_empty());
    }

    #[test]
    fn stale_values_are_hidden() {
        let store = SnapshotStore::with_max_age(Duration::from_millis(10));
        store.publish_scalar("cam/tv", 1.0);
        assert_eq!(store.read_scalar("cam/tv", 0.0), 1.0);
        thread::sleep(Duration::from_millis(25));
        assert_eq!(store.read_scalar("cam/tv", 0.0), 0.0);
        // The entry still exists; only reads hide it.
        assert!(store.age("cam/tv").is_some());
    }

    #[test]
    fn remove_and_clear() {
        let store = SnapshotStore::new();
        store.publish_scalar("a", 1.0);
        store.publish_scalar("b", 2.0);
        assert_eq!(store.remove("a"), Some(TelemetryValue::Scalar(1.0)));
        assert!(store.remove("a").is_none());
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let store = Arc::new(SnapshotStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    store.publish_scalar("cam/tx", i as f64);
                }
            })
        };
        for _ in 0..100 {
            let v = store.read_scalar("cam/tx", 0.0);
            assert!((0.0..100.0).contains(&v));
        }
        writer.join().unwrap();
        assert_eq!(store.read_scalar("cam/tx", 0.0), 99.0);
    }

    #[test]
    fn telemetry_value_deserializes_untagged() {
        let scalar: TelemetryValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(scalar, TelemetryValue::Scalar(1.5));
        let seq: TelemetryValue = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(seq, TelemetryValue::Sequence(vec![1.0, 2.0]));
    }
}
