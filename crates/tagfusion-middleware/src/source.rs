//! The telemetry read capability.
//!
//! The fusion engine never talks to a transport.  It reads already-cached
//! values through [`TelemetrySource`], which any concrete client (a
//! NetworkTables binding, a recording replayer, a test fixture) implements.

use std::sync::Arc;

/// Read access to the latest key/value telemetry.
///
/// # Contract
///
/// * Both reads return the caller's `default` when the key is absent or the
///   underlying value is stale.
/// * Reads must not block on I/O and must not panic.
pub trait TelemetrySource {
    /// Read a numeric scalar published under `key`.
    fn read_scalar(&self, key: &str, default: f64) -> f64;

    /// Read a numeric array published under `key`.
    fn read_sequence(&self, key: &str, default: &[f64]) -> Vec<f64>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for &T {
    fn read_scalar(&self, key: &str, default: f64) -> f64 {
        (**self).read_scalar(key, default)
    }

    fn read_sequence(&self, key: &str, default: &[f64]) -> Vec<f64> {
        (**self).read_sequence(key, default)
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Arc<T> {
    fn read_scalar(&self, key: &str, default: f64) -> f64 {
        (**self).read_scalar(key, default)
    }

    fn read_sequence(&self, key: &str, default: &[f64]) -> Vec<f64> {
        (**self).read_sequence(key, default)
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn read_scalar(&self, key: &str, default: f64) -> f64 {
        (**self).read_scalar(key, default)
    }

    fn read_sequence(&self, key: &str, default: &[f64]) -> Vec<f64> {
        (**self).read_sequence(key, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockSource {
        scalars: HashMap<String, f64>,
    }

    impl TelemetrySource for MockSource {
        fn read_scalar(&self, key: &str, default: f64) -> f64 {
            self.scalars.get(key).copied().unwrap_or(default)
        }

        fn read_sequence(&self, _key: &str, default: &[f64]) -> Vec<f64> {
            default.to_vec()
        }
    }

    fn mock() -> MockSource {
        MockSource {
            scalars: HashMap::from([("cam/tv".to_string(), 1.0)]),
        }
    }

    #[test]
    fn reads_through_references_and_smart_pointers() {
        let src = mock();
        assert_eq!((&src).read_scalar("cam/tv", 0.0), 1.0);

        let shared = Arc::new(mock());
        assert_eq!(shared.read_scalar("cam/tv", 0.0), 1.0);

        let boxed: Box<dyn TelemetrySource> = Box::new(mock());
        assert_eq!(boxed.read_scalar("cam/missing", -1.0), -1.0);
        assert_eq!(boxed.read_sequence("cam/tcornxy", &[0.0; 2]), vec![0.0, 0.0]);
    }
}
