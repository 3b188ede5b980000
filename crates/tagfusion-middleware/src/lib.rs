//! `tagfusion-middleware` – telemetry plumbing between cameras and the engine.
//!
//! Carries raw key/value readings to the fusion engine without caring what
//! they mean.
//!
//! # Modules
//!
//! - [`source`] – [`TelemetrySource`]: the read-with-default capability the
//!   engine depends on.
//! - [`keys`] – the `<camera>/<field>` key naming scheme and
//!   [`CameraKeys`], the per-camera precomputed key set.
//! - [`store`] – [`SnapshotStore`]: a lock-protected latest-value store that
//!   implements [`TelemetrySource`] for multi-threaded readers and writers.

pub mod keys;
pub mod source;
pub mod store;

pub use keys::CameraKeys;
pub use source::TelemetrySource;
pub use store::{SnapshotStore, TelemetryValue};
