//! `tagfusion-runtime` – process-level plumbing around the fusion engine.
//!
//! # Modules
//!
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber, with compact or JSON console output and an
//!   optional OTLP span exporter (`OTEL_EXPORTER_OTLP_ENDPOINT`).
//! - [`replay`] – [`Recording`][replay::Recording] and
//!   [`Replayer`][replay::Replayer]: feed a recorded JSON-lines telemetry
//!   stream through a [`MultiCameraFusion`][tagfusion_perception::MultiCameraFusion]
//!   engine, optionally paced in real time and stoppable from another thread.

pub mod replay;
pub mod telemetry;

pub use replay::{Frame, Recording, ReplaySummary, Replayer};
pub use telemetry::{TracerProviderGuard, init_tracing};
