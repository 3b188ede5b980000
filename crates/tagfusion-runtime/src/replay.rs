//! Recording replay.
//!
//! A recording is a JSON-lines file, one frame per line:
//!
//! ```text
//! {"t": 0.00, "values": {"limelight-left/tv": 1, "limelight-left/tcornxy": [0, 0, 40, 0, 40, 40, 0, 40]}}
//! {"t": 0.02, "values": {"limelight-left/tv": 0}}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.  Frame values are
//! published into a [`SnapshotStore`] and persist until overwritten, the way
//! a live telemetry bus behaves; the engine is then stepped once at the
//! frame's timestamp.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tagfusion_middleware::SnapshotStore;
//! use tagfusion_perception::MultiCameraFusion;
//! use tagfusion_runtime::replay::{Recording, Replayer};
//! use tagfusion_types::{FusionConfig, TagLayout};
//!
//! let recording = Recording::parse(r#"
//! {"t": 0.0, "values": {"limelight-left/tv": 1, "limelight-left/tcornxy": [0, 0, 40, 0, 40, 40, 0, 40]}}
//! {"t": 0.02, "values": {"limelight-left/tv": 0}}
//! "#).unwrap();
//!
//! let store = Arc::new(SnapshotStore::new());
//! let engine = MultiCameraFusion::new(Arc::clone(&store), TagLayout::new(), FusionConfig::default());
//! let mut replayer = Replayer::new(engine, store);
//!
//! let mut ticks = 0;
//! let summary = replayer.run(&recording, |_, _| ticks += 1);
//! assert_eq!(ticks, 2);
//! assert_eq!(summary.frames, 2);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tagfusion_middleware::{SnapshotStore, TelemetrySource, TelemetryValue};
use tagfusion_perception::MultiCameraFusion;
use tagfusion_types::{FusionError, FusionResult};
use tracing::{debug, info, warn};

// ────────────────────────────────────────────────────────────────────────────
// Recording
// ────────────────────────────────────────────────────────────────────────────

/// One recorded tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Timestamp in seconds.
    pub t: f64,
    #[serde(default)]
    pub values: BTreeMap<String, TelemetryValue>,
}

/// An ordered sequence of frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    frames: Vec<Frame>,
}

impl Recording {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Parse JSON-lines text.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Recording`] with the 1-based line number when a
    /// line is not a valid frame, has a non-finite timestamp, or goes back in
    /// time.
    pub fn parse(text: &str) -> Result<Self, FusionError> {
        let mut frames: Vec<Frame> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let number = index + 1;
            let frame: Frame = serde_json::from_str(line).map_err(|e| FusionError::Recording {
                line: number,
                details: e.to_string(),
            })?;
            if !frame.t.is_finite() {
                return Err(FusionError::Recording {
                    line: number,
                    details: format!("non-finite timestamp {}", frame.t),
                });
            }
            if let Some(prev) = frames.last()
                && frame.t < prev.t
            {
                return Err(FusionError::Recording {
                    line: number,
                    details: format!("timestamp {} precedes {}", frame.t, prev.t),
                });
            }
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    /// Read and parse a recording file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FusionError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FusionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let recording = Self::parse(&text)?;
        debug!(path = %path.display(), frames = recording.len(), "recording loaded");
        Ok(recording)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time between the first and last frame.
    pub fn duration_s(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Replayer
// ────────────────────────────────────────────────────────────────────────────

/// Counters collected over one [`Replayer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplaySummary {
    /// Frames stepped.
    pub frames: usize,
    /// Frames that produced a fused pose.
    pub posed_frames: usize,
    /// Frames flagged as occluded.
    pub occluded_frames: usize,
    /// `true` when the stop flag ended the run early.
    pub stopped: bool,
}

/// Feeds a [`Recording`] through a [`MultiCameraFusion`] engine.
///
/// The engine must read from the same store the replayer publishes into.
pub struct Replayer<S> {
    engine: MultiCameraFusion<S>,
    store: Arc<SnapshotStore>,
    realtime: bool,
    stop: Arc<AtomicBool>,
}

impl<S: TelemetrySource> Replayer<S> {
    pub fn new(engine: MultiCameraFusion<S>, store: Arc<SnapshotStore>) -> Self {
        Self {
            engine,
            store,
            realtime: false,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pace frames by their timestamps instead of stepping as fast as
    /// possible.
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    /// Share an externally owned stop flag (e.g. one set by a Ctrl-C handler).
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that ends the current run before its next frame when set.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn engine(&self) -> &MultiCameraFusion<S> {
        &self.engine
    }

    /// Publish every value of `frame` into the store.
    fn apply(&self, frame: &Frame) {
        for (key, value) in &frame.values {
            self.store.publish(key.as_str(), value.clone());
        }
    }

    /// Replay `recording`, calling `sink` with each frame and its result.
    pub fn run<F>(&mut self, recording: &Recording, mut sink: F) -> ReplaySummary
    where
        F: FnMut(&Frame, &FusionResult),
    {
        let mut summary = ReplaySummary::default();
        let start = Instant::now();
        let origin = recording.frames().first().map_or(0.0, |f| f.t);
        info!(
            frames = recording.len(),
            duration_s = recording.duration_s(),
            realtime = self.realtime,
            "replay started"
        );

        for frame in recording.frames() {
            if self.stop.load(Ordering::Acquire) {
                warn!(at = frame.t, "replay stopped");
                summary.stopped = true;
                break;
            }
            if self.realtime {
                let due = Duration::from_secs_f64((frame.t - origin).max(0.0));
                if let Some(wait) = due.checked_sub(start.elapsed()) {
                    std::thread::sleep(wait);
                }
            }

            self.apply(frame);
            let result = self.engine.step(frame.t);
            summary.frames += 1;
            if result.final_pose.is_some() {
                summary.posed_frames += 1;
            }
            if result.occlusion {
                summary.occluded_frames += 1;
            }
            sink(frame, &result);
        }

        info!(
            frames = summary.frames,
            posed = summary.posed_frames,
            occluded = summary.occluded_frames,
            "replay finished"
        );
        summary
    }

    /// Replay `recording` and collect every result.
    pub fn collect(&mut self, recording: &Recording) -> Vec<FusionResult> {
        let mut results = Vec::with_capacity(recording.len());
        self.run(recording, |_, r| results.push(r.clone()));
        results
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
