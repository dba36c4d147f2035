//! Scanner metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Frame admission
    pub const FRAMES_ADMITTED_TOTAL: &str = "scanzoom_frames_admitted_total";
    pub const FRAMES_DROPPED_TOTAL: &str = "scanzoom_frames_dropped_total";

    // Recognition
    pub const DETECTIONS_CONFIRMED_TOTAL: &str = "scanzoom_detections_confirmed_total";
    pub const RECOGNITION_FAILURES_TOTAL: &str = "scanzoom_recognition_failures_total";
    pub const RECOGNITION_DURATION_SECONDS: &str = "scanzoom_recognition_duration_seconds";

    // Zoom control
    pub const ZOOM_COMMANDS_TOTAL: &str = "scanzoom_zoom_commands_total";
    pub const ZOOM_COMMANDS_SUPPRESSED_TOTAL: &str = "scanzoom_zoom_commands_suppressed_total";
    pub const ZOOM_RATIO: &str = "scanzoom_zoom_ratio";
}

pub fn record_frame_admitted() {
    counter!(names::FRAMES_ADMITTED_TOTAL).increment(1);
}

/// Record a frame that never reached the recognizer.
pub fn record_frame_dropped(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::FRAMES_DROPPED_TOTAL, &labels).increment(1);
}

pub fn record_detections_confirmed(count: usize) {
    counter!(names::DETECTIONS_CONFIRMED_TOTAL).increment(count as u64);
}

/// Record a recognizer failure.
pub fn record_recognition_failure(recognizer: &str) {
    let labels = [("recognizer", recognizer.to_string())];
    counter!(names::RECOGNITION_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_recognition_duration(recognizer: &str, duration_secs: f64) {
    let labels = [("recognizer", recognizer.to_string())];
    histogram!(names::RECOGNITION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a command handed to the actuator.
pub fn record_zoom_command(source: &str, ratio: f64) {
    let labels = [("source", source.to_string())];
    counter!(names::ZOOM_COMMANDS_TOTAL, &labels).increment(1);
    gauge!(names::ZOOM_RATIO).set(ratio);
}

/// Record a command that was computed but not applied
/// (dead-band, superseded, stale or queue full).
pub fn record_zoom_suppressed(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::ZOOM_COMMANDS_SUPPRESSED_TOTAL, &labels).increment(1);
}
