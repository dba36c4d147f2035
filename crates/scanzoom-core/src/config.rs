//! Controller configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// Tunables for voting, auto-zoom, tracking and frame admission.
///
/// Size thresholds are fractions of the frame dimension. The entry band
/// `[too_small_ratio, too_big_ratio]` is wider than the exit band
/// `[ideal_min_ratio, ideal_max_ratio]`; that gap is the hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    // ============================================
    // Detection Voter
    // ============================================
    /// Cumulative sightings before a value is confirmed.
    pub vote_threshold: u32,

    // ============================================
    // Auto-Zoom Controller
    // ============================================
    /// Below this size the controller starts zooming in.
    pub too_small_ratio: f64,

    /// Above this size the controller starts zooming out.
    pub too_big_ratio: f64,

    /// Zooming in stops once the size reaches this.
    pub ideal_min_ratio: f64,

    /// Zooming out stops once the size drops to this.
    pub ideal_max_ratio: f64,

    /// Zoom-ratio units added or removed per step before easing.
    pub zoom_step: f64,

    /// Fraction of the way toward the step target applied per command.
    pub zoom_ease_factor: f64,

    /// Minimum time between two auto-zoom commands.
    pub zoom_cooldown_ms: u64,

    /// Commands closer than this to the last applied ratio are dropped.
    pub min_zoom_delta: f64,

    /// Time without a confirmed detection before pulling back out.
    pub idle_reset_ms: u64,

    // ============================================
    // Tracking Controller
    // ============================================
    /// Horizontal offset (fraction of frame width) treated as centered.
    pub tracking_dead_zone: f64,

    /// Zoom boost per unit of horizontal offset.
    pub tracking_gain: f64,

    /// Fraction of the way toward the tracking target applied per frame.
    pub tracking_easing: f64,

    // ============================================
    // Frame Gate / session driver
    // ============================================
    /// Minimum spacing between analyzed frames. Zero disables throttling.
    pub analyze_interval_ms: u64,

    /// Pending actuator commands buffered between worker and dispatcher.
    pub command_queue_capacity: usize,

    /// Events buffered per subscriber before the slowest one lags.
    pub event_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 3,
            too_small_ratio: 0.18,
            too_big_ratio: 0.45,
            ideal_min_ratio: 0.25,
            ideal_max_ratio: 0.38,
            zoom_step: 0.7,
            zoom_ease_factor: 0.15,
            zoom_cooldown_ms: 350,
            min_zoom_delta: 0.02,
            idle_reset_ms: 800,
            tracking_dead_zone: 0.12,
            tracking_gain: 0.6,
            tracking_easing: 0.2,
            analyze_interval_ms: 150, // ~6 FPS
            command_queue_capacity: 16,
            event_buffer: 64,
        }
    }
}

impl ScanConfig {
    /// Create config from `SCANZOOM_*` environment variables.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            vote_threshold: env_or("SCANZOOM_VOTE_THRESHOLD", d.vote_threshold),
            too_small_ratio: env_or("SCANZOOM_TOO_SMALL_RATIO", d.too_small_ratio),
            too_big_ratio: env_or("SCANZOOM_TOO_BIG_RATIO", d.too_big_ratio),
            ideal_min_ratio: env_or("SCANZOOM_IDEAL_MIN_RATIO", d.ideal_min_ratio),
            ideal_max_ratio: env_or("SCANZOOM_IDEAL_MAX_RATIO", d.ideal_max_ratio),
            zoom_step: env_or("SCANZOOM_ZOOM_STEP", d.zoom_step),
            zoom_ease_factor: env_or("SCANZOOM_ZOOM_EASE_FACTOR", d.zoom_ease_factor),
            zoom_cooldown_ms: env_or("SCANZOOM_ZOOM_COOLDOWN_MS", d.zoom_cooldown_ms),
            min_zoom_delta: env_or("SCANZOOM_MIN_ZOOM_DELTA", d.min_zoom_delta),
            idle_reset_ms: env_or("SCANZOOM_IDLE_RESET_MS", d.idle_reset_ms),
            tracking_dead_zone: env_or("SCANZOOM_TRACKING_DEAD_ZONE", d.tracking_dead_zone),
            tracking_gain: env_or("SCANZOOM_TRACKING_GAIN", d.tracking_gain),
            tracking_easing: env_or("SCANZOOM_TRACKING_EASING", d.tracking_easing),
            analyze_interval_ms: env_or("SCANZOOM_ANALYZE_INTERVAL_MS", d.analyze_interval_ms),
            command_queue_capacity: env_or(
                "SCANZOOM_COMMAND_QUEUE_CAPACITY",
                d.command_queue_capacity,
            ),
            event_buffer: env_or("SCANZOOM_EVENT_BUFFER", d.event_buffer),
        }
    }

    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(json: &str) -> ScanResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations that would break the hysteresis band or
    /// make the easing factors meaningless.
    pub fn validate(&self) -> ScanResult<()> {
        if self.vote_threshold == 0 {
            return Err(ScanError::invalid_config("vote_threshold must be at least 1"));
        }

        let band = [
            self.too_small_ratio,
            self.ideal_min_ratio,
            self.ideal_max_ratio,
            self.too_big_ratio,
        ];
        if band.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ScanError::invalid_config("size thresholds must be positive"));
        }
        if !(self.too_small_ratio < self.ideal_min_ratio
            && self.ideal_min_ratio <= self.ideal_max_ratio
            && self.ideal_max_ratio < self.too_big_ratio)
        {
            return Err(ScanError::invalid_config(format!(
                "size thresholds must satisfy too_small < ideal_min <= ideal_max < too_big \
                 (got {} / {} / {} / {})",
                self.too_small_ratio, self.ideal_min_ratio, self.ideal_max_ratio, self.too_big_ratio
            )));
        }

        for (name, value) in [
            ("zoom_ease_factor", self.zoom_ease_factor),
            ("tracking_easing", self.tracking_easing),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ScanError::invalid_config(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }

        if !(self.zoom_step > 0.0) {
            return Err(ScanError::invalid_config("zoom_step must be positive"));
        }
        if self.min_zoom_delta < 0.0 || self.tracking_gain < 0.0 || self.tracking_dead_zone < 0.0
        {
            return Err(ScanError::invalid_config(
                "min_zoom_delta, tracking_gain and tracking_dead_zone must not be negative",
            ));
        }
        if self.command_queue_capacity == 0 || self.event_buffer == 0 {
            return Err(ScanError::invalid_config(
                "command_queue_capacity and event_buffer must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn zoom_cooldown(&self) -> Duration {
        Duration::from_millis(self.zoom_cooldown_ms)
    }

    pub fn idle_reset(&self) -> Duration {
        Duration::from_millis(self.idle_reset_ms)
    }

    /// `None` when analysis throttling is disabled.
    pub fn analyze_interval(&self) -> Option<Duration> {
        (self.analyze_interval_ms > 0).then(|| Duration::from_millis(self.analyze_interval_ms))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vote_threshold, 3);
        assert_eq!(config.zoom_cooldown(), Duration::from_millis(350));
        assert_eq!(config.idle_reset(), Duration::from_millis(800));
        assert_eq!(config.analyze_interval(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn test_zero_interval_disables_throttle() {
        let config = ScanConfig {
            analyze_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.analyze_interval(), None);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let config = ScanConfig {
            ideal_min_ratio: 0.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn test_easing_bounds() {
        let config = ScanConfig {
            zoom_ease_factor: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfig {
            tracking_easing: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ScanConfig::from_json(r#"{"vote_threshold": 5, "zoom_cooldown_ms": 500}"#)
            .unwrap();
        assert_eq!(config.vote_threshold, 5);
        assert_eq!(config.zoom_cooldown_ms, 500);
        assert_eq!(config.too_small_ratio, 0.18);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            ScanConfig::from_json("not json"),
            Err(ScanError::ConfigParse(_))
        ));
        assert!(matches!(
            ScanConfig::from_json(r#"{"vote_threshold": 0}"#),
            Err(ScanError::InvalidConfig(_))
        ));
    }
}
