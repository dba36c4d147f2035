//! Zoom actuator state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Zoom state as reported by the actuator.
///
/// All ratios are positive and `min <= current <= max` for a well-formed
/// report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoomState {
    pub current_ratio: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
}

impl ZoomState {
    pub fn new(current_ratio: f64, min_ratio: f64, max_ratio: f64) -> Self {
        Self {
            current_ratio,
            min_ratio,
            max_ratio,
        }
    }

    /// Check that the report is usable (finite, positive, ordered).
    pub fn is_valid(&self) -> bool {
        self.current_ratio.is_finite()
            && self.min_ratio.is_finite()
            && self.max_ratio.is_finite()
            && self.min_ratio > 0.0
            && self.min_ratio <= self.max_ratio
            && self.current_ratio >= self.min_ratio
            && self.current_ratio <= self.max_ratio
    }

    /// Clamp a ratio into `[min_ratio, max_ratio]`.
    pub fn clamp(&self, ratio: f64) -> f64 {
        ratio.clamp(self.min_ratio, self.max_ratio)
    }

    /// Same limits with a different current ratio.
    pub fn with_current(&self, current_ratio: f64) -> Self {
        Self {
            current_ratio: self.clamp(current_ratio),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_state_validity() {
        assert!(ZoomState::new(1.0, 1.0, 8.0).is_valid());
        assert!(!ZoomState::new(0.5, 1.0, 8.0).is_valid());
        assert!(!ZoomState::new(1.0, 2.0, 1.5).is_valid());
        assert!(!ZoomState::new(f64::NAN, 1.0, 8.0).is_valid());
        assert!(!ZoomState::new(0.0, 0.0, 8.0).is_valid());
    }

    #[test]
    fn test_clamp_and_with_current() {
        let state = ZoomState::new(2.0, 1.0, 4.0);
        assert_eq!(state.clamp(10.0), 4.0);
        assert_eq!(state.clamp(0.1), 1.0);
        assert_eq!(state.with_current(3.5).current_ratio, 3.5);
        assert_eq!(state.with_current(9.0).current_ratio, 4.0);
        assert_eq!(state.with_current(9.0).max_ratio, 4.0);
    }
}
