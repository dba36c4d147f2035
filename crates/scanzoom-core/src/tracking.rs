//! Lateral tracking nudge.
//!
//! When the confirmed code drifts horizontally away from the frame center,
//! a small zoom boost proportional to the offset is eased in. Runs after the
//! auto-zoom controller on the same detection and has no cooldown.

use scanzoom_models::{BoundingBox, FrameSize, ZoomState};

use crate::config::ScanConfig;

#[derive(Debug, Clone)]
pub struct TrackingController {
    dead_zone: f64,
    gain: f64,
    easing: f64,
}

impl TrackingController {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            dead_zone: config.tracking_dead_zone,
            gain: config.tracking_gain,
            easing: config.tracking_easing,
        }
    }

    /// Ratio to apply for this frame, or `None` inside the dead zone.
    ///
    /// `zoom.current_ratio` should be the freshest intended ratio, which may
    /// be ahead of what the actuator last reported.
    pub fn update(&self, bbox: &BoundingBox, frame: FrameSize, zoom: &ZoomState) -> Option<f64> {
        let dx = bbox.horizontal_offset(frame)?;
        if dx.abs() < self.dead_zone {
            return None;
        }

        let current = zoom.current_ratio;
        let boost = dx.abs() * self.gain;
        let target = (current + boost).min(zoom.max_ratio);
        Some(current + (target - current) * self.easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn controller() -> TrackingController {
        TrackingController::new(&ScanConfig::default())
    }

    /// 100px box whose center sits at `center_x` in a 1000px-wide frame.
    fn bbox_at(center_x: f64) -> BoundingBox {
        BoundingBox::new(center_x - 50.0, 450.0, 100.0, 100.0)
    }

    #[test]
    fn test_dead_zone() {
        let ctl = controller();
        let frame = FrameSize::new(1000, 1000);
        let zoom = ZoomState::new(2.0, 1.0, 8.0);

        assert!(ctl.update(&bbox_at(500.0), frame, &zoom).is_none());
        assert!(ctl.update(&bbox_at(619.0), frame, &zoom).is_none());
        assert!(ctl.update(&bbox_at(381.0), frame, &zoom).is_none());
        assert!(ctl.update(&bbox_at(625.0), frame, &zoom).is_some());
    }

    #[test]
    fn test_boost_is_symmetric() {
        let ctl = controller();
        let frame = FrameSize::new(1000, 1000);
        let zoom = ZoomState::new(2.0, 1.0, 8.0);

        let right = ctl.update(&bbox_at(800.0), frame, &zoom).unwrap();
        let left = ctl.update(&bbox_at(200.0), frame, &zoom).unwrap();

        // |dx| = 0.3 -> boost 0.18 -> eased 20% -> +0.036
        assert!((right - 2.036).abs() < EPS);
        assert!((left - right).abs() < EPS);
    }

    #[test]
    fn test_clamped_to_max() {
        let ctl = controller();
        let frame = FrameSize::new(1000, 1000);
        let zoom = ZoomState::new(8.0, 1.0, 8.0);

        let ratio = ctl.update(&bbox_at(950.0), frame, &zoom).unwrap();
        assert!((ratio - 8.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_frame() {
        let ctl = controller();
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        assert!(ctl.update(&bbox_at(900.0), FrameSize::new(0, 10), &zoom).is_none());
    }

    #[test]
    fn test_non_finite_box_is_ignored() {
        let ctl = controller();
        let frame = FrameSize::new(1000, 1000);
        let zoom = ZoomState::new(1.0, 1.0, 8.0);

        let nan_x = BoundingBox::new(f64::NAN, 450.0, 100.0, 100.0);
        let infinite = BoundingBox::new(f64::INFINITY, 450.0, 100.0, 100.0);
        assert!(ctl.update(&nan_x, frame, &zoom).is_none());
        assert!(ctl.update(&infinite, frame, &zoom).is_none());
    }
}
