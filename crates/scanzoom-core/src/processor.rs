//! Per-frame composition of voter, auto-zoom and tracking.
//!
//! `FrameProcessor::process` is the single step the frame worker runs for
//! each recognized frame. It holds no I/O: the caller supplies the actuator
//! snapshot and the clock, and receives the confirmed detections plus at
//! most one zoom command.

use tokio::time::Instant;

use scanzoom_models::{BoundingBox, Detection, FrameSize, ZoomState};

use crate::auto_zoom::{AutoZoomController, AutoZoomDecision, AutoZoomState, ZoomMode};
use crate::command_bus::{CommandSource, ZoomCommand, ZoomCommandBus};
use crate::config::ScanConfig;
use crate::tracking::TrackingController;
use crate::voter::DetectionVoter;

/// Inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub detections: &'a [Detection],
    pub frame_size: FrameSize,
    /// Actuator snapshot; `None` when no camera is bound.
    pub zoom: Option<ZoomState>,
    pub auto_zoom: bool,
    pub now: Instant,
}

/// What the controllers decided for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Detections that passed voting, in recognizer order.
    pub confirmed: Vec<Detection>,
    /// Everything the controllers posted this frame.
    pub bus: ZoomCommandBus,
    /// Auto-zoom decision, when the controller ran.
    pub auto_zoom: Option<AutoZoomDecision>,
    /// True when the idle reset forced `ZoomOut` on this frame.
    pub idle_reset: bool,
}

impl FrameOutcome {
    /// Command to hand to the actuator.
    pub fn command(&self) -> Option<ZoomCommand> {
        self.bus.resolve()
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSnapshot {
    pub mode: ZoomMode,
    pub tracked_values: usize,
    pub last_applied: Option<f64>,
    pub last_command_at: Option<Instant>,
    pub last_seen_at: Option<Instant>,
}

pub struct FrameProcessor {
    voter: DetectionVoter,
    auto_zoom: AutoZoomController,
    tracking: TrackingController,
    state: AutoZoomState,
}

impl FrameProcessor {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            voter: DetectionVoter::new(config.vote_threshold),
            auto_zoom: AutoZoomController::new(config),
            tracking: TrackingController::new(config),
            state: AutoZoomState::default(),
        }
    }

    pub fn process(&mut self, input: FrameInput<'_>) -> FrameOutcome {
        let confirmed = self.voter.vote(input.detections);
        let mut outcome = FrameOutcome::default();

        if confirmed.is_empty() {
            if input.auto_zoom {
                if let Some(state) = self.auto_zoom.idle_check(&self.state, input.now) {
                    self.state = state;
                    outcome.idle_reset = true;
                }
            }
            return outcome;
        }

        if input.auto_zoom {
            self.drive_zoom(&confirmed[0], &input, &mut outcome);
        }

        outcome.confirmed = confirmed;
        outcome
    }

    /// Run auto-zoom then tracking on the first confirmed detection.
    fn drive_zoom(&mut self, first: &Detection, input: &FrameInput<'_>, outcome: &mut FrameOutcome) {
        let Some(bbox) = first.bounding_box.filter(BoundingBox::is_valid) else {
            return;
        };
        let Some(zoom) = input.zoom.filter(ZoomState::is_valid) else {
            return;
        };

        if let Some(step) =
            self.auto_zoom
                .update(&self.state, &bbox, input.frame_size, &zoom, input.now)
        {
            self.state = step.state;
            if let Some(ratio) = step.decision.command() {
                outcome.bus.post(CommandSource::AutoZoom, ratio);
            }
            outcome.auto_zoom = Some(step.decision);
        }

        // Tracking sees the ratio auto-zoom just asked for, not the
        // actuator's possibly stale report.
        let baseline = outcome
            .bus
            .latest()
            .map(|cmd| zoom.with_current(cmd.ratio))
            .unwrap_or(zoom);
        if let Some(ratio) = self.tracking.update(&bbox, input.frame_size, &baseline) {
            outcome.bus.post(CommandSource::Tracking, ratio);
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            mode: self.state.mode,
            tracked_values: self.voter.tracked_values(),
            last_applied: self.state.last_applied,
            last_command_at: self.state.last_command_at,
            last_seen_at: self.state.last_seen_at,
        }
    }

    /// Clear votes and return the state machine to rest with zeroed timing.
    pub fn reset(&mut self) {
        self.voter.clear();
        self.state = AutoZoomState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    fn frame() -> FrameSize {
        FrameSize::new(1000, 1000)
    }

    fn centered(value: &str, ratio: f64) -> Detection {
        let side = ratio * 1000.0;
        Detection::new(value, BoundingBox::new(500.0 - side / 2.0, 500.0 - side / 2.0, side, side))
    }

    fn input<'a>(detections: &'a [Detection], zoom: ZoomState, now: Instant) -> FrameInput<'a> {
        FrameInput {
            detections,
            frame_size: frame(),
            zoom: Some(zoom),
            auto_zoom: true,
            now,
        }
    }

    #[test]
    fn test_small_code_scenario() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![centered("code", 0.10)];
        let start = Instant::now();

        for i in 0..2 {
            let now = start + Duration::from_millis(150 * i);
            let outcome = processor.process(input(&dets, zoom, now));
            assert!(outcome.confirmed.is_empty());
            assert!(outcome.command().is_none());
            assert_eq!(processor.snapshot().mode, ZoomMode::None);
        }

        let outcome = processor.process(input(&dets, zoom, start + Duration::from_millis(300)));
        assert_eq!(outcome.confirmed.len(), 1);
        let command = outcome.command().unwrap();
        assert_eq!(command.source, CommandSource::AutoZoom);
        assert!((command.ratio - 1.105).abs() < EPS);
        assert_eq!(processor.snapshot().mode, ZoomMode::ZoomIn);
    }

    #[test]
    fn test_absent_values_never_command() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![Detection::undecoded(BoundingBox::new(0.0, 0.0, 50.0, 50.0))];
        let start = Instant::now();

        for i in 0..20 {
            let outcome = processor.process(input(&dets, zoom, start + Duration::from_millis(100 * i)));
            assert!(outcome.confirmed.is_empty());
            assert!(outcome.command().is_none());
        }
        assert_eq!(processor.snapshot().tracked_values, 0);
    }

    #[test]
    fn test_tracking_overrides_auto_zoom_from_fresh_baseline() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        // 100px box centered at x = 800: size 0.10, dx = 0.3
        let dets = vec![Detection::new("code", BoundingBox::new(750.0, 450.0, 100.0, 100.0))];
        let start = Instant::now();

        processor.process(input(&dets, zoom, start));
        processor.process(input(&dets, zoom, start));
        let outcome = processor.process(input(&dets, zoom, start));

        assert_eq!(outcome.bus.posted().len(), 2);
        let command = outcome.command().unwrap();
        assert_eq!(command.source, CommandSource::Tracking);
        // Baseline 1.105 from auto-zoom, boost 0.18 eased by 20%.
        assert!((command.ratio - (1.105 + 0.036)).abs() < 1e-6);
        assert_eq!(outcome.bus.superseded()[0].source, CommandSource::AutoZoom);
        // Auto-zoom still remembers its own command for the dead-band.
        assert!((processor.snapshot().last_applied.unwrap() - 1.105).abs() < EPS);
    }

    #[test]
    fn test_auto_zoom_disabled_still_reports() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![centered("code", 0.05)];
        let now = Instant::now();

        let mut last = FrameOutcome::default();
        for _ in 0..3 {
            last = processor.process(FrameInput {
                auto_zoom: false,
                ..input(&dets, zoom, now)
            });
        }
        assert_eq!(last.confirmed.len(), 1);
        assert!(last.command().is_none());
        assert!(last.auto_zoom.is_none());
        assert_eq!(processor.snapshot().mode, ZoomMode::None);
    }

    #[test]
    fn test_missing_zoom_state_is_silent() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let dets = vec![centered("code", 0.05)];
        let now = Instant::now();

        for _ in 0..4 {
            let outcome = processor.process(FrameInput {
                zoom: None,
                ..input(&dets, ZoomState::new(1.0, 1.0, 8.0), now)
            });
            assert!(outcome.command().is_none());
        }
        let snapshot = processor.snapshot();
        assert_eq!(snapshot.mode, ZoomMode::None);
        assert!(snapshot.last_seen_at.is_none());
    }

    #[test]
    fn test_missing_bounding_box_is_silent() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![Detection {
            raw_value: Some("code".into()),
            bounding_box: None,
            format: None,
        }];
        let now = Instant::now();

        let mut last = FrameOutcome::default();
        for _ in 0..3 {
            last = processor.process(input(&dets, zoom, now));
        }
        assert_eq!(last.confirmed.len(), 1);
        assert!(last.command().is_none());
    }

    #[test]
    fn test_non_finite_bounding_box_is_silent() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![Detection::new(
            "code",
            BoundingBox::new(f64::NAN, 450.0, 100.0, 100.0),
        )];
        let start = Instant::now();

        for i in 0..5 {
            let outcome = processor.process(input(&dets, zoom, start + Duration::from_millis(400 * i)));
            assert!(outcome.command().is_none());
        }
        assert_eq!(processor.snapshot().mode, ZoomMode::None);
        assert!(processor.snapshot().last_applied.is_none());
    }

    #[test]
    fn test_idle_reset_after_losing_code() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![centered("code", 0.10)];
        let start = Instant::now();

        for _ in 0..3 {
            processor.process(input(&dets, zoom, start));
        }
        assert_eq!(processor.snapshot().mode, ZoomMode::ZoomIn);

        let quiet = processor.process(input(&[], zoom, start + Duration::from_millis(500)));
        assert!(!quiet.idle_reset);

        let reset = processor.process(input(&[], zoom, start + Duration::from_millis(900)));
        assert!(reset.idle_reset);
        assert_eq!(processor.snapshot().mode, ZoomMode::ZoomOut);

        let again = processor.process(input(&[], zoom, start + Duration::from_millis(2000)));
        assert!(!again.idle_reset);
    }

    #[test]
    fn test_reset_clears_votes_and_state() {
        let mut processor = FrameProcessor::new(&ScanConfig::default());
        let zoom = ZoomState::new(1.0, 1.0, 8.0);
        let dets = vec![centered("code", 0.10)];
        let now = Instant::now();
        for _ in 0..3 {
            processor.process(input(&dets, zoom, now));
        }

        processor.reset();
        let snapshot = processor.snapshot();
        assert_eq!(snapshot.mode, ZoomMode::None);
        assert_eq!(snapshot.tracked_values, 0);
        assert!(snapshot.last_applied.is_none());
        assert!(snapshot.last_command_at.is_none());
        assert!(snapshot.last_seen_at.is_none());

        // Voting starts over.
        assert!(processor.process(input(&dets, zoom, now)).confirmed.is_empty());
    }
}
