//! Hysteresis auto-zoom for keeping a code at a readable size.
//!
//! The controller compares the confirmed detection's size against two nested
//! bands. It starts zooming only when the code leaves the outer band
//! (`too_small` / `too_big`) and keeps zooming until it re-enters the inner
//! band (`ideal_min` / `ideal_max`), so a code sitting on a single boundary
//! value cannot make the lens oscillate.
//!
//! [`AutoZoomController::update`] is a pure function of its inputs and the
//! previous [`AutoZoomState`]; the caller owns the state and threads it from
//! frame to frame.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use scanzoom_models::{BoundingBox, FrameSize, ZoomState};

use crate::config::ScanConfig;

/// Control state of the auto-zoom state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoomMode {
    /// Resting; the code is inside the outer band.
    #[default]
    None,
    /// Driving the zoom ratio up.
    ZoomIn,
    /// Driving the zoom ratio down.
    ZoomOut,
}

impl ZoomMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomMode::None => "none",
            ZoomMode::ZoomIn => "zoom_in",
            ZoomMode::ZoomOut => "zoom_out",
        }
    }

    /// Transition table.
    ///
    /// Every state lists its exits explicitly. `drive` is true when the frame
    /// should produce a zoom step in the resulting mode; entering a zoom mode
    /// drives on the same frame, leaving one never does.
    pub fn transition(self, size_ratio: f64, band: &HysteresisBand) -> Transition {
        match self {
            ZoomMode::None => {
                if size_ratio < band.too_small {
                    Transition::drive(ZoomMode::ZoomIn)
                } else if size_ratio > band.too_big {
                    Transition::drive(ZoomMode::ZoomOut)
                } else {
                    Transition::rest()
                }
            }
            ZoomMode::ZoomIn => {
                if size_ratio >= band.ideal_min {
                    Transition::rest()
                } else {
                    Transition::drive(ZoomMode::ZoomIn)
                }
            }
            ZoomMode::ZoomOut => {
                if size_ratio <= band.ideal_max {
                    Transition::rest()
                } else {
                    Transition::drive(ZoomMode::ZoomOut)
                }
            }
        }
    }
}

/// Result of evaluating the transition table for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ZoomMode,
    pub drive: bool,
}

impl Transition {
    fn drive(next: ZoomMode) -> Self {
        Self { next, drive: true }
    }

    fn rest() -> Self {
        Self {
            next: ZoomMode::None,
            drive: false,
        }
    }
}

/// Entry and exit thresholds as fractions of the frame dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisBand {
    pub too_small: f64,
    pub too_big: f64,
    pub ideal_min: f64,
    pub ideal_max: f64,
}

impl HysteresisBand {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            too_small: config.too_small_ratio,
            too_big: config.too_big_ratio,
            ideal_min: config.ideal_min_ratio,
            ideal_max: config.ideal_max_ratio,
        }
    }
}

/// Mode plus the timing fields owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoZoomState {
    pub mode: ZoomMode,
    /// Ratio of the last command this controller issued.
    pub last_applied: Option<f64>,
    /// When that command was issued.
    pub last_command_at: Option<Instant>,
    /// Last frame on which a confirmed detection reached the controller.
    pub last_seen_at: Option<Instant>,
    /// Set once the idle reset fired; cleared on the next sighting.
    pub idle_reset_fired: bool,
}

/// Why a frame did or did not produce a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoZoomDecision {
    /// Inside the cooldown window; the state machine was not evaluated.
    Cooldown,
    /// Resting, or just returned to rest.
    Rest,
    /// A step was computed but was too close to the last applied ratio.
    DeadBand { proposed: f64 },
    /// Issue this ratio to the actuator.
    Command { ratio: f64 },
}

impl AutoZoomDecision {
    pub fn command(&self) -> Option<f64> {
        match self {
            AutoZoomDecision::Command { ratio } => Some(*ratio),
            _ => None,
        }
    }
}

/// One frame's output: the successor state and the decision that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoZoomStep {
    pub state: AutoZoomState,
    pub decision: AutoZoomDecision,
}

/// Stateless auto-zoom controller.
#[derive(Debug, Clone)]
pub struct AutoZoomController {
    band: HysteresisBand,
    step: f64,
    ease_factor: f64,
    cooldown: std::time::Duration,
    min_delta: f64,
    idle_reset: std::time::Duration,
}

impl AutoZoomController {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            band: HysteresisBand::from_config(config),
            step: config.zoom_step,
            ease_factor: config.zoom_ease_factor,
            cooldown: config.zoom_cooldown(),
            min_delta: config.min_zoom_delta,
            idle_reset: config.idle_reset(),
        }
    }

    pub fn band(&self) -> &HysteresisBand {
        &self.band
    }

    /// Evaluate one frame with a confirmed detection.
    ///
    /// Returns `None` when the frame size or the box is degenerate; the state
    /// is then left untouched.
    pub fn update(
        &self,
        state: &AutoZoomState,
        bbox: &BoundingBox,
        frame: FrameSize,
        zoom: &ZoomState,
        now: Instant,
    ) -> Option<AutoZoomStep> {
        let size_ratio = bbox.size_ratio(frame)?;

        let mut next = AutoZoomState {
            last_seen_at: Some(now),
            idle_reset_fired: false,
            ..*state
        };

        if let Some(last) = state.last_command_at {
            if now.saturating_duration_since(last) < self.cooldown {
                return Some(AutoZoomStep {
                    state: next,
                    decision: AutoZoomDecision::Cooldown,
                });
            }
        }

        let transition = state.mode.transition(size_ratio, &self.band);
        if transition.next != state.mode {
            debug!(
                from = state.mode.as_str(),
                to = transition.next.as_str(),
                size_ratio,
                "Auto-zoom mode transition"
            );
        }
        next.mode = transition.next;

        if !transition.drive {
            return Some(AutoZoomStep {
                state: next,
                decision: AutoZoomDecision::Rest,
            });
        }

        let proposed = self.eased_target(transition.next, zoom);

        if let Some(last) = state.last_applied {
            if (proposed - last).abs() < self.min_delta {
                return Some(AutoZoomStep {
                    state: next,
                    decision: AutoZoomDecision::DeadBand { proposed },
                });
            }
        }

        next.last_applied = Some(proposed);
        next.last_command_at = Some(now);
        Some(AutoZoomStep {
            state: next,
            decision: AutoZoomDecision::Command { ratio: proposed },
        })
    }

    /// Fixed step toward the mode's direction, clamped to the lens range,
    /// then eased from the current ratio.
    fn eased_target(&self, mode: ZoomMode, zoom: &ZoomState) -> f64 {
        let current = zoom.current_ratio;
        let target = match mode {
            ZoomMode::ZoomIn => (current + self.step).min(zoom.max_ratio),
            ZoomMode::ZoomOut => (current - self.step).max(zoom.min_ratio),
            ZoomMode::None => current,
        };
        current + (target - current) * self.ease_factor
    }

    /// Evaluate a frame without confirmed detections.
    ///
    /// After `idle_reset` without a sighting while not at rest, the mode is
    /// forced to `ZoomOut` to reacquire a lost code. Fires once per idle
    /// episode; the next sighting re-arms it.
    pub fn idle_check(&self, state: &AutoZoomState, now: Instant) -> Option<AutoZoomState> {
        if state.mode == ZoomMode::None || state.idle_reset_fired {
            return None;
        }
        let last_seen = state.last_seen_at?;
        if now.saturating_duration_since(last_seen) <= self.idle_reset {
            return None;
        }

        debug!(from = state.mode.as_str(), "No confirmed detection; forcing zoom out");
        Some(AutoZoomState {
            mode: ZoomMode::ZoomOut,
            last_seen_at: Some(now),
            idle_reset_fired: true,
            ..*state
        })
    }
}
