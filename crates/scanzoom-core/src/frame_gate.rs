//! Admission control between the capture session and the recognizer.
//!
//! The gate holds at most one pending frame. A newer frame replaces an older
//! one that the worker has not picked up yet, so the recognizer always sees
//! the freshest image and never has more than one frame in flight. Frames
//! are rejected outright while the gate is closed (no session) or paused,
//! and dropped when they arrive faster than the configured analysis interval.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use scanzoom_models::FrameSize;

/// One captured image handed to the recognizer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub size: FrameSize,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(size: FrameSize, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            size,
            data: data.into(),
            captured_at: Instant::now(),
        }
    }

    /// Frame with no pixel payload, for recognizers that ignore the image.
    pub fn empty(size: FrameSize) -> Self {
        Self::new(size, Vec::<u8>::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No session has been started, or it was stopped.
    Uninitialized,
    Paused,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Uninitialized => "uninitialized",
            RejectReason::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Arrived inside the analysis interval of the last admitted frame.
    Throttled,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Throttled => "throttled",
        }
    }
}

/// Result of offering a frame to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAdmission {
    /// Queued for recognition. `replaced_pending` is true when an older,
    /// not yet processed frame was discarded in its favor.
    Accepted { replaced_pending: bool },
    Rejected(RejectReason),
    Dropped(DropReason),
}

impl FrameAdmission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FrameAdmission::Accepted { .. })
    }
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    paused: bool,
    last_admitted: Option<Instant>,
    pending: Option<Frame>,
}

#[derive(Debug)]
pub struct FrameGate {
    state: Mutex<GateState>,
    ready: Notify,
    interval: Option<Duration>,
}

impl FrameGate {
    /// Create a closed gate. `interval` is the minimum spacing between
    /// admitted frames; `None` admits every frame.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            ready: Notify::new(),
            interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn submit(&self, frame: Frame) -> FrameAdmission {
        self.submit_at(frame, Instant::now())
    }

    pub fn submit_at(&self, frame: Frame, now: Instant) -> FrameAdmission {
        let mut state = self.lock();
        if !state.open {
            return FrameAdmission::Rejected(RejectReason::Uninitialized);
        }
        if state.paused {
            return FrameAdmission::Rejected(RejectReason::Paused);
        }
        if let (Some(interval), Some(last)) = (self.interval, state.last_admitted) {
            if now.saturating_duration_since(last) < interval {
                return FrameAdmission::Dropped(DropReason::Throttled);
            }
        }

        state.last_admitted = Some(now);
        let replaced_pending = state.pending.replace(frame).is_some();
        drop(state);

        self.ready.notify_one();
        FrameAdmission::Accepted { replaced_pending }
    }

    /// Take the pending frame, if any.
    pub fn take_pending(&self) -> Option<Frame> {
        self.lock().pending.take()
    }

    /// Resolves once a frame has been admitted since the last wakeup.
    pub async fn frame_ready(&self) {
        self.ready.notified().await;
    }

    /// Start admitting frames for a new session.
    pub fn open(&self) {
        let mut state = self.lock();
        *state = GateState {
            open: true,
            ..GateState::default()
        };
    }

    /// Stop admitting frames and discard the pending one.
    pub fn close(&self) {
        let mut state = self.lock();
        state.open = false;
        state.paused = false;
        state.pending = None;
    }

    /// Hold admission without tearing the session down. The pending frame
    /// is discarded.
    pub fn pause(&self) {
        let mut state = self.lock();
        state.paused = true;
        state.pending = None;
    }

    pub fn resume(&self) {
        let mut state = self.lock();
        state.paused = false;
        state.last_admitted = None;
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::empty(FrameSize::new(640, 480))
    }

    fn open_gate(interval_ms: u64) -> FrameGate {
        let interval = (interval_ms > 0).then(|| Duration::from_millis(interval_ms));
        let gate = FrameGate::new(interval);
        gate.open();
        gate
    }

    #[test]
    fn test_closed_gate_rejects() {
        let gate = FrameGate::new(None);
        assert_eq!(
            gate.submit(frame()),
            FrameAdmission::Rejected(RejectReason::Uninitialized)
        );
        assert!(gate.take_pending().is_none());
    }

    #[test]
    fn test_paused_gate_rejects_and_discards_pending() {
        let gate = open_gate(0);
        assert!(gate.submit(frame()).is_accepted());

        gate.pause();
        assert!(gate.take_pending().is_none());
        assert_eq!(gate.submit(frame()), FrameAdmission::Rejected(RejectReason::Paused));

        gate.resume();
        assert!(gate.submit(frame()).is_accepted());
    }

    #[test]
    fn test_newer_frame_supersedes_pending() {
        let gate = open_gate(0);
        let first = Frame::empty(FrameSize::new(1, 1));
        let second = Frame::empty(FrameSize::new(2, 2));

        assert_eq!(
            gate.submit(first),
            FrameAdmission::Accepted { replaced_pending: false }
        );
        assert_eq!(
            gate.submit(second),
            FrameAdmission::Accepted { replaced_pending: true }
        );

        let pending = gate.take_pending().unwrap();
        assert_eq!(pending.size, FrameSize::new(2, 2));
        assert!(gate.take_pending().is_none());
    }

    #[test]
    fn test_throttle_interval() {
        let gate = open_gate(150);
        let start = Instant::now();

        assert!(gate.submit_at(frame(), start).is_accepted());
        assert_eq!(
            gate.submit_at(frame(), start + Duration::from_millis(100)),
            FrameAdmission::Dropped(DropReason::Throttled)
        );
        // Dropped frames do not move the window.
        assert!(gate
            .submit_at(frame(), start + Duration::from_millis(150))
            .is_accepted());
    }

    #[test]
    fn test_close_discards_pending() {
        let gate = open_gate(0);
        gate.submit(frame());
        gate.close();
        assert!(!gate.is_open());
        assert!(gate.take_pending().is_none());
        assert_eq!(
            gate.submit(frame()),
            FrameAdmission::Rejected(RejectReason::Uninitialized)
        );
    }

    #[test]
    fn test_frame_ready_pending_until_submit() {
        let gate = open_gate(0);
        let mut ready = tokio_test::task::spawn(gate.frame_ready());
        tokio_test::assert_pending!(ready.poll());

        gate.submit(frame());
        assert!(ready.is_woken());
        tokio_test::assert_ready!(ready.poll());
        assert!(gate.take_pending().is_some());
    }
}
