//! Virtual lens and camera session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use scanzoom_core::{CameraSession, ScanResult, ZoomActuator};
use scanzoom_models::{ScanOptions, ZoomState};

/// Lens that applies every request immediately, clamped to its range.
#[derive(Debug)]
pub struct SimLens {
    state: Mutex<ZoomState>,
    commands: AtomicU64,
}

impl SimLens {
    pub fn new(min_ratio: f64, max_ratio: f64) -> Self {
        Self {
            state: Mutex::new(ZoomState::new(min_ratio, min_ratio, max_ratio)),
            commands: AtomicU64::new(0),
        }
    }

    pub fn current_ratio(&self) -> f64 {
        self.snapshot().current_ratio
    }

    /// Number of ratio requests received.
    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    /// Back to the widest setting.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.current_ratio = state.min_ratio;
    }

    fn snapshot(&self) -> ZoomState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ZoomActuator for SimLens {
    fn zoom_state(&self) -> Option<ZoomState> {
        Some(self.snapshot())
    }

    fn set_zoom_ratio(&self, ratio: f64) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.current_ratio = state.clamp(ratio);
        self.commands.fetch_add(1, Ordering::Relaxed);
        debug!(ratio = state.current_ratio, "Lens moved");
    }
}

/// Camera session whose actuator is a [`SimLens`].
pub struct SimCamera {
    lens: Arc<SimLens>,
    paused: AtomicBool,
}

impl SimCamera {
    pub fn new(lens: Arc<SimLens>) -> Self {
        Self {
            lens,
            paused: AtomicBool::new(false),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CameraSession for SimCamera {
    async fn open(&self, options: &ScanOptions) -> ScanResult<Arc<dyn ZoomActuator>> {
        self.lens.reset();
        self.paused.store(false, Ordering::Relaxed);
        info!(lens = options.lens_facing.as_str(), "Virtual camera opened");
        Ok(Arc::clone(&self.lens) as Arc<dyn ZoomActuator>)
    }

    async fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    async fn resume(&self) -> ScanResult<()> {
        self.paused.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) {
        info!(final_ratio = self.lens.current_ratio(), "Virtual camera closed");
    }

    fn name(&self) -> &'static str {
        "sim-camera"
    }
}
