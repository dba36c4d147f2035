//! Collaborator traits.
//!
//! The scanner drives three external components: a recognizer that decodes
//! frames, a camera session that owns capture and lifecycle, and the zoom
//! actuator that the camera session exposes once it is open.

use std::sync::Arc;

use async_trait::async_trait;

use scanzoom_models::{BarcodeFormat, Detection, ScanOptions, ZoomState};

use crate::error::ScanResult;
use crate::frame_gate::Frame;

/// Barcode recognition engine.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Decode every code of the requested formats in one frame.
    ///
    /// A failure affects only this frame; controller state is untouched.
    async fn detect(&self, frame: &Frame, formats: &[BarcodeFormat]) -> ScanResult<Vec<Detection>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Lens zoom control bound to an open camera session.
pub trait ZoomActuator: Send + Sync {
    /// Current snapshot, or `None` when the camera cannot report one.
    fn zoom_state(&self) -> Option<ZoomState>;

    /// Fire-and-forget request; the actuator clamps to its own range.
    fn set_zoom_ratio(&self, ratio: f64);
}

/// Capture session lifecycle.
#[async_trait]
pub trait CameraSession: Send + Sync {
    /// Bind the camera with the given options and return its actuator.
    async fn open(&self, options: &ScanOptions) -> ScanResult<Arc<dyn ZoomActuator>>;

    /// Stop delivering frames but keep the binding.
    async fn pause(&self);

    /// Re-establish frame delivery after a pause.
    async fn resume(&self) -> ScanResult<()>;

    /// Release the camera.
    async fn close(&self);

    fn name(&self) -> &'static str {
        "camera"
    }
}
