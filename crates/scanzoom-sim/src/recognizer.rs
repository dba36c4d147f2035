//! Scripted recognizer.
//!
//! Renders a single square code whose apparent size and horizontal offset
//! scale with the lens ratio, the way a real code grows toward the edges as
//! the camera zooms in about the frame center.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scanzoom_core::{Frame, Recognizer, ScanResult};
use scanzoom_models::{BarcodeFormat, BoundingBox, Detection, FrameSize};

use crate::config::SimConfig;
use crate::lens::SimLens;

pub struct ScriptedRecognizer {
    lens: Arc<SimLens>,
    code_size: f64,
    offset_x: f64,
    dropout: f64,
    value: String,
    rng: Mutex<StdRng>,
}

impl ScriptedRecognizer {
    pub fn new(config: &SimConfig, lens: Arc<SimLens>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            lens,
            code_size: config.code_size,
            offset_x: config.offset_x,
            dropout: config.dropout.clamp(0.0, 1.0),
            value: config.value.clone(),
            rng: Mutex::new(rng),
        }
    }

    /// Where the code lands at the given zoom, or `None` once it has left
    /// the frame.
    pub fn project(&self, frame: FrameSize, zoom: f64) -> Option<BoundingBox> {
        let width = f64::from(frame.width);
        let height = f64::from(frame.height);
        let side = self.code_size * zoom * height;
        let cx = width * (0.5 + self.offset_x * zoom);
        let cy = height * 0.5;

        if cx < 0.0 || cx > width {
            return None;
        }
        Some(BoundingBox::new(cx - side / 2.0, cy - side / 2.0, side, side))
    }

    fn decodes(&self) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        !rng.random_bool(self.dropout)
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn detect(&self, frame: &Frame, formats: &[BarcodeFormat]) -> ScanResult<Vec<Detection>> {
        let Some(bbox) = self.project(frame.size, self.lens.current_ratio()) else {
            return Ok(Vec::new());
        };

        let format = formats.first().copied().unwrap_or(BarcodeFormat::DEFAULT);
        let detection = if self.decodes() {
            Detection::new(self.value.clone(), bbox).with_format(format)
        } else {
            Detection::undecoded(bbox)
        };
        Ok(vec![detection])
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
