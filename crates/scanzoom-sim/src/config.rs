//! Simulator configuration.

use std::time::Duration;

use tracing::warn;

use scanzoom_models::{parse_format_list, BarcodeFormat, FrameSize, ScanOptions};

/// Simulated scene and capture settings.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Capture rate of the virtual camera
    pub fps: u32,
    /// How long to run the session
    pub duration: Duration,
    /// Capture resolution
    pub frame_width: u32,
    pub frame_height: u32,
    /// Code side as a fraction of the frame height at 1x zoom
    pub code_size: f64,
    /// Horizontal offset of the code center from the frame center at 1x,
    /// as a fraction of the frame width
    pub offset_x: f64,
    /// Probability that a frame sees the code but fails to decode it
    pub dropout: f64,
    /// Lens range
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Decoded payload
    pub value: String,
    /// Symbologies requested from the recognizer
    pub formats: Vec<BarcodeFormat>,
    /// Drive the lens from detections
    pub auto_zoom: bool,
    /// Fixed RNG seed; random when unset
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            duration: Duration::from_secs(10),
            frame_width: 1280,
            frame_height: 720,
            code_size: 0.08,
            offset_x: 0.0,
            dropout: 0.1,
            min_zoom: 1.0,
            max_zoom: 8.0,
            value: "SIM-0001".to_string(),
            formats: vec![BarcodeFormat::QrCode],
            auto_zoom: true,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Create config from `SIM_*` environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            fps: std::env::var("SIM_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|fps| *fps > 0)
                .unwrap_or(d.fps),
            duration: Duration::from_secs(
                std::env::var("SIM_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(d.duration.as_secs()),
            ),
            frame_width: std::env::var("SIM_FRAME_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.frame_width),
            frame_height: std::env::var("SIM_FRAME_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.frame_height),
            code_size: std::env::var("SIM_CODE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.code_size),
            offset_x: std::env::var("SIM_OFFSET_X")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.offset_x),
            dropout: std::env::var("SIM_DROPOUT")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(d.dropout),
            min_zoom: std::env::var("SIM_MIN_ZOOM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.min_zoom),
            max_zoom: std::env::var("SIM_MAX_ZOOM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.max_zoom),
            value: std::env::var("SIM_VALUE").unwrap_or(d.value),
            formats: std::env::var("SIM_FORMATS")
                .map(|v| formats_from_list(&v))
                .unwrap_or(d.formats),
            auto_zoom: std::env::var("SIM_AUTO_ZOOM")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(d.auto_zoom),
            seed: std::env::var("SIM_SEED").ok().and_then(|s| s.parse().ok()),
        }
    }

    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.frame_width, self.frame_height)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn total_frames(&self) -> u64 {
        (self.duration.as_secs_f64() * f64::from(self.fps)).round() as u64
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::default()
            .with_auto_zoom(self.auto_zoom)
            .with_formats(self.formats.iter().copied())
    }
}

/// Parse a comma-separated format list. Unknown names are skipped.
fn formats_from_list(list: &str) -> Vec<BarcodeFormat> {
    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    let (formats, rejected) = parse_format_list(&names);
    for name in rejected {
        warn!(format = %name, "Ignoring unknown barcode format");
    }
    formats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing() {
        let config = SimConfig {
            fps: 20,
            duration: Duration::from_secs(3),
            ..SimConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(50));
        assert_eq!(config.total_frames(), 60);
    }

    #[test]
    fn test_scan_options_follow_auto_zoom_flag() {
        let config = SimConfig {
            auto_zoom: false,
            ..SimConfig::default()
        };
        assert!(!config.scan_options().auto_zoom);
    }

    #[test]
    fn test_format_list_skips_unknown_names() {
        assert_eq!(
            formats_from_list("ean_13, bogus ,QR_CODE"),
            vec![BarcodeFormat::Ean13, BarcodeFormat::QrCode]
        );
        assert_eq!(formats_from_list("bogus"), vec![BarcodeFormat::QrCode]);
        assert_eq!(formats_from_list(""), vec![BarcodeFormat::QrCode]);
    }
}
