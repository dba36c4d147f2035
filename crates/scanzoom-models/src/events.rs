//! Events delivered to the host application.
//!
//! Field names follow the host bridge's camelCase listener payloads.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Detection, FrameSize};

/// Listener event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ScanEventType {
    /// Confirmed detections for one frame
    BarcodesScanned,
    /// Recognition or session failure
    ScanError,
}

impl ScanEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanEventType::BarcodesScanned => "barcodesScanned",
            ScanEventType::ScanError => "scanError",
        }
    }
}

/// Event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEvent {
    /// Confirmed detections, at most once per analyzed frame.
    BarcodesScanned {
        barcodes: Vec<Detection>,
        #[serde(rename = "imageSize")]
        frame_size: FrameSize,
    },

    /// Recognition failure or a failure to re-establish the camera.
    ScanError {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ScanEvent {
    pub fn barcodes_scanned(barcodes: Vec<Detection>, frame_size: FrameSize) -> Self {
        Self::BarcodesScanned {
            barcodes,
            frame_size,
        }
    }

    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> ScanEventType {
        match self {
            ScanEvent::BarcodesScanned { .. } => ScanEventType::BarcodesScanned,
            ScanEvent::ScanError { .. } => ScanEventType::ScanError,
        }
    }
}
