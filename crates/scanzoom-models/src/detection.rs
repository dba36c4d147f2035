//! Per-frame recognizer output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{BarcodeFormat, BoundingBox};

/// One recognized code in one frame.
///
/// Produced fresh each frame by the external recognizer and never kept
/// beyond that frame's processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Decoded text. Detections without a value never vote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,

    /// Location in frame pixel coordinates, when the recognizer reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Symbology, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BarcodeFormat>,
}

impl Detection {
    /// Detection with a decoded value and a location.
    pub fn new(raw_value: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            raw_value: Some(raw_value.into()),
            bounding_box: Some(bounding_box),
            format: None,
        }
    }

    /// Detection the recognizer located but could not decode.
    pub fn undecoded(bounding_box: BoundingBox) -> Self {
        Self {
            raw_value: None,
            bounding_box: Some(bounding_box),
            format: None,
        }
    }

    pub fn with_format(mut self, format: BarcodeFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Decoded value, ignoring empty strings.
    pub fn value(&self) -> Option<&str> {
        self.raw_value.as_deref().filter(|v| !v.is_empty())
    }
}
