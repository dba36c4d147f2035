//! Options accepted when starting a scan.

use schemars::JsonSchema;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::format::{parse_format_list, resolve_formats, BarcodeFormat};

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LensFacing {
    Front,
    #[default]
    Back,
}

impl LensFacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            LensFacing::Front => "FRONT",
            LensFacing::Back => "BACK",
        }
    }
}

impl fmt::Display for LensFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LensFacing {
    type Err = LensFacingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front" => Ok(LensFacing::Front),
            "back" | "rear" => Ok(LensFacing::Back),
            _ => Err(LensFacingParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown lens facing: {0}")]
pub struct LensFacingParseError(String);

fn default_auto_zoom() -> bool {
    true
}

/// One entry of a host-supplied format list.
#[derive(Deserialize)]
#[serde(untagged)]
enum FormatEntry {
    Name(String),
    Other(IgnoredAny),
}

/// Read a format list leniently: unknown or malformed entries are skipped,
/// and a non-empty list with nothing usable resolves to `QR_CODE`.
fn deserialize_formats<'de, D>(deserializer: D) -> Result<Vec<BarcodeFormat>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<FormatEntry>> = Option::deserialize(deserializer)?;
    let entries = entries.unwrap_or_default();
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut names = Vec::with_capacity(entries.len());
    let mut malformed = 0usize;
    for entry in entries {
        match entry {
            FormatEntry::Name(name) => names.push(name),
            FormatEntry::Other(_) => malformed += 1,
        }
    }
    if malformed > 0 {
        warn!(count = malformed, "Ignoring non-string barcode format entries");
    }

    let (formats, rejected) = parse_format_list(&names);
    for name in rejected {
        warn!(format = %name, "Ignoring unknown barcode format");
    }
    Ok(formats)
}

/// Options for `startAutoZoomScan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Drive the zoom actuator from confirmed detections.
    #[serde(default = "default_auto_zoom")]
    pub auto_zoom: bool,

    /// Symbologies to look for. Empty means `QR_CODE`.
    #[serde(default, deserialize_with = "deserialize_formats")]
    pub formats: Vec<BarcodeFormat>,

    #[serde(default)]
    pub lens_facing: LensFacing,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            auto_zoom: default_auto_zoom(),
            formats: Vec::new(),
            lens_facing: LensFacing::default(),
        }
    }
}

impl ScanOptions {
    pub fn with_auto_zoom(mut self, enabled: bool) -> Self {
        self.auto_zoom = enabled;
        self
    }

    pub fn with_formats(mut self, formats: impl IntoIterator<Item = BarcodeFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    pub fn with_lens_facing(mut self, lens_facing: LensFacing) -> Self {
        self.lens_facing = lens_facing;
        self
    }

    /// Formats the recognizer should actually be configured with.
    pub fn resolved_formats(&self) -> Vec<BarcodeFormat> {
        resolve_formats(&self.formats)
    }
}
