//! Barcode symbologies the recognizer can be asked to look for.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "CODE_128")]
    Code128,
    DataMatrix,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "EAN_13")]
    Ean13,
    Itf,
    #[serde(rename = "PDF_417")]
    Pdf417,
    QrCode,
    UpcA,
    UpcE,
}

impl BarcodeFormat {
    /// All supported symbologies.
    pub const ALL: &'static [BarcodeFormat] = &[
        BarcodeFormat::Aztec,
        BarcodeFormat::Codabar,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Itf,
        BarcodeFormat::Pdf417,
        BarcodeFormat::QrCode,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
    ];

    /// Format used when a scan is started without a usable format list.
    pub const DEFAULT: BarcodeFormat = BarcodeFormat::QrCode;

    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Aztec => "AZTEC",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::Pdf417 => "PDF_417",
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
        }
    }

}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BarcodeFormat {
    type Err = BarcodeFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        let compact = normalized.replace('_', "");
        BarcodeFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == normalized || f.as_str().replace('_', "") == compact)
            .ok_or_else(|| BarcodeFormatParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown barcode format: {0}")]
pub struct BarcodeFormatParseError(String);

/// Resolve a requested format set, degrading to `QR_CODE` when it is empty.
///
/// Duplicates are dropped while keeping first-seen order.
pub fn resolve_formats(requested: &[BarcodeFormat]) -> Vec<BarcodeFormat> {
    let mut resolved: Vec<BarcodeFormat> = Vec::with_capacity(requested.len());
    for format in requested {
        if !resolved.contains(format) {
            resolved.push(*format);
        }
    }
    if resolved.is_empty() {
        resolved.push(BarcodeFormat::DEFAULT);
    }
    resolved
}

/// Parse format names, skipping the ones that are not recognized.
///
/// Returns the resolved list together with the rejected names so the caller
/// can report them. An input that yields no valid format resolves to
/// `QR_CODE`.
pub fn parse_format_list<S: AsRef<str>>(names: &[S]) -> (Vec<BarcodeFormat>, Vec<String>) {
    let mut parsed = Vec::with_capacity(names.len());
    let mut rejected = Vec::new();
    for name in names {
        match name.as_ref().parse::<BarcodeFormat>() {
            Ok(format) => parsed.push(format),
            Err(_) => rejected.push(name.as_ref().to_string()),
        }
    }
    (resolve_formats(&parsed), rejected)
}
