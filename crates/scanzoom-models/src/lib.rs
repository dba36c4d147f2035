//! Shared data models for the auto-zoom scanning controller.
//!
//! This crate provides Serde-serializable types for:
//! - Frame geometry and per-frame detections
//! - Zoom actuator state
//! - Barcode formats, lens selection and scan options
//! - Events delivered to the host application

pub mod detection;
pub mod events;
pub mod format;
pub mod geometry;
pub mod options;
pub mod session;
pub mod zoom;

// Re-export common types
pub use detection::Detection;
pub use events::{ScanEvent, ScanEventType};
pub use format::{parse_format_list, resolve_formats, BarcodeFormat, BarcodeFormatParseError};
pub use geometry::{BoundingBox, FrameSize};
pub use options::{LensFacing, LensFacingParseError, ScanOptions};
pub use session::SessionId;
pub use zoom::ZoomState;
