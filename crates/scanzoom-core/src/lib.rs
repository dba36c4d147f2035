#![deny(unreachable_patterns)]
//! Real-time auto-zoom control for barcode scanning.
//!
//! This crate provides:
//! - Multi-frame detection voting
//! - A hysteresis auto-zoom state machine with cooldown, easing and dead-band
//! - Lateral tracking nudges
//! - A per-frame zoom command bus with last-writer-wins resolution
//! - Frame admission with single-slot backpressure and rate throttling
//! - A session driver that runs recognition on a dedicated worker and hands
//!   zoom commands to the actuator

pub mod auto_zoom;
pub mod command_bus;
pub mod config;
pub mod error;
pub mod frame_gate;
pub mod metrics;
pub mod processor;
pub mod providers;
pub mod scanner;
pub mod tracking;
pub mod voter;

mod worker;

// Controllers
pub use auto_zoom::{AutoZoomController, AutoZoomDecision, AutoZoomState, HysteresisBand, ZoomMode};
pub use command_bus::{CommandSource, ZoomCommand, ZoomCommandBus};
pub use processor::{ControllerSnapshot, FrameInput, FrameOutcome, FrameProcessor};
pub use tracking::TrackingController;
pub use voter::DetectionVoter;

// Session driver
pub use frame_gate::{DropReason, Frame, FrameAdmission, FrameGate, RejectReason};
pub use providers::{CameraSession, Recognizer, ZoomActuator};
pub use scanner::AutoZoomScanner;

pub use config::ScanConfig;
pub use error::{ScanError, ScanResult};
