//! Closed-loop auto-zoom simulator.
//!
//! This crate provides:
//! - A virtual lens and camera session
//! - A scripted recognizer whose code grows with the lens ratio
//! - A runner that feeds frames at a fixed rate and summarizes the session

pub mod config;
pub mod lens;
pub mod recognizer;
pub mod runner;

pub use config::SimConfig;
pub use lens::{SimCamera, SimLens};
pub use recognizer::ScriptedRecognizer;
pub use runner::{SimReport, Simulation};
