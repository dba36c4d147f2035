//! Per-frame zoom command bus.
//!
//! Both controllers post to the same bus while a frame is processed, in a
//! fixed order (auto-zoom first, tracking second). The last post wins: only
//! the resolved command is handed to the actuator for that frame.

use serde::{Deserialize, Serialize};

/// Which controller produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    AutoZoom,
    Tracking,
}

impl CommandSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandSource::AutoZoom => "auto_zoom",
            CommandSource::Tracking => "tracking",
        }
    }
}

/// Zoom ratio to set on the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCommand {
    pub ratio: f64,
    pub source: CommandSource,
}

#[derive(Debug, Clone, Default)]
pub struct ZoomCommandBus {
    posted: Vec<ZoomCommand>,
}

impl ZoomCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, source: CommandSource, ratio: f64) {
        self.posted.push(ZoomCommand { ratio, source });
    }

    /// Most recent post, if any.
    pub fn latest(&self) -> Option<&ZoomCommand> {
        self.posted.last()
    }

    /// Everything posted this frame, in order.
    pub fn posted(&self) -> &[ZoomCommand] {
        &self.posted
    }

    /// Commands that were overridden by a later post.
    pub fn superseded(&self) -> &[ZoomCommand] {
        match self.posted.len() {
            0 => &[],
            n => &self.posted[..n - 1],
        }
    }

    /// Last-writer-wins resolution.
    pub fn resolve(&self) -> Option<ZoomCommand> {
        self.posted.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bus() {
        let bus = ZoomCommandBus::new();
        assert!(bus.resolve().is_none());
        assert!(bus.superseded().is_empty());
    }

    #[test]
    fn test_last_writer_wins() {
        let mut bus = ZoomCommandBus::new();
        bus.post(CommandSource::AutoZoom, 1.5);
        bus.post(CommandSource::Tracking, 1.6);

        let resolved = bus.resolve().unwrap();
        assert_eq!(resolved.source, CommandSource::Tracking);
        assert_eq!(resolved.ratio, 1.6);
        assert_eq!(bus.superseded().len(), 1);
        assert_eq!(bus.superseded()[0].source, CommandSource::AutoZoom);
    }
}
