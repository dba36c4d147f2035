//! Session tasks: the frame worker and the actuator dispatcher.
//!
//! The frame worker is the only task that runs the recognizer and touches
//! the [`FrameProcessor`]; frames are handled strictly one at a time. Zoom
//! commands are handed off to the dispatcher over a bounded channel and the
//! worker moves on without waiting for them to be applied.
//!
//! Every command carries the epoch of the session that produced it. The
//! dispatcher applies a command only while holding the epoch lock and only
//! if the epoch still matches, so once a stop has bumped the epoch nothing
//! queued or in flight can reach the actuator.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use scanzoom_models::{BarcodeFormat, Detection, ScanEvent, SessionId};

use crate::auto_zoom::AutoZoomDecision;
use crate::command_bus::ZoomCommand;
use crate::error::ScanResult;
use crate::frame_gate::{Frame, FrameGate};
use crate::metrics;
use crate::processor::{FrameInput, FrameProcessor};
use crate::providers::{Recognizer, ZoomActuator};

/// A command tagged with the session epoch it belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PostedCommand {
    pub epoch: u64,
    pub command: ZoomCommand,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) struct FrameWorker {
    pub session_id: SessionId,
    pub epoch: u64,
    pub gate: Arc<FrameGate>,
    pub recognizer: Arc<dyn Recognizer>,
    pub actuator: Arc<dyn ZoomActuator>,
    pub processor: Arc<Mutex<FrameProcessor>>,
    pub formats: Vec<BarcodeFormat>,
    pub auto_zoom: bool,
    pub events: broadcast::Sender<ScanEvent>,
    pub commands: mpsc::Sender<PostedCommand>,
}

impl FrameWorker {
    /// Drain admitted frames until shutdown is signalled.
    ///
    /// Shutdown also cancels a recognition call that is still running; its
    /// result is discarded.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            session_id = %self.session_id,
            recognizer = self.recognizer.name(),
            auto_zoom = self.auto_zoom,
            "Frame worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = self.gate.frame_ready() => {}
            }

            let Some(frame) = self.gate.take_pending() else {
                continue;
            };
            metrics::record_frame_admitted();

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!(session_id = %self.session_id, "Recognition cancelled by stop");
                    break;
                }
                result = self.recognizer.detect(&frame, &self.formats) => result,
            };
            metrics::record_recognition_duration(
                self.recognizer.name(),
                started.elapsed().as_secs_f64(),
            );

            self.handle_result(&frame, result);
        }

        info!(session_id = %self.session_id, "Frame worker stopped");
    }

    fn handle_result(&self, frame: &Frame, result: ScanResult<Vec<Detection>>) {
        let detections = match result {
            Ok(detections) => detections,
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    recognizer = self.recognizer.name(),
                    "Recognition failed: {}",
                    e
                );
                metrics::record_recognition_failure(self.recognizer.name());
                let _ = self.events.send(ScanEvent::scan_error(e.to_string()));
                return;
            }
        };

        let zoom = self.actuator.zoom_state();
        let outcome = {
            let mut processor = lock(&self.processor);
            processor.process(FrameInput {
                detections: &detections,
                frame_size: frame.size,
                zoom,
                auto_zoom: self.auto_zoom,
                now: Instant::now(),
            })
        };

        match outcome.auto_zoom {
            Some(AutoZoomDecision::DeadBand { proposed }) => {
                debug!(proposed, "Zoom step inside dead-band");
                metrics::record_zoom_suppressed("dead_band");
            }
            Some(AutoZoomDecision::Cooldown) => metrics::record_zoom_suppressed("cooldown"),
            _ => {}
        }
        for superseded in outcome.bus.superseded() {
            debug!(
                source = superseded.source.as_str(),
                ratio = superseded.ratio,
                "Zoom command superseded"
            );
            metrics::record_zoom_suppressed("superseded");
        }

        if let Some(command) = outcome.command() {
            self.post(command);
        }

        if !outcome.confirmed.is_empty() {
            metrics::record_detections_confirmed(outcome.confirmed.len());
            let _ = self
                .events
                .send(ScanEvent::barcodes_scanned(outcome.confirmed, frame.size));
        }
    }

    fn post(&self, command: ZoomCommand) {
        let posted = PostedCommand {
            epoch: self.epoch,
            command,
        };
        match self.commands.try_send(posted) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(ratio = command.ratio, "Zoom dispatcher backlogged; command dropped");
                metrics::record_zoom_suppressed("queue_full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                metrics::record_zoom_suppressed("stale");
            }
        }
    }
}

/// Apply queued commands to the actuator until the channel closes.
pub(crate) async fn run_dispatcher(
    mut commands: mpsc::Receiver<PostedCommand>,
    actuator: Arc<dyn ZoomActuator>,
    current_epoch: Arc<Mutex<u64>>,
) {
    while let Some(posted) = commands.recv().await {
        let applied = {
            let epoch = lock(&current_epoch);
            if *epoch == posted.epoch {
                actuator.set_zoom_ratio(posted.command.ratio);
                true
            } else {
                false
            }
        };

        let source = posted.command.source.as_str();
        if applied {
            debug!(source, ratio = posted.command.ratio, "Zoom command applied");
            metrics::record_zoom_command(source, posted.command.ratio);
        } else {
            debug!(source, "Discarding zoom command from a stopped session");
            metrics::record_zoom_suppressed("stale");
        }
    }
}
