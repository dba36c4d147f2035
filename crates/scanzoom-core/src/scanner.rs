//! Session driver.
//!
//! `AutoZoomScanner` owns one scan session at a time: it opens the camera,
//! wires the frame gate to a dedicated frame worker, forwards zoom commands
//! to the actuator through the dispatcher, and tears everything down again on
//! stop. Host code feeds frames with [`AutoZoomScanner::submit_frame`] and
//! listens on [`AutoZoomScanner::subscribe`].

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use scanzoom_models::{ScanEvent, ScanOptions, SessionId, ZoomState};

use crate::config::ScanConfig;
use crate::error::ScanResult;
use crate::frame_gate::{Frame, FrameAdmission, FrameGate};
use crate::metrics;
use crate::processor::{ControllerSnapshot, FrameProcessor};
use crate::providers::{CameraSession, Recognizer, ZoomActuator};
use crate::worker::{lock, run_dispatcher, FrameWorker};

struct ActiveSession {
    id: SessionId,
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

/// Actuator of the running session, readable from synchronous getters.
struct BoundCamera {
    id: SessionId,
    actuator: Arc<dyn ZoomActuator>,
}

pub struct AutoZoomScanner {
    config: ScanConfig,
    recognizer: Arc<dyn Recognizer>,
    camera: Arc<dyn CameraSession>,
    gate: Arc<FrameGate>,
    processor: Arc<Mutex<FrameProcessor>>,
    dispatch_epoch: Arc<Mutex<u64>>,
    events: broadcast::Sender<ScanEvent>,
    session: tokio::sync::Mutex<Option<ActiveSession>>,
    bound: RwLock<Option<BoundCamera>>,
}

impl AutoZoomScanner {
    pub fn new(
        config: ScanConfig,
        recognizer: Arc<dyn Recognizer>,
        camera: Arc<dyn CameraSession>,
    ) -> ScanResult<Self> {
        config.validate()?;

        let (events, _) = broadcast::channel(config.event_buffer);
        Ok(Self {
            gate: Arc::new(FrameGate::new(config.analyze_interval())),
            processor: Arc::new(Mutex::new(FrameProcessor::new(&config))),
            dispatch_epoch: Arc::new(Mutex::new(0)),
            events,
            session: tokio::sync::Mutex::new(None),
            bound: RwLock::new(None),
            config,
            recognizer,
            camera,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Start a new session, stopping any running one first.
    ///
    /// Camera failures are returned unchanged and leave the scanner stopped.
    pub async fn start_auto_zoom_scan(&self, options: ScanOptions) -> ScanResult<SessionId> {
        let mut session = self.session.lock().await;
        if let Some(previous) = session.take() {
            self.shutdown(previous).await;
        }

        let actuator = self.camera.open(&options).await.map_err(|e| {
            warn!(camera = self.camera.name(), "Failed to open camera session: {}", e);
            e
        })?;

        let id = SessionId::new();
        let formats = options.resolved_formats();
        let epoch = {
            let mut epoch = lock(&self.dispatch_epoch);
            *epoch = epoch.wrapping_add(1);
            *epoch
        };
        lock(&self.processor).reset();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (commands_tx, commands_rx) = mpsc::channel(self.config.command_queue_capacity);

        let dispatcher = tokio::spawn(run_dispatcher(
            commands_rx,
            Arc::clone(&actuator),
            Arc::clone(&self.dispatch_epoch),
        ));

        let worker = FrameWorker {
            session_id: id.clone(),
            epoch,
            gate: Arc::clone(&self.gate),
            recognizer: Arc::clone(&self.recognizer),
            actuator: Arc::clone(&actuator),
            processor: Arc::clone(&self.processor),
            formats: formats.clone(),
            auto_zoom: options.auto_zoom,
            events: self.events.clone(),
            commands: commands_tx,
        };
        let worker = tokio::spawn(worker.run(shutdown_rx));

        *self.bound_mut() = Some(BoundCamera {
            id: id.clone(),
            actuator,
        });
        self.gate.open();

        info!(
            session_id = %id,
            auto_zoom = options.auto_zoom,
            lens = options.lens_facing.as_str(),
            formats = ?formats,
            "Scan session started"
        );

        *session = Some(ActiveSession {
            id: id.clone(),
            shutdown: shutdown_tx,
            worker,
            dispatcher,
        });
        Ok(id)
    }

    /// Offer a frame for analysis. Never blocks.
    pub fn submit_frame(&self, frame: Frame) -> FrameAdmission {
        let admission = self.gate.submit(frame);
        match admission {
            FrameAdmission::Accepted { replaced_pending: true } => {
                metrics::record_frame_dropped("superseded");
            }
            FrameAdmission::Accepted { .. } => {}
            FrameAdmission::Rejected(reason) => metrics::record_frame_dropped(reason.as_str()),
            FrameAdmission::Dropped(reason) => metrics::record_frame_dropped(reason.as_str()),
        }
        admission
    }

    /// Stop admitting frames but keep the camera bound and all controller
    /// state, including votes.
    pub async fn pause_scan(&self) {
        let session = self.session.lock().await;
        let Some(active) = session.as_ref() else {
            return;
        };
        if self.gate.is_paused() {
            return;
        }

        self.gate.pause();
        self.camera.pause().await;
        info!(session_id = %active.id, "Scan session paused");
    }

    /// Resume a paused session. Failures are reported on the event stream.
    pub async fn resume_scan(&self) {
        let session = self.session.lock().await;
        let Some(active) = session.as_ref() else {
            return;
        };
        if !self.gate.is_paused() {
            return;
        }

        match self.camera.resume().await {
            Ok(()) => {
                self.gate.resume();
                info!(session_id = %active.id, "Scan session resumed");
            }
            Err(e) => {
                warn!(session_id = %active.id, "Failed to resume camera session: {}", e);
                let _ = self.events.send(ScanEvent::scan_error(e.to_string()));
            }
        }
    }

    /// Stop the session and reset every controller. After this returns no
    /// command from the stopped session reaches the actuator.
    pub async fn stop_scan(&self) {
        let mut session = self.session.lock().await;
        match session.take() {
            Some(active) => self.shutdown(active).await,
            None => {
                self.gate.close();
                lock(&self.processor).reset();
            }
        }
    }

    async fn shutdown(&self, active: ActiveSession) {
        {
            let mut epoch = lock(&self.dispatch_epoch);
            *epoch = epoch.wrapping_add(1);
        }
        self.gate.close();
        *self.bound_mut() = None;

        let _ = active.shutdown.send(true);
        if let Err(e) = active.worker.await {
            warn!(session_id = %active.id, "Frame worker ended abnormally: {}", e);
        }
        // The worker owned the only command sender; the dispatcher drains
        // what is left as stale and exits.
        if let Err(e) = active.dispatcher.await {
            warn!(session_id = %active.id, "Zoom dispatcher ended abnormally: {}", e);
        }

        lock(&self.processor).reset();
        self.camera.close().await;
        info!(session_id = %active.id, "Scan session stopped");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Request an explicit ratio, bypassing the controllers. The next frame
    /// treats it as the new baseline. No-op without a session.
    pub fn set_zoom_ratio(&self, ratio: f64) {
        if !ratio.is_finite() {
            warn!(ratio, "Ignoring non-finite zoom ratio");
            return;
        }
        if let Some(bound) = self.bound().as_ref() {
            bound.actuator.set_zoom_ratio(ratio);
        }
    }

    pub fn get_zoom_ratio(&self) -> Option<f64> {
        self.zoom_state().map(|z| z.current_ratio)
    }

    pub fn get_min_zoom_ratio(&self) -> Option<f64> {
        self.zoom_state().map(|z| z.min_ratio)
    }

    pub fn get_max_zoom_ratio(&self) -> Option<f64> {
        self.zoom_state().map(|z| z.max_ratio)
    }

    fn zoom_state(&self) -> Option<ZoomState> {
        self.bound()
            .as_ref()
            .and_then(|bound| bound.actuator.zoom_state())
    }

    pub fn is_camera_active(&self) -> bool {
        self.bound().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.bound().as_ref().map(|bound| bound.id.clone())
    }

    pub fn controller_snapshot(&self) -> ControllerSnapshot {
        lock(&self.processor).snapshot()
    }

    fn bound(&self) -> RwLockReadGuard<'_, Option<BoundCamera>> {
        self.bound.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bound_mut(&self) -> RwLockWriteGuard<'_, Option<BoundCamera>> {
        self.bound.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
