//! Closed-loop session runner.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use scanzoom_core::{
    AutoZoomScanner, CameraSession, Frame, FrameAdmission, Recognizer, ScanConfig, ScanResult,
};
use scanzoom_models::ScanEvent;

use crate::config::SimConfig;
use crate::lens::{SimCamera, SimLens};
use crate::recognizer::ScriptedRecognizer;

/// Summary of one simulated session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimReport {
    pub frames_submitted: u64,
    pub frames_accepted: u64,
    pub frames_throttled: u64,
    pub frames_rejected: u64,
    pub frames_reported: u64,
    pub scan_errors: u64,
    pub lens_commands: u64,
    pub final_zoom: f64,
    /// Seconds from start to the first confirmed detection
    pub first_confirmation_secs: Option<f64>,
    pub final_mode: String,
}

pub struct Simulation {
    config: SimConfig,
    lens: Arc<SimLens>,
    scanner: AutoZoomScanner,
}

impl Simulation {
    pub fn new(config: SimConfig, scan_config: ScanConfig) -> ScanResult<Self> {
        let lens = Arc::new(SimLens::new(config.min_zoom, config.max_zoom));
        let recognizer: Arc<dyn Recognizer> =
            Arc::new(ScriptedRecognizer::new(&config, Arc::clone(&lens)));
        let camera: Arc<dyn CameraSession> = Arc::new(SimCamera::new(Arc::clone(&lens)));
        let scanner = AutoZoomScanner::new(scan_config, recognizer, camera)?;

        Ok(Self {
            config,
            lens,
            scanner,
        })
    }

    pub fn scanner(&self) -> &AutoZoomScanner {
        &self.scanner
    }

    /// Feed frames at the configured rate for the configured duration.
    pub async fn run(&self) -> ScanResult<SimReport> {
        let mut events = self.scanner.subscribe();
        let session_id = self
            .scanner
            .start_auto_zoom_scan(self.config.scan_options())
            .await?;
        info!(
            session_id = %session_id,
            fps = self.config.fps,
            frames = self.config.total_frames(),
            "Simulation started"
        );

        let started = Instant::now();
        let mut report = SimReport::default();
        let mut ticker = interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        for _ in 0..self.config.total_frames() {
            ticker.tick().await;
            report.frames_submitted += 1;
            match self.scanner.submit_frame(Frame::empty(self.config.frame_size())) {
                FrameAdmission::Accepted { .. } => report.frames_accepted += 1,
                FrameAdmission::Dropped(_) => report.frames_throttled += 1,
                FrameAdmission::Rejected(_) => report.frames_rejected += 1,
            }
            drain_events(&mut events, &mut report, started);
        }

        // Let the last admitted frame finish before tearing down.
        ticker.tick().await;
        drain_events(&mut events, &mut report, started);

        report.final_mode = self.scanner.controller_snapshot().mode.as_str().to_string();
        self.scanner.stop_scan().await;

        report.lens_commands = self.lens.commands();
        report.final_zoom = self.lens.current_ratio();
        info!(
            final_zoom = report.final_zoom,
            lens_commands = report.lens_commands,
            frames_reported = report.frames_reported,
            "Simulation finished"
        );
        Ok(report)
    }
}

fn drain_events(
    events: &mut tokio::sync::broadcast::Receiver<ScanEvent>,
    report: &mut SimReport,
    started: Instant,
) {
    loop {
        match events.try_recv() {
            Ok(ScanEvent::BarcodesScanned { .. }) => {
                report.frames_reported += 1;
                report
                    .first_confirmation_secs
                    .get_or_insert_with(|| started.elapsed().as_secs_f64());
            }
            Ok(ScanEvent::ScanError { message, .. }) => {
                warn!("Scan error: {}", message);
                report.scan_errors += 1;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event receiver lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}
