// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan sessions — pre-flight checks, the frame analysis loop, and the
// capture → rectify → deliver tail.

use std::sync::Arc;

use chrono::Utc;
use docscan_core::error::{Result, ScanError};
use docscan_core::{
    CaptureReason, DetectorKind, OsVersion, Quad, ScannedPage, ScannerConfig, SessionId,
    SessionPhase,
};
use docscan_vision::encode::decode_image;
use docscan_vision::{CornerDetector, DetectorSettings, Rectifier};
use tokio::sync::{Notify, mpsc, oneshot};
use tracing::{debug, info, instrument, trace, warn};

use crate::arbiter::CaptureArbiter;
use crate::sink::ResultSink;
use crate::source::{Frame, FrameSource, HostEnvironment};
use crate::stability::StabilityTracker;

/// Entry point: holds the host and configuration, starts sessions.
pub struct Scanner {
    host: Arc<dyn HostEnvironment>,
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(host: Arc<dyn HostEnvironment>, config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { host, config })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Start one scan session.
    ///
    /// Pre-flight runs here, synchronously: OS version, host view, then the
    /// frame source. A pre-flight failure is delivered through the returned
    /// handle without any frame being analysed. Otherwise the analysis loop
    /// is spawned, so this must be called from within a Tokio runtime.
    pub fn start_scan(&self) -> ScanHandle {
        let id = SessionId::new();
        let (mut sink, result_rx) = ResultSink::channel(id, Arc::clone(&self.host));
        let (arbiter, commits) = CaptureArbiter::new(self.config.capture_mode);
        let dismissed = Arc::new(Notify::new());
        let controls = SessionControls {
            arbiter: Arc::clone(&arbiter),
            dismissed: Arc::clone(&dismissed),
        };

        match self.open_session(id, Arc::clone(&arbiter)) {
            Ok((session, frames)) => {
                sink.mark_presented();
                tokio::spawn(session.run(frames, commits, dismissed, sink));
            }
            Err(err) => {
                arbiter.close();
                sink.deliver(Err(err));
            }
        }

        ScanHandle {
            id,
            controls,
            result_rx,
        }
    }

    fn open_session(
        &self,
        id: SessionId,
        arbiter: Arc<CaptureArbiter>,
    ) -> Result<(AnalysisLoop, mpsc::Receiver<Frame>)> {
        let version = self.host.os_version();
        if !version.is_supported() {
            return Err(ScanError::UnsupportedVersion {
                found: version,
                required: OsVersion::MIN_SUPPORTED,
            });
        }
        if !self.host.has_host_view() {
            return Err(ScanError::NoHostView);
        }

        let settings = DetectorSettings::from(&self.config);
        let still_kind = DetectorKind::for_version(version);
        let frame_detector = self
            .host
            .corner_detector(DetectorKind::RectangleDetection, settings);
        let still_detector = self.host.corner_detector(still_kind, settings);
        if frame_detector.is_none() {
            warn!("rectangle detection unavailable; preview frames will not be analysed");
        }

        let mut source = self.host.open_frame_source(self.config.frame_buffer)?;
        let frames = source.start()?;

        info!(
            session = %id,
            os = %version,
            still_detector = still_kind.as_str(),
            mode = ?self.config.capture_mode,
            "scan session started"
        );

        let session = AnalysisLoop {
            id,
            arbiter,
            source,
            tracker: StabilityTracker::from_config(&self.config),
            frame_detector,
            still_detector,
            rectifier: Rectifier::from_config(&self.config),
            hint: None,
            frames_analyzed: 0,
            phase: SessionPhase::Idle,
        };
        Ok((session, frames))
    }
}

/// Cloneable remote control for a running session: manual shutter and
/// dismissal. Usable from any thread.
#[derive(Clone)]
pub struct SessionControls {
    arbiter: Arc<CaptureArbiter>,
    dismissed: Arc<Notify>,
}

impl SessionControls {
    /// Manual shutter. Returns `true` if this press committed the capture.
    pub fn capture_now(&self) -> bool {
        self.arbiter.request_capture(CaptureReason::Manual)
    }

    /// The user closed the scanner. Ends the session with `Dismissed` unless
    /// a result was already delivered.
    pub fn dismiss(&self) {
        self.dismissed.notify_one();
    }
}

/// Handle to one session, returned by [`Scanner::start_scan`].
pub struct ScanHandle {
    id: SessionId,
    controls: SessionControls,
    result_rx: oneshot::Receiver<Result<ScannedPage>>,
}

impl ScanHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn controls(&self) -> SessionControls {
        self.controls.clone()
    }

    pub fn capture_now(&self) -> bool {
        self.controls.capture_now()
    }

    pub fn dismiss(&self) {
        self.controls.dismiss();
    }

    /// Wait for the session's single result.
    pub async fn result(self) -> Result<ScannedPage> {
        self.result_rx.await.unwrap_or_else(|_| {
            Err(ScanError::Scanner(
                "session ended without delivering a result".into(),
            ))
        })
    }
}

/// State owned by the spawned session task.
struct AnalysisLoop {
    id: SessionId,
    arbiter: Arc<CaptureArbiter>,
    source: Box<dyn FrameSource>,
    tracker: StabilityTracker,
    frame_detector: Option<Arc<dyn CornerDetector>>,
    still_detector: Option<Arc<dyn CornerDetector>>,
    rectifier: Rectifier,
    /// Most recent preview quad, used when the still yields no corners.
    hint: Option<Quad>,
    frames_analyzed: u64,
    phase: SessionPhase,
}

impl AnalysisLoop {
    #[instrument(name = "scan_session", skip_all, fields(session = %self.id))]
    async fn run(
        mut self,
        frames: mpsc::Receiver<Frame>,
        commits: mpsc::UnboundedReceiver<CaptureReason>,
        dismissed: Arc<Notify>,
        sink: ResultSink,
    ) {
        let outcome = self.drive(frames, commits, &dismissed).await;

        self.source.stop();
        self.arbiter.close();
        self.enter(if outcome.is_ok() {
            SessionPhase::Done
        } else {
            SessionPhase::Failed
        });
        sink.deliver(outcome);
    }

    async fn drive(
        &mut self,
        mut frames: mpsc::Receiver<Frame>,
        mut commits: mpsc::UnboundedReceiver<CaptureReason>,
        dismissed: &Notify,
    ) -> Result<ScannedPage> {
        self.enter(SessionPhase::Previewing);

        let reason = loop {
            tokio::select! {
                biased;
                _ = dismissed.notified() => return Err(ScanError::Dismissed),
                Some(reason) = commits.recv() => break reason,
                frame = frames.recv() => match frame {
                    Some(frame) => self.analyze(frame).await,
                    // The committed request is already queued.
                    None if self.arbiter.is_in_flight() => continue,
                    None => return Err(ScanError::FrameSourceClosed),
                },
            }
        };

        self.enter(SessionPhase::Capturing);
        self.source.stop();
        let still_rx = self.source.capture_still();
        let still = tokio::select! {
            biased;
            _ = dismissed.notified() => return Err(ScanError::Dismissed),
            received = still_rx => received.map_err(|_| {
                ScanError::Capture("frame source dropped the still request".into())
            })?,
        }?;
        debug!(bytes = still.len(), ?reason, "still captured");

        self.enter(SessionPhase::Rectifying);
        let rectifier = self.rectifier;
        let detector = self.still_detector.clone();
        let hint = self.hint;
        let job = tokio::task::spawn_blocking(move || {
            let image = decode_image(&still)
                .map_err(|err| ScanError::Capture(format!("captured still is unreadable: {err}")))?;
            rectifier.rectify_still(&image, detector.as_deref(), hint)
        });
        let page = tokio::select! {
            biased;
            _ = dismissed.notified() => return Err(ScanError::Dismissed),
            joined = job => joined.map_err(|err| {
                ScanError::Scanner(format!("rectification task failed: {err}"))
            })?,
        }?;

        Ok(ScannedPage {
            session_id: self.id,
            jpeg: page.jpeg,
            width: page.width,
            height: page.height,
            reason,
            frames_analyzed: self.frames_analyzed,
            captured_at: Utc::now(),
        })
    }

    /// Run the preview detector on one frame and feed the tracker.
    async fn analyze(&mut self, frame: Frame) {
        let sequence = frame.sequence;
        let observation = match self.frame_detector.clone() {
            Some(detector) => {
                match tokio::task::spawn_blocking(move || detector.detect(&frame.luma)).await {
                    Ok(Ok(observation)) => observation,
                    Ok(Err(err)) => {
                        debug!(sequence, error = %err, "frame analysis failed");
                        None
                    }
                    Err(err) => {
                        warn!(sequence, error = %err, "frame analysis task aborted");
                        None
                    }
                }
            }
            None => None,
        };
        self.frames_analyzed += 1;

        // A capture may have been committed while the detector ran.
        if self.arbiter.is_in_flight() {
            trace!(sequence, "capture in flight; late result discarded");
            return;
        }

        let quad = observation.map(|o| o.quad);
        if quad.is_some() {
            self.hint = quad;
        }
        trace!(sequence, found = quad.is_some(), "frame analysed");

        if self.tracker.observe(quad) && self.arbiter.mode().allows_auto() {
            self.arbiter.request_capture(CaptureReason::AutoStable);
        }
    }

    fn enter(&mut self, phase: SessionPhase) {
        debug!(from = ?self.phase, to = ?phase, "session phase");
        self.phase = phase;
    }
}
