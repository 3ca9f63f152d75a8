// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture arbiter — the single point where a session commits to its one
// still capture, whichever trigger gets there first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docscan_core::{CaptureMode, CaptureReason};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lets exactly one capture request through per session.
///
/// Safe to call from any thread. The winning request is forwarded to the
/// analysis loop, which owns the camera and performs the capture.
#[derive(Debug)]
pub struct CaptureArbiter {
    mode: CaptureMode,
    /// Set by the first accepted request, or when the session closes.
    in_flight: AtomicBool,
    commits: mpsc::UnboundedSender<CaptureReason>,
}

impl CaptureArbiter {
    /// Create an arbiter and the receiving end the analysis loop listens on.
    pub fn new(mode: CaptureMode) -> (Arc<Self>, mpsc::UnboundedReceiver<CaptureReason>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let arbiter = Arc::new(Self {
            mode,
            in_flight: AtomicBool::new(false),
            commits: tx,
        });
        (arbiter, rx)
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Try to commit the session to a capture. Returns `true` only for the
    /// request that wins; every other request is a no-op.
    pub fn request_capture(&self, reason: CaptureReason) -> bool {
        let enabled = match reason {
            CaptureReason::Manual => self.mode.allows_manual(),
            CaptureReason::AutoStable => self.mode.allows_auto(),
        };
        if !enabled {
            debug!(?reason, mode = ?self.mode, "trigger disabled for this capture mode");
            return false;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(?reason, "capture already in flight; request ignored");
            return false;
        }

        info!(?reason, "capture committed");
        if self.commits.send(reason).is_err() {
            warn!("analysis loop has already finished; capture request dropped");
        }
        true
    }

    /// Whether a capture has been committed (or the session closed).
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Refuse all further requests.
    pub fn close(&self) {
        self.in_flight.store(true, Ordering::Release);
    }
}
