// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result sink — hands the caller exactly one outcome per session.

use std::sync::Arc;

use docscan_core::error::{ErrorKind, Result};
use docscan_core::{ScannedPage, SessionId};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::source::HostEnvironment;

/// One-shot delivery of a session's outcome.
///
/// `deliver` consumes the sink, so a second result cannot be sent.
pub struct ResultSink {
    session_id: SessionId,
    host: Arc<dyn HostEnvironment>,
    presented: bool,
    tx: oneshot::Sender<Result<ScannedPage>>,
}

impl ResultSink {
    pub fn channel(
        session_id: SessionId,
        host: Arc<dyn HostEnvironment>,
    ) -> (Self, oneshot::Receiver<Result<ScannedPage>>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            session_id,
            host,
            presented: false,
            tx,
        };
        (sink, rx)
    }

    /// Record that scanner UI is on screen and must be torn down on delivery.
    pub fn mark_presented(&mut self) {
        self.presented = true;
    }

    pub fn deliver(self, outcome: Result<ScannedPage>) {
        match &outcome {
            Ok(page) => info!(
                session = %self.session_id,
                reason = ?page.reason,
                width = page.width,
                height = page.height,
                bytes = page.jpeg.len(),
                "scan complete"
            ),
            Err(err) if err.kind() == ErrorKind::Session => info!(
                session = %self.session_id,
                code = err.code(),
                error = %err,
                "scan ended"
            ),
            Err(err) => warn!(
                session = %self.session_id,
                code = err.code(),
                error = %err,
                "scan failed"
            ),
        }

        if self.presented {
            self.host.dismiss();
        }
        if self.tx.send(outcome).is_err() {
            debug!(session = %self.session_id, "caller stopped waiting for the result");
        }
    }
}
