// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary traits for the camera and the hosting platform.

use std::sync::Arc;

use docscan_core::error::Result;
use docscan_core::{DetectorKind, OsVersion};
use docscan_vision::{CornerDetector, DetectorSettings, detector_for};
use image::GrayImage;
use tokio::sync::{mpsc, oneshot};

/// One preview frame. Owned by the session only while it is analysed.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Arrival order, starting at zero.
    pub sequence: u64,
    /// Luma plane of the frame.
    pub luma: GrayImage,
}

/// Completion of a still request: encoded image bytes, or the capture error.
pub type StillReceiver = oneshot::Receiver<Result<Vec<u8>>>;

/// A camera: a stream of preview frames plus a one-shot still capture.
///
/// Owned exclusively by one scan session.
pub trait FrameSource: Send {
    /// Begin delivering preview frames in arrival order. Closing the
    /// returned channel means the source has stopped for good.
    ///
    /// Sources drop frames rather than wait when the channel is full.
    fn start(&mut self) -> Result<mpsc::Receiver<Frame>>;

    /// Stop delivering preview frames. Must be idempotent.
    fn stop(&mut self);

    /// Request one still photo. The result arrives on the returned channel.
    fn capture_still(&mut self) -> StillReceiver;
}

/// What the hosting platform provides to a scan session.
pub trait HostEnvironment: Send + Sync + 'static {
    fn os_version(&self) -> OsVersion;

    /// Whether there is a view to present the scanner from.
    fn has_host_view(&self) -> bool;

    /// Configure the capture device. Errors here are configuration errors.
    fn open_frame_source(&self, frame_buffer: usize) -> Result<Box<dyn FrameSource>>;

    /// The detection capability of `kind`, or `None` where the platform
    /// lacks it. Defaults to the built-in image-based detectors.
    fn corner_detector(
        &self,
        kind: DetectorKind,
        settings: DetectorSettings,
    ) -> Option<Arc<dyn CornerDetector>> {
        Some(detector_for(kind, settings))
    }

    /// Tear down the scanner UI once the session has delivered its result.
    fn dismiss(&self) {}
}
