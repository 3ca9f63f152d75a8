// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub host for desktop/CI builds where no camera is wired in.
//
// Pre-flight passes; opening the camera reports `CameraUnavailable`.

use docscan_capture::{FrameSource, HostEnvironment};
use docscan_core::error::{Result, ScanError};
use docscan_core::OsVersion;

/// No-camera host returned by [`crate::platform_host`].
pub struct StubHost;

impl HostEnvironment for StubHost {
    fn os_version(&self) -> OsVersion {
        OsVersion::SEGMENTATION
    }

    fn has_host_view(&self) -> bool {
        true
    }

    fn open_frame_source(&self, _frame_buffer: usize) -> Result<Box<dyn FrameSource>> {
        tracing::warn!("HostEnvironment::open_frame_source called on stub host");
        Err(ScanError::CameraUnavailable(
            "no camera on this platform".into(),
        ))
    }
}
