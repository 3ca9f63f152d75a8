// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-bridge — Where the scanner meets its host.
//
// The host supplies the camera and the view the scanner is presented from;
// callers reach the scanner through a single named method channel.

pub mod channel;
pub mod replay;
pub mod stub;

use std::sync::Arc;

use docscan_capture::HostEnvironment;

pub use channel::{CHANNEL_NAME, METHOD_SCAN_DOCUMENT, MethodResponse, dispatch, pages_response};
pub use replay::{ReplayFrameSource, ReplayHost};
pub use stub::StubHost;

/// The host for the current target.
///
/// Camera-backed hosts are provided by the embedding app through
/// [`HostEnvironment`]; builds without one get the stub, which opens no camera.
pub fn platform_host() -> Arc<dyn HostEnvironment> {
    Arc::new(StubHost)
}
