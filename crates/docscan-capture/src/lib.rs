// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-capture — The live auto-capture state machine.
//
// A scan session watches preview frames, tracks whether the detected page
// has settled, commits to exactly one still capture (automatic or manual),
// rectifies that still, and delivers exactly one result.

pub mod arbiter;
pub mod session;
pub mod sink;
pub mod source;
pub mod stability;

pub use arbiter::CaptureArbiter;
pub use session::{ScanHandle, Scanner, SessionControls};
pub use sink::ResultSink;
pub use source::{Frame, FrameSource, HostEnvironment, StillReceiver};
pub use stability::StabilityTracker;
