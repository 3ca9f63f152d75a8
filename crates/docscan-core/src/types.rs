// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the docscan capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScanError;

/// Unique identifier for one scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 2D point. Units depend on context (normalized or pixel space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four document corners.
///
/// Observations use normalized coordinates: both axes in `[0, 1]` with the
/// origin at the bottom-left, so "top" corners carry the larger `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quad {
    pub const fn new(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Corners in label order: top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Largest per-corner absolute difference on each axis, as `(dx, dy)`.
    pub fn max_corner_delta(&self, other: &Quad) -> (f32, f32) {
        self.corners()
            .iter()
            .zip(other.corners().iter())
            .fold((0.0f32, 0.0f32), |(dx, dy), (a, b)| {
                (dx.max((a.x - b.x).abs()), dy.max((a.y - b.y).abs()))
            })
    }

    /// Two quads are similar when every corner moved less than `threshold`
    /// on each axis independently.
    pub fn is_similar(&self, other: &Quad, threshold: f32) -> bool {
        let (dx, dy) = self.max_corner_delta(other);
        dx < threshold && dy < threshold
    }
}

/// One detector result for a single frame or still.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub quad: Quad,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Host operating system version, compared as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
}

impl OsVersion {
    /// Oldest OS on which the live scanner runs at all.
    pub const MIN_SUPPORTED: OsVersion = OsVersion::new(13, 0);
    /// First OS that ships the document segmentation capability.
    pub const SEGMENTATION: OsVersion = OsVersion::new(15, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_supported(&self) -> bool {
        *self >= Self::MIN_SUPPORTED
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for OsVersion {
    type Err = ScanError;

    /// Parse `"15"`, `"15.4"` or `"15.4.1"` (the patch level is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScanError::InvalidConfig(format!("invalid OS version: {s:?}"));
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(invalid)?
            .parse::<u32>()
            .map_err(|_| invalid())?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(Self::new(major, minor))
    }
}

/// Which quadrilateral detection capability is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Newer document segmentation capability.
    DocumentSegmentation,
    /// Older generic rectangle detection.
    RectangleDetection,
}

impl DetectorKind {
    /// Best capability available on `version`.
    pub fn for_version(version: OsVersion) -> Self {
        if version >= OsVersion::SEGMENTATION {
            Self::DocumentSegmentation
        } else {
            Self::RectangleDetection
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentSegmentation => "document-segmentation",
            Self::RectangleDetection => "rectangle-detection",
        }
    }
}

/// Which trigger sources may start the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Only the shutter; frames are analysed for a corner hint only.
    ManualOnly,
    /// Only the stability tracker.
    AutoStable,
    /// Whichever fires first.
    #[default]
    Hybrid,
}

impl CaptureMode {
    pub fn allows_manual(&self) -> bool {
        matches!(self, Self::ManualOnly | Self::Hybrid)
    }

    pub fn allows_auto(&self) -> bool {
        matches!(self, Self::AutoStable | Self::Hybrid)
    }
}

/// Why a capture was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureReason {
    Manual,
    AutoStable,
}

/// What to do when one page of a multi-page batch fails to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFailurePolicy {
    /// Log and drop the page, keep the rest.
    #[default]
    SkipFailed,
    /// Fail the whole batch on the first bad page.
    FailBatch,
}

/// Lifecycle phases of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Previewing,
    Capturing,
    Rectifying,
    Done,
    Failed,
}

/// The successful outcome of one scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedPage {
    pub session_id: SessionId,
    /// Encoded JPEG bytes of the rectified page.
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub reason: CaptureReason,
    /// Preview frames run through the detector before the capture.
    pub frames_analyzed: u64,
    pub captured_at: DateTime<Utc>,
}
