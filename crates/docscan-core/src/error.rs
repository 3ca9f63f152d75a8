// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docscan.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OsVersion;

/// Top-level error type for all scanner operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Configuration errors --
    #[error("no host view to present the scanner from")]
    NoHostView,

    #[error("unsupported OS version {found} (requires {required} or later)")]
    UnsupportedVersion { found: OsVersion, required: OsVersion },

    #[error("no usable capture device: {0}")]
    CameraUnavailable(String),

    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(String),

    // -- Detection errors (per frame, non-fatal) --
    #[error("quadrilateral detection failed: {0}")]
    Detection(String),

    // -- Capture errors --
    #[error("still capture failed: {0}")]
    Capture(String),

    #[error("frame source closed before a capture was requested")]
    FrameSourceClosed,

    // -- Rectification errors --
    #[error("no document found in the captured still")]
    NoDocument,

    #[error("perspective transform unavailable: {0}")]
    TransformUnavailable(String),

    #[error("perspective transform produced no renderable output")]
    EmptyOutput,

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("image decoding failed: {0}")]
    Decode(String),

    // -- Session --
    #[error("scan cancelled: host view dismissed")]
    Dismissed,

    #[error("scanner error: {0}")]
    Scanner(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse grouping used to decide how a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal before any frame arrives.
    Configuration,
    /// Per-frame; the observation is treated as absent.
    Detection,
    /// Fatal once the still was requested.
    Capture,
    /// Fatal once a still exists; never falls back to the raw still.
    Rectification,
    /// Cancellation and internal plumbing.
    Session,
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoHostView
            | Self::UnsupportedVersion { .. }
            | Self::CameraUnavailable(_)
            | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Detection(_) => ErrorKind::Detection,
            Self::Capture(_) | Self::FrameSourceClosed => ErrorKind::Capture,
            Self::NoDocument
            | Self::TransformUnavailable(_)
            | Self::EmptyOutput
            | Self::Encode(_)
            | Self::Decode(_) => ErrorKind::Rectification,
            Self::Dismissed | Self::Scanner(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorKind::Session
            }
        }
    }

    /// Stable wire code reported across the host boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoHostView => "NO_HOST_VIEW",
            Self::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            Self::CameraUnavailable(_) => "CAMERA_UNAVAILABLE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Detection(_) => "DETECTION_FAILED",
            Self::Capture(_) | Self::FrameSourceClosed => "CAPTURE_FAILED",
            Self::NoDocument => "NO_DOCUMENT",
            Self::TransformUnavailable(_) => "TRANSFORM_FAILED",
            Self::EmptyOutput => "EMPTY_OUTPUT",
            Self::Encode(_) => "ENCODE_FAILED",
            Self::Decode(_) => "DECODE_FAILED",
            Self::Dismissed => "CANCELLED",
            Self::Scanner(_) | Self::Io(_) | Self::Serialization(_) => "SCANNER_ERROR",
        }
    }
}

/// The only error shape that crosses the host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub code: String,
    pub message: String,
}

impl From<&ScanError> for ScanFailure {
    fn from(err: &ScanError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ScanError> for ScanFailure {
    fn from(err: ScanError) -> Self {
        Self::from(&err)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
