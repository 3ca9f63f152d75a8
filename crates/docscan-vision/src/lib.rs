// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-vision — Image-side work for the document scanner.
//
// Provides quadrilateral detection (document segmentation and generic
// rectangle detection), the normalized/pixel coordinate conversions, the
// perspective rectification pipeline, and JPEG encoding for single pages and
// multi-page batches.

pub mod batch;
pub mod detect;
pub mod encode;
pub mod geometry;
pub mod rectify;

pub use batch::encode_pages;
pub use detect::{CornerDetector, DetectorSettings, detector_for};
pub use rectify::{RectifiedPage, Rectifier};
