// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral detection — the "corner detector" capability with two
// interchangeable implementations, chosen once per session.

pub mod rectangle;
pub mod segmentation;

use std::sync::Arc;

use docscan_core::error::Result;
use docscan_core::{DetectorKind, Observation, ScannerConfig};
use image::GrayImage;
use tracing::trace;

use crate::geometry::{self, PixelCorners};

pub use rectangle::RectangleDetector;
pub use segmentation::SegmentationDetector;

/// Finds at most one document quadrilateral in a single image.
///
/// Returned corners are normalized with a bottom-left origin. `Ok(None)`
/// means nothing passed the detector's filters; `Err` means the analysis
/// itself failed. Callers treat both the same way for preview frames.
pub trait CornerDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(&self, image: &GrayImage) -> Result<Option<Observation>>;
}

/// Candidate filters shared by both detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    pub min_confidence: f32,
    pub min_aspect_ratio: f32,
    pub min_area_fraction: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self::from(&ScannerConfig::default())
    }
}

impl From<&ScannerConfig> for DetectorSettings {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            min_aspect_ratio: config.min_aspect_ratio,
            min_area_fraction: config.min_area_fraction,
        }
    }
}

impl DetectorSettings {
    /// Apply the confidence, aspect and area filters to a pixel-space
    /// candidate and normalize it.
    pub fn accept(
        &self,
        corners: &PixelCorners,
        confidence: f32,
        width: u32,
        height: u32,
    ) -> Option<Observation> {
        let frame_area = width as f32 * height as f32;
        let area = geometry::quad_area(corners);
        if area < frame_area * self.min_area_fraction {
            trace!(area, frame_area, "candidate too small");
            return None;
        }
        let aspect = geometry::aspect_ratio(corners);
        if aspect < self.min_aspect_ratio {
            trace!(aspect, "candidate aspect ratio rejected");
            return None;
        }
        if confidence < self.min_confidence {
            trace!(confidence, "candidate confidence rejected");
            return None;
        }
        Some(Observation {
            quad: geometry::normalize(corners, width, height),
            confidence,
        })
    }
}

/// Build the built-in detector for `kind`.
pub fn detector_for(kind: DetectorKind, settings: DetectorSettings) -> Arc<dyn CornerDetector> {
    match kind {
        DetectorKind::DocumentSegmentation => Arc::new(SegmentationDetector::new(settings)),
        DetectorKind::RectangleDetection => Arc::new(RectangleDetector::new(settings)),
    }
}

/// Dark background with a bright axis-aligned page, shared by detector tests.
#[cfg(test)]
pub(crate) fn synthetic_page(
    width: u32,
    height: u32,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
) -> GrayImage {
    use image::Luma;
    let mut img = GrayImage::from_pixel(width, height, Luma([30u8]));
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Luma([235u8]));
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_filters_small_candidates() {
        let settings = DetectorSettings::default();
        let tiny: PixelCorners = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        assert!(settings.accept(&tiny, 1.0, 400, 400).is_none());
    }

    #[test]
    fn accept_filters_thin_candidates() {
        let settings = DetectorSettings::default();
        let strip: PixelCorners = [(0.0, 0.0), (400.0, 0.0), (0.0, 150.0), (400.0, 150.0)];
        assert!(settings.accept(&strip, 1.0, 400, 400).is_none());
    }

    #[test]
    fn accept_filters_low_confidence() {
        let settings = DetectorSettings::default();
        let page: PixelCorners = [(50.0, 40.0), (350.0, 40.0), (50.0, 360.0), (350.0, 360.0)];
        assert!(settings.accept(&page, 0.5, 400, 400).is_none());
        let obs = settings.accept(&page, 0.95, 400, 400).unwrap();
        assert_eq!(obs.confidence, 0.95);
        assert!((obs.quad.top_left.y - 0.9).abs() < 1e-6);
    }

    #[test]
    fn detector_for_builds_requested_kind() {
        let settings = DetectorSettings::default();
        for kind in [DetectorKind::DocumentSegmentation, DetectorKind::RectangleDetection] {
            assert_eq!(detector_for(kind, settings).kind(), kind);
        }
    }
}
