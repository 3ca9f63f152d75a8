// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document segmentation — separates the page from the background by global
// thresholding, then fits four corners to the largest page region.

use docscan_core::error::{Result, ScanError};
use docscan_core::{DetectorKind, Observation};
use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::contrast::otsu_level;
use tracing::trace;

use super::{CornerDetector, DetectorSettings};
use crate::geometry::{self, PixelCorners};

/// Below this spread between darkest and brightest pixel there is no
/// page/background split to find.
const MIN_CONTRAST: u8 = 32;

/// Segmentation-based document detector.
///
/// 1. Otsu threshold splits bright page from darker background
/// 2. Outer contours of the foreground are traced
/// 3. The largest contour by area is taken as the page
/// 4. Corners are its extreme points along the two diagonals
/// 5. Confidence is how much of the fitted quad the contour fills
pub struct SegmentationDetector {
    settings: DetectorSettings,
}

impl SegmentationDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }
}

impl CornerDetector for SegmentationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::DocumentSegmentation
    }

    fn detect(&self, image: &GrayImage) -> Result<Option<Observation>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::Detection("image has no pixels".into()));
        }

        let (lo, hi) = image
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        if hi.saturating_sub(lo) < MIN_CONTRAST {
            trace!(lo, hi, "frame has no contrast to segment");
            return Ok(None);
        }

        let level = otsu_level(image);
        let mask = GrayImage::from_fn(width, height, |x, y| {
            if image.get_pixel(x, y).0[0] > level {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });

        let contours: Vec<Contour<i32>> = find_contours(&mask);
        let largest = contours
            .iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.points.len() >= 4)
            .map(|c| {
                let pts: Vec<(f32, f32)> =
                    c.points.iter().map(|p| (p.x as f32, p.y as f32)).collect();
                let area = geometry::polygon_area(&pts);
                (pts, area)
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let Some((points, contour_area)) = largest else {
            return Ok(None);
        };

        let Some(corners) = diagonal_extremes(&points) else {
            return Ok(None);
        };
        let fitted = geometry::quad_area(&corners);
        if fitted <= 0.0 {
            return Ok(None);
        }
        let confidence = (contour_area / fitted).clamp(0.0, 1.0);
        trace!(contour_area, fitted, confidence, "segmentation candidate");

        Ok(self.settings.accept(&corners, confidence, width, height))
    }
}

/// Fit corners from the extreme points along both diagonals: top-left
/// minimises `x + y`, bottom-right maximises it, top-right maximises
/// `x - y`, bottom-left minimises it.
fn diagonal_extremes(points: &[(f32, f32)]) -> Option<PixelCorners> {
    let pick = |key: fn(&(f32, f32)) -> f32, max: bool| {
        let cmp = |a: &&(f32, f32), b: &&(f32, f32)| {
            key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal)
        };
        if max {
            points.iter().max_by(cmp).copied()
        } else {
            points.iter().min_by(cmp).copied()
        }
    };
    let sum: fn(&(f32, f32)) -> f32 = |p| p.0 + p.1;
    let diff: fn(&(f32, f32)) -> f32 = |p| p.0 - p.1;

    Some([
        pick(sum, false)?,
        pick(diff, true)?,
        pick(diff, false)?,
        pick(sum, true)?,
    ])
}
