// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generic rectangle detection — edge detection plus the Hough line transform.
// Cheap enough to run on every preview frame.

use docscan_core::error::{Result, ScanError};
use docscan_core::{DetectorKind, Observation};
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use tracing::{debug, trace};

use super::{CornerDetector, DetectorSettings};
use crate::geometry::PixelCorners;

/// Samples taken along each edge when scoring a candidate.
const SAMPLES_PER_EDGE: usize = 48;
/// How far (in pixels) a perimeter sample may sit from an edge pixel.
const EDGE_TOLERANCE: i64 = 2;

/// Rectangle detector built on Canny edges and Hough lines.
///
/// ## Pipeline
///
/// 1. Gaussian blur (sigma 2.0) for noise reduction
/// 2. Canny edge detection
/// 3. Hough line detection to find dominant straight edges
/// 4. Classify lines as roughly horizontal or roughly vertical
/// 5. Select the outermost top/bottom and left/right edges
/// 6. Intersect them pairwise into four corners
/// 7. Score the quad by how much of its perimeter lies on detected edges
pub struct RectangleDetector {
    settings: DetectorSettings,
    blur_sigma: f32,
    canny_low: f32,
    canny_high: f32,
}

impl RectangleDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            blur_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

impl CornerDetector for RectangleDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RectangleDetection
    }

    fn detect(&self, image: &GrayImage) -> Result<Option<Observation>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::Detection("image has no pixels".into()));
        }
        if width < 16 || height < 16 {
            return Ok(None);
        }

        let blurred = gaussian_blur_f32(image, self.blur_sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);

        // Vote threshold scales with the short side so a page covering the
        // minimum area still produces lines with enough support.
        let vote_threshold = ((width.min(height) as f32) * 0.2).max(20.0) as u32;
        let options = LineDetectionOptions {
            vote_threshold,
            suppression_radius: 8,
        };
        let lines = detect_lines(&edges, options);
        trace!(line_count = lines.len(), vote_threshold, "Hough lines detected");
        if lines.len() < 4 {
            return Ok(None);
        }

        let (horizontal, vertical) = classify_lines(&lines);
        if horizontal.len() < 2 || vertical.len() < 2 {
            trace!(
                horizontal = horizontal.len(),
                vertical = vertical.len(),
                "not enough edges for a quad"
            );
            return Ok(None);
        }

        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let by_row = |l: &PolarLine| row_at(l, cx);
        let by_col = |l: &PolarLine| col_at(l, cy);
        let (Some(top), Some(bottom)) = (
            extreme(&horizontal, by_row, false),
            extreme(&horizontal, by_row, true),
        ) else {
            return Ok(None);
        };
        let (Some(left), Some(right)) = (
            extreme(&vertical, by_col, false),
            extreme(&vertical, by_col, true),
        ) else {
            return Ok(None);
        };

        let rows = row_at(&bottom, cx) - row_at(&top, cx);
        let cols = col_at(&right, cy) - col_at(&left, cy);
        if rows < 1.0 || cols < 1.0 {
            trace!("only one edge found per axis");
            return Ok(None);
        }

        let Some(corners) = quad_corners(&top, &bottom, &left, &right) else {
            debug!("could not intersect document edges");
            return Ok(None);
        };

        let margin = 2.0;
        let (max_x, max_y) = (width as f32 + margin, height as f32 + margin);
        let inside = corners
            .iter()
            .all(|&(x, y)| x >= -margin && y >= -margin && x <= max_x && y <= max_y);
        if !inside {
            trace!(?corners, "corners fall outside the frame");
            return Ok(None);
        }

        let confidence = perimeter_support(&edges, &corners);
        Ok(self.settings.accept(&corners, confidence, width, height))
    }
}

/// Split Hough lines into roughly horizontal and roughly vertical sets.
///
/// `angle_in_degrees` is the direction of the line's normal: a normal near
/// 90 degrees means a horizontal line, near 0 or 180 a vertical one. Lines
/// more than 30 degrees off either axis are dropped.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }

    (horizontal, vertical)
}

/// Row where a (roughly horizontal) line crosses column `x`.
fn row_at(line: &PolarLine, x: f32) -> f32 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    (line.r - x * theta.cos()) / theta.sin()
}

/// Column where a (roughly vertical) line crosses row `y`.
fn col_at(line: &PolarLine, y: f32) -> f32 {
    let theta = (line.angle_in_degrees as f32).to_radians();
    (line.r - y * theta.sin()) / theta.cos()
}

/// The line with the smallest (or largest, if `max`) position.
fn extreme(
    lines: &[PolarLine],
    position: impl Fn(&PolarLine) -> f32,
    max: bool,
) -> Option<PolarLine> {
    let cmp = |a: &&PolarLine, b: &&PolarLine| {
        position(a)
            .partial_cmp(&position(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    let found = if max {
        lines.iter().max_by(cmp)
    } else {
        lines.iter().min_by(cmp)
    };
    found.copied()
}

/// Corners in label order (top-left, top-right, bottom-left, bottom-right),
/// or `None` if any pair of edges is parallel.
fn quad_corners(
    top: &PolarLine,
    bottom: &PolarLine,
    left: &PolarLine,
    right: &PolarLine,
) -> Option<PixelCorners> {
    Some([
        intersect(top, left)?,
        intersect(top, right)?,
        intersect(bottom, left)?,
        intersect(bottom, right)?,
    ])
}

/// Intersection of two lines in polar form `x cos(t) + y sin(t) = r`.
fn intersect(a: &PolarLine, b: &PolarLine) -> Option<(f32, f32)> {
    let ta = (a.angle_in_degrees as f64).to_radians();
    let tb = (b.angle_in_degrees as f64).to_radians();
    let (sin_a, cos_a) = ta.sin_cos();
    let (sin_b, cos_b) = tb.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (ra, rb) = (a.r as f64, b.r as f64);
    let x = (ra * sin_b - rb * sin_a) / denom;
    let y = (rb * cos_a - ra * cos_b) / denom;
    Some((x as f32, y as f32))
}

/// Fraction of points sampled along the quad's perimeter that lie within
/// `EDGE_TOLERANCE` of an edge pixel.
fn perimeter_support(edges: &GrayImage, corners: &PixelCorners) -> f32 {
    let [tl, tr, bl, br] = *corners;
    let (w, h) = (edges.width() as i64, edges.height() as i64);
    let near_edge = |x: f32, y: f32| {
        let (cx, cy) = (x.round() as i64, y.round() as i64);
        for dy in -EDGE_TOLERANCE..=EDGE_TOLERANCE {
            for dx in -EDGE_TOLERANCE..=EDGE_TOLERANCE {
                let (px, py) = (cx + dx, cy + dy);
                let in_bounds = px >= 0 && py >= 0 && px < w && py < h;
                if in_bounds && edges.get_pixel(px as u32, py as u32).0[0] > 0 {
                    return true;
                }
            }
        }
        false
    };

    let mut hits = 0usize;
    let mut total = 0usize;
    for (a, b) in [(tl, tr), (tr, br), (br, bl), (bl, tl)] {
        // Skip the ends: corners are where blurred edges are weakest.
        for i in 1..SAMPLES_PER_EDGE {
            let t = i as f32 / SAMPLES_PER_EDGE as f32;
            let (x, y) = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            total += 1;
            if near_edge(x, y) {
                hits += 1;
            }
        }
    }

    if total == 0 { 0.0 } else { hits as f32 / total as f32 }
}
