// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate conversions between the detector's normalized space and image
// pixel space, plus small quadrilateral measurements.

use docscan_core::{Point, Quad};

/// Pixel-space corners, top-left origin, in label order:
/// top-left, top-right, bottom-left, bottom-right.
pub type PixelCorners = [(f32, f32); 4];

/// Scale normalized corners into pixel space, flipping the vertical axis.
///
/// `pixel_y = (1 - normalized_y) * height`, so normalized `(0, 0)` lands on
/// pixel `(0, height)` and `(1, 1)` on `(width, 0)`.
pub fn to_pixel_space(quad: &Quad, width: u32, height: u32) -> PixelCorners {
    let (w, h) = (width as f32, height as f32);
    let scale = |p: Point| (p.x * w, (1.0 - p.y) * h);
    [
        scale(quad.top_left),
        scale(quad.top_right),
        scale(quad.bottom_left),
        scale(quad.bottom_right),
    ]
}

/// Inverse of [`to_pixel_space`].
pub fn normalize(corners: &PixelCorners, width: u32, height: u32) -> Quad {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let unit = |(x, y): (f32, f32)| {
        Point::new((x / w).clamp(0.0, 1.0), (1.0 - y / h).clamp(0.0, 1.0))
    };
    Quad::new(
        unit(corners[0]),
        unit(corners[1]),
        unit(corners[2]),
        unit(corners[3]),
    )
}

/// Area of a simple polygon via the shoelace formula. Vertices in order
/// (CW or CCW).
pub fn polygon_area(points: &[(f32, f32)]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].0 as f64 * points[j].1 as f64;
        area -= points[j].0 as f64 * points[i].1 as f64;
    }
    (area.abs() / 2.0) as f32
}

/// Area of the quadrilateral walked around its perimeter.
pub fn quad_area(corners: &PixelCorners) -> f32 {
    let [tl, tr, bl, br] = *corners;
    polygon_area(&[tl, tr, br, bl])
}

fn dist(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Side lengths as `(width, height)`: the longer of each pair of opposite
/// edges.
pub fn edge_extent(corners: &PixelCorners) -> (f32, f32) {
    let [tl, tr, bl, br] = *corners;
    let width = dist(tl, tr).max(dist(bl, br));
    let height = dist(tl, bl).max(dist(tr, br));
    (width, height)
}

/// Rounded pixel size of the upright rectangle a quad rectifies into.
pub fn output_size(corners: &PixelCorners) -> (u32, u32) {
    let (w, h) = edge_extent(corners);
    (w.round() as u32, h.round() as u32)
}

/// Short side over long side, in `[0, 1]`. Zero for a degenerate quad.
pub fn aspect_ratio(corners: &PixelCorners) -> f32 {
    let (w, h) = edge_extent(corners);
    let long = w.max(h);
    if long <= f32::EPSILON {
        return 0.0;
    }
    w.min(h) / long
}
