// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification pipeline — maps detector corners into the captured still,
// warps the page to an upright rectangle, and encodes the result.

use docscan_core::error::{ErrorKind, Result, ScanError};
use docscan_core::{Quad, ScannerConfig};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument, warn};

use crate::detect::CornerDetector;
use crate::encode::encode_jpeg;
use crate::geometry::{self, PixelCorners};

/// A corrected, encoded page.
#[derive(Debug, Clone)]
pub struct RectifiedPage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Warps a detected document region into a flat, cropped image.
#[derive(Debug, Clone, Copy)]
pub struct Rectifier {
    /// Lossy encode quality on a 0-1 scale.
    quality: f32,
}

impl Default for Rectifier {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl Rectifier {
    pub fn new(quality: f32) -> Self {
        Self { quality }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.jpeg_quality)
    }

    /// Warp the region bounded by `quad` (normalized, bottom-left origin)
    /// into an upright rectangle.
    ///
    /// The output is as wide as the longer of the top and bottom edges and
    /// as tall as the longer of the left and right edges.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn correct(&self, image: &DynamicImage, quad: &Quad) -> Result<RgbaImage> {
        let src = geometry::to_pixel_space(quad, image.width(), image.height());
        let (out_w, out_h) = geometry::output_size(&src);
        debug!(?src, out_w, out_h, "corners mapped into pixel space");
        if out_w == 0 || out_h == 0 {
            return Err(ScanError::EmptyOutput);
        }

        let projection = projection_onto(&src, out_w, out_h)?;

        let rgba = image.to_rgba8();
        let mut output = RgbaImage::new(out_w, out_h);
        warp_into(
            &rgba,
            &projection,
            Interpolation::Bilinear,
            Rgba([255u8, 255, 255, 255]),
            &mut output,
        );
        Ok(output)
    }

    /// Correct and encode in one step.
    pub fn rectify(&self, image: &DynamicImage, quad: &Quad) -> Result<RectifiedPage> {
        let corrected = self.correct(image, quad)?;
        let (width, height) = corrected.dimensions();
        let jpeg = encode_jpeg(&DynamicImage::ImageRgba8(corrected), self.quality)?;
        info!(width, height, bytes = jpeg.len(), "page rectified");
        Ok(RectifiedPage { width, height, jpeg })
    }

    /// Rectify a freshly captured still.
    ///
    /// Corners come from running `detector` over the still; when it is
    /// unavailable or finds nothing, `hint` (the last quad seen during
    /// preview) is used instead. With neither, the still holds no document.
    #[instrument(skip_all, fields(width = still.width(), height = still.height()))]
    pub fn rectify_still(
        &self,
        still: &DynamicImage,
        detector: Option<&dyn CornerDetector>,
        hint: Option<Quad>,
    ) -> Result<RectifiedPage> {
        let quad = resolve_corners(&still.to_luma8(), detector, hint)?;
        self.rectify(still, &quad)
    }
}

/// Pick the corners to rectify with: a fresh detection on the still wins
/// over the preview hint. A detection failure falls back to the hint like a
/// miss does; any other error from the detector is returned as is.
pub fn resolve_corners(
    still: &GrayImage,
    detector: Option<&dyn CornerDetector>,
    hint: Option<Quad>,
) -> Result<Quad> {
    let mut failure = None;
    if let Some(detector) = detector {
        match detector.detect(still) {
            Ok(Some(observation)) => {
                debug!(
                    detector = detector.kind().as_str(),
                    confidence = observation.confidence,
                    "document found in still"
                );
                return Ok(observation.quad);
            }
            Ok(None) => debug!(detector = detector.kind().as_str(), "no document in still"),
            Err(err) if err.kind() == ErrorKind::Detection => {
                warn!(error = %err, "still detection failed");
                failure = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    match (hint, failure) {
        (Some(quad), _) => {
            debug!("falling back to last preview corners");
            Ok(quad)
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err(ScanError::NoDocument),
    }
}

/// Projective transform taking the source corners onto an `out_w` x `out_h`
/// rectangle in label order.
fn projection_onto(src: &PixelCorners, out_w: u32, out_h: u32) -> Result<Projection> {
    let (w, h) = (out_w as f32, out_h as f32);
    let dest: PixelCorners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    Projection::from_control_points(*src, dest).ok_or_else(|| {
        ScanError::TransformUnavailable("corners do not define an invertible projection".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectorSettings, SegmentationDetector, synthetic_page};
    use docscan_core::{DetectorKind, Observation, Point};
    use image::{Luma, Rgb, RgbImage};

    /// Normalized quad for the pixel rectangle `(x0, y0)..(x1, y1)`.
    fn quad_for(width: u32, height: u32, x0: f32, y0: f32, x1: f32, y1: f32) -> Quad {
        let (w, h) = (width as f32, height as f32);
        Quad::new(
            Point::new(x0 / w, 1.0 - y0 / h),
            Point::new(x1 / w, 1.0 - y0 / h),
            Point::new(x0 / w, 1.0 - y1 / h),
            Point::new(x1 / w, 1.0 - y1 / h),
        )
    }

    /// Bright page over the middle of a dark frame; at 400x300 it spans
    /// `(50, 40)..(350, 240)`.
    fn page_on_dark(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::from_pixel(width, height, Rgb([20, 20, 20]));
        for y in height * 2 / 15..height * 4 / 5 {
            for x in width / 8..width * 7 / 8 {
                img.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    struct Nothing;

    impl CornerDetector for Nothing {
        fn kind(&self) -> DetectorKind {
            DetectorKind::RectangleDetection
        }

        fn detect(&self, _image: &GrayImage) -> Result<Option<Observation>> {
            Ok(None)
        }
    }

    #[test]
    fn axis_aligned_rectangle_keeps_its_size() {
        let image = page_on_dark(400, 300);
        let quad = quad_for(400, 300, 50.0, 40.0, 350.0, 240.0);
        let out = Rectifier::default().correct(&image, &quad).unwrap();
        assert_eq!(out.dimensions(), (300, 200));

        // The crop is the bright page, not the dark surround.
        let centre = out.get_pixel(150, 100);
        assert!(centre.0[0] > 200, "centre pixel {:?}", centre);
    }

    #[test]
    fn rectify_encodes_jpeg() {
        let image = page_on_dark(400, 300);
        let quad = quad_for(400, 300, 50.0, 40.0, 350.0, 240.0);
        let page = Rectifier::new(0.8).rectify(&image, &quad).unwrap();
        assert_eq!((page.width, page.height), (300, 200));
        let decoded = image::load_from_memory(&page.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[test]
    fn collapsed_quad_has_no_output() {
        let image = page_on_dark(100, 100);
        let p = Point::new(0.5, 0.5);
        let err = Rectifier::default()
            .correct(&image, &Quad::new(p, p, p, p))
            .unwrap_err();
        assert!(matches!(err, ScanError::EmptyOutput));
        assert_eq!(err.code(), "EMPTY_OUTPUT");

        // Flattened onto a horizontal line: width but no height.
        let (l, r) = (Point::new(0.2, 0.5), Point::new(0.8, 0.5));
        let err = Rectifier::default()
            .correct(&image, &Quad::new(l, r, l, r))
            .unwrap_err();
        assert!(matches!(err, ScanError::EmptyOutput));
    }

    #[test]
    fn still_without_document_or_hint_fails() {
        let still = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([128u8])));
        let err = Rectifier::default()
            .rectify_still(&still, Some(&Nothing), None)
            .unwrap_err();
        assert!(matches!(err, ScanError::NoDocument));
    }

    struct Broken;

    impl CornerDetector for Broken {
        fn kind(&self) -> DetectorKind {
            DetectorKind::DocumentSegmentation
        }

        fn detect(&self, _image: &GrayImage) -> Result<Option<Observation>> {
            Err(ScanError::Detection("model failed to load".into()))
        }
    }

    #[test]
    fn detector_error_without_hint_is_reported() {
        let still = GrayImage::from_pixel(64, 64, Luma([128u8]));
        let err = resolve_corners(&still, Some(&Broken), None).unwrap_err();
        assert_eq!(err.code(), "DETECTION_FAILED");

        let hint = quad_for(64, 64, 8.0, 8.0, 56.0, 56.0);
        assert_eq!(resolve_corners(&still, Some(&Broken), Some(hint)).unwrap(), hint);
    }

    struct Unreadable;

    impl CornerDetector for Unreadable {
        fn kind(&self) -> DetectorKind {
            DetectorKind::DocumentSegmentation
        }

        fn detect(&self, _image: &GrayImage) -> Result<Option<Observation>> {
            Err(ScanError::Decode("corrupt still".into()))
        }
    }

    #[test]
    fn non_detection_error_ignores_the_hint() {
        let still = GrayImage::from_pixel(64, 64, Luma([128u8]));
        let hint = quad_for(64, 64, 8.0, 8.0, 56.0, 56.0);
        let err = resolve_corners(&still, Some(&Unreadable), Some(hint)).unwrap_err();
        assert_eq!(err.code(), "DECODE_FAILED");
    }

    #[test]
    fn hint_is_used_when_still_detection_misses() {
        let image = page_on_dark(400, 300);
        let hint = quad_for(400, 300, 50.0, 40.0, 350.0, 240.0);
        let page = Rectifier::default()
            .rectify_still(&image, Some(&Nothing), Some(hint))
            .unwrap();
        assert_eq!((page.width, page.height), (300, 200));
    }

    #[test]
    fn still_detection_beats_hint() {
        let still = DynamicImage::ImageLuma8(synthetic_page(400, 500, 50, 60, 350, 440));
        let wrong_hint = quad_for(400, 500, 0.0, 0.0, 100.0, 100.0);
        let detector = SegmentationDetector::new(DetectorSettings::default());
        let page = Rectifier::default()
            .rectify_still(&still, Some(&detector), Some(wrong_hint))
            .unwrap();
        assert!((page.width as i32 - 299).abs() <= 2, "width {}", page.width);
        assert!((page.height as i32 - 379).abs() <= 2, "height {}", page.height);
    }
}
