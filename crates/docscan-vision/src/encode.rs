// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JPEG encoding and still decoding.

use docscan_core::config::quality_percent;
use docscan_core::error::{Result, ScanError};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

/// Encode `image` as JPEG with a 0-1 quality factor.
pub fn encode_jpeg(image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent(quality));
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanError::Encode(format!("JPEG encoding failed: {err}")))?;
    debug!(bytes = buffer.len(), width = image.width(), height = image.height(), "JPEG encoded");
    Ok(buffer)
}

/// Decode encoded image bytes (JPEG, PNG, ...).
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data)
        .map_err(|err| ScanError::Decode(format!("failed to decode image: {err}")))
}
