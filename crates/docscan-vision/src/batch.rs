// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-page encoding for the legacy full-screen scanner path, where the
// platform UI hands back several already-corrected pages at once.

use docscan_core::PageFailurePolicy;
use docscan_core::error::{Result, ScanError};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::encode::encode_jpeg;

/// Encode every page to JPEG, in order.
///
/// Under [`PageFailurePolicy::SkipFailed`] a page that fails to encode is
/// logged and left out; under [`PageFailurePolicy::FailBatch`] the first
/// failure is returned. An empty batch, or one where every page was skipped,
/// is [`ScanError::NoDocument`].
#[instrument(skip(pages), fields(page_count = pages.len()))]
pub fn encode_pages(
    pages: &[DynamicImage],
    policy: PageFailurePolicy,
    quality: f32,
) -> Result<Vec<Vec<u8>>> {
    if pages.is_empty() {
        return Err(ScanError::NoDocument);
    }

    let mut encoded = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        match encode_jpeg(page, quality) {
            Ok(bytes) => encoded.push(bytes),
            Err(err) => match policy {
                PageFailurePolicy::SkipFailed => {
                    warn!(index, error = %err, "skipping page that failed to encode");
                }
                PageFailurePolicy::FailBatch => return Err(err),
            },
        }
    }

    if encoded.is_empty() {
        return Err(ScanError::NoDocument);
    }
    info!(kept = encoded.len(), "pages encoded");
    Ok(encoded)
}
