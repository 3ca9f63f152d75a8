// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::{CaptureMode, PageFailurePolicy};

/// Tunables for one scanner instance. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Which triggers may start the capture.
    pub capture_mode: CaptureMode,
    /// Consecutive similar observations needed before auto-capture.
    pub required_stable_count: u32,
    /// Per-axis corner bound (normalized units) for "same document".
    pub similarity_threshold: f32,
    /// Minimum detector confidence for a candidate to count.
    pub min_confidence: f32,
    /// Minimum short-side / long-side ratio for a candidate.
    pub min_aspect_ratio: f32,
    /// Minimum candidate area as a fraction of the frame area.
    pub min_area_fraction: f32,
    /// Lossy encode quality on a 0-1 scale.
    pub jpeg_quality: f32,
    /// Legacy multi-page behaviour when a page fails to encode.
    pub page_failure_policy: PageFailurePolicy,
    /// Depth of the preview frame channel.
    pub frame_buffer: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::Hybrid,
            required_stable_count: 5,
            similarity_threshold: 0.02,
            min_confidence: 0.8,
            min_aspect_ratio: 0.5,
            min_area_fraction: 0.10,
            jpeg_quality: 0.8,
            page_failure_policy: PageFailurePolicy::SkipFailed,
            frame_buffer: 4,
        }
    }
}

impl ScannerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_stable_count == 0 {
            return Err(ScanError::InvalidConfig(
                "required_stable_count must be at least 1".into(),
            ));
        }
        let unit_fields = [
            ("similarity_threshold", self.similarity_threshold),
            ("min_aspect_ratio", self.min_aspect_ratio),
            ("jpeg_quality", self.jpeg_quality),
        ];
        for (name, value) in unit_fields {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ScanError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("min_area_fraction", self.min_area_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScanError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.frame_buffer == 0 {
            return Err(ScanError::InvalidConfig(
                "frame_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Map a 0-1 quality factor onto the encoder's 1-100 scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
