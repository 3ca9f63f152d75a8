// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method channel — the named entry point hosts use to invoke the scanner.

use docscan_capture::Scanner;
use docscan_core::PageFailurePolicy;
use docscan_core::error::{ScanError, ScanFailure};
use docscan_core::human_errors::humanize_error;
use docscan_vision::encode_pages;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name the host registers the scanner under.
pub const CHANNEL_NAME: &str = "docscan";

/// Start one scan and reply with the rectified page.
pub const METHOD_SCAN_DOCUMENT: &str = "scanDocument";

/// Reply to a method call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum MethodResponse {
    /// One encoded page.
    Success(Vec<u8>),
    /// Several encoded pages, in input order.
    Pages(Vec<Vec<u8>>),
    Error {
        code: String,
        message: String,
        /// What the user can do about it, when there is something.
        details: Option<String>,
    },
    NotImplemented,
}

impl MethodResponse {
    /// Boundary failure plus optional user-facing details.
    pub fn failure(failure: ScanFailure, details: Option<String>) -> Self {
        let ScanFailure { code, message } = failure;
        Self::Error {
            code,
            message,
            details,
        }
    }

    pub fn from_error(err: &ScanError) -> Self {
        Self::failure(ScanFailure::from(err), Some(humanize_error(err).suggestion))
    }

    /// The boundary failure carried by an error reply.
    pub fn as_failure(&self) -> Option<ScanFailure> {
        match self {
            Self::Error { code, message, .. } => Some(ScanFailure {
                code: code.clone(),
                message: message.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Pages(_))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Handle one call on [`CHANNEL_NAME`].
pub async fn dispatch(scanner: &Scanner, method: &str) -> MethodResponse {
    match method {
        METHOD_SCAN_DOCUMENT => {
            let handle = scanner.start_scan();
            info!(session = %handle.id(), "scanDocument invoked");
            match handle.result().await {
                Ok(page) => MethodResponse::Success(page.jpeg),
                Err(err) => MethodResponse::from_error(&err),
            }
        }
        other => {
            debug!(method = other, "unknown method on {CHANNEL_NAME}");
            MethodResponse::NotImplemented
        }
    }
}

/// Encode a batch of pages for the multi-page reply.
pub fn pages_response(
    pages: &[DynamicImage],
    policy: PageFailurePolicy,
    quality: f32,
) -> MethodResponse {
    match encode_pages(pages, policy, quality) {
        Ok(encoded) => MethodResponse::Pages(encoded),
        Err(err) => MethodResponse::from_error(&err),
    }
}
