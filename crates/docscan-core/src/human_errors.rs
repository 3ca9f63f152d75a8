// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A fresh attempt will probably work.
    Transient,
    /// User must do something (grant camera access, flatten the page).
    ActionRequired,
    /// Cannot be fixed by retrying on this device.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether starting a new scan is likely to help.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: severity == Severity::Transient,
            severity,
        }
    }
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::NoHostView => HumanError::new(
            "The scanner has nowhere to open.",
            "Bring the app to the foreground and try again.",
            Severity::Transient,
        ),
        ScanError::UnsupportedVersion { required, .. } => HumanError::new(
            "This device is too old for the document scanner.",
            format!("Update the operating system to version {required} or later."),
            Severity::Permanent,
        ),
        ScanError::CameraUnavailable(_) => HumanError::new(
            "We couldn't open the camera.",
            "Check that the app is allowed to use the camera and no other app is using it.",
            Severity::ActionRequired,
        ),
        ScanError::InvalidConfig(detail) => HumanError::new(
            "The scanner settings are not valid.",
            format!("Fix the configuration and try again. ({detail})"),
            Severity::Permanent,
        ),
        ScanError::Detection(_) => HumanError::new(
            "We lost track of the page for a moment.",
            "Hold the camera steady over the page.",
            Severity::Transient,
        ),
        ScanError::Capture(_) | ScanError::FrameSourceClosed => HumanError::new(
            "The photo could not be taken.",
            "Try scanning again.",
            Severity::Transient,
        ),
        ScanError::NoDocument => HumanError::new(
            "We couldn't find a page in the photo.",
            "Place the page on a darker surface so all four corners are visible, then scan again.",
            Severity::ActionRequired,
        ),
        ScanError::TransformUnavailable(_) | ScanError::EmptyOutput => HumanError::new(
            "We couldn't straighten the page.",
            "Make sure the whole page is in view and not folded, then scan again.",
            Severity::ActionRequired,
        ),
        ScanError::Encode(_) | ScanError::Decode(_) => HumanError::new(
            "The scanned image could not be saved.",
            "Try scanning again.",
            Severity::Transient,
        ),
        ScanError::Dismissed => HumanError::new(
            "The scan was cancelled.",
            "Start a new scan when you're ready.",
            Severity::Transient,
        ),
        ScanError::Scanner(detail) => HumanError::new(
            "Something went wrong in the scanner.",
            format!("Try again. ({detail})"),
            Severity::Transient,
        ),
        ScanError::Io(io_err) => HumanError::new(
            "A file could not be read or written.",
            format!("Check the path and permissions. ({io_err})"),
            Severity::ActionRequired,
        ),
        ScanError::Serialization(json_err) => HumanError::new(
            "A settings file could not be read.",
            format!("Check that the file is valid JSON. ({json_err})"),
            Severity::Permanent,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OsVersion;

    #[test]
    fn unsupported_version_is_permanent() {
        let human = humanize_error(&ScanError::UnsupportedVersion {
            found: OsVersion::new(12, 0),
            required: OsVersion::MIN_SUPPORTED,
        });
        assert_eq!(human.severity, Severity::Permanent);
        assert!(!human.retriable);
        assert!(human.suggestion.contains("13.0"));
    }

    #[test]
    fn no_document_needs_user_action() {
        let human = humanize_error(&ScanError::NoDocument);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn capture_failure_is_retriable() {
        let human = humanize_error(&ScanError::Capture("sensor busy".into()));
        assert!(human.retriable);
    }
}
