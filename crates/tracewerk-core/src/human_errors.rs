// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for batch reports and the command line.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the CLI prints the line.

use crate::error::TracewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it (different setting, writable folder).
    ActionRequired,
    /// This input will never convert (damaged or empty file).
    Permanent,
    /// A bug in Tracewerk; worth reporting.
    Internal,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `TracewerkError` into a `HumanError`.
pub fn humanize_error(err: &TracewerkError) -> HumanError {
    match err {
        TracewerkError::InvalidParameter(detail) => HumanError {
            message: "One of the conversion settings is out of range.".into(),
            suggestion: format!(
                "Use a threshold between 0 and 255 and an odd blur size such as 1, 3 or 5. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        TracewerkError::InvalidImage(_) => HumanError {
            message: "This file could not be read as an image.".into(),
            suggestion: "The file may be damaged or empty. Try re-saving it as PNG or JPEG.".into(),
            severity: Severity::Permanent,
        },

        TracewerkError::TraceInternal(detail) => HumanError {
            message: "Tracing failed unexpectedly.".into(),
            suggestion: format!("Please report this with the input image attached. ({detail})"),
            severity: Severity::Internal,
        },

        TracewerkError::OutputWrite { path, .. } => HumanError {
            message: "The SVG file could not be saved.".into(),
            suggestion: format!(
                "Check that {} is writable and that the disk is not full.",
                path.display()
            ),
            severity: Severity::ActionRequired,
        },

        TracewerkError::Io(io) => match io.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file or folder was not found.".into(),
                suggestion: "Check the path and try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Check the folder permissions and try again.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "A file operation failed.".into(),
                suggestion: format!("Details: {io}"),
                severity: Severity::ActionRequired,
            },
        },

        TracewerkError::Serialization(err) => HumanError {
            message: "Reading or writing JSON failed.".into(),
            suggestion: format!(
                "If this is your configuration file, run `tracewerk config` to print a valid one to start from. ({err})"
            ),
            severity: Severity::ActionRequired,
        },

        TracewerkError::WorkerFailed(detail) => HumanError {
            message: "Converting this image crashed.".into(),
            suggestion: format!("Other images were not affected. Please report this. ({detail})"),
            severity: Severity::Internal,
        },

        TracewerkError::OutputConflict { path, claimed_by } => HumanError {
            message: format!("Another image in this batch already writes {}.", path.display()),
            suggestion: format!(
                "Rename one of the inputs; {} was converted first.",
                claimed_by.display()
            ),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_image_is_permanent() {
        let human = humanize_error(&TracewerkError::InvalidImage("bad header".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn parameter_detail_is_kept_in_suggestion() {
        let human = humanize_error(&TracewerkError::InvalidParameter("blur 4".into()));
        assert!(human.suggestion.contains("blur 4"));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn permission_denied_io_is_actionable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let human = humanize_error(&TracewerkError::Io(io));
        assert_eq!(human.message, "Permission denied.");
    }

    #[test]
    fn worker_failure_is_internal() {
        let human = humanize_error(&TracewerkError::WorkerFailed("panicked".into()));
        assert_eq!(human.severity, Severity::Internal);
    }

    #[test]
    fn json_errors_do_not_blame_the_config_file() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let human = humanize_error(&TracewerkError::Serialization(err));
        assert!(!human.message.contains("configuration"));
        assert!(human.suggestion.contains("EOF"));
    }

    #[test]
    fn output_conflict_points_at_the_first_input() {
        let human = humanize_error(&TracewerkError::OutputConflict {
            path: "out/logo.svg".into(),
            claimed_by: "in/logo.png".into(),
        });
        assert!(human.message.contains("out/logo.svg"));
        assert!(human.suggestion.contains("in/logo.png"));
    }
}
