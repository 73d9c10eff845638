// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tracewerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Tracewerk operations.
#[derive(Debug, Error)]
pub enum TracewerkError {
    // -- Input validation --
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    // -- Pipeline stages --
    #[error("contour tracing invariant violated: {0}")]
    TraceInternal(String),

    #[error("cannot write {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Batch execution --
    #[error("batch worker failed: {0}")]
    WorkerFailed(String),

    #[error("{} is already the output of {}", path.display(), claimed_by.display())]
    OutputConflict { path: PathBuf, claimed_by: PathBuf },
}

impl TracewerkError {
    /// Short machine-friendly tag for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::InvalidImage(_) => "invalid_image",
            Self::TraceInternal(_) => "trace_internal",
            Self::OutputWrite { .. } => "output_write",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::WorkerFailed(_) => "worker_failed",
            Self::OutputConflict { .. } => "output_conflict",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TracewerkError>;
