// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tracewerk-pipeline — Orchestration of the vector stages.
//
// Runs decode, preprocess, trace, fit and serialize for one image, and fans
// whole directories out over sequential or parallel batches with per-item
// error isolation.

pub mod batch;
pub mod integrity;
pub mod pipeline;

pub use batch::{
    ALLOWED_EXTENSIONS, BatchItem, BatchOutcome, BatchReport, ItemSummary, ReportSummary,
    collect_inputs, plan_directory, process_batch_parallel,
};
pub use pipeline::{Conversion, ConvertedDocument, Pipeline};
