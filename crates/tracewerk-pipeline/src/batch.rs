// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch conversion — directory planning, sequential and parallel runs, and the
// per-run report.
//
// Items are independent: a failure (or a panicking worker) is recorded in that
// item's outcome and the run carries on. Outcomes always follow input order.
// No two items ever write the same file: a later item that targets an output
// already claimed in the run fails with `OutputConflict` without running.

use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracewerk_core::BatchConfig;
use tracewerk_core::error::{Result, TracewerkError};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::pipeline::{ConvertedDocument, Pipeline};

/// Lower-case extensions picked up from an input directory.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "gif", "webp"];

/// One input image and where its SVG goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BatchItem {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// The result of converting one [`BatchItem`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub item: BatchItem,
    pub result: Result<ConvertedDocument>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&TracewerkError> {
        self.result.as_ref().err()
    }
}

/// Everything that happened during one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, item: BatchItem, result: Result<ConvertedDocument>) {
        match &result {
            Ok(doc) => info!(input = %item.input.display(), paths = doc.paths, "Converted"),
            Err(err) => warn!(input = %item.input.display(), kind = err.kind(), error = %err, "Conversion failed"),
        }
        self.outcomes.push(BatchOutcome { item, result });
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        info!(
            run_id = %self.run_id,
            succeeded = self.succeeded(),
            failed = self.failed(),
            "Batch finished"
        );
        self
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Serializable view of the report.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            succeeded: self.succeeded(),
            failed: self.failed(),
            items: self
                .outcomes
                .iter()
                .map(|outcome| match &outcome.result {
                    Ok(doc) => ItemSummary {
                        input: outcome.item.input.clone(),
                        output: outcome.item.output.clone(),
                        document: Some(doc.clone()),
                        error_kind: None,
                        error: None,
                    },
                    Err(err) => ItemSummary {
                        input: outcome.item.input.clone(),
                        output: outcome.item.output.clone(),
                        document: None,
                        error_kind: Some(err.kind().to_owned()),
                        error: Some(err.to_string()),
                    },
                })
                .collect(),
        }
    }

    /// Pretty JSON of [`BatchReport::summary`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

/// JSON form of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<ConvertedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// -- Directory planning -------------------------------------------------------

/// Regular files in `dir` with an allowed image extension, sorted by path.
/// Anything else is skipped silently.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_allowed_extension(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Create both directories if needed and pair every input with
/// `<output_dir>/<stem>.svg`.
///
/// Inputs sharing a stem (`logo.png`, `logo.bmp`) keep their extension
/// instead (`logo.png.svg`, `logo.bmp.svg`). Names are compared
/// case-insensitively and any remaining clash gets a `-2`, `-3`... suffix, so
/// every item has its own output file.
#[instrument(skip_all, fields(input_dir = %config.input_dir.display(), output_dir = %config.output_dir.display()))]
pub fn plan_directory(config: &BatchConfig) -> Result<Vec<BatchItem>> {
    std::fs::create_dir_all(&config.input_dir)?;
    std::fs::create_dir_all(&config.output_dir)?;

    let inputs = collect_inputs(&config.input_dir)?;
    let mut stems: HashMap<String, usize> = HashMap::new();
    for input in &inputs {
        *stems.entry(name_key(input.file_stem())).or_default() += 1;
    }

    let mut taken = HashSet::new();
    let items: Vec<BatchItem> = inputs
        .into_iter()
        .map(|input| {
            let shared = stems
                .get(&name_key(input.file_stem()))
                .is_some_and(|&count| count > 1);
            let base = if shared { input.file_name() } else { input.file_stem() };
            let output = config
                .output_dir
                .join(unique_svg_name(base.unwrap_or_default(), &mut taken));
            BatchItem { input, output }
        })
        .collect();
    info!(items = items.len(), "Batch planned");
    Ok(items)
}

fn name_key(name: Option<&OsStr>) -> String {
    name.unwrap_or_default().to_string_lossy().to_lowercase()
}

/// `<base>.svg`, or `<base>-N.svg` with the smallest N not yet in `taken`.
fn unique_svg_name(base: &OsStr, taken: &mut HashSet<String>) -> OsString {
    let mut suffix = 1usize;
    loop {
        let mut name = base.to_os_string();
        if suffix > 1 {
            name.push(format!("-{suffix}"));
        }
        name.push(".svg");
        if taken.insert(name_key(Some(name.as_os_str()))) {
            return name;
        }
        suffix += 1;
    }
}

/// For each item, the conflict error if an earlier item already targets the
/// same output.
fn claim_outputs(items: &[BatchItem]) -> Vec<Option<TracewerkError>> {
    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    let mut conflicts = Vec::with_capacity(items.len());
    for item in items {
        if let Some(first) = claimed.get(item.output.as_path()) {
            conflicts.push(Some(TracewerkError::OutputConflict {
                path: item.output.clone(),
                claimed_by: first.to_path_buf(),
            }));
        } else {
            claimed.insert(item.output.as_path(), item.input.as_path());
            conflicts.push(None);
        }
    }
    conflicts
}

// -- Execution ----------------------------------------------------------------

impl Pipeline {
    /// Convert every item in order, one at a time. Never fails as a whole.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn process_batch(&self, items: &[BatchItem]) -> BatchReport {
        let mut report = BatchReport::start();
        for (item, conflict) in items.iter().zip(claim_outputs(items)) {
            let result = match conflict {
                Some(err) => Err(err),
                None => self.process_one(&item.input, Some(item.output.as_path())),
            };
            report.record(item.clone(), result);
        }
        report.finish()
    }
}

/// Convert items on tokio's blocking pool with at most `max_parallel` running
/// at once. A worker that panics is recorded as
/// [`TracewerkError::WorkerFailed`] for its item, and an item whose output is
/// already claimed is never started.
#[instrument(skip_all, fields(items = items.len(), max_parallel = max_parallel))]
pub async fn process_batch_parallel(
    pipeline: Arc<Pipeline>,
    items: Vec<BatchItem>,
    max_parallel: usize,
) -> BatchReport {
    let mut report = BatchReport::start();
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    let handles: Vec<_> = items
        .iter()
        .cloned()
        .zip(claim_outputs(&items))
        .map(|(item, conflict)| {
            if let Some(err) = conflict {
                return Err(err);
            }
            let pipeline = Arc::clone(&pipeline);
            let semaphore = Arc::clone(&semaphore);
            Ok(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|err| TracewerkError::WorkerFailed(err.to_string()))?;
                tokio::task::spawn_blocking(move || {
                    pipeline.process_one(&item.input, Some(item.output.as_path()))
                })
                .await
                .map_err(|err| TracewerkError::WorkerFailed(err.to_string()))?
            }))
        })
        .collect();

    for (item, handle) in items.into_iter().zip(handles) {
        let result = match handle {
            Err(conflict) => Err(conflict),
            Ok(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => Err(TracewerkError::WorkerFailed(err.to_string())),
            },
        };
        report.record(item, result);
    }
    report.finish()
}
