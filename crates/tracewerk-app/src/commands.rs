// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each returns whether the run fully succeeded; errors
// are reported here in plain language rather than propagated to `main`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracewerk_core::BatchConfig;
use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::human_errors::{Severity, humanize_error};
use tracewerk_pipeline::{
    ALLOWED_EXTENSIONS, BatchReport, Pipeline, plan_directory, process_batch_parallel,
};
use tracing::info;

use crate::cli::ConversionArgs;
use crate::settings::{self, Settings};

fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    Ok(Pipeline::new(settings.config.clone())?
        .with_auto_threshold(settings.auto_threshold)
        .with_preview(settings.preview))
}

/// Print an error the way a user should read it.
pub fn report_error(context: &str, err: &TracewerkError) {
    let human = humanize_error(err);
    let label = match human.severity {
        Severity::ActionRequired => "error",
        Severity::Permanent => "skipped",
        Severity::Internal => "internal error",
    };
    eprintln!("{label}: {context}: {}", human.message);
    eprintln!("  {}", human.suggestion);
}

// -- convert ------------------------------------------------------------------

pub fn convert(input: &Path, output: Option<&Path>, args: &ConversionArgs) -> bool {
    let run = || -> Result<()> {
        let settings = settings::resolve(args)?;
        let pipeline = build_pipeline(&settings)?;
        let doc = pipeline.process_one(input, output)?;
        println!(
            "{} -> {} ({} paths, {} bytes, threshold {})",
            doc.input.display(),
            doc.output.display(),
            doc.paths,
            doc.bytes,
            doc.threshold
        );
        if let Some(preview) = &doc.preview {
            println!("preview: {}", preview.display());
        }
        Ok(())
    };

    match run() {
        Ok(()) => true,
        Err(err) => {
            report_error(&input.display().to_string(), &err);
            false
        }
    }
}

// -- batch --------------------------------------------------------------------

pub fn batch(
    input_dir: PathBuf,
    output_dir: PathBuf,
    jobs: usize,
    report_path: Option<&Path>,
    args: &ConversionArgs,
) -> bool {
    let batch_config = BatchConfig {
        input_dir,
        output_dir,
        max_parallel: jobs.max(1),
    };

    let run = || -> Result<BatchReport> {
        let settings = settings::resolve(args)?;
        let pipeline = build_pipeline(&settings)?;
        let items = plan_directory(&batch_config)?;
        if items.is_empty() {
            println!(
                "No images found in {}. Supported: {}.",
                batch_config.input_dir.display(),
                ALLOWED_EXTENSIONS.join(", ")
            );
        }

        if batch_config.max_parallel > 1 {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            info!(jobs = batch_config.max_parallel, "Running batch in parallel");
            Ok(runtime.block_on(process_batch_parallel(
                Arc::new(pipeline),
                items,
                batch_config.max_parallel,
            )))
        } else {
            Ok(pipeline.process_batch(&items))
        }
    };

    let report = match run() {
        Ok(report) => report,
        Err(err) => {
            report_error(&batch_config.input_dir.display().to_string(), &err);
            return false;
        }
    };

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(doc) => println!("converted: {} -> {}", doc.input.display(), doc.output.display()),
            Err(err) => report_error(&outcome.item.input.display().to_string(), err),
        }
    }
    println!(
        "Done: {} converted, {} failed. SVG files are in {}",
        report.succeeded(),
        report.failed(),
        batch_config.output_dir.display()
    );

    if let Some(path) = report_path {
        let written = report
            .to_json()
            .and_then(|json| std::fs::write(path, json).map_err(TracewerkError::from));
        if let Err(err) = written {
            report_error(&path.display().to_string(), &err);
            return false;
        }
        println!("report: {}", path.display());
    }

    report.failed() == 0
}

// -- config -------------------------------------------------------------------

pub fn config(write: Option<&Path>, args: &ConversionArgs) -> bool {
    let run = || -> Result<()> {
        let settings = settings::resolve(args)?;
        settings.config.validate()?;
        println!("{}", serde_json::to_string_pretty(&settings.config)?);
        if let Some(path) = write {
            settings.config.save(path)?;
            println!("saved: {}", path.display());
        } else if args.config.is_none() {
            info!(path = %settings::default_config_path().display(), "User configuration location");
        }
        Ok(())
    };

    match run() {
        Ok(()) => true,
        Err(err) => {
            report_error("configuration", &err);
            false
        }
    }
}
