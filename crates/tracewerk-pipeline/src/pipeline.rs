// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-image orchestration: decode -> preprocess -> trace -> speckle filter
// -> fit -> serialize -> write.
//
// Every parameter is validated when the pipeline is built, so a bad setting
// fails before any file is opened. The output file is only created once the
// document has been fully rendered in memory, and a failed item leaves
// neither an SVG nor a preview behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::{BinaryBitmap, ConversionConfig, VectorDocument};
use tracewerk_vector::image::suggest_threshold;
use tracewerk_vector::{
    ContourTracer, CurveFitter, FitOptions, Preprocessor, RasterImage, SvgOptions, SvgWriter,
    remove_speckles, save_preview,
};
use tracing::{debug, info, instrument, warn};

use crate::integrity;

/// In-memory result of converting one image.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The binarized image the contours were traced from.
    pub bitmap: BinaryBitmap,
    /// Threshold actually applied (differs from the config in auto mode).
    pub threshold: u8,
    /// Contours left after speckle removal.
    pub contours: usize,
    pub document: VectorDocument,
}

/// Record of one SVG written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub input: PathBuf,
    pub output: PathBuf,
    /// PNG rendering of the bitmap, when previews are enabled.
    pub preview: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub threshold: u8,
    pub contours: usize,
    pub paths: usize,
    pub bytes: usize,
    /// SHA-256 of the written SVG, lowercase hex.
    pub sha256: String,
}

/// The configured conversion pipeline. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ConversionConfig,
    preprocessor: Preprocessor,
    tracer: ContourTracer,
    fitter: CurveFitter,
    svg: SvgOptions,
    auto_threshold: bool,
    write_preview: bool,
}

impl Pipeline {
    // -- Construction ---------------------------------------------------------

    /// Build a pipeline, rejecting out-of-range parameters up front.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            preprocessor: Preprocessor::from_config(&config)?,
            tracer: ContourTracer::new(config.turn_policy),
            fitter: CurveFitter::new(FitOptions::from_config(&config)),
            svg: SvgOptions::from_config(&config),
            config,
            auto_threshold: false,
            write_preview: false,
        })
    }

    /// Pick the threshold per image with Otsu's method instead of using the
    /// configured value.
    pub fn with_auto_threshold(mut self, enabled: bool) -> Self {
        self.auto_threshold = enabled;
        self
    }

    /// Also write `<output stem>.preview.png` next to every SVG.
    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.write_preview = enabled;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// `input` with its extension replaced by `svg`.
    pub fn default_output(input: &Path) -> PathBuf {
        input.with_extension("svg")
    }

    // -- Stages ---------------------------------------------------------------

    /// Run every stage in memory.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn convert(&self, image: &RasterImage, title: Option<&str>) -> Result<Conversion> {
        let auto = self.auto_preprocessor(image)?;
        let preprocessor = auto.as_ref().unwrap_or(&self.preprocessor);

        let bitmap = preprocessor.run(image);
        let contours = remove_speckles(self.tracer.trace(&bitmap)?, self.config.speckle_area);
        let paths = self.fitter.fit_all(&contours);

        let mut writer = SvgWriter::new(self.svg.clone());
        if let Some(title) = title {
            writer.set_title(title);
        }
        let document = writer.serialize(paths, bitmap.width(), bitmap.height());

        Ok(Conversion {
            threshold: preprocessor.threshold(),
            contours: contours.len(),
            bitmap,
            document,
        })
    }

    /// Decode `input` and return the binarized bitmap without tracing it.
    pub fn preview(&self, input: &Path) -> Result<BinaryBitmap> {
        let image = RasterImage::open(input)?;
        let auto = self.auto_preprocessor(&image)?;
        Ok(auto.as_ref().unwrap_or(&self.preprocessor).run(&image))
    }

    /// Per-image preprocessor when automatic thresholding is on.
    fn auto_preprocessor(&self, image: &RasterImage) -> Result<Option<Preprocessor>> {
        if !self.auto_threshold {
            return Ok(None);
        }
        let level = suggest_threshold(image, self.config.blur)?;
        debug!(level, "Automatic threshold selected");
        let preprocessor =
            Preprocessor::new(i32::from(level), self.config.blur)?.with_invert(self.config.invert);
        Ok(Some(preprocessor))
    }

    /// Convert one file. `output` defaults to [`Pipeline::default_output`].
    ///
    /// Nothing is written when decoding or any stage fails.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn process_one(&self, input: &Path, output: Option<&Path>) -> Result<ConvertedDocument> {
        let output = output.map_or_else(|| Self::default_output(input), Path::to_path_buf);

        let image = RasterImage::open(input)?;
        let title = input.file_stem().and_then(|stem| stem.to_str());
        let conversion = self.convert(&image, title)?;

        let preview = if self.write_preview {
            let path = preview_path(&output);
            save_preview(&conversion.bitmap, &path)?;
            Some(path)
        } else {
            None
        };

        let writer = SvgWriter::new(self.svg.clone());
        let written = writer.write_to(&conversion.document, &output).and_then(|bytes| {
            let sha256 = integrity::hash_bytes(&bytes);
            if integrity::verify_file(&output, &sha256)? {
                Ok((bytes, sha256))
            } else {
                Err(TracewerkError::OutputWrite {
                    path: output.clone(),
                    reason: "file on disk does not match the rendered document".into(),
                })
            }
        });
        let (bytes, sha256) = match written {
            Ok(written) => written,
            Err(err) => {
                if let Some(path) = &preview {
                    if let Err(cleanup) = std::fs::remove_file(path) {
                        warn!(preview = %path.display(), error = %cleanup, "Could not remove preview");
                    }
                }
                return Err(err);
            }
        };

        let converted = ConvertedDocument {
            input: input.to_path_buf(),
            output,
            preview,
            width: conversion.document.width,
            height: conversion.document.height,
            threshold: conversion.threshold,
            contours: conversion.contours,
            paths: conversion.document.paths.len(),
            bytes: bytes.len(),
            sha256,
        };
        info!(
            output = %converted.output.display(),
            contours = converted.contours,
            paths = converted.paths,
            bytes = converted.bytes,
            "Image converted"
        );
        Ok(converted)
    }
}

/// `dir/name.svg` -> `dir/name.preview.png`.
fn preview_path(output: &Path) -> PathBuf {
    output.with_extension("preview.png")
}
