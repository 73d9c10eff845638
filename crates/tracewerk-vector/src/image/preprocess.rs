// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessor — luminance, separable Gaussian smoothing (imageproc, edge
// samples replicated past the border) and global thresholding. Turns a `RasterImage` into the `BinaryBitmap` the tracer
// consumes.

use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;
use tracewerk_core::config::{validate_blur, validate_threshold};
use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::{BinaryBitmap, ConversionConfig};
use tracing::{debug, info, instrument};

use super::raster::RasterImage;

/// Binarization stage with validated parameters.
///
/// ```ignore
/// let bitmap = Preprocessor::new(100, 5)?.run(&RasterImage::open("logo.png")?);
/// ```
#[derive(Debug, Clone)]
pub struct Preprocessor {
    threshold: u8,
    /// Normalised 1-D Gaussian weights, applied along rows then columns.
    kernel: Vec<f32>,
    invert: bool,
}

impl Preprocessor {
    /// Validate `threshold` (0-255) and `blur` (odd, >= 1).
    pub fn new(threshold: i32, blur: i32) -> Result<Self> {
        let threshold = validate_threshold(threshold)?;
        let size = validate_blur(blur)?;
        Ok(Self {
            threshold,
            kernel: gaussian_kernel(size),
            invert: false,
        })
    }

    pub fn from_config(config: &ConversionConfig) -> Result<Self> {
        Ok(Self::new(config.threshold, config.blur)?.with_invert(config.invert))
    }

    /// Swap the two classes after thresholding.
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    /// Smoothed luminance rounded to 8 bits.
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), kernel = self.kernel.len()))]
    pub fn smooth(&self, image: &RasterImage) -> GrayImage {
        let (width, height) = (image.width(), image.height());
        let Some(mut luma) = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(width, height, image.luminance())
        else {
            return GrayImage::new(width, height);
        };

        if self.kernel.len() > 1 {
            luma = separable_filter_equal(&luma, self.kernel.as_slice());
            debug!("Gaussian smoothing applied");
        }

        GrayImage::from_fn(width, height, |x, y| {
            Luma([luma.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
        })
    }

    /// Run the full stage: luminance, smoothing, thresholding.
    ///
    /// A pixel whose smoothed luminance is greater than the threshold becomes
    /// background, every other pixel foreground.
    #[instrument(skip_all, fields(threshold = self.threshold, invert = self.invert))]
    pub fn run(&self, image: &RasterImage) -> BinaryBitmap {
        let smoothed = self.smooth(image);
        let threshold = self.threshold;
        let mut bitmap = BinaryBitmap::from_fn(smoothed.width(), smoothed.height(), |x, y| {
            smoothed.get_pixel(x, y).0[0] <= threshold
        });
        if self.invert {
            bitmap.invert();
        }
        info!(
            foreground = bitmap.foreground_count(),
            total = bitmap.cells().len(),
            "Binarization complete"
        );
        bitmap
    }
}

/// Free-function form of [`Preprocessor::run`].
pub fn preprocess(image: &RasterImage, threshold: i32, blur: i32) -> Result<BinaryBitmap> {
    Ok(Preprocessor::new(threshold, blur)?.run(image))
}

/// Otsu threshold of the smoothed luminance, for `--threshold auto`.
pub fn suggest_threshold(image: &RasterImage, blur: i32) -> Result<u8> {
    let smoothed = Preprocessor::new(0, blur)?.smooth(image);
    let level = imageproc::contrast::otsu_level(&smoothed);
    debug!(level, "Otsu level computed");
    Ok(level)
}

// -- Preview ------------------------------------------------------------------

/// Render a bitmap for display: foreground black, background white.
pub fn bitmap_to_image(bitmap: &BinaryBitmap) -> GrayImage {
    GrayImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        if bitmap.is_foreground(x as i64, y as i64) {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Write the preview rendering as PNG.
pub fn save_preview(bitmap: &BinaryBitmap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    bitmap_to_image(bitmap)
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| TracewerkError::OutputWrite {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

// -- Kernel helpers -----------------------------------------------------------

/// Normalised Gaussian weights for an odd kernel `size`.
///
/// Sigma follows the usual size-derived rule
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`. Size 1 yields the identity `[1.0]`.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0];
    }
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let centre = (size / 2) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| (w / sum) as f32).collect()
}
