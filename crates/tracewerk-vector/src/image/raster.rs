// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster input — decode files or bytes into an immutable 8-bit RGB buffer
// using the `image` crate.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use tracewerk_core::error::{Result, TracewerkError};
use tracing::{debug, info, instrument};

/// Decoded source image, three channels per pixel, row-major.
///
/// Construction rejects zero-sized images, so every `RasterImage` has at least
/// one pixel.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. The format is sniffed from the content,
    /// falling back to the extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = image::ImageReader::open(path)
            .map_err(|err| {
                TracewerkError::InvalidImage(format!("failed to open {}: {}", path.display(), err))
            })?
            .with_guessed_format()
            .map_err(|err| {
                TracewerkError::InvalidImage(format!("failed to read {}: {}", path.display(), err))
            })?;
        let decoded = reader.decode().map_err(|err| {
            TracewerkError::InvalidImage(format!("failed to decode {}: {}", path.display(), err))
        })?;
        let raster = Self::from_dynamic(decoded)?;
        info!(
            width = raster.width(),
            height = raster.height(),
            "Image loaded"
        );
        Ok(raster)
    }

    /// Decode raw encoded bytes (PNG, JPEG, BMP, GIF, WEBP, TIFF).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data).map_err(|err| {
            TracewerkError::InvalidImage(format!("failed to decode image: {}", err))
        })?;
        let raster = Self::from_dynamic(decoded)?;
        debug!(
            width = raster.width(),
            height = raster.height(),
            "Image decoded from bytes"
        );
        Ok(raster)
    }

    /// Wrap an already-decoded `DynamicImage`, dropping any alpha channel.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::from_rgb(image.to_rgb8())
    }

    /// Wrap an RGB buffer.
    pub fn from_rgb(pixels: RgbImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(TracewerkError::InvalidImage(format!(
                "image has zero size ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying RGB buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Per-pixel luminance `0.299 R + 0.587 G + 0.114 B`, row-major, in
    /// `[0, 255]`.
    pub fn luminance(&self) -> Vec<f32> {
        self.pixels
            .pixels()
            .map(|pixel| {
                let image::Rgb([r, g, b]) = *pixel;
                0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};

    #[test]
    fn zero_sized_image_is_rejected() {
        let result = RasterImage::from_rgb(RgbImage::new(0, 5));
        assert!(matches!(result, Err(TracewerkError::InvalidImage(_))));
    }

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let result = RasterImage::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(TracewerkError::InvalidImage(_))));
    }

    #[test]
    fn png_bytes_round_trip_dimensions() {
        let source = RgbImage::from_pixel(7, 3, Rgb([10, 20, 30]));
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(source)
            .write_to(&mut std::io::Cursor::new(&mut encoded), ImageFormat::Png)
            .unwrap();

        let raster = RasterImage::from_bytes(&encoded).unwrap();
        assert_eq!((raster.width(), raster.height()), (7, 3));
    }

    #[test]
    fn luminance_uses_weighted_channels() {
        let raster = RasterImage::from_rgb(RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]))).unwrap();
        let luma = raster.luminance();
        assert!((luma[0] - 76.245).abs() < 1e-3);

        let white = RasterImage::from_rgb(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]))).unwrap();
        assert!((white.luminance()[0] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_invalid_image() {
        let result = RasterImage::open("/definitely/not/here.png");
        assert!(matches!(result, Err(TracewerkError::InvalidImage(_))));
    }
}
