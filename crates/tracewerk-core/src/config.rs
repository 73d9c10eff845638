// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion and batch configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracewerkError};

/// Highest number of decimals the serializer will print.
pub const MAX_PRECISION: usize = 6;

/// How the boundary follower resolves a saddle vertex, where two foreground
/// pixels touch only at a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Turn towards the foreground: diagonal neighbours stay separate shapes.
    Right,
    /// Turn away from the foreground: diagonal neighbours join into one shape.
    #[default]
    Left,
}

/// Every tunable of the raster to vector pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Binarization threshold (0-255). Smoothed luminance above it is background.
    pub threshold: i32,
    /// Gaussian kernel size in pixels. Must be odd; 1 disables smoothing.
    pub blur: i32,
    /// Swap foreground and background after thresholding.
    pub invert: bool,
    /// Saddle resolution used by the contour tracer.
    pub turn_policy: TurnPolicy,
    /// Contours with an absolute area at or below this (px²) are dropped.
    /// 0 keeps everything.
    pub speckle_area: f64,
    /// Douglas-Peucker tolerance (px) used to straighten pixel staircases.
    pub simplify_epsilon: f64,
    /// Turn angle (radians) above which a polygon vertex is a corner.
    pub corner_angle: f64,
    /// Maximum distance (px) between a fitted curve and the vertices it replaces.
    pub fit_tolerance: f64,
    /// Decimal places for coordinates in the SVG output.
    pub precision: usize,
    /// Fill of the canvas rectangle.
    pub background: String,
    /// Fill of the traced shapes.
    pub foreground: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            threshold: 100,
            blur: 5,
            invert: false,
            turn_policy: TurnPolicy::default(),
            speckle_area: 0.0,
            simplify_epsilon: 1.0,
            corner_angle: 1.0,
            fit_tolerance: 0.5,
            precision: 2,
            background: "white".into(),
            foreground: "black".into(),
        }
    }
}

impl ConversionConfig {
    /// Check every field, returning `InvalidParameter` for the first bad one.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        validate_blur(self.blur)?;

        if !self.speckle_area.is_finite() || self.speckle_area < 0.0 {
            return Err(TracewerkError::InvalidParameter(format!(
                "speckle area must be a non-negative number, got {}",
                self.speckle_area
            )));
        }
        if !self.simplify_epsilon.is_finite() || self.simplify_epsilon < 0.0 {
            return Err(TracewerkError::InvalidParameter(format!(
                "simplify epsilon must be a non-negative number, got {}",
                self.simplify_epsilon
            )));
        }
        if !self.corner_angle.is_finite()
            || self.corner_angle <= 0.0
            || self.corner_angle > std::f64::consts::PI
        {
            return Err(TracewerkError::InvalidParameter(format!(
                "corner angle must be in (0, pi] radians, got {}",
                self.corner_angle
            )));
        }
        if !self.fit_tolerance.is_finite() || self.fit_tolerance <= 0.0 {
            return Err(TracewerkError::InvalidParameter(format!(
                "fit tolerance must be positive, got {}",
                self.fit_tolerance
            )));
        }
        if self.precision > MAX_PRECISION {
            return Err(TracewerkError::InvalidParameter(format!(
                "precision must be at most {MAX_PRECISION} decimals, got {}",
                self.precision
            )));
        }
        if self.background.trim().is_empty() || self.foreground.trim().is_empty() {
            return Err(TracewerkError::InvalidParameter(
                "fill colours must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Read a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }
}

/// Check a binarization threshold and narrow it to a byte.
pub fn validate_threshold(threshold: i32) -> Result<u8> {
    u8::try_from(threshold).map_err(|_| {
        TracewerkError::InvalidParameter(format!(
            "threshold must be in [0, 255], got {threshold}"
        ))
    })
}

/// Check a blur kernel size: odd and at least 1.
pub fn validate_blur(blur: i32) -> Result<usize> {
    if blur < 1 || blur % 2 == 0 {
        return Err(TracewerkError::InvalidParameter(format!(
            "blur radius must be an odd integer >= 1, got {blur}"
        )));
    }
    Ok(blur as usize)
}

/// Directory-to-directory batch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory scanned for input images.
    pub input_dir: PathBuf,
    /// Directory receiving one `.svg` per input (created if absent).
    pub output_dir: PathBuf,
    /// Upper bound on concurrently converted images. 1 runs sequentially.
    pub max_parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: Path::new("Images").join("ToConvert"),
            output_dir: Path::new("Images").join("Converted"),
            max_parallel: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ConversionConfig::default().validate().is_ok());
    }

    #[test]
    fn even_blur_is_rejected() {
        let config = ConversionConfig {
            blur: 4,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TracewerkError::InvalidParameter(_))
        ));
        assert!(validate_blur(0).is_err());
        assert!(validate_blur(-3).is_err());
        assert_eq!(validate_blur(1).unwrap(), 1);
    }

    #[test]
    fn threshold_range_is_enforced() {
        assert!(validate_threshold(-1).is_err());
        assert!(validate_threshold(256).is_err());
        assert_eq!(validate_threshold(0).unwrap(), 0);
        assert_eq!(validate_threshold(255).unwrap(), 255);
    }

    #[test]
    fn non_finite_tolerances_are_rejected() {
        let config = ConversionConfig {
            fit_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConversionConfig {
            corner_angle: 4.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ConversionConfig =
            serde_json::from_str(r#"{ "threshold": 140, "turn_policy": "right" }"#).unwrap();
        assert_eq!(config.threshold, 140);
        assert_eq!(config.turn_policy, TurnPolicy::Right);
        assert_eq!(config.blur, 5);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracewerk.json");
        let config = ConversionConfig {
            threshold: 180,
            blur: 7,
            invert: true,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ConversionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "blur": 2 }"#).unwrap();
        assert!(matches!(
            ConversionConfig::load(&path),
            Err(TracewerkError::InvalidParameter(_))
        ));
    }
}
