// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// tracewerk-vector — The raster to vector stages of Tracewerk.
//
// Provides image preprocessing (luminance, Gaussian smoothing, thresholding),
// boundary tracing on the pixel-corner lattice, corner/curve fitting of the
// traced polygons, and SVG serialization with an even-odd fill.

pub mod fit;
pub mod image;
pub mod svg;
pub mod trace;

// Re-export the primary structs so callers can use `tracewerk_vector::ContourTracer` etc.
pub use crate::fit::{CurveFitter, FitOptions};
pub use crate::image::preprocess::{Preprocessor, bitmap_to_image, preprocess, save_preview};
pub use crate::image::raster::RasterImage;
pub use crate::svg::writer::{SvgOptions, SvgWriter};
pub use crate::trace::{ContourTracer, remove_speckles};
