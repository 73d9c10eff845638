// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, luminance, smoothing and binarization.

pub mod preprocess;
pub mod raster;

pub use preprocess::{Preprocessor, suggest_threshold};
pub use raster::RasterImage;
