// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trace module — boundary following on the pixel-corner lattice and the
// outer/hole hierarchy of the resulting contours.

mod hierarchy;
pub mod tracer;

pub use tracer::ContourTracer;

use tracewerk_core::ContourSet;
use tracing::debug;

/// Drop contours whose absolute area is at or below `max_area` (px²).
///
/// Holes of a dropped shape are smaller than the shape, so they go with it.
/// `max_area <= 0` keeps everything.
pub fn remove_speckles(contours: ContourSet, max_area: f64) -> ContourSet {
    if max_area <= 0.0 {
        return contours;
    }
    let before = contours.len();
    let kept = contours.retain(|contour| contour.area() > max_area);
    debug!(
        removed = before - kept.len(),
        kept = kept.len(),
        max_area,
        "Speckles removed"
    );
    kept
}
