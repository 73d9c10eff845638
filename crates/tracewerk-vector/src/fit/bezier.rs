// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Least-squares fitting of one cubic Bézier to an ordered run of points with
// fixed end tangents, and the deviation measure used to accept a fit.

use tracewerk_core::{Point, cubic_point};

use super::simplify::segment_distance;

/// Samples per curve when measuring deviation. Matches the flattening used
/// for area checks so both see the same polyline.
pub const DEVIATION_SAMPLES: usize = 32;

/// Fit control points for a cubic from `points[0]` to `points[last]`.
///
/// `start_tangent` is the unit direction of travel leaving the first point and
/// `end_tangent` the unit direction arriving at the last. Only the handle
/// lengths are solved for; when the system is singular or yields a
/// non-positive handle both fall back to a third of the chord.
pub fn fit_cubic(points: &[Point], start_tangent: Point, end_tangent: Point) -> (Point, Point) {
    let p0 = points[0];
    let p3 = points[points.len() - 1];
    let chord = p0.distance(p3);
    let params = chord_length_params(points);

    let (mut c11, mut c12, mut c22, mut x1, mut x2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (p, &u) in points.iter().zip(&params) {
        let mu = 1.0 - u;
        let b0 = mu * mu * mu;
        let b1 = 3.0 * mu * mu * u;
        let b2 = 3.0 * mu * u * u;
        let b3 = u * u * u;

        let a1 = start_tangent * b1;
        let a2 = end_tangent * -b2;
        let base = p0 * (b0 + b1) + p3 * (b2 + b3);
        let residual = *p - base;

        c11 += a1.dot(a1);
        c12 += a1.dot(a2);
        c22 += a2.dot(a2);
        x1 += a1.dot(residual);
        x2 += a2.dot(residual);
    }

    let det = c11 * c22 - c12 * c12;
    let fallback = chord / 3.0;
    let (mut alpha1, mut alpha2) = if det.abs() > 1e-12 {
        ((x1 * c22 - c12 * x2) / det, (c11 * x2 - c12 * x1) / det)
    } else {
        (fallback, fallback)
    };

    let floor = 1e-6 * chord;
    if !alpha1.is_finite() || !alpha2.is_finite() || alpha1 <= floor || alpha2 <= floor {
        alpha1 = fallback;
        alpha2 = fallback;
    }
    // Handles longer than the chord overshoot wildly on short runs.
    alpha1 = alpha1.min(chord);
    alpha2 = alpha2.min(chord);

    (p0 + start_tangent * alpha1, p3 - end_tangent * alpha2)
}

/// Largest distance from an interior point of the run to the sampled curve,
/// with the index of that point. Endpoints lie on the curve by construction.
pub fn max_deviation(points: &[Point], p0: Point, c1: Point, c2: Point, p3: Point) -> (f64, usize) {
    let samples: Vec<Point> = (0..=DEVIATION_SAMPLES)
        .map(|i| cubic_point(p0, c1, c2, p3, i as f64 / DEVIATION_SAMPLES as f64))
        .collect();

    let mut worst = (0.0, 0);
    for (index, p) in points.iter().enumerate().skip(1).take(points.len().saturating_sub(2)) {
        let d = samples
            .windows(2)
            .map(|w| segment_distance(*p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min);
        if d > worst.0 {
            worst = (d, index);
        }
    }
    worst
}

/// Normalized cumulative chord length, one parameter per point.
fn chord_length_params(points: &[Point]) -> Vec<f64> {
    let mut params = Vec::with_capacity(points.len());
    let mut total = 0.0;
    params.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        params.push(total);
    }
    if total > 0.0 {
        for u in &mut params {
            *u /= total;
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_run_fits_exactly() {
        let points: Vec<Point> = (0..=6).map(|i| Point::new(i as f64, 0.0)).collect();
        let t = Point::new(1.0, 0.0);
        let (c1, c2) = fit_cubic(&points, t, t);
        assert!(c1.y.abs() < 1e-9 && c2.y.abs() < 1e-9);
        let (err, _) = max_deviation(&points, points[0], c1, c2, points[6]);
        assert!(err < 1e-9);
    }

    #[test]
    fn quarter_arc_fits_within_a_tenth() {
        let r = 20.0;
        let points: Vec<Point> = (0..=12)
            .map(|i| {
                let a = std::f64::consts::FRAC_PI_2 * i as f64 / 12.0;
                Point::new(r * a.cos(), r * a.sin())
            })
            .collect();
        let (c1, c2) = fit_cubic(&points, Point::new(0.0, 1.0), Point::new(-1.0, 0.0));
        let (err, _) = max_deviation(&points, points[0], c1, c2, points[12]);
        assert!(err < 0.1, "deviation {err}");
    }

    #[test]
    fn two_points_use_third_chord_handles() {
        let points = [Point::new(0.0, 0.0), Point::new(9.0, 0.0)];
        let t = Point::new(1.0, 0.0);
        let (c1, c2) = fit_cubic(&points, t, t);
        assert_eq!(c1, Point::new(3.0, 0.0));
        assert_eq!(c2, Point::new(6.0, 0.0));
    }

    #[test]
    fn params_span_unit_interval() {
        let params = chord_length_params(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        ]);
        assert_eq!(params, vec![0.0, 1.0 / 3.0, 1.0]);
    }
}
