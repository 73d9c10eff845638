// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Curve fitting — turns lattice contours into closed outlines of straight
// lines and cubic Bézier curves.
//
// Pipeline per contour:
//   1. Expand turn vertices into unit steps.
//   2. Douglas-Peucker simplification (falls back to the raw polygon for
//      features too small to survive it).
//   3. Vertices turning more sharply than `corner_angle` become corners.
//   4. Runs between adjacent corners are either a single Line or one or more
//      cubic Curves, split recursively until each lies within
//      `fit_tolerance` of its polygon vertices.

pub mod bezier;
pub mod simplify;

use tracewerk_core::{Contour, ContourSet, ConversionConfig, Point, VectorPath};
use tracing::{debug, instrument};

use self::bezier::{fit_cubic, max_deviation};
use self::simplify::{expand_unit_steps, simplify_closed};

/// Recursion cap for curve splitting. Runs shrink at every split, so this is
/// only reached on pathological input.
const MAX_SPLIT_DEPTH: u32 = 24;

/// Tuning for [`CurveFitter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Douglas-Peucker tolerance in pixels.
    pub simplify_epsilon: f64,
    /// Turn angle in radians above which a vertex is a corner.
    pub corner_angle: f64,
    /// Maximum distance from a curve to the vertices it replaces, in pixels.
    pub fit_tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            simplify_epsilon: 1.0,
            corner_angle: 1.0,
            fit_tolerance: 0.5,
        }
    }
}

impl FitOptions {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            simplify_epsilon: config.simplify_epsilon,
            corner_angle: config.corner_angle,
            fit_tolerance: config.fit_tolerance,
        }
    }
}

/// Fits contours to mixed line/curve outlines.
#[derive(Debug, Clone, Default)]
pub struct CurveFitter {
    options: FitOptions,
}

impl CurveFitter {
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Fit every contour in the set, in set order. Degenerate contours are
    /// skipped.
    #[instrument(skip_all, fields(contours = contours.len()))]
    pub fn fit_all(&self, contours: &ContourSet) -> Vec<VectorPath> {
        let paths: Vec<VectorPath> = contours.iter().filter_map(|c| self.fit(c)).collect();
        let (lines, curves) = paths.iter().fold((0, 0), |(l, c), p| {
            (l + p.line_count(), c + p.curve_count())
        });
        debug!(paths = paths.len(), lines, curves, "Contours fitted");
        paths
    }

    /// Fit one contour. Returns `None` when it has fewer than three distinct
    /// vertices.
    ///
    /// The outline keeps the contour's orientation and starts at its first
    /// corner (or the first simplified vertex when there are none).
    pub fn fit(&self, contour: &Contour) -> Option<VectorPath> {
        if contour.distinct_points() < 3 {
            debug!(contour = %contour.id, "Degenerate contour skipped");
            return None;
        }

        let unit = expand_unit_steps(&contour.points);
        let mut polygon = simplify_closed(&unit, self.options.simplify_epsilon);
        if polygon.len() < 3 {
            polygon = contour.points.iter().map(|p| p.to_point()).collect();
        }

        let m = polygon.len();
        let corners: Vec<usize> = (0..m)
            .filter(|&i| {
                turn_angle(polygon[(i + m - 1) % m], polygon[i], polygon[(i + 1) % m])
                    > self.options.corner_angle
            })
            .collect();

        if corners.is_empty() {
            // Smooth loop: two curve runs split at opposite vertices.
            let split = m / 2;
            let mut path = VectorPath::new(polygon[0], contour.orientation);
            self.fit_run(&cyclic_run(&polygon, 0, split), &mut path);
            self.fit_run(&cyclic_run(&polygon, split, m), &mut path);
            return Some(path);
        }

        let mut path = VectorPath::new(polygon[corners[0]], contour.orientation);
        for (k, &from) in corners.iter().enumerate() {
            let next = corners[(k + 1) % corners.len()];
            let to = if next > from { next } else { next + m };
            let run = cyclic_run(&polygon, from, to);
            if run.len() == 2 {
                path.line_to(run[1]);
            } else {
                self.fit_run(&run, &mut path);
            }
        }
        Some(path)
    }

    /// Append curves covering `run` to `path`, tangent to the run's first and
    /// last edges.
    fn fit_run(&self, run: &[Point], path: &mut VectorPath) {
        let start_tangent = end_direction(run[1], run[0]);
        let end_tangent = end_direction(run[run.len() - 1], run[run.len() - 2]);
        self.fit_segment(run, start_tangent, end_tangent, path, 0);
    }

    fn fit_segment(
        &self,
        run: &[Point],
        start_tangent: Point,
        end_tangent: Point,
        path: &mut VectorPath,
        depth: u32,
    ) {
        let first = run[0];
        let last = run[run.len() - 1];

        // A run that closes on itself has no chord to fit against.
        let closed = run.len() > 2 && first.distance(last) <= f64::EPSILON;
        let at = if closed {
            run.len() / 2
        } else {
            let (c1, c2) = fit_cubic(run, start_tangent, end_tangent);
            let (error, worst) = max_deviation(run, first, c1, c2, last);
            if error <= self.options.fit_tolerance || run.len() <= 2 || depth >= MAX_SPLIT_DEPTH {
                path.curve_to(c1, c2, last);
                return;
            }
            worst
        };

        let tangent = (run[at + 1] - run[at - 1]).normalized().unwrap_or(start_tangent);
        self.fit_segment(&run[..=at], start_tangent, tangent, path, depth + 1);
        self.fit_segment(&run[at..], tangent, end_tangent, path, depth + 1);
    }
}

/// Absolute turn angle at `b` when travelling `a` -> `b` -> `c`, in radians.
fn turn_angle(a: Point, b: Point, c: Point) -> f64 {
    let incoming = b - a;
    let outgoing = c - b;
    incoming.cross(outgoing).atan2(incoming.dot(outgoing)).abs()
}

/// Unit direction from `from` to `to`, or zero when they coincide.
fn end_direction(to: Point, from: Point) -> Point {
    (to - from).normalized().unwrap_or_default()
}

/// `polygon[from..=to]` with indices taken modulo the polygon length.
fn cyclic_run(polygon: &[Point], from: usize, to: usize) -> Vec<Point> {
    let m = polygon.len();
    (from..=to).map(|i| polygon[i % m]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::ContourTracer;
    use tracewerk_core::{BinaryBitmap, ContourId, LatticePoint, Orientation, PathSegment};

    fn trace(bitmap: &BinaryBitmap) -> ContourSet {
        ContourTracer::default().trace(bitmap).expect("trace")
    }

    fn disc(size: u32, cx: f64, cy: f64, r: f64) -> BinaryBitmap {
        BinaryBitmap::from_fn(size, size, |x, y| {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            dx * dx + dy * dy <= r * r
        })
    }

    /// Axis-aligned squares are four straight lines with exact area.
    #[test]
    fn square_fits_to_four_lines() {
        let bitmap = BinaryBitmap::from_fn(20, 20, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
        let contours = trace(&bitmap);
        let path = CurveFitter::default().fit(&contours.as_slice()[0]).expect("path");

        assert_eq!(path.segments.len(), 4);
        assert_eq!(path.line_count(), 4);
        assert_eq!(path.curve_count(), 0);
        assert_eq!(path.signed_area().abs(), 100.0);
        assert_eq!(path.orientation, Orientation::Outer);
    }

    #[test]
    fn hole_keeps_its_orientation() {
        let bitmap = BinaryBitmap::from_fn(30, 30, |x, y| {
            let outer = (2..28).contains(&x) && (2..28).contains(&y);
            let hole = (10..20).contains(&x) && (10..20).contains(&y);
            outer && !hole
        });
        let paths = CurveFitter::default().fit_all(&trace(&bitmap));
        assert_eq!(paths.len(), 2);
        let hole = paths
            .iter()
            .find(|p| p.orientation == Orientation::Hole)
            .expect("hole path");
        assert!(hole.signed_area() < 0.0);
        assert_eq!(hole.signed_area(), -100.0);
    }

    #[test]
    fn single_pixel_survives_as_a_square() {
        let bitmap = BinaryBitmap::from_fn(3, 3, |x, y| x == 1 && y == 1);
        let paths = CurveFitter::default().fit_all(&trace(&bitmap));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].line_count(), 4);
        assert_eq!(paths[0].signed_area(), 1.0);
    }

    #[test]
    fn disc_uses_curves_and_keeps_its_area() {
        let bitmap = disc(64, 32.0, 32.0, 20.0);
        let contours = trace(&bitmap);
        let contour = &contours.as_slice()[0];
        let path = CurveFitter::default().fit(contour).expect("path");

        assert!(path.curve_count() >= 2, "curves: {}", path.curve_count());
        let drift = (path.signed_area() - contour.area()).abs() / contour.area();
        assert!(drift < 0.06, "area drift {drift}");
    }

    /// Every simplified vertex lies within the fit tolerance of the outline.
    #[test]
    fn disc_outline_stays_within_tolerance() {
        let options = FitOptions::default();
        let bitmap = disc(64, 32.0, 32.0, 20.0);
        let contours = trace(&bitmap);
        let contour = &contours.as_slice()[0];
        let path = CurveFitter::new(options).fit(contour).expect("path");

        let polygon = simplify_closed(&expand_unit_steps(&contour.points), options.simplify_epsilon);
        let mut outline = path.flatten(bezier::DEVIATION_SAMPLES);
        outline.push(path.start);
        for vertex in polygon {
            let d = outline
                .windows(2)
                .map(|w| simplify::segment_distance(vertex, w[0], w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(d <= options.fit_tolerance + 1e-6, "vertex {vertex:?} off by {d}");
        }
    }

    #[test]
    fn fitting_is_deterministic() {
        let bitmap = BinaryBitmap::from_fn(48, 48, |x, y| {
            let dx = x as f64 - 20.0;
            let dy = y as f64 - 26.0;
            dx * dx / 300.0 + dy * dy / 120.0 <= 1.0 || ((30..44).contains(&x) && (4..12).contains(&y))
        });
        let contours = trace(&bitmap);
        let fitter = CurveFitter::default();
        assert_eq!(fitter.fit_all(&contours), fitter.fit_all(&contours));
    }

    #[test]
    fn degenerate_contour_is_skipped() {
        let contour = Contour {
            id: ContourId(0),
            points: vec![
                LatticePoint::new(0, 0),
                LatticePoint::new(4, 0),
            ],
            orientation: Orientation::Outer,
            parent: None,
        };
        assert!(CurveFitter::default().fit(&contour).is_none());
    }

    #[test]
    fn every_path_closes_on_its_start() {
        let bitmap = disc(40, 20.0, 20.0, 12.0);
        for path in CurveFitter::default().fit_all(&trace(&bitmap)) {
            let last = path.segments.last().map(PathSegment::end).expect("segments");
            assert!(last.distance(path.start) < 1e-9);
        }
    }

    #[test]
    fn turn_angle_measures_deflection() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert!(turn_angle(a, b, Point::new(2.0, 0.0)).abs() < 1e-12);
        let right = turn_angle(a, b, Point::new(1.0, 1.0));
        assert!((right - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn options_follow_config() {
        let config = ConversionConfig {
            fit_tolerance: 0.25,
            ..ConversionConfig::default()
        };
        assert_eq!(FitOptions::from_config(&config).fit_tolerance, 0.25);
    }
}
