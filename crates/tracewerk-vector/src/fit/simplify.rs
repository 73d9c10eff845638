// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon preparation: unit-step expansion of lattice contours and
// Douglas-Peucker simplification of closed polylines.

use tracewerk_core::{LatticePoint, Point};

/// Every lattice point along the boundary, one unit step apart. The closing
/// step back to the first point is implied.
pub fn expand_unit_steps(points: &[LatticePoint]) -> Vec<Point> {
    let n = points.len();
    let mut out = Vec::new();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let (dx, dy) = ((b.x - a.x).signum(), (b.y - a.y).signum());
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs());
        for s in 0..steps {
            out.push(Point::new((a.x + dx * s) as f64, (a.y + dy * s) as f64));
        }
        if steps == 0 {
            out.push(a.to_point());
        }
    }
    out
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Douglas-Peucker on a closed polyline.
///
/// The loop is cut at the first point and at the point farthest from it; both
/// halves are simplified as open polylines. The first point is always kept.
pub fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 4 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let anchor = points[0];
    let mut far = 0;
    let mut far_dist = 0.0;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(anchor);
        if d > far_dist {
            far_dist = d;
            far = i;
        }
    }
    if far == 0 {
        return vec![anchor];
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[far] = true;

    mark_open(&points[..=far], epsilon, &mut keep[..=far]);

    let second: Vec<Point> = points[far..].iter().copied().chain(std::iter::once(anchor)).collect();
    let mut second_keep = vec![false; second.len()];
    mark_open(&second, epsilon, &mut second_keep);
    for (offset, kept) in second_keep.iter().enumerate().take(second.len() - 1) {
        if *kept {
            keep[far + offset] = true;
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(p, _)| *p)
        .collect()
}

/// Mark the points of an open polyline that survive simplification.
/// Endpoints are always marked.
fn mark_open(points: &[Point], epsilon: f64, keep: &mut [bool]) {
    let n = points.len();
    if n == 0 {
        return;
    }
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let mut worst = first;
        let mut worst_dist = 0.0;
        for (i, p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = segment_distance(*p, a, b);
            if d > worst_dist {
                worst_dist = d;
                worst = i;
            }
        }
        if worst_dist > epsilon {
            keep[worst] = true;
            stack.push((first, worst));
            stack.push((worst, last));
        }
    }
}
