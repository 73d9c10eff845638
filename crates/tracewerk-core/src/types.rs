// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the raster to vector pipeline: the binary bitmap,
// traced contours, fitted paths and the vector document.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracewerkError};

// -- Binary bitmap ------------------------------------------------------------

/// Two-class raster produced by the preprocessor. `true` is foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBitmap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl BinaryBitmap {
    /// Wrap a row-major cell buffer. The buffer length must equal
    /// `width * height`.
    pub fn new(width: u32, height: u32, cells: Vec<bool>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(TracewerkError::InvalidParameter(format!(
                "bitmap of {width}x{height} needs {expected} cells, got {}",
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// All-background bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Build a bitmap by asking `f(x, y)` for every cell.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major cells.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Foreground test that treats everything outside the canvas as background.
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Swap foreground and background in place.
    pub fn invert(&mut self) {
        for cell in &mut self.cells {
            *cell = !*cell;
        }
    }

    pub fn foreground_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }
}

// -- Geometry -----------------------------------------------------------------

/// Integer pixel-corner coordinate. `(0, 0)` is the top-left corner of the
/// top-left pixel; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LatticePoint {
    pub x: i32,
    pub y: i32,
}

impl LatticePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Floating-point 2-D coordinate in the same frame as [`LatticePoint`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3-D cross product.
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        if len <= f64::EPSILON {
            None
        } else {
            Some(Point::new(self.x / len, self.y / len))
        }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Evaluate a cubic Bézier at parameter `t` in `[0, 1]`.
pub fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    )
}

/// Shoelace area of a closed polygon. Positive when the vertices run
/// clockwise on screen (y down).
pub fn polygon_signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| points[i].cross(points[(i + 1) % n]))
        .sum::<f64>()
        / 2.0
}

/// Crossing-number (even-odd) test against one closed polygon.
pub fn point_in_polygon(points: &[Point], probe: Point) -> bool {
    let n = points.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > probe.y) != (b.y > probe.y) {
            let x_at = (b.x - a.x) * (probe.y - a.y) / (b.y - a.y) + a.x;
            if probe.x < x_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// -- Contours -----------------------------------------------------------------

/// Winding convention of a traced boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Boundary of a foreground region (clockwise on screen).
    Outer,
    /// Boundary of a background hole inside a foreground region.
    Hole,
}

/// Index of a contour inside its [`ContourSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContourId(pub usize);

impl std::fmt::Display for ContourId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A closed boundary polygon on the pixel-corner lattice.
///
/// `points` holds only direction changes; the edge from the last point back to
/// the first is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub id: ContourId,
    pub points: Vec<LatticePoint>,
    pub orientation: Orientation,
    /// Innermost enclosing contour, if any.
    pub parent: Option<ContourId>,
}

impl Contour {
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice as f64 / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Number of distinct lattice points.
    pub fn distinct_points(&self) -> usize {
        let mut points = self.points.clone();
        points.sort_by_key(|p| (p.y, p.x));
        points.dedup();
        points.len()
    }
}

/// Arena of contours. Parents are stored as indices, children are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    contours: Vec<Contour>,
}

impl ContourSet {
    /// Wrap contours whose `id` matches their position.
    pub fn new(contours: Vec<Contour>) -> Result<Self> {
        for (index, contour) in contours.iter().enumerate() {
            if contour.id.0 != index {
                return Err(TracewerkError::TraceInternal(format!(
                    "contour at index {index} carries id {}",
                    contour.id
                )));
            }
            if let Some(parent) = contour.parent {
                if parent.0 >= contours.len() || parent == contour.id {
                    return Err(TracewerkError::TraceInternal(format!(
                        "contour {} has invalid parent {parent}",
                        contour.id
                    )));
                }
            }
        }
        Ok(Self { contours })
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    pub fn get(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(id.0)
    }

    pub fn as_slice(&self) -> &[Contour] {
        &self.contours
    }

    /// Contours whose parent is `id`.
    pub fn children(&self, id: ContourId) -> impl Iterator<Item = &Contour> + '_ {
        self.contours.iter().filter(move |c| c.parent == Some(id))
    }

    /// Contours not enclosed by any other contour.
    pub fn roots(&self) -> impl Iterator<Item = &Contour> + '_ {
        self.contours.iter().filter(|c| c.parent.is_none())
    }

    pub fn count(&self, orientation: Orientation) -> usize {
        self.contours
            .iter()
            .filter(|c| c.orientation == orientation)
            .count()
    }

    /// Keep only contours for which `keep` returns true. Ids are re-packed and
    /// a kept contour whose parent was removed inherits the nearest kept
    /// ancestor.
    pub fn retain(self, mut keep: impl FnMut(&Contour) -> bool) -> Self {
        let flags: Vec<bool> = self.contours.iter().map(&mut keep).collect();
        let mut remap = vec![None; self.contours.len()];
        let mut next = 0;
        for (index, &kept) in flags.iter().enumerate() {
            if kept {
                remap[index] = Some(ContourId(next));
                next += 1;
            }
        }

        let nearest_kept = |mut parent: Option<ContourId>| {
            // Parents always point outward, so the walk terminates.
            while let Some(id) = parent {
                if let Some(mapped) = remap[id.0] {
                    return Some(mapped);
                }
                parent = self.contours[id.0].parent;
            }
            None
        };

        let contours = self
            .contours
            .iter()
            .zip(&flags)
            .filter(|(_, kept)| **kept)
            .enumerate()
            .map(|(index, (contour, _))| Contour {
                id: ContourId(index),
                points: contour.points.clone(),
                orientation: contour.orientation,
                parent: nearest_kept(contour.parent),
            })
            .collect();
        Self { contours }
    }
}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a Contour;
    type IntoIter = std::slice::Iter<'a, Contour>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

// -- Fitted paths -------------------------------------------------------------

/// One piece of a fitted outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    Line {
        end: Point,
    },
    Curve {
        control1: Point,
        control2: Point,
        end: Point,
    },
}

impl PathSegment {
    pub fn end(&self) -> Point {
        match *self {
            Self::Line { end } | Self::Curve { end, .. } => end,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line { .. })
    }
}

/// A closed outline made of lines and cubic curves, one per fitted contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    pub start: Point,
    pub segments: Vec<PathSegment>,
    pub orientation: Orientation,
}

impl VectorPath {
    pub fn new(start: Point, orientation: Orientation) -> Self {
        Self {
            start,
            segments: Vec::new(),
            orientation,
        }
    }

    pub fn line_to(&mut self, end: Point) {
        self.segments.push(PathSegment::Line { end });
    }

    pub fn curve_to(&mut self, control1: Point, control2: Point, end: Point) {
        self.segments.push(PathSegment::Curve {
            control1,
            control2,
            end,
        });
    }

    pub fn line_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_line()).count()
    }

    pub fn curve_count(&self) -> usize {
        self.segments.len() - self.line_count()
    }

    /// Polyline approximation; every curve is sampled at `steps` intervals.
    /// The closing edge back to `start` is implied.
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut points = vec![self.start];
        let mut current = self.start;
        for segment in &self.segments {
            match *segment {
                PathSegment::Line { end } => points.push(end),
                PathSegment::Curve {
                    control1,
                    control2,
                    end,
                } => {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        points.push(cubic_point(current, control1, control2, end, t));
                    }
                }
            }
            current = segment.end();
        }
        if points.len() > 1 && points.last() == Some(&self.start) {
            points.pop();
        }
        points
    }

    pub fn signed_area(&self) -> f64 {
        polygon_signed_area(&self.flatten(32))
    }
}

/// The complete vector output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub width: u32,
    pub height: u32,
    pub paths: Vec<VectorPath>,
    pub background: String,
    pub foreground: String,
    /// Optional human-readable title, usually the source file stem.
    pub title: Option<String>,
}

impl VectorDocument {
    /// Whether `probe` is painted with the foreground under the even-odd rule.
    pub fn covers(&self, probe: Point) -> bool {
        self.paths
            .iter()
            .filter(|path| point_in_polygon(&path.flatten(32), probe))
            .count()
            % 2
            == 1
    }
}
