// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour tracer — follows foreground/background boundaries along pixel edges.
//
// Every foreground pixel side that faces background (or the canvas border)
// becomes a directed unit edge on the (width+1) x (height+1) corner lattice,
// oriented clockwise around the foreground. Each vertex then has as many
// outgoing edges as incoming ones, so following edges always closes a loop.
// Saddle vertices (two diagonal foreground pixels) have two ways out; the
// `TurnPolicy` picks one.

use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::{BinaryBitmap, Contour, ContourId, ContourSet, LatticePoint, Orientation, TurnPolicy};
use tracing::{debug, info, instrument};

use super::hierarchy::{EdgeOwners, assign_parents};

/// Lattice directions, clockwise on screen (y down).
const EAST: u8 = 0;
const SOUTH: u8 = 1;
const WEST: u8 = 2;
const NORTH: u8 = 3;

const DELTAS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Boundary tracer for `BinaryBitmap`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourTracer {
    policy: TurnPolicy,
}

/// Directed unit edges, one bitmask of outgoing directions per lattice vertex.
struct EdgeGrid {
    stride: usize,
    outgoing: Vec<u8>,
    total: usize,
}

impl EdgeGrid {
    fn build(bitmap: &BinaryBitmap) -> Self {
        let (w, h) = (bitmap.width() as usize, bitmap.height() as usize);
        let stride = w + 1;
        let mut outgoing = vec![0u8; stride * (h + 1)];
        let mut total = 0;

        for y in 0..h as i64 {
            for x in 0..w as i64 {
                if !bitmap.is_foreground(x, y) {
                    continue;
                }
                let (ux, uy) = (x as usize, y as usize);
                let mut add = |vx: usize, vy: usize, dir: u8| {
                    outgoing[vy * stride + vx] |= 1 << dir;
                    total += 1;
                };
                if !bitmap.is_foreground(x, y - 1) {
                    add(ux, uy, EAST);
                }
                if !bitmap.is_foreground(x + 1, y) {
                    add(ux + 1, uy, SOUTH);
                }
                if !bitmap.is_foreground(x, y + 1) {
                    add(ux + 1, uy + 1, WEST);
                }
                if !bitmap.is_foreground(x - 1, y) {
                    add(ux, uy + 1, NORTH);
                }
            }
        }

        Self {
            stride,
            outgoing,
            total,
        }
    }

    fn has(&self, vertex: usize, dir: u8) -> bool {
        self.outgoing[vertex] & (1 << dir) != 0
    }

    fn step(&self, vertex: usize, dir: u8) -> usize {
        let (dx, dy) = DELTAS[dir as usize];
        let x = (vertex % self.stride) as i64 + dx;
        let y = (vertex / self.stride) as i64 + dy;
        y as usize * self.stride + x as usize
    }

    fn point(&self, vertex: usize) -> LatticePoint {
        LatticePoint::new((vertex % self.stride) as i32, (vertex / self.stride) as i32)
    }
}

impl ContourTracer {
    pub fn new(policy: TurnPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// Trace every boundary of `bitmap` and link holes to their shapes.
    ///
    /// Contours come out in the raster order of their first edge. An empty
    /// bitmap yields an empty set.
    #[instrument(skip_all, fields(width = bitmap.width(), height = bitmap.height(), policy = ?self.policy))]
    pub fn trace(&self, bitmap: &BinaryBitmap) -> Result<ContourSet> {
        let expected = bitmap.width() as usize * bitmap.height() as usize;
        if bitmap.cells().len() != expected {
            return Err(TracewerkError::TraceInternal(format!(
                "bitmap holds {} cells for {}x{}",
                bitmap.cells().len(),
                bitmap.width(),
                bitmap.height()
            )));
        }

        let grid = EdgeGrid::build(bitmap);
        debug!(edges = grid.total, "Boundary edges collected");

        let mut visited = vec![0u8; grid.outgoing.len()];
        let mut owners = EdgeOwners::new(bitmap.width(), bitmap.height());
        let mut contours = Vec::new();
        let mut starts = Vec::new();

        for vertex in 0..grid.outgoing.len() {
            for dir in [EAST, SOUTH, WEST, NORTH] {
                if !grid.has(vertex, dir) || visited[vertex] & (1 << dir) != 0 {
                    continue;
                }
                let id = ContourId(contours.len());
                let points = self.follow(&grid, &mut visited, &mut owners, id, vertex, dir)?;
                let mut contour = Contour {
                    id,
                    points,
                    orientation: Orientation::Outer,
                    parent: None,
                };
                if contour.signed_area() < 0.0 {
                    contour.orientation = Orientation::Hole;
                }
                contours.push(contour);
                starts.push(grid.point(vertex));
            }
        }

        assign_parents(&mut contours, &starts, &owners, bitmap);
        let set = ContourSet::new(contours)?;
        info!(
            contours = set.len(),
            outer = set.count(Orientation::Outer),
            holes = set.count(Orientation::Hole),
            "Tracing complete"
        );
        Ok(set)
    }

    /// Walk one loop starting with edge (`start`, `start_dir`), mark its
    /// vertical edges as owned by `id` and return its turning points.
    fn follow(
        &self,
        grid: &EdgeGrid,
        visited: &mut [u8],
        owners: &mut EdgeOwners,
        id: ContourId,
        start: usize,
        start_dir: u8,
    ) -> Result<Vec<LatticePoint>> {
        let mut steps: Vec<(usize, u8)> = Vec::new();
        let (mut vertex, mut dir) = (start, start_dir);

        loop {
            if steps.len() > grid.total {
                return Err(TracewerkError::TraceInternal(format!(
                    "boundary starting at {:?} did not close",
                    grid.point(start)
                )));
            }
            visited[vertex] |= 1 << dir;
            steps.push((vertex, dir));
            let (x, y) = (vertex % grid.stride, vertex / grid.stride);
            match dir {
                SOUTH => owners.claim(x, y, id.0)?,
                NORTH => owners.claim(x, y - 1, id.0)?,
                _ => {}
            }

            let next = grid.step(vertex, dir);
            let next_dir = self.choose(grid, next, dir).ok_or_else(|| {
                TracewerkError::TraceInternal(format!(
                    "dead end at {:?} heading {dir}",
                    grid.point(next)
                ))
            })?;
            if next == start && next_dir == start_dir {
                break;
            }
            vertex = next;
            dir = next_dir;
        }

        // Keep only the vertices where the heading changes, starting from the
        // first such vertex along the walk.
        let n = steps.len();
        let turns: Vec<LatticePoint> = (0..n)
            .filter(|&i| steps[(i + n - 1) % n].1 != steps[i].1)
            .map(|i| grid.point(steps[i].0))
            .collect();
        Ok(turns)
    }

    /// Pick the outgoing direction at `vertex` after arriving with `heading`.
    fn choose(&self, grid: &EdgeGrid, vertex: usize, heading: u8) -> Option<u8> {
        let right = (heading + 1) % 4;
        let left = (heading + 3) % 4;
        let order = match self.policy {
            TurnPolicy::Right => [right, heading, left],
            TurnPolicy::Left => [left, heading, right],
        };
        order.into_iter().find(|&dir| grid.has(vertex, dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_from_rows(rows: &[&str]) -> BinaryBitmap {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        BinaryBitmap::from_fn(width, height, |x, y| {
            rows[y as usize].as_bytes()[x as usize] == b'#'
        })
    }

    fn filled_square(canvas: u32, offset: u32, side: u32) -> BinaryBitmap {
        BinaryBitmap::from_fn(canvas, canvas, |x, y| {
            (offset..offset + side).contains(&x) && (offset..offset + side).contains(&y)
        })
    }

    #[test]
    fn empty_bitmap_has_no_contours() {
        let set = ContourTracer::default()
            .trace(&BinaryBitmap::blank(8, 8))
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn zero_sized_bitmap_has_no_contours() {
        let set = ContourTracer::default()
            .trace(&BinaryBitmap::blank(0, 0))
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn isolated_pixel_is_unit_square() {
        let bitmap = bitmap_from_rows(&["...", ".#.", "..."]);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        assert_eq!(set.len(), 1);
        let contour = &set.as_slice()[0];
        assert_eq!(
            contour.points,
            vec![
                LatticePoint::new(1, 1),
                LatticePoint::new(2, 1),
                LatticePoint::new(2, 2),
                LatticePoint::new(1, 2),
            ]
        );
        assert_eq!(contour.orientation, Orientation::Outer);
        assert_eq!(contour.area(), 1.0);
    }

    #[test]
    fn solid_square_is_one_four_corner_contour() {
        for side in [2u32, 3, 10] {
            let set = ContourTracer::default()
                .trace(&filled_square(side + 4, 2, side))
                .unwrap();
            assert_eq!(set.len(), 1);
            let contour = &set.as_slice()[0];
            assert_eq!(contour.points.len(), 4);
            assert_eq!(contour.orientation, Orientation::Outer);
            assert_eq!(contour.signed_area(), (side * side) as f64);
            assert_eq!(contour.parent, None);
        }
    }

    #[test]
    fn square_touching_canvas_edges_is_traced() {
        let set = ContourTracer::default()
            .trace(&BinaryBitmap::from_fn(5, 5, |_, _| true))
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].area(), 25.0);
    }

    #[test]
    fn square_with_hole_links_hole_to_outer() {
        // 10x10 block with a 4x4 hole in the middle.
        let bitmap = BinaryBitmap::from_fn(14, 14, |x, y| {
            let in_block = (2..12).contains(&x) && (2..12).contains(&y);
            let in_hole = (5..9).contains(&x) && (5..9).contains(&y);
            in_block && !in_hole
        });
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        assert_eq!(set.len(), 2);

        let outer = set
            .iter()
            .find(|c| c.orientation == Orientation::Outer)
            .unwrap();
        let hole = set
            .iter()
            .find(|c| c.orientation == Orientation::Hole)
            .unwrap();
        assert_eq!(outer.area(), 100.0);
        assert_eq!(hole.area(), 16.0);
        assert_eq!(hole.signed_area(), -16.0);
        assert_eq!(hole.parent, Some(outer.id));
        assert_eq!(outer.parent, None);
        assert_eq!(set.children(outer.id).count(), 1);
    }

    #[test]
    fn island_inside_hole_is_nested_twice() {
        let bitmap = bitmap_from_rows(&[
            ".........",
            ".#######.",
            ".#.....#.",
            ".#.###.#.",
            ".#.###.#.",
            ".#.###.#.",
            ".#.....#.",
            ".#######.",
            ".........",
        ]);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.count(Orientation::Outer), 2);
        assert_eq!(set.count(Orientation::Hole), 1);

        let island = set
            .iter()
            .find(|c| c.orientation == Orientation::Outer && c.area() == 9.0)
            .unwrap();
        let hole = set.get(island.parent.unwrap()).unwrap();
        assert_eq!(hole.orientation, Orientation::Hole);
        let ring = set.get(hole.parent.unwrap()).unwrap();
        assert_eq!(ring.orientation, Orientation::Outer);
        assert_eq!(ring.parent, None);
        assert_eq!(set.roots().count(), 1);
    }

    #[test]
    fn turn_policy_decides_diagonal_connectivity() {
        let bitmap = bitmap_from_rows(&["....", ".#..", "..#.", "...."]);

        let joined = ContourTracer::new(TurnPolicy::Left).trace(&bitmap).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.as_slice()[0].area(), 2.0);

        let separate = ContourTracer::new(TurnPolicy::Right).trace(&bitmap).unwrap();
        assert_eq!(separate.len(), 2);
        assert!(separate.iter().all(|c| c.area() == 1.0));
    }

    #[test]
    fn diagonal_hole_depends_on_policy() {
        // A ring whose hole is two background pixels touching diagonally.
        let bitmap = bitmap_from_rows(&["####", "#.##", "##.#", "####"]);

        let left = ContourTracer::new(TurnPolicy::Left).trace(&bitmap).unwrap();
        assert_eq!(left.count(Orientation::Hole), 2);

        let right = ContourTracer::new(TurnPolicy::Right).trace(&bitmap).unwrap();
        assert_eq!(right.count(Orientation::Hole), 1);
        assert_eq!(right.iter().find(|c| c.orientation == Orientation::Hole).unwrap().area(), 2.0);
    }

    #[test]
    fn every_edge_lands_in_exactly_one_contour() {
        let bitmap = bitmap_from_rows(&[
            "##..#",
            "#.#.#",
            ".###.",
            "#..##",
        ]);
        let grid = EdgeGrid::build(&bitmap);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        let perimeter: f64 = set
            .iter()
            .map(|c| {
                let n = c.points.len();
                (0..n)
                    .map(|i| {
                        let a = c.points[i];
                        let b = c.points[(i + 1) % n];
                        ((b.x - a.x).abs() + (b.y - a.y).abs()) as f64
                    })
                    .sum::<f64>()
            })
            .sum();
        assert_eq!(perimeter as usize, grid.total);

        let area: f64 = set.iter().map(|c| c.signed_area()).sum();
        assert_eq!(area as usize, bitmap.foreground_count());
    }

    /// Forty thousand dots inside one frame: every dot hangs off the frame's
    /// hole, and tracing stays fast.
    #[test]
    fn many_contours_resolve_parents_quickly() {
        let bitmap = BinaryBitmap::from_fn(404, 404, |x, y| {
            let frame = x == 0 || y == 0 || x == 403 || y == 403;
            let dot = (2..402).contains(&x) && (2..402).contains(&y) && x % 2 == 0 && y % 2 == 0;
            frame || dot
        });

        let started = std::time::Instant::now();
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(set.len(), 40_002);
        let hole = set
            .iter()
            .find(|c| c.orientation == Orientation::Hole)
            .unwrap();
        assert_eq!(set.children(hole.id).count(), 40_000);
        assert_eq!(set.roots().count(), 1);
        assert!(elapsed.as_secs() < 5, "tracing took {elapsed:?}");
    }
}
