// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour nesting, resolved in one raster sweep.
//
// Contours are discovered at their top-left vertex in raster order, so when a
// contour starts every vertical boundary edge to its left on that pixel row
// belongs to a contour that was already found. The nearest such edge decides
// the parent: if the cell just right of it lies inside the edge's contour that
// contour is the parent, otherwise the two contours share a parent.

use tracewerk_core::error::{Result, TracewerkError};
use tracewerk_core::{BinaryBitmap, Contour, ContourId, LatticePoint, Orientation};

const UNOWNED: u32 = u32::MAX;

/// Which contour owns each vertical unit edge of the corner lattice. An edge
/// is keyed by its upper vertex.
#[derive(Debug, Clone)]
pub(crate) struct EdgeOwners {
    stride: usize,
    owners: Vec<u32>,
}

impl EdgeOwners {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let stride = width as usize + 1;
        Self {
            stride,
            owners: vec![UNOWNED; stride * (height as usize + 1)],
        }
    }

    /// Record `owner` for the edge from `(x, y)` down to `(x, y + 1)`.
    pub(crate) fn claim(&mut self, x: usize, y: usize, owner: usize) -> Result<()> {
        let owner = u32::try_from(owner)
            .ok()
            .filter(|&owner| owner != UNOWNED)
            .ok_or_else(|| TracewerkError::TraceInternal(format!("contour index {owner} out of range")))?;
        self.owners[y * self.stride + x] = owner;
        Ok(())
    }

    fn owner(&self, x: usize, y: usize) -> Option<usize> {
        match self.owners[y * self.stride + x] {
            UNOWNED => None,
            owner => Some(owner as usize),
        }
    }
}

/// Set `parent` on every contour to the innermost contour enclosing it.
///
/// `starts[i]` is the vertex where contour `i` was discovered; contours must
/// be in discovery (raster) order. Runs in time linear in the canvas size
/// plus the number of contours.
pub(crate) fn assign_parents(
    contours: &mut [Contour],
    starts: &[LatticePoint],
    owners: &EdgeOwners,
    bitmap: &BinaryBitmap,
) {
    let (width, height) = (bitmap.width() as usize, bitmap.height() as usize);
    let mut next = 0;

    for y in 0..height {
        // Nearest vertical edge to the left so far: (owner, x).
        let mut last: Option<(usize, usize)> = None;
        for x in 0..width {
            while next < contours.len() && starts[next] == LatticePoint::new(x as i32, y as i32) {
                let parent = last.and_then(|(owner, edge_x)| {
                    let neighbour = &contours[owner];
                    let foreground = bitmap.is_foreground(edge_x as i64, y as i64);
                    if foreground == (neighbour.orientation == Orientation::Outer) {
                        Some(ContourId(owner))
                    } else {
                        neighbour.parent
                    }
                });
                contours[next].parent = parent;
                next += 1;
            }
            if let Some(owner) = owners.owner(x, y) {
                last = Some((owner, x));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracewerk_core::{BinaryBitmap, ContourSet, Orientation, Point, TurnPolicy, point_in_polygon};

    use crate::trace::ContourTracer;

    fn bitmap_from_rows(rows: &[&str]) -> BinaryBitmap {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        BinaryBitmap::from_fn(width, height, |x, y| {
            rows[y as usize].as_bytes()[x as usize] == b'#'
        })
    }

    /// Every pixel centre is enclosed by a chain of contours ordered by area;
    /// each link of that chain must be a parent link.
    fn assert_parents_follow_containment(set: &ContourSet, bitmap: &BinaryBitmap) {
        let polygons: Vec<Vec<Point>> = set
            .iter()
            .map(|c| c.points.iter().map(|p| p.to_point()).collect())
            .collect();
        for y in 0..bitmap.height() {
            for x in 0..bitmap.width() {
                let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let mut chain: Vec<usize> = (0..set.len())
                    .filter(|&i| point_in_polygon(&polygons[i], centre))
                    .collect();
                chain.sort_by(|&a, &b| set.as_slice()[a].area().total_cmp(&set.as_slice()[b].area()));
                for pair in chain.windows(2) {
                    assert_eq!(
                        set.as_slice()[pair[0]].parent,
                        Some(set.as_slice()[pair[1]].id),
                        "pixel ({x}, {y})"
                    );
                }
                if let Some(&outermost) = chain.last() {
                    assert_eq!(set.as_slice()[outermost].parent, None, "pixel ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn siblings_share_a_parent() {
        let bitmap = bitmap_from_rows(&[
            "###########",
            "#..#####..#",
            "#..#####..#",
            "###########",
        ]);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        assert_eq!(set.len(), 3);
        let outer = set.iter().find(|c| c.orientation == Orientation::Outer).unwrap();
        assert_eq!(outer.parent, None);
        assert_eq!(set.children(outer.id).count(), 2);
    }

    #[test]
    fn disjoint_shapes_are_roots() {
        let bitmap = bitmap_from_rows(&["##...", "##...", "...##", "...##"]);
        let set = ContourTracer::new(TurnPolicy::Right).trace(&bitmap).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|c| c.parent.is_none()));
    }

    #[test]
    fn island_beside_a_ring_is_not_its_child() {
        // The island's row crosses the ring's right side first.
        let bitmap = bitmap_from_rows(&[
            "#####....",
            "#...#....",
            "#...#.##.",
            "#####.##.",
        ]);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        let island = set
            .iter()
            .find(|c| c.orientation == Orientation::Outer && c.area() == 4.0)
            .unwrap();
        assert_eq!(island.parent, None);
        assert_parents_follow_containment(&set, &bitmap);
    }

    #[test]
    fn innermost_container_wins() {
        let bitmap = bitmap_from_rows(&[
            "###########",
            "#.........#",
            "#.#######.#",
            "#.#.....#.#",
            "#.#.###.#.#",
            "#.#.#.#.#.#",
            "#.#.###.#.#",
            "#.#.....#.#",
            "#.#######.#",
            "#.........#",
            "###########",
        ]);
        let set = ContourTracer::default().trace(&bitmap).unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(set.roots().count(), 1);
        assert_parents_follow_containment(&set, &bitmap);
    }

    #[test]
    fn parents_match_containment_on_noise() {
        let mut state: u32 = 0x9e37_79b9;
        let bitmap = BinaryBitmap::from_fn(28, 28, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state % 5 < 2
        });
        for policy in [TurnPolicy::Left, TurnPolicy::Right] {
            let set = ContourTracer::new(policy).trace(&bitmap).unwrap();
            if policy == TurnPolicy::Left {
                assert!(set.count(Orientation::Hole) > 0);
            }
            assert_parents_follow_containment(&set, &bitmap);
        }
    }
}
