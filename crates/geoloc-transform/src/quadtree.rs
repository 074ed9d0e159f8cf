//! Sparse inverse index: a quadtree over the correspondence points.
//!
//! Memory is proportional to the point count rather than the ground extent,
//! which wins when the footprint is large or point density is very uneven.
//! Entries live in a flat arena; nodes hold entry indices.

use tracing::debug;

use crate::config::TransformerConfig;
use crate::error::{GeolocError, Result};
use crate::grid::GeolocationGrid;
use crate::types::GroundBounds;

/// One pixel <-> ground correspondence.
#[derive(Debug, Clone, Copy)]
struct Entry {
    gx: f64,
    gy: f64,
    px: f64,
    py: f64,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Vec<u32>),
    Internal(Box<[Node; 4]>),
}

/// Pick the child quadrant for a point relative to the rectangle center.
/// Points on a center line go to the >= side, so every point belongs to
/// exactly one quadrant.
#[inline]
fn child_of(cx: f64, cy: f64, gx: f64, gy: f64) -> usize {
    (usize::from(gx >= cx)) | (usize::from(gy >= cy) << 1)
}

/// Rectangle of child quadrant `i` of `rect`.
fn child_rect(rect: &GroundBounds, i: usize) -> GroundBounds {
    let cx = (rect.min_x + rect.max_x) / 2.0;
    let cy = (rect.min_y + rect.max_y) / 2.0;
    match i {
        0 => GroundBounds::new(rect.min_x, rect.min_y, cx, cy),
        1 => GroundBounds::new(cx, rect.min_y, rect.max_x, cy),
        2 => GroundBounds::new(rect.min_x, cy, cx, rect.max_y),
        _ => GroundBounds::new(cx, cy, rect.max_x, rect.max_y),
    }
}

/// Quadtree spatial index answering ground -> pixel queries.
#[derive(Debug, Clone)]
pub struct QuadTreeIndex {
    entries: Vec<Entry>,
    root: Node,
    bounds: GroundBounds,
}

impl QuadTreeIndex {
    /// Build the index from every geolocated pixel of the grid.
    pub fn build(grid: &GeolocationGrid, config: &TransformerConfig) -> Result<Self> {
        let bounds = grid.bounds();
        if bounds.is_degenerate() {
            return Err(GeolocError::degenerate(
                "ground bounding box has no area; cannot build quadtree",
            ));
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(grid.width() * grid.height())
            .map_err(|_| {
                GeolocError::allocation(
                    "quadtree entries",
                    grid.width() * grid.height() * std::mem::size_of::<Entry>(),
                )
            })?;
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                if let Some((gx, gy)) = grid.ground_at(col, row) {
                    entries.push(Entry {
                        gx,
                        gy,
                        px: col as f64,
                        py: row as f64,
                    });
                }
            }
        }

        let mut index = Self {
            entries,
            root: Node::Leaf(Vec::new()),
            bounds,
        };
        for i in 0..index.entries.len() {
            let entry = index.entries[i];
            insert(
                &mut index.root,
                &index.bounds,
                0,
                i as u32,
                entry.gx,
                entry.gy,
                &index.entries,
                config.quad_leaf_capacity,
                config.quad_max_depth,
            );
        }

        debug!(
            points = index.entries.len(),
            leaves = index.leaf_count(),
            "built quadtree index"
        );

        Ok(index)
    }

    /// Number of indexed correspondence points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the grid had no geolocated pixels.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 1,
                Node::Internal(children) => children.iter().map(count).sum(),
            }
        }
        count(&self.root)
    }

    /// Look up the source pixel nearest to a ground coordinate.
    ///
    /// Descends to the leaf containing the point and answers the nearest
    /// entry in it (first-inserted wins ties). `None` when the point is
    /// outside the root rectangle or the resolved leaf holds no points.
    pub fn inverse(&self, gx: f64, gy: f64) -> Option<(f64, f64)> {
        if !self.bounds.contains(gx, gy) {
            return None;
        }

        let mut node = &self.root;
        let mut rect = self.bounds;
        loop {
            match node {
                Node::Internal(children) => {
                    let cx = (rect.min_x + rect.max_x) / 2.0;
                    let cy = (rect.min_y + rect.max_y) / 2.0;
                    let i = child_of(cx, cy, gx, gy);
                    rect = child_rect(&rect, i);
                    node = &children[i];
                }
                Node::Leaf(indices) => {
                    let mut best: Option<(f64, &Entry)> = None;
                    for &i in indices {
                        let entry = &self.entries[i as usize];
                        let dx = entry.gx - gx;
                        let dy = entry.gy - gy;
                        let dist = dx * dx + dy * dy;
                        // Strict comparison keeps the first-inserted entry
                        // on equal distances.
                        if best.map_or(true, |(d, _)| dist < d) {
                            best = Some((dist, entry));
                        }
                    }
                    return best.map(|(_, entry)| (entry.px, entry.py));
                }
            }
        }
    }
}

/// Insert one entry, splitting leaves that exceed capacity until the depth
/// bound. Duplicate and degenerate coordinates terminate at `max_depth` in
/// an over-full leaf, which is fine for queries.
#[allow(clippy::too_many_arguments)]
fn insert(
    node: &mut Node,
    rect: &GroundBounds,
    depth: u32,
    idx: u32,
    gx: f64,
    gy: f64,
    entries: &[Entry],
    leaf_capacity: usize,
    max_depth: u32,
) {
    match node {
        Node::Leaf(indices) => {
            indices.push(idx);
            if indices.len() > leaf_capacity && depth < max_depth {
                let moved = std::mem::take(indices);
                let mut children = Box::new([
                    Node::Leaf(Vec::new()),
                    Node::Leaf(Vec::new()),
                    Node::Leaf(Vec::new()),
                    Node::Leaf(Vec::new()),
                ]);
                let cx = (rect.min_x + rect.max_x) / 2.0;
                let cy = (rect.min_y + rect.max_y) / 2.0;
                for moved_idx in moved {
                    let entry = &entries[moved_idx as usize];
                    let i = child_of(cx, cy, entry.gx, entry.gy);
                    insert(
                        &mut children[i],
                        &child_rect(rect, i),
                        depth + 1,
                        moved_idx,
                        entry.gx,
                        entry.gy,
                        entries,
                        leaf_capacity,
                        max_depth,
                    );
                }
                *node = Node::Internal(children);
            }
        }
        Node::Internal(children) => {
            let cx = (rect.min_x + rect.max_x) / 2.0;
            let cy = (rect.min_y + rect.max_y) / 2.0;
            let i = child_of(cx, cy, gx, gy);
            insert(
                &mut children[i],
                &child_rect(rect, i),
                depth + 1,
                idx,
                gx,
                gy,
                entries,
                leaf_capacity,
                max_depth,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use crate::testdata::{curved_grid_sources, regular_grid_sources};

    fn build_index(width: usize, height: usize) -> (GeolocationGrid, QuadTreeIndex) {
        let (x_src, y_src) = regular_grid_sources(width, height);
        let grid = GeolocationGrid::load(&x_src, &y_src, true).unwrap();
        let index = QuadTreeIndex::build(&grid, &TransformerConfig::default()).unwrap();
        (grid, index)
    }

    #[test]
    fn test_inverse_exact_at_vertices() {
        let (grid, index) = build_index(16, 12);

        for (col, row) in [(0usize, 0usize), (7, 5), (15, 11), (0, 11), (15, 0)] {
            let (gx, gy) = grid.ground_at(col, row).unwrap();
            let (px, py) = index.inverse(gx, gy).unwrap();
            assert_eq!(px, col as f64);
            assert_eq!(py, row as f64);
        }
    }

    #[test]
    fn test_inverse_out_of_coverage() {
        let (_, index) = build_index(4, 3);

        assert_eq!(index.inverse(1000.0, 1000.0), None);
        assert_eq!(index.inverse(9.99, 101.0), None);
        assert_eq!(index.inverse(11.0, 102.01), None);
    }

    #[test]
    fn test_splits_under_capacity_one() {
        let (x_src, y_src) = curved_grid_sources(16, 12);
        let grid = GeolocationGrid::load(&x_src, &y_src, false).unwrap();
        let config = TransformerConfig {
            quad_leaf_capacity: 1,
            ..TransformerConfig::default()
        };
        let index = QuadTreeIndex::build(&grid, &config).unwrap();
        assert_eq!(index.len(), 16 * 12);

        // Every vertex still resolves to itself.
        for (col, row) in [(0usize, 0usize), (8, 3), (15, 11)] {
            let (gx, gy) = grid.ground_at(col, row).unwrap();
            assert_eq!(index.inverse(gx, gy), Some((col as f64, row as f64)));
        }
    }

    #[test]
    fn test_duplicate_coordinates_terminate_and_tiebreak() {
        // Two pixel rows share identical ground coordinates: splitting can
        // never separate them, so the depth bound must stop recursion.
        let x = InMemorySource::new(vec![10.0, 11.0, 10.0, 11.0, 20.0, 21.0], 2, 3);
        let y = InMemorySource::new(vec![100.0, 100.0, 100.0, 100.0, 200.0, 200.0], 2, 3);
        let grid = GeolocationGrid::load(&x, &y, false).unwrap();
        let config = TransformerConfig {
            quad_leaf_capacity: 1,
            quad_max_depth: 4,
            ..TransformerConfig::default()
        };
        let index = QuadTreeIndex::build(&grid, &config).unwrap();

        // (10, 100) is shared by pixels (0,0) and (0,1); first inserted wins.
        assert_eq!(index.inverse(10.0, 100.0), Some((0.0, 0.0)));
    }

    #[test]
    fn test_empty_leaf_answers_not_covered() {
        // Points on the diagonal of a square footprint: off-diagonal
        // quadrants exist but hold nothing.
        let x = InMemorySource::new(vec![0.0, 1.0, 2.0, 3.0], 1, 4);
        let y = InMemorySource::new(vec![0.0, 1.0, 2.0, 3.0], 1, 4);
        let grid = GeolocationGrid::load(&x, &y, false).unwrap();
        let config = TransformerConfig {
            quad_leaf_capacity: 1,
            ..TransformerConfig::default()
        };
        let index = QuadTreeIndex::build(&grid, &config).unwrap();

        // Inside the root rectangle, far from the diagonal.
        assert_eq!(index.inverse(2.9, 0.1), None);
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let x = InMemorySource::new(vec![5.0; 4], 2, 2);
        let y = InMemorySource::new(vec![7.0; 4], 2, 2);
        let grid = GeolocationGrid::load(&x, &y, false).unwrap();
        let err = QuadTreeIndex::build(&grid, &TransformerConfig::default()).unwrap_err();
        assert!(matches!(err, GeolocError::DegenerateGeometry(_)));
    }
}
