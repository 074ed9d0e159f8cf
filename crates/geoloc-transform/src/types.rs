//! Core types for geolocation transforms.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding rectangle in ground coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GroundBounds {
    /// Create a new bounding rectangle.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An empty rectangle that any real point will expand.
    pub fn empty() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
        }
    }

    /// Grow the rectangle to include a point.
    pub fn update(&mut self, x: f64, y: f64) {
        if x < self.min_x {
            self.min_x = x;
        }
        if x > self.max_x {
            self.max_x = x;
        }
        if y < self.min_y {
            self.min_y = y;
        }
        if y > self.max_y {
            self.max_y = y;
        }
    }

    /// Check if a point is contained within the rectangle (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Get the width in ground units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height in ground units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True if no point was ever folded in, or the extent has no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0) || !(self.height() > 0.0)
    }

    /// Expand the rectangle by a buffer amount on every side.
    pub fn expand(&self, buffer: f64) -> Self {
        Self {
            min_x: self.min_x - buffer,
            min_y: self.min_y - buffer,
            max_x: self.max_x + buffer,
            max_y: self.max_y + buffer,
        }
    }
}

/// Which inverse-lookup index a transformer builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InverseMode {
    /// Dense scatter-and-normalize backmap raster. O(1) queries,
    /// memory proportional to the ground-space extent.
    #[default]
    BackMap,
    /// Sparse quadtree over the correspondence points. Memory proportional
    /// to the point count; preferable for sparse or very spread-out grids.
    QuadTree,
}

impl InverseMode {
    /// Parse from string (case-insensitive). Unknown values fall back to
    /// the backmap.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "quadtree" | "quad_tree" => Self::QuadTree,
            _ => Self::BackMap,
        }
    }
}

impl std::fmt::Display for InverseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackMap => write!(f, "backmap"),
            Self::QuadTree => write!(f, "quadtree"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_update() {
        let mut bounds = GroundBounds::empty();
        bounds.update(10.0, 100.0);
        bounds.update(13.0, 102.0);
        bounds.update(11.0, 101.0);

        assert_eq!(bounds.min_x, 10.0);
        assert_eq!(bounds.max_x, 13.0);
        assert_eq!(bounds.min_y, 100.0);
        assert_eq!(bounds.max_y, 102.0);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = GroundBounds::new(10.0, 100.0, 13.0, 102.0);
        assert!(bounds.contains(11.5, 101.0));
        assert!(bounds.contains(10.0, 100.0)); // edge
        assert!(!bounds.contains(9.9, 101.0));
        assert!(!bounds.contains(11.5, 103.0));
    }

    #[test]
    fn test_bounds_degenerate() {
        assert!(GroundBounds::empty().is_degenerate());
        // Single point: zero area
        let mut bounds = GroundBounds::empty();
        bounds.update(5.0, 5.0);
        assert!(bounds.is_degenerate());

        let ok = GroundBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(!ok.is_degenerate());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(InverseMode::from_str("quadtree"), InverseMode::QuadTree);
        assert_eq!(InverseMode::from_str("QUADTREE"), InverseMode::QuadTree);
        assert_eq!(InverseMode::from_str("backmap"), InverseMode::BackMap);
        assert_eq!(InverseMode::from_str("anything"), InverseMode::BackMap);
    }
}
