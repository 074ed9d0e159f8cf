//! Configuration for the geolocation transformer.

use serde::{Deserialize, Serialize};

/// Configuration for grid loading and inverse-index construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Backmap resolution multiplier relative to the source grid density.
    /// Higher values reduce aliasing at the cost of memory.
    pub oversample_factor: f64,

    /// Hard cap on the number of backmap cells. Exceeding it fails the
    /// build rather than exhausting memory.
    pub max_backmap_cells: usize,

    /// Maximum number of points a quadtree leaf holds before splitting.
    pub quad_leaf_capacity: usize,

    /// Maximum quadtree depth. Bounds the tree even when many points share
    /// the same ground coordinate.
    pub quad_max_depth: u32,

    /// Refine inverse estimates against the exact geolocation arrays.
    pub refine_inverse: bool,

    /// Iteration budget for the inverse refinement.
    pub refine_iterations: u32,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            oversample_factor: 1.3,
            max_backmap_cells: 64 * 1024 * 1024,
            quad_leaf_capacity: 16,
            quad_max_depth: 12,
            refine_inverse: true,
            refine_iterations: 4,
        }
    }
}

impl TransformerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GEOLOC_OVERSAMPLE_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.oversample_factor = factor;
            }
        }

        if let Ok(val) = std::env::var("GEOLOC_MAX_BACKMAP_CELLS") {
            if let Ok(cells) = val.parse() {
                config.max_backmap_cells = cells;
            }
        }

        if let Ok(val) = std::env::var("GEOLOC_QUAD_LEAF_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.quad_leaf_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("GEOLOC_QUAD_MAX_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.quad_max_depth = depth;
            }
        }

        if let Ok(val) = std::env::var("GEOLOC_REFINE_INVERSE") {
            config.refine_inverse = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.oversample_factor >= 0.1 && self.oversample_factor <= 100.0) {
            return Err("oversample_factor must be in [0.1, 100.0]".to_string());
        }

        if self.max_backmap_cells == 0 {
            return Err("max_backmap_cells must be > 0".to_string());
        }

        if self.quad_leaf_capacity == 0 {
            return Err("quad_leaf_capacity must be > 0".to_string());
        }

        if self.quad_max_depth == 0 || self.quad_max_depth > 32 {
            return Err("quad_max_depth must be 1-32".to_string());
        }

        Ok(())
    }
}
