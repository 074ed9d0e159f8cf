//! Public facade: load the geolocation grid, build one inverse index, and
//! answer forward/inverse queries.

use tracing::debug;

use crate::backmap::BackMap;
use crate::config::TransformerConfig;
use crate::error::{GeolocError, Result};
use crate::grid::GeolocationGrid;
use crate::quadtree::QuadTreeIndex;
use crate::source::RasterSource;
use crate::types::{GroundBounds, InverseMode};

#[derive(Debug, Clone)]
enum InverseIndex {
    BackMap(BackMap),
    QuadTree(QuadTreeIndex),
}

/// Bidirectional pixel <-> ground transformer for a sensor image
/// georeferenced by a geolocation array.
///
/// Construction loads the grid and builds exactly one inverse index; any
/// failure aborts construction and nothing partially built is ever exposed.
/// Once constructed the transformer is immutable, so `forward` and `inverse`
/// may be called concurrently from any number of threads.
#[derive(Debug, Clone)]
pub struct GeolocTransformer {
    grid: GeolocationGrid,
    index: InverseIndex,
    config: TransformerConfig,
}

impl GeolocTransformer {
    /// Load the geolocation bands and build the selected inverse index.
    ///
    /// `regular` asserts the separable-grid layout (X band `width x 1`,
    /// Y band `height x 1`); with it unset both bands are read densely.
    pub fn new(
        x_src: &dyn RasterSource,
        y_src: &dyn RasterSource,
        regular: bool,
        mode: InverseMode,
        config: TransformerConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|msg| GeolocError::degenerate(format!("invalid configuration: {msg}")))?;

        let grid = GeolocationGrid::load(x_src, y_src, regular)?;
        let index = match mode {
            InverseMode::BackMap => InverseIndex::BackMap(BackMap::build(&grid, &config)?),
            InverseMode::QuadTree => InverseIndex::QuadTree(QuadTreeIndex::build(&grid, &config)?),
        };

        debug!(%mode, width = grid.width(), height = grid.height(), "transformer ready");

        Ok(Self {
            grid,
            index,
            config,
        })
    }

    /// Pixel -> ground. Bilinear interpolation over the geolocation arrays;
    /// `None` only when the interpolation stencil has no geolocation.
    pub fn forward(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        self.grid.forward(px, py)
    }

    /// Ground -> pixel through the built index, optionally refined against
    /// the exact arrays. `None` means the point is outside the represented
    /// footprint (out of coverage), never a construction problem.
    pub fn inverse(&self, gx: f64, gy: f64) -> Option<(f64, f64)> {
        let estimate = match &self.index {
            InverseIndex::BackMap(backmap) => backmap.inverse(gx, gy)?,
            InverseIndex::QuadTree(index) => index.inverse(gx, gy)?,
        };

        if self.config.refine_inverse {
            Some(
                self.grid
                    .refine_inverse(gx, gy, estimate, self.config.refine_iterations),
            )
        } else {
            Some(estimate)
        }
    }

    /// Which inverse index this transformer built.
    pub fn mode(&self) -> InverseMode {
        match self.index {
            InverseIndex::BackMap(_) => InverseMode::BackMap,
            InverseIndex::QuadTree(_) => InverseMode::QuadTree,
        }
    }

    /// The loaded geolocation grid.
    pub fn grid(&self) -> &GeolocationGrid {
        &self.grid
    }

    /// Ground-space footprint of the geolocated pixels.
    pub fn bounds(&self) -> GroundBounds {
        self.grid.bounds()
    }

    /// Diagnostic access to the backmap. `None` in quadtree mode.
    pub fn backmap(&self) -> Option<&BackMap> {
        match &self.index {
            InverseIndex::BackMap(backmap) => Some(backmap),
            InverseIndex::QuadTree(_) => None,
        }
    }
}
