//! Dense inverse index: the backmap.
//!
//! A quantized raster over ground space where each cell holds the averaged
//! source pixel coordinate of the geolocation points that landed in it.
//! Trades memory (proportional to the ground extent) for O(1) inverse
//! queries. Cells with no contributing pixel are tracked in a packed
//! validity bitmap rather than a reserved coordinate value.

use tracing::debug;

use crate::config::TransformerConfig;
use crate::error::{GeolocError, Result};
use crate::grid::GeolocationGrid;
use crate::storage::{DenseStorage, StorageAccessor};

/// Scatter every geolocated source pixel into the accumulator arrays:
/// sum of pixel X, sum of pixel Y, and hit count per cell.
///
/// Generic over the storage backend so dense and tiled accumulators run the
/// identical pass. Iteration is row-major over the source grid, which keeps
/// float accumulation order deterministic.
pub(crate) fn scatter<S: StorageAccessor<Value = f32>>(
    grid: &GeolocationGrid,
    sum_x: &mut S,
    sum_y: &mut S,
    weight: &mut S,
    origin_x: f64,
    origin_y: f64,
    cell_x: f64,
    cell_y: f64,
) {
    let bm_width = sum_x.width();
    let bm_height = sum_x.height();

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let Some((gx, gy)) = grid.ground_at(col, row) else {
                continue;
            };
            let bx = ((gx - origin_x) / cell_x).floor();
            let by = ((origin_y - gy) / cell_y).floor();
            if bx < 0.0 || by < 0.0 {
                continue;
            }
            let (bx, by) = (bx as usize, by as usize);
            if bx >= bm_width || by >= bm_height {
                continue;
            }
            sum_x.set(bx, by, sum_x.get(bx, by) + col as f32);
            sum_y.set(bx, by, sum_y.get(bx, by) + row as f32);
            weight.set(bx, by, weight.get(bx, by) + 1.0);
        }
    }
}

/// Divide accumulated sums by their weights in place and return the packed
/// validity bitmap. Cells that received no contribution stay zero and are
/// marked invalid.
pub(crate) fn normalize<S: StorageAccessor<Value = f32>>(
    sum_x: &mut S,
    sum_y: &mut S,
    weight: &S,
) -> Vec<u64> {
    let width = sum_x.width();
    let height = sum_x.height();
    let mut valid = vec![0u64; (width * height).div_ceil(64)];

    for row in 0..height {
        for col in 0..width {
            let w = weight.get(col, row);
            if w > 0.0 {
                sum_x.set(col, row, sum_x.get(col, row) / w);
                sum_y.set(col, row, sum_y.get(col, row) / w);
                let idx = row * width + col;
                valid[idx / 64] |= 1u64 << (idx % 64);
            }
        }
    }

    valid
}

/// The built backmap: normalized mean pixel coordinates per ground cell.
#[derive(Debug, Clone)]
pub struct BackMap {
    map_x: DenseStorage<f32>,
    map_y: DenseStorage<f32>,
    valid: Vec<u64>,
    width: usize,
    height: usize,
    /// Ground X of the left edge of cell column 0.
    origin_x: f64,
    /// Ground Y of the top edge of cell row 0 (rows run top-down).
    origin_y: f64,
    cell_x: f64,
    cell_y: f64,
}

impl BackMap {
    /// Build the backmap from a loaded geolocation grid.
    ///
    /// Cell size is chosen so the backmap holds roughly
    /// `grid pixels * oversample_factor` cells over the ground bounding box,
    /// padded by half a cell on each side. The weight accumulator lives only
    /// for the duration of this call.
    pub fn build(grid: &GeolocationGrid, config: &TransformerConfig) -> Result<Self> {
        let bounds = grid.bounds();
        if bounds.is_degenerate() {
            return Err(GeolocError::degenerate(
                "ground bounding box has no area; cannot size backmap",
            ));
        }

        let target_cells =
            grid.width() as f64 * grid.height() as f64 * config.oversample_factor;
        let cell = (bounds.width() * bounds.height() / target_cells).sqrt();
        if !(cell > 0.0) || !cell.is_finite() {
            return Err(GeolocError::degenerate(format!(
                "invalid backmap cell size {cell}"
            )));
        }

        let padded = bounds.expand(cell / 2.0);
        let cols = (padded.width() / cell).ceil();
        let rows = (padded.height() / cell).ceil();
        if !(cols > 0.0 && rows > 0.0 && cols * rows < config.max_backmap_cells as f64) {
            return Err(GeolocError::allocation(
                "backmap exceeds configured cell budget",
                (cols * rows) as usize,
            ));
        }

        // Per-axis cell sizes recomputed after rounding so the cell raster
        // exactly spans the padded bounds.
        let cell_x = padded.width() / cols;
        let cell_y = padded.height() / rows;
        // One column/row of slack past the padded edge.
        let width = cols as usize + 1;
        let height = rows as usize + 1;

        let mut map_x = DenseStorage::<f32>::zeroed(width, height, "backmap X array")?;
        let mut map_y = DenseStorage::<f32>::zeroed(width, height, "backmap Y array")?;

        let valid = {
            let mut weight = DenseStorage::<f32>::zeroed(width, height, "backmap weights")?;
            scatter(
                grid,
                &mut map_x,
                &mut map_y,
                &mut weight,
                padded.min_x,
                padded.max_y,
                cell_x,
                cell_y,
            );
            normalize(&mut map_x, &mut map_y, &weight)
            // weight dropped here; it has no further use
        };

        let backmap = Self {
            map_x,
            map_y,
            valid,
            width,
            height,
            origin_x: padded.min_x,
            origin_y: padded.max_y,
            cell_x,
            cell_y,
        };

        debug!(
            width,
            height,
            cell_x,
            cell_y,
            valid_cells = backmap.valid_count(),
            "built backmap"
        );

        Ok(backmap)
    }

    #[inline]
    fn is_valid(&self, col: usize, row: usize) -> bool {
        let idx = row * self.width + col;
        (self.valid[idx / 64] & (1u64 << (idx % 64))) != 0
    }

    /// Number of cells with at least one contributing source pixel.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Backmap dimensions in cells.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Ground-space cell size along each axis.
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_x, self.cell_y)
    }

    /// Look up the approximate source pixel for a ground coordinate.
    ///
    /// Answers `None` for coordinates outside the backmap raster or landing
    /// in a cell with no contributing pixel; out-of-coverage is never
    /// clamped to the nearest valid cell. Valid neighbour cells are blended
    /// bilinearly for a smoother estimate, which stays within roughly a cell
    /// of the truth.
    pub fn inverse(&self, gx: f64, gy: f64) -> Option<(f64, f64)> {
        let bx = (gx - self.origin_x) / self.cell_x;
        let by = (self.origin_y - gy) / self.cell_y;
        if !(bx >= 0.0 && by >= 0.0 && bx + 1.0 < self.width as f64 && by + 1.0 < self.height as f64)
        {
            return None;
        }

        let col = bx as usize;
        let row = by as usize;
        if !self.is_valid(col, row) {
            return None;
        }

        let fx = bx - col as f64;
        let fy = by - row as f64;

        let v00 = (self.map_x.get(col, row) as f64, self.map_y.get(col, row) as f64);
        let right = self.is_valid(col + 1, row);
        let down = self.is_valid(col, row + 1);
        let diag = self.is_valid(col + 1, row + 1);

        if right && down && diag {
            let v10 = (self.map_x.get(col + 1, row) as f64, self.map_y.get(col + 1, row) as f64);
            let v01 = (self.map_x.get(col, row + 1) as f64, self.map_y.get(col, row + 1) as f64);
            let v11 = (
                self.map_x.get(col + 1, row + 1) as f64,
                self.map_y.get(col + 1, row + 1) as f64,
            );
            let px = (1.0 - fy) * (v00.0 + fx * (v10.0 - v00.0)) + fy * (v01.0 + fx * (v11.0 - v01.0));
            let py = (1.0 - fy) * (v00.1 + fx * (v10.1 - v00.1)) + fy * (v01.1 + fx * (v11.1 - v01.1));
            Some((px, py))
        } else if right {
            let v10 = (self.map_x.get(col + 1, row) as f64, self.map_y.get(col + 1, row) as f64);
            Some((v00.0 + fx * (v10.0 - v00.0), v00.1 + fx * (v10.1 - v00.1)))
        } else if down {
            let v01 = (self.map_x.get(col, row + 1) as f64, self.map_y.get(col, row + 1) as f64);
            Some((v00.0 + fy * (v01.0 - v00.0), v00.1 + fy * (v01.1 - v00.1)))
        } else {
            Some(v00)
        }
    }

    /// Diagnostic view: the backmap as two row-major float bands (pixel X,
    /// pixel Y) with `f32::NAN` marking cells without coverage. Inspection
    /// only; not a persistence format.
    pub fn to_bands(&self) -> (Vec<f32>, Vec<f32>) {
        let mut band_x = self.map_x.as_slice().to_vec();
        let mut band_y = self.map_y.as_slice().to_vec();
        for row in 0..self.height {
            for col in 0..self.width {
                if !self.is_valid(col, row) {
                    band_x[row * self.width + col] = f32::NAN;
                    band_y[row * self.width + col] = f32::NAN;
                }
            }
        }
        (band_x, band_y)
    }
}
