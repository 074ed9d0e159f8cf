//! Geolocation grid: the dense pixel -> ground correspondence arrays.
//!
//! The grid is loaded once from two raster bands (X and Y ground coordinates
//! per source pixel) and is immutable afterwards. Both inverse indexes are
//! built from it, and the forward transform interpolates directly over it.

use tracing::debug;

use crate::error::{GeolocError, Result};
use crate::source::RasterSource;
use crate::storage::{DenseStorage, StorageAccessor};
use crate::types::GroundBounds;

/// Dense per-pixel ground coordinates for a sensor image.
#[derive(Debug, Clone)]
pub struct GeolocationGrid {
    width: usize,
    height: usize,
    geo_x: DenseStorage<f64>,
    geo_y: DenseStorage<f64>,
    bounds: GroundBounds,
    is_regular: bool,
    no_data: Option<f64>,
}

impl GeolocationGrid {
    /// Load the grid from the X and Y geolocation bands.
    ///
    /// With `regular` set, the bands are separable: the X band is a single
    /// `width x 1` row holding the per-column X coordinates shared by every
    /// row, and the Y band is a single `height x 1` row holding the per-row
    /// Y coordinates shared by every column. Each band is read once and
    /// broadcast, instead of reading `width x height` values twice.
    pub fn load(
        x_src: &dyn RasterSource,
        y_src: &dyn RasterSource,
        regular: bool,
    ) -> Result<Self> {
        let (width, height) = if regular {
            if x_src.height() != 1 || y_src.height() != 1 {
                return Err(GeolocError::degenerate(format!(
                    "regular grid expects 1-row bands, got {}x{} and {}x{}",
                    x_src.width(),
                    x_src.height(),
                    y_src.width(),
                    y_src.height()
                )));
            }
            (x_src.width(), y_src.width())
        } else {
            if x_src.width() != y_src.width() || x_src.height() != y_src.height() {
                return Err(GeolocError::degenerate(format!(
                    "geolocation bands differ in shape: {}x{} vs {}x{}",
                    x_src.width(),
                    x_src.height(),
                    y_src.width(),
                    y_src.height()
                )));
            }
            (x_src.width(), x_src.height())
        };

        if width == 0 || height == 0 {
            return Err(GeolocError::degenerate(format!(
                "zero-sized geolocation grid ({}x{})",
                width, height
            )));
        }

        let mut geo_x = DenseStorage::<f64>::zeroed(width, height, "geolocation X array")?;
        let mut geo_y = DenseStorage::<f64>::zeroed(width, height, "geolocation Y array")?;

        if regular {
            let mut row_x = vec![0.0; width];
            x_src.read_rect(0, 0, width, 1, &mut row_x)?;
            let mut col_y = vec![0.0; height];
            y_src.read_rect(0, 0, height, 1, &mut col_y)?;

            let x_slice = geo_x.as_mut_slice();
            for row in 0..height {
                x_slice[row * width..(row + 1) * width].copy_from_slice(&row_x);
            }
            let y_slice = geo_y.as_mut_slice();
            for (row, &y) in col_y.iter().enumerate() {
                y_slice[row * width..(row + 1) * width].fill(y);
            }
        } else {
            x_src.read_rect(0, 0, width, height, geo_x.as_mut_slice())?;
            y_src.read_rect(0, 0, width, height, geo_y.as_mut_slice())?;
        }

        let no_data = x_src.no_data();

        // Scan for the ground-space extent, skipping pixels without a
        // geolocation.
        let mut bounds = GroundBounds::empty();
        let x_slice = geo_x.as_slice();
        let y_slice = geo_y.as_slice();
        for i in 0..width * height {
            if no_data.map_or(true, |nd| x_slice[i] != nd) {
                bounds.update(x_slice[i], y_slice[i]);
            }
        }

        debug!(
            width,
            height,
            regular,
            min_x = bounds.min_x,
            min_y = bounds.min_y,
            max_x = bounds.max_x,
            max_y = bounds.max_y,
            "loaded geolocation grid"
        );

        Ok(Self {
            width,
            height,
            geo_x,
            geo_y,
            bounds,
            is_regular: regular,
            no_data,
        })
    }

    /// Grid width in source pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in source pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Ground-space bounding box of all geolocated pixels.
    pub fn bounds(&self) -> GroundBounds {
        self.bounds
    }

    /// Whether the grid was loaded through the regular-grid broadcast path.
    pub fn is_regular(&self) -> bool {
        self.is_regular
    }

    /// Stored ground coordinate of an integer pixel, or `None` when the
    /// pixel has no geolocation.
    pub fn ground_at(&self, col: usize, row: usize) -> Option<(f64, f64)> {
        debug_assert!(col < self.width && row < self.height);
        let gx = self.geo_x.get(col, row);
        if self.no_data == Some(gx) {
            return None;
        }
        Some((gx, self.geo_y.get(col, row)))
    }

    /// Interpolate the ground coordinate of a (fractional) pixel position.
    ///
    /// Bilinear over the 2x2 cell anchored at the clamped integer position;
    /// positions beyond the borders extrapolate from the closest cell.
    /// Exact at integer vertices. `None` when a sample in the interpolation
    /// stencil has no geolocation.
    pub fn forward(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let mut ix = px.max(0.0) as usize;
        ix = ix.min(self.width - 1);
        if self.width >= 2 {
            ix = ix.min(self.width - 2);
        }
        let mut iy = py.max(0.0) as usize;
        iy = iy.min(self.height - 1);
        if self.height >= 2 {
            iy = iy.min(self.height - 2);
        }

        // Clamped neighbor indices degrade 1-wide/1-tall grids to linear or
        // constant interpolation.
        let ix1 = (ix + 1).min(self.width - 1);
        let iy1 = (iy + 1).min(self.height - 1);

        let x00 = self.geo_x.get(ix, iy);
        let x10 = self.geo_x.get(ix1, iy);
        let x01 = self.geo_x.get(ix, iy1);
        let x11 = self.geo_x.get(ix1, iy1);
        if let Some(nd) = self.no_data {
            if x00 == nd || x10 == nd || x01 == nd || x11 == nd {
                return None;
            }
        }

        let fx = px - ix as f64;
        let fy = py - iy as f64;

        let gx = (1.0 - fy) * (x00 + fx * (x10 - x00)) + fy * (x01 + fx * (x11 - x01));

        let y00 = self.geo_y.get(ix, iy);
        let y10 = self.geo_y.get(ix1, iy);
        let y01 = self.geo_y.get(ix, iy1);
        let y11 = self.geo_y.get(ix1, iy1);
        let gy = (1.0 - fy) * (y00 + fx * (y10 - y00)) + fy * (y01 + fx * (y11 - y01));

        Some((gx, gy))
    }

    /// Locally correct an approximate inverse solution against the exact
    /// arrays.
    ///
    /// Newton iteration on the forward residual with a finite-difference
    /// Jacobian. The indexes answer within roughly a cell of the truth; this
    /// tightens the answer to sub-cell accuracy. Falls back to the best
    /// estimate seen when the local geometry degenerates or a sample has no
    /// geolocation.
    pub fn refine_inverse(
        &self,
        gx: f64,
        gy: f64,
        estimate: (f64, f64),
        max_iterations: u32,
    ) -> (f64, f64) {
        const STEP: f64 = 0.25;

        let (mut px, mut py) = estimate;
        let mut best = estimate;
        let mut best_residual = f64::MAX;

        for _ in 0..max_iterations {
            let Some((fx, fy)) = self.forward(px, py) else {
                break;
            };
            let rx = gx - fx;
            let ry = gy - fy;
            let residual = rx * rx + ry * ry;
            if residual < best_residual {
                best_residual = residual;
                best = (px, py);
            }
            if residual == 0.0 {
                break;
            }

            let (Some((xpx, ypx)), Some((xpy, ypy))) =
                (self.forward(px + STEP, py), self.forward(px, py + STEP))
            else {
                break;
            };
            let j11 = (xpx - fx) / STEP;
            let j21 = (ypx - fy) / STEP;
            let j12 = (xpy - fx) / STEP;
            let j22 = (ypy - fy) / STEP;

            let det = j11 * j22 - j12 * j21;
            if det.abs() < 1e-15 {
                break;
            }

            let dpx = (rx * j22 - ry * j12) / det;
            let dpy = (ry * j11 - rx * j21) / det;
            px += dpx;
            py += dpy;

            if dpx.abs() < 1e-9 && dpy.abs() < 1e-9 {
                if let Some((fx, fy)) = self.forward(px, py) {
                    let rx = gx - fx;
                    let ry = gy - fy;
                    if rx * rx + ry * ry < best_residual {
                        best = (px, py);
                    }
                }
                return best;
            }
        }

        best
    }
}
