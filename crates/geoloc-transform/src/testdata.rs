//! Test data generation utilities.
//!
//! Synthetic geolocation bands with known values, shared by unit and
//! integration tests. The regular grids use X = 10 + column and
//! Y = 100 + row so expected ground coordinates can be read off directly.

use crate::source::InMemorySource;

/// Regular (separable) grid as the loader's broadcast path expects it:
/// a `width x 1` X band and a `height x 1` Y band.
pub fn regular_grid_sources(width: usize, height: usize) -> (InMemorySource, InMemorySource) {
    let xs: Vec<f64> = (0..width).map(|col| 10.0 + col as f64).collect();
    let ys: Vec<f64> = (0..height).map(|row| 100.0 + row as f64).collect();
    (
        InMemorySource::new(xs, width, 1),
        InMemorySource::new(ys, height, 1),
    )
}

/// The same separable grid expanded to full `width x height` bands, for
/// checking the broadcast load against a dense load.
pub fn separable_dense_sources(width: usize, height: usize) -> (InMemorySource, InMemorySource) {
    let mut xs = Vec::with_capacity(width * height);
    let mut ys = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            xs.push(10.0 + col as f64);
            ys.push(100.0 + row as f64);
        }
    }
    (
        InMemorySource::new(xs, width, height),
        InMemorySource::new(ys, width, height),
    )
}

/// A mildly curved (non-separable) grid, still invertible: each row is
/// sheared and stretched a little more than the one above it.
pub fn curved_grid_sources(width: usize, height: usize) -> (InMemorySource, InMemorySource) {
    let mut xs = Vec::with_capacity(width * height);
    let mut ys = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let c = col as f64;
            let r = row as f64;
            xs.push(10.0 + c * (1.0 + 0.02 * r) + 0.1 * r);
            ys.push(100.0 + r + 0.05 * c);
        }
    }
    (
        InMemorySource::new(xs, width, height),
        InMemorySource::new(ys, width, height),
    )
}
