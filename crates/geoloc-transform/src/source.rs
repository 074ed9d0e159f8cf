//! Raster sources supplying geolocation band data.
//!
//! The transformer never does raster I/O itself; it pulls the X and Y
//! geolocation bands through this trait. Reads happen once, synchronously,
//! during construction.

use crate::error::{GeolocError, Result};

/// Read access to one band of double-precision raster data.
pub trait RasterSource {
    /// Width of the band in pixels.
    fn width(&self) -> usize;

    /// Height of the band in pixels.
    fn height(&self) -> usize;

    /// Read a `w x h` rectangle starting at (x, y) into `out`, row-major.
    /// `out` must hold exactly `w * h` values; a short or failed read is an
    /// error, never a partial fill.
    fn read_rect(&self, x: usize, y: usize, w: usize, h: usize, out: &mut [f64]) -> Result<()>;

    /// Sentinel marking pixels with no geolocation, if the band has one.
    fn no_data(&self) -> Option<f64> {
        None
    }
}

/// A raster band held fully in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    data: Vec<f64>,
    width: usize,
    height: usize,
    no_data: Option<f64>,
}

impl InMemorySource {
    /// Wrap a row-major buffer. The buffer length must be `width * height`.
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "buffer length mismatch");
        Self {
            data,
            width,
            height,
            no_data: None,
        }
    }

    /// Attach a no-data sentinel to the band.
    pub fn with_no_data(mut self, no_data: f64) -> Self {
        self.no_data = Some(no_data);
        self
    }
}

impl RasterSource for InMemorySource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn read_rect(&self, x: usize, y: usize, w: usize, h: usize, out: &mut [f64]) -> Result<()> {
        if out.len() != w * h {
            return Err(GeolocError::read_failed(format!(
                "output buffer holds {} values, expected {}",
                out.len(),
                w * h
            )));
        }
        if x + w > self.width || y + h > self.height {
            return Err(GeolocError::read_failed(format!(
                "window {}x{}+{}+{} exceeds band {}x{}",
                w, h, x, y, self.width, self.height
            )));
        }
        for row in 0..h {
            let src = (y + row) * self.width + x;
            out[row * w..(row + 1) * w].copy_from_slice(&self.data[src..src + w]);
        }
        Ok(())
    }

    fn no_data(&self) -> Option<f64> {
        self.no_data
    }
}

/// A source whose every read fails. Test double for read-failure paths.
#[derive(Debug, Clone)]
pub struct FailingSource {
    width: usize,
    height: usize,
}

impl FailingSource {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl RasterSource for FailingSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn read_rect(&self, _x: usize, _y: usize, _w: usize, _h: usize, _out: &mut [f64]) -> Result<()> {
        Err(GeolocError::read_failed("simulated source failure"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rect_full() {
        let source = InMemorySource::new((0..12).map(f64::from).collect(), 4, 3);
        let mut out = vec![0.0; 12];
        source.read_rect(0, 0, 4, 3, &mut out).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[5], 5.0);
        assert_eq!(out[11], 11.0);
    }

    #[test]
    fn test_read_rect_window() {
        let source = InMemorySource::new((0..12).map(f64::from).collect(), 4, 3);
        let mut out = vec![0.0; 4];
        source.read_rect(1, 1, 2, 2, &mut out).unwrap();
        assert_eq!(out, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_read_rect_out_of_window() {
        let source = InMemorySource::new(vec![0.0; 12], 4, 3);
        let mut out = vec![0.0; 8];
        assert!(source.read_rect(2, 0, 4, 2, &mut out).is_err());
    }

    #[test]
    fn test_read_rect_buffer_mismatch() {
        let source = InMemorySource::new(vec![0.0; 12], 4, 3);
        let mut out = vec![0.0; 3];
        assert!(source.read_rect(0, 0, 2, 2, &mut out).is_err());
    }
}
