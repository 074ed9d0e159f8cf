//! Error types for geolocation transforms.

use thiserror::Error;

/// Errors that can occur while loading a geolocation grid or building an
/// inverse index.
///
/// Out-of-coverage query results are deliberately not part of this taxonomy:
/// a query for a point outside the represented footprint answers `None`, it
/// never errors.
#[derive(Error, Debug)]
pub enum GeolocError {
    /// An array allocation failed during load or index build.
    #[error("allocation of {what} failed ({bytes} bytes)")]
    Allocation { what: String, bytes: usize },

    /// A read from a geolocation source was incomplete or failed.
    #[error("failed to read geolocation data: {0}")]
    ReadFailed(String),

    /// Zero-sized grid, mismatched source shapes, or a degenerate
    /// ground-space bounding box.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl GeolocError {
    /// Create an Allocation error.
    pub fn allocation(what: impl Into<String>, bytes: usize) -> Self {
        Self::Allocation {
            what: what.into(),
            bytes,
        }
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }
}

/// Result type for geolocation transform operations.
pub type Result<T> = std::result::Result<T, GeolocError>;
