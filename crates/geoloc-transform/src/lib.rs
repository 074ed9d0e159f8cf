//! Pixel/ground transformer for sensor images georeferenced by a
//! geolocation array.
//!
//! Push-broom satellite and airborne sensors often ship no closed-form
//! projection, only a discrete sampling of (pixel -> ground) correspondences:
//! two raster bands holding the ground X and Y coordinate of every source
//! pixel. This crate loads that sampling and answers both directions:
//!
//! - **Forward** (pixel -> ground): bilinear interpolation over the loaded
//!   arrays. Cheap and always available.
//! - **Inverse** (ground -> pixel): a scattered-point inverse problem,
//!   answered through one of two pre-built indexes — a dense *backmap*
//!   (quantized ground raster of averaged pixel coordinates, O(1) lookups)
//!   or a *quadtree* over the correspondence points (memory proportional to
//!   point count).
//!
//! # Architecture
//!
//! ```text
//! RasterSource (X band)  RasterSource (Y band)
//!          │                  │
//!          └────────┬─────────┘
//!                   ▼
//!        GeolocationGrid::load          (regular grids broadcast
//!                   │                    one row/column read)
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!    BackMap::build    QuadTreeIndex::build     (exactly one, per mode)
//!          └────────┬────────┘
//!                   ▼
//!           GeolocTransformer
//!            forward / inverse          (immutable, thread-safe reads)
//! ```
//!
//! Queries that fall outside the represented footprint answer `None`; that
//! is a normal result, not an error. Construction failures (allocation,
//! source reads, degenerate geometry) abort and release everything.
//!
//! # Example
//!
//! ```
//! use geoloc_transform::{
//!     GeolocTransformer, InMemorySource, InverseMode, TransformerConfig,
//! };
//!
//! // A regular 4x3 grid: X per column, Y per row.
//! let x_band = InMemorySource::new(vec![10.0, 11.0, 12.0, 13.0], 4, 1);
//! let y_band = InMemorySource::new(vec![100.0, 101.0, 102.0], 3, 1);
//!
//! let transformer = GeolocTransformer::new(
//!     &x_band,
//!     &y_band,
//!     true,
//!     InverseMode::BackMap,
//!     TransformerConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(transformer.forward(2.0, 1.0), Some((12.0, 101.0)));
//! let (px, py) = transformer.inverse(12.0, 101.0).unwrap();
//! assert!((px - 2.0).abs() < 1e-3 && (py - 1.0).abs() < 1e-3);
//! assert_eq!(transformer.inverse(1000.0, 1000.0), None);
//! ```

pub mod backmap;
pub mod config;
pub mod error;
pub mod grid;
pub mod quadtree;
pub mod source;
pub mod storage;
pub mod testdata;
pub mod transformer;
pub mod types;

// Re-export commonly used types at crate root
pub use backmap::BackMap;
pub use config::TransformerConfig;
pub use error::{GeolocError, Result};
pub use grid::GeolocationGrid;
pub use quadtree::QuadTreeIndex;
pub use source::{FailingSource, InMemorySource, RasterSource};
pub use storage::{DenseStorage, StorageAccessor, TiledStorage};
pub use transformer::GeolocTransformer;
pub use types::{GroundBounds, InverseMode};
