//! Storage backends for dense 2D arrays.
//!
//! Index construction is written against the [`StorageAccessor`] trait so the
//! same scatter/normalize algorithms run unchanged over a contiguous
//! in-memory array or a tiled backend sized for very large grids.

use num_traits::Zero;

use crate::error::{GeolocError, Result};

/// Uniform get/set capability over a 2D dense array.
///
/// Accesses are O(1) and unsynchronized. The caller guarantees coordinates
/// are within `width() x height()`; implementations only carry debug
/// assertions.
pub trait StorageAccessor {
    type Value: Copy;

    /// Read the value at (col, row).
    fn get(&self, col: usize, row: usize) -> Self::Value;

    /// Write the value at (col, row). Returns false if the write was
    /// rejected (out of the configured extent).
    fn set(&mut self, col: usize, row: usize, value: Self::Value) -> bool;

    /// Width of the array in columns.
    fn width(&self) -> usize;

    /// Height of the array in rows.
    fn height(&self) -> usize;
}

/// Contiguous row-major storage.
#[derive(Debug, Clone)]
pub struct DenseStorage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Copy + Zero> DenseStorage<T> {
    /// Allocate a zero-filled array, failing cleanly instead of aborting
    /// when the allocation cannot be satisfied.
    pub fn zeroed(width: usize, height: usize, what: &str) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or_else(|| GeolocError::allocation(what, usize::MAX))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GeolocError::allocation(what, len * std::mem::size_of::<T>()))?;
        data.resize(len, T::zero());
        Ok(Self {
            data,
            width,
            height,
        })
    }
}

impl<T: Copy> DenseStorage<T> {
    /// Wrap an existing row-major buffer. The buffer length must match.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Borrow the underlying row-major buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutably borrow the underlying row-major buffer.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy> StorageAccessor for DenseStorage<T> {
    type Value = T;

    #[inline]
    fn get(&self, col: usize, row: usize) -> T {
        debug_assert!(col < self.width && row < self.height);
        self.data[row * self.width + col]
    }

    #[inline]
    fn set(&mut self, col: usize, row: usize, value: T) -> bool {
        debug_assert!(col < self.width && row < self.height);
        self.data[row * self.width + col] = value;
        true
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}

/// Tile edge length for [`TiledStorage`], in elements.
const TILE_SIZE: usize = 256;

/// Storage paged into fixed-size square tiles.
///
/// Tiles are allocated individually, so a grid too large for one contiguous
/// allocation can still be built. Layout within a tile is row-major.
#[derive(Debug, Clone)]
pub struct TiledStorage<T> {
    tiles: Vec<Vec<T>>,
    tiles_x: usize,
    width: usize,
    height: usize,
}

impl<T: Copy + Zero> TiledStorage<T> {
    /// Allocate a zero-filled tiled array.
    pub fn zeroed(width: usize, height: usize, what: &str) -> Result<Self> {
        let tiles_x = width.div_ceil(TILE_SIZE);
        let tiles_y = height.div_ceil(TILE_SIZE);
        let tile_len = TILE_SIZE * TILE_SIZE;

        let mut tiles = Vec::new();
        tiles
            .try_reserve_exact(tiles_x * tiles_y)
            .map_err(|_| {
                GeolocError::allocation(what, tiles_x * tiles_y * std::mem::size_of::<Vec<T>>())
            })?;
        for _ in 0..tiles_x * tiles_y {
            let mut tile = Vec::new();
            tile.try_reserve_exact(tile_len)
                .map_err(|_| GeolocError::allocation(what, tile_len * std::mem::size_of::<T>()))?;
            tile.resize(tile_len, T::zero());
            tiles.push(tile);
        }

        Ok(Self {
            tiles,
            tiles_x,
            width,
            height,
        })
    }

    #[inline]
    fn locate(&self, col: usize, row: usize) -> (usize, usize) {
        let tile = (row / TILE_SIZE) * self.tiles_x + col / TILE_SIZE;
        let offset = (row % TILE_SIZE) * TILE_SIZE + col % TILE_SIZE;
        (tile, offset)
    }
}

impl<T: Copy + Zero> StorageAccessor for TiledStorage<T> {
    type Value = T;

    #[inline]
    fn get(&self, col: usize, row: usize) -> T {
        debug_assert!(col < self.width && row < self.height);
        let (tile, offset) = self.locate(col, row);
        self.tiles[tile][offset]
    }

    #[inline]
    fn set(&mut self, col: usize, row: usize, value: T) -> bool {
        debug_assert!(col < self.width && row < self.height);
        let (tile, offset) = self.locate(col, row);
        self.tiles[tile][offset] = value;
        true
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }
}
