//! Tile geometry over a texture
//!
//! The compositor only ever asks three things of a spriteset: which texture
//! it lives in, how big a tile is, and where tile N starts.

use crate::error::{Result, VideoError};
use crate::texture::TextureHandle;

/// Source of tiles for `draw_tile`
pub trait TileSource {
    fn texture(&self) -> TextureHandle;

    /// Tile width and height, in texels
    fn tile_dimensions(&self) -> (u32, u32);

    /// Top-left texel of tile `tile`
    fn tile_position(&self, tile: usize) -> Result<(u32, u32)>;
}

/// Uniform grid of tiles, numbered left to right, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spriteset {
    texture: TextureHandle,
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
}

impl Spriteset {
    /// Cut a `texture_width` x `texture_height` texture into tiles
    ///
    /// Leftover texels on the right/bottom edge that don't make a full tile
    /// are ignored.
    pub fn new(
        texture: TextureHandle,
        texture_width: u32,
        texture_height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(VideoError::ArgumentsBad("tile dimensions must be non-zero"));
        }
        if tile_width > texture_width || tile_height > texture_height {
            return Err(VideoError::ArgumentsBad("tile is larger than its texture"));
        }
        Ok(Self {
            texture,
            columns: texture_width / tile_width,
            rows: texture_height / tile_height,
            tile_width,
            tile_height,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl TileSource for Spriteset {
    fn texture(&self) -> TextureHandle {
        self.texture
    }

    fn tile_dimensions(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    fn tile_position(&self, tile: usize) -> Result<(u32, u32)> {
        if tile >= self.tile_count() {
            return Err(VideoError::InvalidIndex {
                index: tile,
                count: self.tile_count(),
            });
        }
        let columns = self.columns as usize;
        Ok((
            (tile % columns) as u32 * self.tile_width,
            (tile / columns) as u32 * self.tile_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureStore;

    fn handle() -> TextureHandle {
        let mut store = TextureStore::new();
        store.load(&[0; 4], 1, 1).unwrap()
    }

    #[test]
    fn test_tile_positions_row_major() {
        let sset = Spriteset::new(handle(), 64, 32, 16, 16).unwrap();
        assert_eq!(sset.tile_count(), 8);
        assert_eq!(sset.tile_position(0).unwrap(), (0, 0));
        assert_eq!(sset.tile_position(3).unwrap(), (48, 0));
        assert_eq!(sset.tile_position(4).unwrap(), (0, 16));
        assert_eq!(sset.tile_position(7).unwrap(), (48, 16));
    }

    #[test]
    fn test_tile_past_end() {
        let sset = Spriteset::new(handle(), 32, 32, 16, 16).unwrap();
        assert!(matches!(
            sset.tile_position(4),
            Err(VideoError::InvalidIndex { index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_rejects_bad_tiles() {
        assert!(Spriteset::new(handle(), 32, 32, 0, 8).is_err());
        assert!(Spriteset::new(handle(), 32, 32, 64, 8).is_err());
    }
}
