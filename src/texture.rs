//! Texture storage for the software compositor
//!
//! Textures are decoded once into two planes: an RGB24 color plane and a
//! one-byte-per-pixel mask plane. The mask is the complement of the source
//! alpha and the color bytes are ANDed with alpha, so a transparent texel
//! is all zeros in color and 0xFF in mask. The blitter relies on that to
//! composite with a plain `(dst & mask) | src`.
//!
//! Only binary alpha (0 or 255) composites correctly. Partial alpha is
//! keyed bit-wise, never blended.

use crate::error::{Result, VideoError};
use crate::util::is_pow2;

/// Opaque handle to a texture in a [`TextureStore`]
///
/// Handles are handed out densely, starting at 0, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(usize);

impl TextureHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decoded texture: RGB24 color plane plus transparency mask
pub struct Texture {
    width: u32,
    height: u32,
    /// Row length of the color plane, in bytes
    stride: usize,
    color: Vec<u8>,
    /// 0xFF = transparent, 0x00 = opaque
    mask: Vec<u8>,
}

impl Texture {
    /// Decode tightly packed RGBA8888 data
    ///
    /// Width and height must be non-zero powers of two and `rgba` must hold
    /// exactly `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        if !is_pow2(width) || !is_pow2(height) {
            return Err(VideoError::InvalidDimension { width, height });
        }
        let pixel_count = width as usize * height as usize;
        if rgba.len() != pixel_count * 4 {
            return Err(VideoError::ArgumentsBad(
                "texture data length doesn't match its dimensions",
            ));
        }

        let mut color = Vec::new();
        color
            .try_reserve_exact(pixel_count * 3)
            .map_err(|_| VideoError::AllocFailed(pixel_count * 3))?;
        let mut mask = Vec::new();
        mask.try_reserve_exact(pixel_count)
            .map_err(|_| VideoError::AllocFailed(pixel_count))?;

        for px in rgba.chunks_exact(4) {
            let a = px[3];
            color.push(px[0] & a);
            color.push(px[1] & a);
            color.push(px[2] & a);
            mask.push(!a);
        }

        Ok(Self {
            width,
            height,
            stride: width as usize * 3,
            color,
            mask,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row of the color plane
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw RGB24 plane, pre-masked by alpha
    #[inline]
    pub fn color_plane(&self) -> &[u8] {
        &self.color
    }

    /// Raw mask plane, one byte per texel
    #[inline]
    pub fn mask_plane(&self) -> &[u8] {
        &self.mask
    }
}

// ============================================================================
// TextureStore
// ============================================================================

/// Owns every loaded texture; handles stay valid for the store's lifetime
#[derive(Default)]
pub struct TextureStore {
    textures: Vec<Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and store an RGBA texture, returning its handle
    ///
    /// The handle equals the number of textures stored before this call.
    /// On failure nothing is stored.
    pub fn load(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<TextureHandle> {
        let texture = Texture::from_rgba(width, height, rgba)?;
        self.textures
            .try_reserve(1)
            .map_err(|_| VideoError::AllocFailed(std::mem::size_of::<Texture>()))?;

        let handle = TextureHandle(self.textures.len());
        self.textures.push(texture);
        log::debug!(
            "Loaded texture {} ({}x{})",
            handle.index(),
            width,
            height
        );
        Ok(handle)
    }

    pub fn get(&self, handle: TextureHandle) -> Result<&Texture> {
        self.textures
            .get(handle.0)
            .ok_or(VideoError::InvalidIndex {
                index: handle.0,
                count: self.textures.len(),
            })
    }

    /// Number of textures loaded so far
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

// ============================================================================
// Procedural RGBA Generators
// ============================================================================

/// Checkerboard of two opaque colors, `tile`-sized squares
pub fn checkerboard_rgba(size: u32, tile: u32, c1: (u8, u8, u8), c2: (u8, u8, u8)) -> Vec<u8> {
    let tile = tile.max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let checker = ((x / tile) + (y / tile)) % 2 == 0;
            let (r, g, b) = if checker { c1 } else { c2 };
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    data
}

/// Filled disc on a fully transparent background
///
/// Handy as a keyed sprite: everything outside the disc has alpha 0.
pub fn disc_rgba(size: u32, color: (u8, u8, u8)) -> Vec<u8> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    let c = size as f32 / 2.0 - 0.5;
    let r2 = (size as f32 / 2.0) * (size as f32 / 2.0);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - c;
            let dy = y as f32 - c;
            if dx * dx + dy * dy <= r2 {
                data.extend_from_slice(&[color.0, color.1, color.2, 255]);
            } else {
                data.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_texture_is_all_keyed() {
        let mut rgba = vec![0u8; 16 * 16 * 4];
        for px in rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&[0x12, 0x34, 0x56, 0x00]);
        }
        let tex = Texture::from_rgba(16, 16, &rgba).unwrap();
        assert!(tex.mask_plane().iter().all(|&m| m == 0xFF));
        assert!(tex.color_plane().iter().all(|&c| c == 0x00));
        assert_eq!(tex.mask_plane().len(), 256);
        assert_eq!(tex.color_plane().len(), 256 * 3);
    }

    #[test]
    fn test_opaque_texel_keeps_color() {
        let tex = Texture::from_rgba(1, 1, &[10, 20, 30, 255]).unwrap();
        assert_eq!(tex.color_plane(), &[10, 20, 30]);
        assert_eq!(tex.mask_plane(), &[0]);
        assert_eq!(tex.stride(), 3);
    }

    #[test]
    fn test_partial_alpha_is_keyed_bitwise() {
        let tex = Texture::from_rgba(1, 1, &[0xFF, 0xF0, 0x0F, 0x3C]).unwrap();
        assert_eq!(tex.color_plane(), &[0x3C, 0x30, 0x0C]);
        assert_eq!(tex.mask_plane(), &[0xC3]);
    }

    #[test]
    fn test_rejects_non_pow2() {
        let rgba = vec![0u8; 3 * 4 * 4];
        assert!(matches!(
            Texture::from_rgba(3, 4, &rgba),
            Err(VideoError::InvalidDimension { width: 3, height: 4 })
        ));
        assert!(matches!(
            Texture::from_rgba(0, 4, &[]),
            Err(VideoError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_rejects_short_data() {
        assert!(matches!(
            Texture::from_rgba(2, 2, &[0; 15]),
            Err(VideoError::ArgumentsBad(_))
        ));
    }

    #[test]
    fn test_store_handles_are_dense() {
        let mut store = TextureStore::new();
        let sizes = [(1, 1), (2, 8), (16, 4), (64, 64)];
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let data = vec![255u8; (w * h * 4) as usize];
            let handle = store.load(&data, w, h).unwrap();
            assert_eq!(handle.index(), i);
            assert_eq!(store.get(handle).unwrap().dimensions(), (w, h));
        }
        assert_eq!(store.len(), sizes.len());
    }

    #[test]
    fn test_failed_load_stores_nothing() {
        let mut store = TextureStore::new();
        assert!(store.load(&[0; 12 * 4], 3, 4).is_err());
        assert!(store.is_empty());
        let handle = store.load(&[0; 4], 1, 1).unwrap();
        assert_eq!(handle.index(), 0);
    }

    #[test]
    fn test_get_out_of_range() {
        let store = TextureStore::new();
        assert!(matches!(
            store.get(TextureHandle(0)),
            Err(VideoError::InvalidIndex { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_disc_corners_are_transparent() {
        let data = disc_rgba(8, (255, 0, 0));
        assert_eq!(&data[0..4], &[0, 0, 0, 0]);
        let center = ((4 * 8 + 4) * 4) as usize;
        assert_eq!(&data[center..center + 4], &[255, 0, 0, 255]);
    }
}
