//! Tile blitter
//!
//! Copies one rectangle of a texture into the backbuffer, clipped to the
//! backbuffer edges and optionally mirrored horizontally. Compositing is
//! `dst = (dst & mask) | src`, which is exact for 0/255 alpha and relies
//! on the texture's color plane being pre-masked (see `texture`).

use crate::display::{Backbuffer, BYTES_PER_PIXEL};
use crate::error::{Result, VideoError};
use crate::texture::Texture;

/// Location of a tile inside its texture, in texels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clip this tile, placed at (`dst_x`, `dst_y`), against a
    /// `bbuf_w` x `bbuf_h` target
    ///
    /// A negative destination advances the source origin; a destination
    /// running past the right/bottom edge shortens the source. Returns
    /// `None` when nothing is left to copy.
    pub fn clip(self, dst_x: i32, dst_y: i32, bbuf_w: u32, bbuf_h: u32) -> Option<ClippedBlit> {
        let (mut src_x, mut src_y) = (i64::from(self.x), i64::from(self.y));
        let (mut src_w, mut src_h) = (i64::from(self.width), i64::from(self.height));
        let (mut dst_x, mut dst_y) = (i64::from(dst_x), i64::from(dst_y));
        let (bbuf_w, bbuf_h) = (i64::from(bbuf_w), i64::from(bbuf_h));

        if dst_x < 0 {
            src_x -= dst_x;
            src_w += dst_x;
            dst_x = 0;
        }
        if dst_x + src_w > bbuf_w {
            src_w = bbuf_w - dst_x;
        }
        if dst_y < 0 {
            src_y -= dst_y;
            src_h += dst_y;
            dst_y = 0;
        }
        if dst_y + src_h > bbuf_h {
            src_h = bbuf_h - dst_y;
        }

        if src_w <= 0 || src_h <= 0 || src_x < 0 || src_y < 0 {
            return None;
        }
        Some(ClippedBlit {
            src_x: src_x as usize,
            src_y: src_y as usize,
            dst_x: dst_x as usize,
            dst_y: dst_y as usize,
            width: src_w as usize,
            height: src_h as usize,
        })
    }
}

/// A tile copy that lies entirely inside the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedBlit {
    pub src_x: usize,
    pub src_y: usize,
    pub dst_x: usize,
    pub dst_y: usize,
    pub width: usize,
    pub height: usize,
}

/// Composite one tile into the backbuffer
///
/// Returns how many pixels were written; a tile that is entirely off the
/// backbuffer writes none and is not an error. With `flipped` the source
/// and mask are walked right to left while the destination still goes
/// left to right.
pub fn draw_tile(
    target: &mut Backbuffer,
    texture: &Texture,
    tile: TileRect,
    dst_x: i32,
    dst_y: i32,
    flipped: bool,
) -> Result<usize> {
    let Some(blit) = tile.clip(dst_x, dst_y, target.width(), target.height()) else {
        return Ok(0);
    };
    if blit.src_x + blit.width > texture.width() as usize
        || blit.src_y + blit.height > texture.height() as usize
    {
        return Err(VideoError::ArgumentsBad("tile lies outside its texture"));
    }

    let row_bytes = blit.width * BYTES_PER_PIXEL;
    let dst_stride = target.stride();
    let src_stride = texture.stride();
    let mask_stride = texture.width() as usize;
    let dst_start = target.pixel_index(blit.dst_x as u32, blit.dst_y as u32);
    let color = texture.color_plane();
    let mask = texture.mask_plane();
    let pixels = target.as_bytes_mut();

    for row in 0..blit.height {
        let d = dst_start + row * dst_stride;
        let s = (blit.src_y + row) * src_stride + blit.src_x * BYTES_PER_PIXEL;
        let m = (blit.src_y + row) * mask_stride + blit.src_x;

        let dst_row = &mut pixels[d..d + row_bytes];
        let src_row = &color[s..s + row_bytes];
        let mask_row = &mask[m..m + blit.width];

        if flipped {
            let src_px = src_row.chunks_exact(BYTES_PER_PIXEL).rev();
            let mask_px = mask_row.iter().rev();
            for ((dst, src), &key) in dst_row
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(src_px)
                .zip(mask_px)
            {
                composite(dst, src, key);
            }
        } else {
            for ((dst, src), &key) in dst_row
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(src_row.chunks_exact(BYTES_PER_PIXEL))
                .zip(mask_row)
            {
                composite(dst, src, key);
            }
        }
    }

    Ok(blit.width * blit.height)
}

#[inline]
fn composite(dst: &mut [u8], src: &[u8], key: u8) {
    dst[0] = (dst[0] & key) | src[0];
    dst[1] = (dst[1] & key) | src[1];
    dst[2] = (dst[2] & key) | src[2];
}
