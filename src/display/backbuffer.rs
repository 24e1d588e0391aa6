use crate::error::{Result, VideoError};

/// Bytes per backbuffer pixel (RGB24, no alpha)
pub const BYTES_PER_PIXEL: usize = 3;

// ============================================================================
// Backbuffer
// ============================================================================

/// RGB24 off-screen render target
///
/// Its size is fixed at creation: windows and resolutions may change around
/// it, but the backbuffer itself never does. Rows are tightly packed, so the
/// stride is always `width * 3`.
pub struct Backbuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl Backbuffer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(VideoError::ArgumentsBad("backbuffer dimensions must be non-zero"));
        }
        let stride = width as usize * BYTES_PER_PIXEL;
        let len = stride * height as usize;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| VideoError::AllocFailed(len))?;
        pixels.resize(len, 0);

        Ok(Self {
            pixels,
            width,
            height,
            stride,
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

    /// Bytes per row
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Size of the whole frame in bytes (`width * height * 3`)
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Byte offset of pixel (x, y)
    #[inline]
    pub(crate) fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * BYTES_PER_PIXEL
    }

    /// Fill every pixel with one color
    pub fn clear(&mut self, r: u8, g: u8, b: u8) {
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Read a pixel (bounds checked)
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]))
        } else {
            None
        }
    }

    /// Write a pixel (bounds checked, silently ignored outside)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx] = r;
            self.pixels[idx + 1] = g;
            self.pixels[idx + 2] = b;
        }
    }

    /// The composited frame, row-major RGB24 without padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Copy the frame into a caller buffer of at least `byte_len()` bytes
    pub fn copy_to(&self, out: &mut [u8]) -> Result<usize> {
        let len = self.pixels.len();
        if out.len() < len {
            return Err(VideoError::BufferTooSmall {
                required: len,
                given: out.len(),
            });
        }
        out[..len].copy_from_slice(&self.pixels);
        Ok(len)
    }

    /// Copy the frame row by row into a host surface with its own pitch
    ///
    /// `pitch` is the host surface's bytes per row and may be larger than
    /// our stride; the padding bytes are left untouched.
    pub fn upload_into(&self, surface: &mut [u8], pitch: usize) -> Result<()> {
        let rows = self.height as usize;
        if pitch < self.stride || surface.len() < pitch * (rows - 1) + self.stride {
            return Err(VideoError::Host(format!(
                "surface of {} bytes (pitch {}) can't hold a {}x{} RGB24 frame",
                surface.len(),
                pitch,
                self.width,
                self.height
            )));
        }

        for (src, dst) in self
            .pixels
            .chunks_exact(self.stride)
            .zip(surface.chunks_mut(pitch))
        {
            dst[..self.stride].copy_from_slice(src);
        }
        Ok(())
    }
}
