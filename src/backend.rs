//! Video backend table and the software (CPU) implementation
//!
//! [`VideoBackend`] is the full set of entry points the engine calls; any
//! backend, software or GPU, implements the same trait and is picked once
//! through [`create_backend`]. [`SoftwareBackend`] composites every tile
//! on the CPU into an RGB24 backbuffer and hands the finished frame to a
//! [`Host`] for scaled, letterboxed presentation.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::blit::{self, TileRect};
use crate::display::{
    Backbuffer, DisplayState, Host, InputEvent, Resolution, Rgba, Viewport, WindowSettings,
};
use crate::error::{Result, VideoError};
use crate::spriteset::TileSource;
use crate::texture::{Texture, TextureHandle, TextureStore};
use crate::util::FrameClock;

/// Opaque black, the background after window creation
pub const DEFAULT_BACKGROUND: u32 = 0xFF00_0000;

/// Frames averaged by the frame clock
const CLOCK_SAMPLES: usize = 60;

/// Which implementation `create_backend` builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum BackendKind {
    /// CPU compositor
    #[default]
    Software,
}

/// Draw statistics for the previous frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawInfo {
    /// Draw calls sent to the host (one per object, nothing is batched)
    pub batched: usize,
    /// Objects drawn
    pub sprites: usize,
}

/// Entry points every video backend provides
///
/// Initialization is construction (see [`create_backend`]) and teardown is
/// `Drop`.
pub trait VideoBackend {
    fn count_resolutions(&self) -> usize;

    fn resolution(&self, index: usize) -> Result<Resolution>;

    fn init_window(
        &mut self,
        width: u32,
        height: u32,
        bbuf_width: u32,
        bbuf_height: u32,
        title: &str,
        resizable: bool,
        vsync: bool,
    ) -> Result<()>;

    fn init_window_fullscreen(
        &mut self,
        resolution: usize,
        bbuf_width: u32,
        bbuf_height: u32,
        title: &str,
        resizable: bool,
        vsync: bool,
    ) -> Result<()>;

    fn set_dimensions(&mut self, width: u32, height: u32) -> Result<()>;

    fn dimensions(&self) -> Result<(u32, u32)>;

    fn set_fullscreen(&mut self) -> Result<()>;

    fn set_windowed(&mut self) -> Result<()>;

    fn set_resolution(&mut self, index: usize) -> Result<()>;

    fn backbuffer_dimensions(&self) -> Result<(u32, u32)>;

    fn window_to_backbuffer(&self, x: i32, y: i32) -> Result<(i32, i32)>;

    /// Background as `0xAARRGGBB`
    fn set_background_color(&mut self, color: u32) -> Result<()>;

    /// Load tightly packed RGBA8888 pixels
    fn load_texture(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<TextureHandle>;

    fn draw_begin(&mut self) -> Result<()>;

    /// Draw tile `tile` of `sset` with its top-left corner at (`x`, `y`)
    fn draw_tile(
        &mut self,
        sset: &dyn TileSource,
        x: i32,
        y: i32,
        tile: i32,
        flipped: bool,
    ) -> Result<()>;

    fn draw_rectangle(&mut self, x: i32, y: i32, width: u32, height: u32, color: u32)
        -> Result<()>;

    fn draw_fill_rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: u32,
    ) -> Result<()>;

    /// Two-phase read-back of the composited frame
    ///
    /// With `None` returns the size needed; with a buffer copies the frame
    /// (RGB24, no padding) and returns the bytes written.
    fn backbuffer_data(&self, out: Option<&mut [u8]>) -> Result<usize>;

    fn draw_end(&mut self) -> Result<()>;

    fn texture(&self, handle: TextureHandle) -> Result<&Texture>;

    fn texture_dimensions(&self, texture: &Texture) -> (u32, u32);

    fn draw_info(&self) -> Result<DrawInfo>;

    /// Presentation timestamps
    fn frame_clock(&self) -> &FrameClock;

    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// Build the backend `kind` on top of `host`
pub fn create_backend<H: Host + 'static>(
    kind: BackendKind,
    host: H,
) -> Result<Box<dyn VideoBackend>> {
    match kind {
        BackendKind::Software => Ok(Box::new(SoftwareBackend::new(host)?)),
    }
}

fn warned(err: VideoError) -> VideoError {
    log::warn!("{}", err);
    err
}

// ============================================================================
// SoftwareBackend
// ============================================================================

pub struct SoftwareBackend<H: Host> {
    host: H,
    textures: TextureStore,
    /// Allocated with the window, fixed size from then on
    backbuffer: Option<Backbuffer>,
    display: DisplayState,
    background: Rgba,
    /// Objects drawn since the last `draw_begin`
    total_objects: usize,
    /// Objects drawn in the previous frame
    last_objects: usize,
    clock: FrameClock,
}

impl<H: Host> SoftwareBackend<H> {
    /// Read the host display's defaults; no window is opened yet
    pub fn new(mut host: H) -> Result<Self> {
        log::info!("Initializing software video backend");
        let display = DisplayState::query(&mut host)?;
        Ok(Self {
            host,
            textures: TextureStore::new(),
            backbuffer: None,
            display,
            background: Rgba::from_argb(DEFAULT_BACKGROUND),
            total_objects: 0,
            last_objects: 0,
            clock: FrameClock::new(CLOCK_SAMPLES),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Zoom and output rectangle in use, once a window exists
    pub fn viewport(&self) -> Option<Viewport> {
        self.display.viewport()
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    fn window_created(&mut self, backbuffer: Backbuffer) {
        self.backbuffer = Some(backbuffer);
        self.background = Rgba::from_argb(DEFAULT_BACKGROUND);
    }

    fn backbuffer(&self) -> Result<&Backbuffer> {
        self.backbuffer
            .as_ref()
            .ok_or(VideoError::BackbufferNotInitialized)
    }
}

impl<H: Host> VideoBackend for SoftwareBackend<H> {
    fn count_resolutions(&self) -> usize {
        self.display.resolution_count()
    }

    fn resolution(&self, index: usize) -> Result<Resolution> {
        self.display.resolution(index).map_err(warned)
    }

    fn init_window(
        &mut self,
        width: u32,
        height: u32,
        bbuf_width: u32,
        bbuf_height: u32,
        title: &str,
        resizable: bool,
        vsync: bool,
    ) -> Result<()> {
        let backbuffer = self
            .display
            .create_window(
                &mut self.host,
                width,
                height,
                bbuf_width,
                bbuf_height,
                WindowSettings {
                    title,
                    resizable,
                    vsync,
                },
            )
            .map_err(warned)?;
        self.window_created(backbuffer);
        Ok(())
    }

    fn init_window_fullscreen(
        &mut self,
        resolution: usize,
        bbuf_width: u32,
        bbuf_height: u32,
        title: &str,
        resizable: bool,
        vsync: bool,
    ) -> Result<()> {
        let backbuffer = self
            .display
            .create_fullscreen_window(
                &mut self.host,
                resolution,
                bbuf_width,
                bbuf_height,
                WindowSettings {
                    title,
                    resizable,
                    vsync,
                },
            )
            .map_err(warned)?;
        self.window_created(backbuffer);
        Ok(())
    }

    fn set_dimensions(&mut self, width: u32, height: u32) -> Result<()> {
        self.display
            .set_dimensions(&mut self.host, width, height)
            .map_err(warned)
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        self.display.dimensions()
    }

    fn set_fullscreen(&mut self) -> Result<()> {
        self.display.set_fullscreen(&mut self.host).map_err(warned)
    }

    fn set_windowed(&mut self) -> Result<()> {
        self.display.set_windowed(&mut self.host).map_err(warned)
    }

    fn set_resolution(&mut self, index: usize) -> Result<()> {
        self.display
            .set_resolution(&mut self.host, index)
            .map_err(warned)
    }

    fn backbuffer_dimensions(&self) -> Result<(u32, u32)> {
        self.display.backbuffer_dimensions()
    }

    fn window_to_backbuffer(&self, x: i32, y: i32) -> Result<(i32, i32)> {
        self.display.window_to_backbuffer(x, y)
    }

    fn set_background_color(&mut self, color: u32) -> Result<()> {
        self.background = Rgba::from_argb(color);
        log::debug!("Background color set to 0x{:08X}", color);
        Ok(())
    }

    fn load_texture(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<TextureHandle> {
        self.textures.load(rgba, width, height).map_err(warned)
    }

    fn draw_begin(&mut self) -> Result<()> {
        let bg = self.background;
        let backbuffer = self
            .backbuffer
            .as_mut()
            .ok_or(VideoError::BackbufferNotInitialized)
            .map_err(warned)?;
        backbuffer.clear(bg.r, bg.g, bg.b);

        self.last_objects = self.total_objects;
        self.total_objects = 0;
        Ok(())
    }

    fn draw_tile(
        &mut self,
        sset: &dyn TileSource,
        x: i32,
        y: i32,
        tile: i32,
        flipped: bool,
    ) -> Result<()> {
        let index = usize::try_from(tile)
            .map_err(|_| warned(VideoError::ArgumentsBad("negative tile index")))?;
        let backbuffer = self
            .backbuffer
            .as_mut()
            .ok_or(VideoError::BackbufferNotInitialized)
            .map_err(warned)?;
        let texture = self.textures.get(sset.texture()).map_err(warned)?;

        let (tile_w, tile_h) = sset.tile_dimensions();
        let (src_x, src_y) = sset.tile_position(index).map_err(warned)?;
        let rect = TileRect::new(src_x as i32, src_y as i32, tile_w as i32, tile_h as i32);
        blit::draw_tile(backbuffer, texture, rect, x, y, flipped).map_err(warned)?;

        self.total_objects += 1;
        Ok(())
    }

    fn draw_rectangle(
        &mut self,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
        _color: u32,
    ) -> Result<()> {
        Err(VideoError::NotImplemented)
    }

    fn draw_fill_rectangle(
        &mut self,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
        _color: u32,
    ) -> Result<()> {
        Err(VideoError::NotImplemented)
    }

    fn backbuffer_data(&self, out: Option<&mut [u8]>) -> Result<usize> {
        let backbuffer = self.backbuffer().map_err(warned)?;
        match out {
            None => Ok(backbuffer.byte_len()),
            Some(buf) => backbuffer.copy_to(buf).map_err(warned),
        }
    }

    fn draw_end(&mut self) -> Result<()> {
        let (Some(backbuffer), Some(viewport)) = (self.backbuffer.as_ref(), self.display.viewport())
        else {
            return Err(warned(VideoError::BackbufferNotInitialized));
        };

        // Letterbox border is black; only the background's alpha carries over
        let border = Rgba::new(0, 0, 0, self.background.a);
        self.host.present(border, viewport.out, &mut |surface, pitch| {
            backbuffer.upload_into(surface, pitch)
        })
        .map_err(warned)?;

        self.clock.stamp(Instant::now());
        Ok(())
    }

    fn texture(&self, handle: TextureHandle) -> Result<&Texture> {
        self.textures.get(handle)
    }

    fn texture_dimensions(&self, texture: &Texture) -> (u32, u32) {
        texture.dimensions()
    }

    fn draw_info(&self) -> Result<DrawInfo> {
        self.backbuffer()?;
        Ok(DrawInfo {
            batched: self.last_objects,
            sprites: self.last_objects,
        })
    }

    fn frame_clock(&self) -> &FrameClock {
        &self.clock
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.host.poll_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::HeadlessHost;
    use crate::spriteset::Spriteset;

    fn backend() -> SoftwareBackend<HeadlessHost> {
        let host = HeadlessHost::new(vec![
            Resolution::new(1920, 1080, 60),
            Resolution::new(800, 600, 60),
        ]);
        SoftwareBackend::new(host).unwrap()
    }

    fn sprite(backend: &mut SoftwareBackend<HeadlessHost>) -> Spriteset {
        let handle = backend.load_texture(&[200u8; 8 * 8 * 4], 8, 8).unwrap();
        Spriteset::new(handle, 8, 8, 4, 4).unwrap()
    }

    #[test]
    fn test_drawing_needs_a_window() {
        let mut backend = backend();
        let sset = sprite(&mut backend);
        assert!(matches!(
            backend.draw_begin(),
            Err(VideoError::BackbufferNotInitialized)
        ));
        assert!(matches!(
            backend.draw_tile(&sset, 0, 0, 0, false),
            Err(VideoError::BackbufferNotInitialized)
        ));
        assert!(matches!(
            backend.draw_end(),
            Err(VideoError::BackbufferNotInitialized)
        ));
        assert!(matches!(
            backend.backbuffer_data(None),
            Err(VideoError::BackbufferNotInitialized)
        ));
        assert!(matches!(
            backend.draw_info(),
            Err(VideoError::BackbufferNotInitialized)
        ));
    }

    #[test]
    fn test_negative_tile_rejected() {
        let mut backend = backend();
        let sset = sprite(&mut backend);
        backend
            .init_window(640, 480, 320, 240, "t", false, false)
            .unwrap();
        backend.draw_begin().unwrap();
        assert!(matches!(
            backend.draw_tile(&sset, 0, 0, -1, false),
            Err(VideoError::ArgumentsBad(_))
        ));
        assert!(matches!(
            backend.draw_tile(&sset, 0, 0, 4, false),
            Err(VideoError::InvalidIndex { index: 4, count: 4 })
        ));
        backend.draw_begin().unwrap();
        assert_eq!(backend.draw_info().unwrap().sprites, 0);
    }

    #[test]
    fn test_rectangles_not_implemented() {
        let mut backend = backend();
        backend
            .init_window(640, 480, 320, 240, "t", false, false)
            .unwrap();
        assert!(matches!(
            backend.draw_rectangle(0, 0, 10, 10, 0xFFFF_FFFF),
            Err(VideoError::NotImplemented)
        ));
        assert!(matches!(
            backend.draw_fill_rectangle(0, 0, 10, 10, 0xFFFF_FFFF),
            Err(VideoError::NotImplemented)
        ));
    }

    #[test]
    fn test_draw_begin_clears_to_background() {
        let mut backend = backend();
        backend
            .init_window(640, 480, 320, 240, "t", false, false)
            .unwrap();
        backend.set_background_color(0x80_11_22_33).unwrap();
        backend.draw_begin().unwrap();
        let bb = backend.backbuffer.as_ref().unwrap();
        assert_eq!(bb.get_pixel(0, 0), Some((0x11, 0x22, 0x33)));
        assert_eq!(bb.get_pixel(319, 239), Some((0x11, 0x22, 0x33)));
    }

    #[test]
    fn test_draw_end_border_and_clock() {
        let mut backend = backend();
        backend
            .init_window(1000, 700, 320, 240, "t", false, false)
            .unwrap();
        backend.set_background_color(0x7F_FF_FF_FF).unwrap();
        backend.draw_begin().unwrap();
        backend.draw_end().unwrap();

        assert_eq!(backend.frame_clock().frame_count(), 1);
        assert!(backend.frame_clock().last_present().is_some());
        assert_eq!(backend.host().last_border(), Some(Rgba::new(0, 0, 0, 0x7F)));
        assert_eq!(backend.host().last_out(), Some(backend.viewport().unwrap().out));
    }

    #[test]
    fn test_backend_kind_serde() {
        assert_eq!(
            serde_json::to_string(&BackendKind::Software).unwrap(),
            "\"software\""
        );
        let kind: BackendKind = serde_json::from_str("\"software\"").unwrap();
        assert_eq!(kind, BackendKind::Software);
    }

    #[test]
    fn test_factory_builds_software() {
        let host = HeadlessHost::new(vec![Resolution::new(640, 480, 60)]);
        let backend = create_backend(BackendKind::Software, host).unwrap();
        assert_eq!(backend.count_resolutions(), 1);
    }
}
