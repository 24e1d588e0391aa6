//! Window and display-mode state
//!
//! Tracks the device size, the enumerated fullscreen resolutions, the
//! windowed size and the current mode, and derives the integer zoom and
//! centered output rectangle the compositor presents into. Every
//! transition validates first, then talks to the host, then commits, so a
//! rejected change leaves the previous state in place.

use super::backbuffer::Backbuffer;
use super::host::{Host, WindowRequest};
use crate::error::{Result, VideoError};

/// Largest window dimension accepted by `create_window`
pub const MAX_WINDOW_DIMENSION: u32 = 16384;

/// One enumerated display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32, refresh_rate: u32) -> Self {
        Self {
            width,
            height,
            refresh_rate,
        }
    }
}

/// Where the scaled backbuffer lands inside the window, in window pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Integer zoom plus the letterboxed output rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub zoom: u32,
    pub out: OutRect,
}

impl Viewport {
    /// Fit a backbuffer into a `width` x `height` window
    ///
    /// Zoom is the largest integer for which the scaled backbuffer fits on
    /// both axes; the result is centered with integer division.
    pub fn fit(bbuf_w: u32, bbuf_h: u32, width: u32, height: u32) -> Result<Self> {
        if bbuf_w == 0 || bbuf_h == 0 {
            return Err(VideoError::ArgumentsBad("backbuffer dimensions must be non-zero"));
        }
        let zoom = (width / bbuf_w).min(height / bbuf_h);
        if zoom == 0 {
            return Err(VideoError::BackbufferWindowTooSmall { width, height });
        }

        let out_w = bbuf_w * zoom;
        let out_h = bbuf_h * zoom;
        Ok(Self {
            zoom,
            out: OutRect {
                x: ((width - out_w) / 2) as i32,
                y: ((height - out_h) / 2) as i32,
                width: out_w,
                height: out_h,
            },
        })
    }

    /// Map a window-space point into backbuffer space
    ///
    /// Division truncates toward zero; points on the letterbox border land
    /// outside the backbuffer. Computed in i64 and saturated, so any `i32`
    /// input is accepted.
    #[inline]
    pub fn window_to_backbuffer(&self, x: i32, y: i32) -> (i32, i32) {
        let zoom = i64::from(self.zoom);
        let map = |p: i32, origin: i32| {
            let v = (i64::from(p) - i64::from(origin)) / zoom;
            v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        };
        (map(x, self.out.x), map(y, self.out.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    NoWindow,
    Windowed,
    Fullscreen,
}

/// Window options that don't affect geometry
#[derive(Debug, Clone, Copy)]
pub struct WindowSettings<'a> {
    pub title: &'a str,
    pub resizable: bool,
    pub vsync: bool,
}

// ============================================================================
// DisplayState
// ============================================================================

pub struct DisplayState {
    device_width: u32,
    device_height: u32,
    resolutions: Vec<Resolution>,
    current_resolution: usize,
    /// Size used while windowed (cached while fullscreen)
    window_width: u32,
    window_height: u32,
    mode: WindowMode,
    backbuffer_width: u32,
    backbuffer_height: u32,
    viewport: Option<Viewport>,
}

impl DisplayState {
    /// Read the device defaults and the resolution list from the host
    ///
    /// Resolution 0 is the device's native mode and gives the device size.
    pub fn query(host: &mut dyn Host) -> Result<Self> {
        let resolutions = host.display_modes()?;
        let native = *resolutions
            .first()
            .ok_or_else(|| VideoError::Host("no display modes reported".to_string()))?;

        log::info!(
            "Main display dimensions: {} x {}",
            native.width,
            native.height
        );
        log::info!("Number of available resolutions: {}", resolutions.len());

        Ok(Self {
            device_width: native.width,
            device_height: native.height,
            resolutions,
            current_resolution: 0,
            window_width: 0,
            window_height: 0,
            mode: WindowMode::NoWindow,
            backbuffer_width: 0,
            backbuffer_height: 0,
            viewport: None,
        })
    }

    pub fn device_dimensions(&self) -> (u32, u32) {
        (self.device_width, self.device_height)
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    pub fn resolution(&self, index: usize) -> Result<Resolution> {
        let res = self.resolution_at(index)?;
        log::debug!(
            "Resolution {}: {} x {} @ {}Hz",
            index,
            res.width,
            res.height,
            res.refresh_rate
        );
        Ok(res)
    }

    fn resolution_at(&self, index: usize) -> Result<Resolution> {
        self.resolutions
            .get(index)
            .copied()
            .ok_or(VideoError::InvalidIndex {
                index,
                count: self.resolutions.len(),
            })
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.mode == WindowMode::Fullscreen
    }

    pub fn current_resolution(&self) -> usize {
        self.current_resolution
    }

    /// Current zoom and output rectangle, once a window exists
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn clamp_to_device(&self, width: u32, height: u32) -> (u32, u32) {
        (width.min(self.device_width), height.min(self.device_height))
    }

    fn require_window(&self) -> Result<()> {
        if self.mode == WindowMode::NoWindow {
            return Err(VideoError::WindowNotInitialized);
        }
        Ok(())
    }

    fn fit(&self, width: u32, height: u32) -> Result<Viewport> {
        Viewport::fit(self.backbuffer_width, self.backbuffer_height, width, height)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        log::info!(
            "Backbuffer position: {} x {}",
            viewport.out.x,
            viewport.out.y
        );
        log::info!(
            "Backbuffer resized dimensions: {} x {}",
            viewport.out.width,
            viewport.out.height
        );
        log::info!("Backbuffer scaling ratio: {} times", viewport.zoom);
        self.viewport = Some(viewport);
    }

    /// Validate a new window and allocate its backbuffer
    ///
    /// Returns the clamped window size, its viewport and the backbuffer.
    fn prepare_window(
        &self,
        width: u32,
        height: u32,
        bbuf_w: u32,
        bbuf_h: u32,
    ) -> Result<(u32, u32, Viewport, Backbuffer)> {
        if self.mode != WindowMode::NoWindow {
            return Err(VideoError::WindowAlreadyInitialized);
        }
        let (width, height) = self.clamp_to_device(width, height);
        if bbuf_w > width {
            return Err(VideoError::BackbufferWidthInvalid {
                backbuffer: bbuf_w,
                window: width,
            });
        }
        if bbuf_h > height {
            return Err(VideoError::BackbufferHeightInvalid {
                backbuffer: bbuf_h,
                window: height,
            });
        }
        let viewport = Viewport::fit(bbuf_w, bbuf_h, width, height)?;
        let backbuffer = Backbuffer::new(bbuf_w, bbuf_h)?;
        Ok((width, height, viewport, backbuffer))
    }

    fn commit_window(
        &mut self,
        mode: WindowMode,
        width: u32,
        height: u32,
        backbuffer: &Backbuffer,
    ) {
        self.mode = mode;
        self.window_width = width;
        self.window_height = height;
        self.backbuffer_width = backbuffer.width();
        self.backbuffer_height = backbuffer.height();
    }

    /// Create the (only) window in windowed mode
    ///
    /// The size is clamped to the device; the backbuffer must fit inside the
    /// clamped window. The fullscreen resolution resets to the native one.
    pub fn create_window(
        &mut self,
        host: &mut dyn Host,
        width: u32,
        height: u32,
        bbuf_w: u32,
        bbuf_h: u32,
        settings: WindowSettings<'_>,
    ) -> Result<Backbuffer> {
        if width == 0 || height == 0 {
            return Err(VideoError::ArgumentsBad("window dimensions must be non-zero"));
        }
        if width > MAX_WINDOW_DIMENSION || height > MAX_WINDOW_DIMENSION {
            return Err(VideoError::ArgumentsBad("window dimensions above 16384"));
        }
        let (width, height, viewport, backbuffer) =
            self.prepare_window(width, height, bbuf_w, bbuf_h)?;

        log::info!("Initializing game in windowed mode");
        log::info!(
            "Creating {} x {} window{}...",
            width,
            height,
            if settings.vsync { " with VSYNC" } else { "" }
        );
        host.create_window(&WindowRequest {
            title: settings.title,
            width,
            height,
            backbuffer_width: bbuf_w,
            backbuffer_height: bbuf_h,
            resizable: settings.resizable,
            vsync: settings.vsync,
            fullscreen: false,
            display_mode: None,
        })?;

        self.commit_window(WindowMode::Windowed, width, height, &backbuffer);
        self.current_resolution = 0;
        self.set_viewport(viewport);
        Ok(backbuffer)
    }

    /// Create the (only) window directly in fullscreen, at resolution `index`
    ///
    /// The windowed size used after switching back defaults to the device
    /// size. The window and its display mode come from a single host call,
    /// so a failure leaves neither behind.
    pub fn create_fullscreen_window(
        &mut self,
        host: &mut dyn Host,
        index: usize,
        bbuf_w: u32,
        bbuf_h: u32,
        settings: WindowSettings<'_>,
    ) -> Result<Backbuffer> {
        let res = self.resolution_at(index)?;
        let (width, height, _, backbuffer) =
            self.prepare_window(self.device_width, self.device_height, bbuf_w, bbuf_h)?;
        let viewport = Viewport::fit(bbuf_w, bbuf_h, res.width, res.height)?;

        log::info!("Initializing game in fullscreen mode");
        host.create_window(&WindowRequest {
            title: settings.title,
            width,
            height,
            backbuffer_width: bbuf_w,
            backbuffer_height: bbuf_h,
            resizable: settings.resizable,
            vsync: settings.vsync,
            fullscreen: true,
            display_mode: Some(index),
        })?;
        log::info!(
            "Fullscreen resolution set to {} x {} @ {}Hz",
            res.width,
            res.height,
            res.refresh_rate
        );

        self.commit_window(WindowMode::Fullscreen, width, height, &backbuffer);
        self.current_resolution = index;
        self.set_viewport(viewport);
        Ok(backbuffer)
    }

    /// Resize the window
    ///
    /// While fullscreen the new size is only cached and takes effect when
    /// switching back to windowed mode.
    pub fn set_dimensions(&mut self, host: &mut dyn Host, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(VideoError::ArgumentsBad("window dimensions must be non-zero"));
        }
        self.require_window()?;

        let (width, height) = self.clamp_to_device(width, height);
        let viewport = self.fit(width, height)?;
        host.set_window_size(width, height)?;

        if self.mode == WindowMode::Windowed {
            self.set_viewport(viewport);
        }
        log::info!("Window dimensions set to {} x {}", width, height);
        self.window_width = width;
        self.window_height = height;
        Ok(())
    }

    /// Window size, or the current resolution's size while fullscreen
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        match self.mode {
            WindowMode::NoWindow => Err(VideoError::WindowNotInitialized),
            WindowMode::Windowed => Ok((self.window_width, self.window_height)),
            WindowMode::Fullscreen => {
                let res = self.resolution_at(self.current_resolution)?;
                Ok((res.width, res.height))
            },
        }
    }

    pub fn set_fullscreen(&mut self, host: &mut dyn Host) -> Result<()> {
        self.require_window()?;
        if self.mode == WindowMode::Fullscreen {
            return Err(VideoError::WindowModeUnchanged);
        }
        let res = self.resolution_at(self.current_resolution)?;
        let viewport = self.fit(res.width, res.height)?;

        host.set_fullscreen(true)?;
        self.mode = WindowMode::Fullscreen;
        log::info!("Just switched to fullscreen mode");
        self.set_viewport(viewport);
        Ok(())
    }

    pub fn set_windowed(&mut self, host: &mut dyn Host) -> Result<()> {
        self.require_window()?;
        if self.mode == WindowMode::Windowed {
            return Err(VideoError::WindowModeUnchanged);
        }
        let viewport = self.fit(self.window_width, self.window_height)?;

        host.set_fullscreen(false)?;
        self.mode = WindowMode::Windowed;
        log::info!("Just switched to windowed mode");
        self.set_viewport(viewport);
        Ok(())
    }

    /// Pick the resolution used in fullscreen
    ///
    /// Applied right away if already fullscreen, otherwise on the next
    /// switch.
    pub fn set_resolution(&mut self, host: &mut dyn Host, index: usize) -> Result<()> {
        let res = self.resolution_at(index)?;
        self.require_window()?;
        let viewport = self.fit(res.width, res.height)?;

        host.set_display_mode(index)?;
        log::info!(
            "Fullscreen resolution set to {} x {} @ {}Hz",
            res.width,
            res.height,
            res.refresh_rate
        );

        if self.mode == WindowMode::Fullscreen {
            self.set_viewport(viewport);
        }
        self.current_resolution = index;
        Ok(())
    }

    pub fn backbuffer_dimensions(&self) -> Result<(u32, u32)> {
        self.require_window()?;
        Ok((self.backbuffer_width, self.backbuffer_height))
    }

    pub fn window_to_backbuffer(&self, x: i32, y: i32) -> Result<(i32, i32)> {
        self.viewport
            .map(|vp| vp.window_to_backbuffer(x, y))
            .ok_or(VideoError::BackbufferNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::HeadlessHost;

    const SETTINGS: WindowSettings<'static> = WindowSettings {
        title: "test",
        resizable: false,
        vsync: false,
    };

    fn host() -> HeadlessHost {
        HeadlessHost::new(vec![
            Resolution::new(1920, 1080, 60),
            Resolution::new(1280, 720, 60),
            Resolution::new(640, 480, 75),
            Resolution::new(300, 200, 60),
        ])
    }

    #[test]
    fn test_fit_exact_multiple() {
        let vp = Viewport::fit(320, 240, 960, 720).unwrap();
        assert_eq!(vp.zoom, 3);
        assert_eq!(
            vp.out,
            OutRect {
                x: 0,
                y: 0,
                width: 960,
                height: 720
            }
        );
    }

    #[test]
    fn test_fit_limited_by_height() {
        let vp = Viewport::fit(320, 240, 1000, 700).unwrap();
        assert_eq!(vp.zoom, 2);
        assert_eq!(
            vp.out,
            OutRect {
                x: 180,
                y: 110,
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn test_fit_is_greatest_zoom() {
        for (w, h) in [(320, 240), (641, 999), (1919, 1080), (5000, 250), (333, 481)] {
            let vp = Viewport::fit(320, 240, w, h).unwrap();
            assert!(320 * vp.zoom <= w && 240 * vp.zoom <= h);
            assert!(320 * (vp.zoom + 1) > w || 240 * (vp.zoom + 1) > h);
            assert_eq!(vp.out.x as u32, (w - 320 * vp.zoom) / 2);
            assert_eq!(vp.out.y as u32, (h - 240 * vp.zoom) / 2);
        }
    }

    #[test]
    fn test_fit_too_small() {
        assert!(matches!(
            Viewport::fit(320, 240, 319, 1000),
            Err(VideoError::BackbufferWindowTooSmall { .. })
        ));
    }

    #[test]
    fn test_window_to_backbuffer_mapping() {
        let vp = Viewport::fit(320, 240, 1000, 700).unwrap();
        assert_eq!(vp.window_to_backbuffer(180, 110), (0, 0));
        assert_eq!(vp.window_to_backbuffer(181, 111), (0, 0));
        assert_eq!(vp.window_to_backbuffer(182, 112), (1, 1));
        assert_eq!(vp.window_to_backbuffer(180 + 639, 110 + 479), (319, 239));
        assert_eq!(vp.window_to_backbuffer(0, 0), (-90, -55));
    }

    #[test]
    fn test_window_to_backbuffer_extremes() {
        let vp = Viewport::fit(320, 240, 1000, 700).unwrap();
        let low = vp.window_to_backbuffer(i32::MIN, i32::MIN);
        assert_eq!(
            low,
            (
                ((i64::from(i32::MIN) - 180) / 2) as i32,
                ((i64::from(i32::MIN) - 110) / 2) as i32
            )
        );
        let high = vp.window_to_backbuffer(i32::MAX, i32::MAX);
        assert_eq!(high, ((i32::MAX - 180) / 2, (i32::MAX - 110) / 2));

        // Zoom 1 with an origin of 0 still can't leave the i32 range
        let vp = Viewport::fit(320, 240, 320, 240).unwrap();
        assert_eq!(
            vp.window_to_backbuffer(i32::MIN, i32::MAX),
            (i32::MIN, i32::MAX)
        );
    }

    #[test]
    fn test_query_uses_first_mode_as_device() {
        let mut host = host();
        let state = DisplayState::query(&mut host).unwrap();
        assert_eq!(state.device_dimensions(), (1920, 1080));
        assert_eq!(state.resolution_count(), 4);
        assert_eq!(state.resolution(2).unwrap(), Resolution::new(640, 480, 75));
        assert!(matches!(
            state.resolution(4),
            Err(VideoError::InvalidIndex { index: 4, count: 4 })
        ));
        assert_eq!(state.mode(), WindowMode::NoWindow);
    }

    #[test]
    fn test_create_window_clamps_to_device() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        let bb = state
            .create_window(&mut host, 4000, 700, 320, 240, SETTINGS)
            .unwrap();
        assert_eq!((bb.width(), bb.height()), (320, 240));
        assert_eq!(state.dimensions().unwrap(), (1920, 700));
        assert_eq!(state.viewport().unwrap().zoom, 2);
        assert_eq!(host.window_size(), Some((1920, 700)));
    }

    #[test]
    fn test_create_window_backbuffer_must_fit() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        assert!(matches!(
            state.create_window(&mut host, 300, 700, 320, 240, SETTINGS),
            Err(VideoError::BackbufferWidthInvalid { .. })
        ));
        assert!(matches!(
            state.create_window(&mut host, 640, 200, 320, 240, SETTINGS),
            Err(VideoError::BackbufferHeightInvalid { .. })
        ));
        assert_eq!(state.mode(), WindowMode::NoWindow);
        assert_eq!(host.window_size(), None);
    }

    #[test]
    fn test_create_window_twice() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        state
            .create_window(&mut host, 640, 480, 320, 240, SETTINGS)
            .unwrap();
        assert!(matches!(
            state.create_window(&mut host, 640, 480, 320, 240, SETTINGS),
            Err(VideoError::WindowAlreadyInitialized)
        ));
    }

    #[test]
    fn test_resize_deferred_while_fullscreen() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        state
            .create_window(&mut host, 640, 480, 320, 240, SETTINGS)
            .unwrap();
        state.set_resolution(&mut host, 1).unwrap();
        state.set_fullscreen(&mut host).unwrap();
        assert_eq!(state.dimensions().unwrap(), (1280, 720));
        assert_eq!(state.viewport().unwrap().zoom, 3);

        state.set_dimensions(&mut host, 960, 720).unwrap();
        assert_eq!(state.viewport().unwrap().zoom, 3);
        assert_eq!(state.viewport().unwrap().out.x, 160);

        state.set_windowed(&mut host).unwrap();
        assert_eq!(state.dimensions().unwrap(), (960, 720));
        assert_eq!(state.viewport().unwrap().out.x, 0);
    }

    #[test]
    fn test_mode_unchanged() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        assert!(matches!(
            state.set_fullscreen(&mut host),
            Err(VideoError::WindowNotInitialized)
        ));
        state
            .create_window(&mut host, 640, 480, 320, 240, SETTINGS)
            .unwrap();
        assert!(matches!(
            state.set_windowed(&mut host),
            Err(VideoError::WindowModeUnchanged)
        ));
        state.set_fullscreen(&mut host).unwrap();
        assert!(matches!(
            state.set_fullscreen(&mut host),
            Err(VideoError::WindowModeUnchanged)
        ));
    }

    #[test]
    fn test_small_resolution_rejected_and_state_kept() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        state
            .create_fullscreen_window(&mut host, 2, 320, 240, SETTINGS)
            .unwrap();
        let before = state.viewport();
        assert!(matches!(
            state.set_resolution(&mut host, 3),
            Err(VideoError::BackbufferWindowTooSmall {
                width: 300,
                height: 200
            })
        ));
        assert_eq!(state.current_resolution(), 2);
        assert_eq!(state.viewport(), before);
        assert_eq!(host.display_mode(), Some(2));
    }

    #[test]
    fn test_fullscreen_window_caches_device_size() {
        let mut host = host();
        let mut state = DisplayState::query(&mut host).unwrap();
        state
            .create_fullscreen_window(&mut host, 2, 320, 240, SETTINGS)
            .unwrap();
        assert!(state.is_fullscreen());
        assert_eq!(state.dimensions().unwrap(), (640, 480));
        assert_eq!(state.viewport().unwrap().zoom, 2);

        state.set_windowed(&mut host).unwrap();
        assert_eq!(state.dimensions().unwrap(), (1920, 1080));
        assert_eq!(state.viewport().unwrap().zoom, 4);
    }

    #[test]
    fn test_window_to_backbuffer_needs_window() {
        let mut host = host();
        let state = DisplayState::query(&mut host).unwrap();
        assert!(matches!(
            state.window_to_backbuffer(0, 0),
            Err(VideoError::BackbufferNotInitialized)
        ));
    }
}
