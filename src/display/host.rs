//! Boundary between the compositor and the window system
//!
//! Everything platform-specific (window creation, display modes, the
//! streaming texture, scaled presentation, input) sits behind [`Host`].
//! The compositor keeps the geometry and pixel logic on its side.

use super::mode::{OutRect, Resolution};
use crate::error::Result;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAARRGGBB` color
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Everything the host needs to open the window
#[derive(Debug, Clone, Copy)]
pub struct WindowRequest<'a> {
    pub title: &'a str,
    /// Already clamped to the device size
    pub width: u32,
    pub height: u32,
    /// Size of the streaming RGB24 texture
    pub backbuffer_width: u32,
    pub backbuffer_height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// Open as a borderless desktop-sized fullscreen window
    pub fullscreen: bool,
    /// Fullscreen display mode to apply before the window is handed back
    pub display_mode: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Char(char),
    Plus,
    Minus,
    Other,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Key),
    KeyUp(Key),
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseDown {
        x: i32,
        y: i32,
        button: MouseButtonKind,
    },
    MouseUp {
        x: i32,
        y: i32,
        button: MouseButtonKind,
    },
    /// The window was resized from outside (user drag)
    Resized {
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonKind {
    Left,
    Right,
    Middle,
}

/// Callback that fills the host's locked texture: `(surface, pitch)`
pub type Upload<'a> = dyn FnMut(&mut [u8], usize) -> Result<()> + 'a;

pub trait Host {
    /// Every fullscreen mode of the main display; index 0 is the native one
    fn display_modes(&mut self) -> Result<Vec<Resolution>>;

    /// Open the window, its renderer and a streaming texture of the
    /// backbuffer's size
    ///
    /// If applying `request.display_mode` fails, no window is left open.
    fn create_window(&mut self, request: &WindowRequest<'_>) -> Result<()>;

    fn set_window_size(&mut self, width: u32, height: u32) -> Result<()>;

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()>;

    /// Switch the fullscreen display mode to `display_modes()[index]`
    fn set_display_mode(&mut self, index: usize) -> Result<()>;

    /// Lock the streaming texture and hand it to `upload`, clear the window
    /// to `border`, draw the texture scaled into `out`, then flip
    fn present(&mut self, border: Rgba, out: OutRect, upload: &mut Upload<'_>) -> Result<()>;

    fn poll_events(&mut self) -> Vec<InputEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_unpack() {
        let c = Rgba::from_argb(0xFF10_2030);
        assert_eq!(c, Rgba::new(0x10, 0x20, 0x30, 0xFF));
        assert_eq!(c.to_argb(), 0xFF10_2030);
    }
}
