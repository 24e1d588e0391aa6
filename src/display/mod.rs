mod backbuffer;
mod headless;
mod host;
mod mode;
#[cfg(feature = "sdl")]
mod sdl;

pub use backbuffer::{Backbuffer, BYTES_PER_PIXEL};
pub use headless::HeadlessHost;
pub use host::{Host, InputEvent, Key, MouseButtonKind, Rgba, Upload, WindowRequest};
pub use mode::{
    DisplayState, OutRect, Resolution, Viewport, WindowMode, WindowSettings, MAX_WINDOW_DIMENSION,
};
#[cfg(feature = "sdl")]
pub use sdl::Sdl2Host;
