use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{DisplayMode, FullscreenType, Window, WindowContext};
use sdl2::{EventPump, Sdl, VideoSubsystem};

use super::host::{Host, InputEvent, Key, MouseButtonKind, Rgba, Upload, WindowRequest};
use super::mode::{OutRect, Resolution};
use crate::error::{Result, VideoError};

/// SDL2 window, accelerated renderer and one streaming RGB24 texture
pub struct Sdl2Host {
    _sdl: Sdl,
    video: VideoSubsystem,
    event_pump: EventPump,
    modes: Vec<DisplayMode>,
    // Field order matters: the texture must go before its renderer.
    texture: Option<Texture>,
    texture_creator: Option<TextureCreator<WindowContext>>,
    canvas: Option<Canvas<Window>>,
}

impl Sdl2Host {
    pub fn new() -> Result<Self> {
        let sdl = sdl2::init().map_err(VideoError::Host)?;
        let video = sdl.video().map_err(VideoError::Host)?;
        let event_pump = sdl.event_pump().map_err(VideoError::Host)?;

        Ok(Self {
            _sdl: sdl,
            video,
            event_pump,
            modes: Vec::new(),
            texture: None,
            texture_creator: None,
            canvas: None,
        })
    }

    fn canvas_mut(&mut self) -> Result<&mut Canvas<Window>> {
        self.canvas
            .as_mut()
            .ok_or_else(|| VideoError::Host("window not created".to_string()))
    }
}

impl Drop for Sdl2Host {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            // SAFETY: the renderer that owns the texture is still alive here
            unsafe { texture.destroy() };
        }
    }
}

impl Host for Sdl2Host {
    fn display_modes(&mut self) -> Result<Vec<Resolution>> {
        let count = self.video.num_display_modes(0).map_err(VideoError::Host)?;
        // Kept in SDL's order so index i is SDL's mode i; mode 0 is the device size
        let mut modes = Vec::with_capacity(count.max(0) as usize);
        for i in 0..count {
            modes.push(self.video.display_mode(0, i).map_err(VideoError::Host)?);
        }

        let list = modes
            .iter()
            .map(|m| Resolution::new(m.w as u32, m.h as u32, m.refresh_rate as u32))
            .collect();
        self.modes = modes;
        Ok(list)
    }

    fn create_window(&mut self, request: &WindowRequest<'_>) -> Result<()> {
        if self.canvas.is_some() {
            return Err(VideoError::Host("window already created".to_string()));
        }

        let mut builder = self.video.window(request.title, request.width, request.height);
        builder.position_centered();
        if request.resizable {
            builder.resizable();
        }
        if request.fullscreen {
            builder.fullscreen_desktop();
        }
        let window = builder.build().map_err(|e| VideoError::Host(e.to_string()))?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if request.vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let mut canvas = canvas_builder
            .build()
            .map_err(|e| VideoError::Host(e.to_string()))?;

        // Dropping the canvas on failure closes the window again
        if let Some(index) = request.display_mode {
            let mode = *self.modes.get(index).ok_or(VideoError::InvalidIndex {
                index,
                count: self.modes.len(),
            })?;
            canvas
                .window_mut()
                .set_display_mode(Some(mode))
                .map_err(VideoError::Host)?;
        }

        let texture_creator = canvas.texture_creator();
        let texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                request.backbuffer_width,
                request.backbuffer_height,
            )
            .map_err(|e| VideoError::Host(e.to_string()))?;

        self.texture = Some(texture);
        self.texture_creator = Some(texture_creator);
        self.canvas = Some(canvas);
        Ok(())
    }

    fn set_window_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas_mut()?
            .window_mut()
            .set_size(width, height)
            .map_err(|e| VideoError::Host(e.to_string()))
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let kind = if fullscreen {
            FullscreenType::Desktop
        } else {
            FullscreenType::Off
        };
        self.canvas_mut()?
            .window_mut()
            .set_fullscreen(kind)
            .map_err(VideoError::Host)
    }

    fn set_display_mode(&mut self, index: usize) -> Result<()> {
        let mode = *self.modes.get(index).ok_or(VideoError::InvalidIndex {
            index,
            count: self.modes.len(),
        })?;
        self.canvas_mut()?
            .window_mut()
            .set_display_mode(Some(mode))
            .map_err(VideoError::Host)
    }

    fn present(&mut self, border: Rgba, out: OutRect, upload: &mut Upload<'_>) -> Result<()> {
        let (Some(canvas), Some(texture)) = (self.canvas.as_mut(), self.texture.as_mut()) else {
            return Err(VideoError::Host("window not created".to_string()));
        };

        texture
            .with_lock(None, |surface, pitch| upload(surface, pitch))
            .map_err(VideoError::Host)??;

        canvas.set_draw_color(Color::RGBA(border.r, border.g, border.b, border.a));
        canvas.clear();
        canvas
            .copy(
                texture,
                None,
                Some(Rect::new(out.x, out.y, out.width, out.height)),
            )
            .map_err(VideoError::Host)?;
        canvas.present();
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(map_key(k))),
                Event::KeyUp {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyUp(map_key(k))),
                Event::MouseMotion { x, y, .. } => events.push(InputEvent::MouseMove { x, y }),
                Event::MouseButtonDown {
                    x, y, mouse_btn, ..
                } => {
                    if let Some(button) = map_mouse_button(mouse_btn) {
                        events.push(InputEvent::MouseDown { x, y, button });
                    }
                },
                Event::MouseButtonUp {
                    x, y, mouse_btn, ..
                } => {
                    if let Some(button) = map_mouse_button(mouse_btn) {
                        events.push(InputEvent::MouseUp { x, y, button });
                    }
                },
                Event::Window {
                    win_event: WindowEvent::Resized(w, h),
                    ..
                } => events.push(InputEvent::Resized {
                    width: w.max(0) as u32,
                    height: h.max(0) as u32,
                }),
                _ => {},
            }
        }

        events
    }
}

fn map_key(k: Keycode) -> Key {
    match k {
        Keycode::Escape => Key::Escape,
        Keycode::Plus | Keycode::Equals | Keycode::KpPlus => Key::Plus,
        Keycode::Minus | Keycode::KpMinus => Key::Minus,
        _ => {
            let name = k.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                _ => Key::Other,
            }
        },
    }
}

fn map_mouse_button(btn: MouseButton) -> Option<MouseButtonKind> {
    match btn {
        MouseButton::Left => Some(MouseButtonKind::Left),
        MouseButton::Right => Some(MouseButtonKind::Right),
        MouseButton::Middle => Some(MouseButtonKind::Middle),
        _ => None,
    }
}
