//! Window-less host
//!
//! Reports a fixed list of display modes and keeps whatever the compositor
//! presents in memory, so frames can be inspected without a window system.
//! Used by the tests and by anything rendering off-screen.

use std::collections::VecDeque;

use super::backbuffer::BYTES_PER_PIXEL;
use super::host::{Host, InputEvent, Rgba, Upload, WindowRequest};
use super::mode::{OutRect, Resolution};
use crate::error::{Result, VideoError};

#[derive(Debug, Clone)]
struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    resizable: bool,
    vsync: bool,
    fullscreen: bool,
    texture_width: u32,
    texture_height: u32,
}

pub struct HeadlessHost {
    modes: Vec<Resolution>,
    /// Extra bytes at the end of every texture row
    pitch_padding: usize,
    window: Option<HeadlessWindow>,
    display_mode: Option<usize>,
    /// Make every display mode change fail, like a driver refusing a mode
    fail_display_mode: bool,
    surface: Vec<u8>,
    pitch: usize,
    last_border: Option<Rgba>,
    last_out: Option<OutRect>,
    present_count: u64,
    events: VecDeque<InputEvent>,
}

impl HeadlessHost {
    pub fn new(modes: Vec<Resolution>) -> Self {
        Self {
            modes,
            pitch_padding: 0,
            window: None,
            display_mode: None,
            fail_display_mode: false,
            surface: Vec::new(),
            pitch: 0,
            last_border: None,
            last_out: None,
            present_count: 0,
            events: VecDeque::new(),
        }
    }

    /// Pad every texture row, like drivers that align their pitch
    pub fn with_pitch_padding(mut self, padding: usize) -> Self {
        self.pitch_padding = padding;
        self
    }

    /// Reject (or accept again) display mode changes
    pub fn set_display_mode_fails(&mut self, fails: bool) {
        self.fail_display_mode = fails;
    }

    /// Queue an event for the next `poll_events`
    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.window.as_ref().map(|w| (w.width, w.height))
    }

    pub fn window_title(&self) -> Option<&str> {
        self.window.as_ref().map(|w| w.title.as_str())
    }

    pub fn is_resizable(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.resizable)
    }

    pub fn is_vsync(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.vsync)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.fullscreen)
    }

    /// Last display mode applied, at window creation or with `set_display_mode`
    pub fn display_mode(&self) -> Option<usize> {
        self.display_mode
    }

    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    pub fn last_border(&self) -> Option<Rgba> {
        self.last_border
    }

    pub fn last_out(&self) -> Option<OutRect> {
        self.last_out
    }

    /// Bytes per row of the streaming texture
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// The streaming texture as uploaded, padding included
    pub fn surface(&self) -> &[u8] {
        &self.surface
    }

    /// The last uploaded frame with the row padding stripped
    pub fn frame(&self) -> Vec<u8> {
        let Some(window) = &self.window else {
            return Vec::new();
        };
        let row = window.texture_width as usize * BYTES_PER_PIXEL;
        self.surface
            .chunks(self.pitch.max(1))
            .take(window.texture_height as usize)
            .flat_map(|r| r[..row].iter().copied())
            .collect()
    }

    fn apply_display_mode(&mut self, index: usize) -> Result<()> {
        if index >= self.modes.len() {
            return Err(VideoError::Host(format!("no display mode {}", index)));
        }
        if self.fail_display_mode {
            return Err(VideoError::Host(format!("display mode {} refused", index)));
        }
        self.display_mode = Some(index);
        Ok(())
    }

    fn window_mut(&mut self) -> Result<&mut HeadlessWindow> {
        self.window
            .as_mut()
            .ok_or_else(|| VideoError::Host("no window".to_string()))
    }
}

impl Host for HeadlessHost {
    fn display_modes(&mut self) -> Result<Vec<Resolution>> {
        Ok(self.modes.clone())
    }

    fn create_window(&mut self, request: &WindowRequest<'_>) -> Result<()> {
        if self.window.is_some() {
            return Err(VideoError::Host("window already open".to_string()));
        }
        if let Some(index) = request.display_mode {
            self.apply_display_mode(index)?;
        }
        self.pitch = request.backbuffer_width as usize * BYTES_PER_PIXEL + self.pitch_padding;
        self.surface = vec![0; self.pitch * request.backbuffer_height as usize];
        self.window = Some(HeadlessWindow {
            title: request.title.to_string(),
            width: request.width,
            height: request.height,
            resizable: request.resizable,
            vsync: request.vsync,
            fullscreen: request.fullscreen,
            texture_width: request.backbuffer_width,
            texture_height: request.backbuffer_height,
        });
        Ok(())
    }

    fn set_window_size(&mut self, width: u32, height: u32) -> Result<()> {
        let window = self.window_mut()?;
        window.width = width;
        window.height = height;
        Ok(())
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        self.window_mut()?.fullscreen = fullscreen;
        Ok(())
    }

    fn set_display_mode(&mut self, index: usize) -> Result<()> {
        self.apply_display_mode(index)
    }

    fn present(&mut self, border: Rgba, out: OutRect, upload: &mut Upload<'_>) -> Result<()> {
        if self.window.is_none() {
            return Err(VideoError::Host("no window".to_string()));
        }
        upload(&mut self.surface, self.pitch)?;
        self.last_border = Some(border);
        self.last_out = Some(out);
        self.present_count += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }
}
