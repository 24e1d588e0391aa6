//! Result codes for the video backend
//!
//! Argument, state and capacity errors are surfaced unchanged to the
//! caller. Nothing in this crate retries on its own.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    /// An argument was out of its accepted range (zero sizes, negative tile...)
    #[error("bad arguments: {0}")]
    ArgumentsBad(&'static str),
    /// A handle or list index past the end of its collection
    #[error("index {index} out of range (count is {count})")]
    InvalidIndex { index: usize, count: usize },
    /// Texture width/height is zero or not a power of two
    #[error("invalid texture dimensions {width}x{height} (must be powers of two)")]
    InvalidDimension { width: u32, height: u32 },
    #[error("allocation of {0} bytes failed")]
    AllocFailed(usize),

    #[error("backbuffer not initialized")]
    BackbufferNotInitialized,
    #[error("window not initialized")]
    WindowNotInitialized,
    #[error("window already initialized")]
    WindowAlreadyInitialized,
    /// Backbuffer is wider than the (clamped) window it must live in
    #[error("backbuffer width {backbuffer} doesn't fit a {window} pixels wide window")]
    BackbufferWidthInvalid { backbuffer: u32, window: u32 },
    #[error("backbuffer height {backbuffer} doesn't fit a {window} pixels tall window")]
    BackbufferHeightInvalid { backbuffer: u32, window: u32 },
    /// A resize or resolution change would leave no room for the backbuffer
    #[error("{width}x{height} is too small for the backbuffer")]
    BackbufferWindowTooSmall { width: u32, height: u32 },
    #[error("window is already in the requested mode")]
    WindowModeUnchanged,

    #[error("buffer too small: {required} bytes required, {given} given")]
    BufferTooSmall { required: usize, given: usize },
    #[error("function not implemented")]
    NotImplemented,

    /// Failure reported by the host window system
    #[error("host error: {0}")]
    Host(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for VideoError {
    fn from(err: serde_json::Error) -> Self {
        VideoError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VideoError>;
