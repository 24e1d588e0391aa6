//! Software video backend: CPU tile compositing into a fixed-size RGB24
//! backbuffer, presented with integer zoom and letterboxing.

pub mod backend;
pub mod blit;
pub mod config;
pub mod display;
pub mod error;
pub mod spriteset;
pub mod texture;
pub mod util;

pub use backend::{create_backend, BackendKind, DrawInfo, SoftwareBackend, VideoBackend};
pub use config::VideoConfig;
pub use error::{Result, VideoError};
