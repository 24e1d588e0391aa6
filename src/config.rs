use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::backend::{BackendKind, DEFAULT_BACKGROUND};
use crate::error::Result;

/// Window and backbuffer setup, stored as JSON
///
/// Every field has a default, so a partial file (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub backbuffer_width: u32,
    pub backbuffer_height: u32,
    /// Start in fullscreen at `resolution`
    pub fullscreen: bool,
    /// Index into the host's display modes
    pub resolution: usize,
    pub resizable: bool,
    pub vsync: bool,
    /// 0xAARRGGBB
    pub background: u32,
    pub backend: BackendKind,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            title: "softframe".to_string(),
            window_width: 640,
            window_height: 480,
            backbuffer_width: 320,
            backbuffer_height: 240,
            fullscreen: false,
            resolution: 0,
            resizable: false,
            vsync: true,
            background: DEFAULT_BACKGROUND,
            backend: BackendKind::Software,
        }
    }
}

impl VideoConfig {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = VideoConfig::default();
        assert_eq!((cfg.window_width, cfg.window_height), (640, 480));
        assert_eq!((cfg.backbuffer_width, cfg.backbuffer_height), (320, 240));
        assert!(!cfg.fullscreen);
        assert!(cfg.vsync);
        assert_eq!(cfg.background, 0xFF00_0000);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: VideoConfig =
            serde_json::from_str(r#"{ "window_width": 1280, "fullscreen": true }"#).unwrap();
        assert_eq!(cfg.window_width, 1280);
        assert_eq!(cfg.window_height, 480);
        assert!(cfg.fullscreen);
        assert_eq!(cfg.backend, BackendKind::Software);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(serde_json::from_str::<VideoConfig>(r#"{ "backend": "vulkan" }"#).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("softframe-config-{}.json", std::process::id()));
        let cfg = VideoConfig {
            title: "saved".to_string(),
            resolution: 3,
            background: 0xFF20_4060,
            ..VideoConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = VideoConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = VideoConfig::load("/nonexistent/softframe.json").unwrap_err();
        assert!(matches!(err, crate::error::VideoError::Io(_)));
    }
}
