//! # Unified Configuration
//!
//! Window creation options and engine-wide settings. Every struct derives
//! serde and implements [`Config`], so a game can ship a `window.toml` or
//! `engine.ron` next to its executable.
//!
//! Missing fields fall back to their defaults, which keeps hand-written
//! config files short.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Strings placed around the live FPS value when it is appended to the title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FpsAppendConfiguration {
    /// Inserted between the title and the number
    pub between_title_and_value: String,
    /// Appended after the number
    pub after_value: String,
}

impl Default for FpsAppendConfiguration {
    fn default() -> Self {
        Self {
            between_title_and_value: " | FPS: ".to_string(),
            after_value: String::new(),
        }
    }
}

impl FpsAppendConfiguration {
    /// Format `title` followed by `fps` using these separators
    pub fn format(&self, title: &str, fps: u32) -> String {
        format!("{title}{}{fps}{}", self.between_title_and_value, self.after_value)
    }
}

/// # Window Configuration
///
/// Everything the frame orchestrator reads when it creates its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial framebuffer width
    pub width: u32,
    /// Initial framebuffer height
    pub height: u32,
    /// Window title (prefix when the FPS is appended)
    pub title: String,
    /// Render pacing cap
    pub max_fps: u32,
    /// Update pacing cap
    pub max_ups: u32,
    /// Swap interval 1 when true, 0 otherwise
    pub vsync: bool,
    /// Window hint at creation
    pub resizeable: bool,
    /// Window hint at creation
    pub decorated: bool,
    /// Enter fullscreen right after creation
    pub fullscreen: bool,
    /// Periodically append the live FPS to the title
    pub append_fps_to_title: bool,
    /// Separators used when appending the FPS
    pub fps_append: FpsAppendConfiguration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Lumen".to_string(),
            max_fps: 60,
            max_ups: 30,
            vsync: false,
            resizeable: true,
            decorated: true,
            fullscreen: false,
            append_fps_to_title: false,
            fps_append: FpsAppendConfiguration::default(),
        }
    }
}

impl Config for WindowConfig {}

impl WindowConfig {
    /// Create a config with the given size and title
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the FPS and UPS caps
    pub fn with_caps(mut self, max_fps: u32, max_ups: u32) -> Self {
        self.max_fps = max_fps;
        self.max_ups = max_ups;
        self
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Append the live FPS to the title
    pub fn with_fps_in_title(mut self, fps_append: FpsAppendConfiguration) -> Self {
        self.append_fps_to_title = true;
        self.fps_append = fps_append;
        self
    }
}

/// Graphics API used to create windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderingApi {
    /// OpenGL 3.3 core through glow
    #[default]
    OpenGl,
    /// Declared for configuration compatibility, window creation fails
    Vulkan,
}

/// # Engine Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graphics API for new windows
    pub rendering_api: RenderingApi,
    /// Vertices each pooled batch can hold
    pub batch_size: usize,
    /// Window used when none is supplied explicitly
    pub window: WindowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rendering_api: RenderingApi::OpenGl,
            batch_size: 1000,
            window: WindowConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            title = "Game"
            max_fps = 144
            append_fps_to_title = true

            [fps_append]
            between_title_and_value = " ("
            after_value = ")"
        "#;
        let config = WindowConfig::from_str_with_format(text, "window.toml").unwrap();

        assert_eq!(config.title, "Game");
        assert_eq!(config.max_fps, 144);
        assert_eq!(config.max_ups, 30);
        assert_eq!(config.width, 800);
        assert!(config.append_fps_to_title);
        assert_eq!(config.fps_append.format(&config.title, 61), "Game (61)");
    }

    #[test]
    fn test_engine_config_from_ron() {
        let text = "(rendering_api: Vulkan, batch_size: 64)";
        let config = EngineConfig::from_str_with_format(text, "engine.ron").unwrap();

        assert_eq!(config.rendering_api, RenderingApi::Vulkan);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = WindowConfig::from_str_with_format("", "window.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_fps_suffix() {
        let config = FpsAppendConfiguration::default();
        assert_eq!(config.format("Lumen", 60), "Lumen | FPS: 60");
    }
}
