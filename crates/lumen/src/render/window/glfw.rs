//! GLFW window with an OpenGL 3.3 core context
//!
//! Creates the native window, makes its context current on the calling
//! thread and hands back a `glow` context loaded from it. Everything else is
//! the [`WindowBackend`] contract.

use std::any::Any;

use glfw::Context;

use crate::core::config::WindowConfig;
use crate::input::{KeyCode, MouseButton};
use crate::render::window::backend::{CursorShape, WindowBackend, WindowError, WindowEvent, WindowRect, WindowResult};

/// DPI reported when the monitor does not expose its physical size
pub const FALLBACK_DPI: f32 = 96.0;

/// GLFW window wrapper with proper resource management
pub struct GlfwBackend {
    glfw: glfw::Glfw,
    window: Option<glfw::PWindow>,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    dpi: f32,
}

impl std::fmt::Debug for GlfwBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlfwBackend")
            .field("open", &self.window.is_some())
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

impl GlfwBackend {
    /// Create a window and its GL context
    ///
    /// The window is centered on the primary monitor and shown once the
    /// context is current.
    pub fn new(config: &WindowConfig) -> WindowResult<(Self, glow::Context)> {
        let mut glfw = glfw::init(log_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizeable));
        glfw.window_hint(glfw::WindowHint::Decorated(config.decorated));
        glfw.window_hint(glfw::WindowHint::Visible(false));
        glfw.window_hint(glfw::WindowHint::StencilBits(Some(8)));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        let (mode, physical_width_mm) = glfw.with_primary_monitor(|_, monitor| {
            monitor.map_or((None, 0), |m| (m.get_video_mode(), m.get_physical_size().0))
        });
        let dpi = match mode {
            Some(mode) if physical_width_mm > 0 => mode.width as f32 / (physical_width_mm as f32 / 25.4),
            _ => FALLBACK_DPI,
        };
        if let Some(mode) = mode {
            window.set_pos(
                (mode.width as i32 - config.width as i32) / 2,
                (mode.height as i32 - config.height as i32) / 2,
            );
        }

        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_key_polling(true);
        window.set_char_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);
        window.set_focus_polling(true);
        window.set_close_polling(true);

        let gl = unsafe { glow::Context::from_loader_function(|s| window.get_proc_address(s) as *const _) };

        window.show();
        log::info!("Created {}x{} window \"{}\"", config.width, config.height, config.title);

        Ok((
            Self {
                glfw,
                window: Some(window),
                events,
                dpi,
            },
            gl,
        ))
    }

    fn translate(event: glfw::WindowEvent) -> Option<WindowEvent> {
        match event {
            glfw::WindowEvent::FramebufferSize(w, h) => Some(WindowEvent::Resized(w.max(0) as u32, h.max(0) as u32)),
            glfw::WindowEvent::Key(key, _, action, _) => {
                map_key(key).map(|k| WindowEvent::Key(k, action != glfw::Action::Release))
            }
            glfw::WindowEvent::MouseButton(button, action, _) => {
                map_button(button).map(|b| WindowEvent::MouseButton(b, action != glfw::Action::Release))
            }
            glfw::WindowEvent::CursorPos(x, y) => Some(WindowEvent::CursorMoved(x, y)),
            glfw::WindowEvent::Scroll(x, y) => Some(WindowEvent::Scroll(x, y)),
            glfw::WindowEvent::Char(c) => Some(WindowEvent::Char(c)),
            glfw::WindowEvent::Focus(focused) => Some(WindowEvent::Focus(focused)),
            glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
            _ => None,
        }
    }
}

/// GLFW error callback; failures surface through the calling function's return value
fn log_errors(error: glfw::Error, description: String) {
    log::error!("GLFW error {error:?}: {description}");
}

fn map_key(key: glfw::Key) -> Option<KeyCode> {
    use glfw::Key;
    Some(match key {
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::Num0 => KeyCode::Num0,
        Key::Num1 => KeyCode::Num1,
        Key::Num2 => KeyCode::Num2,
        Key::Num3 => KeyCode::Num3,
        Key::Num4 => KeyCode::Num4,
        Key::Num5 => KeyCode::Num5,
        Key::Num6 => KeyCode::Num6,
        Key::Num7 => KeyCode::Num7,
        Key::Num8 => KeyCode::Num8,
        Key::Num9 => KeyCode::Num9,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Escape => KeyCode::Escape,
        Key::Tab => KeyCode::Tab,
        Key::Backspace => KeyCode::Backspace,
        Key::LeftShift | Key::RightShift => KeyCode::Shift,
        Key::LeftControl | Key::RightControl => KeyCode::Control,
        Key::LeftAlt | Key::RightAlt => KeyCode::Alt,
        Key::F11 => KeyCode::F11,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        _ => return None,
    })
}

fn map_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

impl WindowBackend for GlfwBackend {
    fn should_close(&self) -> bool {
        self.window.as_ref().map_or(true, |w| w.should_close())
    }

    fn set_should_close(&mut self, should_close: bool) {
        if let Some(window) = self.window.as_mut() {
            window.set_should_close(should_close);
        }
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| Self::translate(event))
            .collect()
    }

    fn size(&self) -> (u32, u32) {
        self.window.as_ref().map_or((0, 0), |w| {
            let (width, height) = w.get_framebuffer_size();
            (width.max(0) as u32, height.max(0) as u32)
        })
    }

    fn position(&self) -> (i32, i32) {
        self.window.as_ref().map_or((0, 0), |w| w.get_pos())
    }

    fn set_title(&mut self, title: &str) {
        if let Some(window) = self.window.as_mut() {
            window.set_title(title);
        }
    }

    fn set_fullscreen(&mut self) -> Option<(u32, u32)> {
        let window = self.window.as_mut()?;
        self.glfw.with_primary_monitor(|_, monitor| {
            let monitor = monitor?;
            let mode = monitor.get_video_mode()?;
            window.set_monitor(
                glfw::WindowMode::FullScreen(&*monitor),
                0,
                0,
                mode.width,
                mode.height,
                Some(mode.refresh_rate),
            );
            Some((mode.width, mode.height))
        })
    }

    fn set_windowed(&mut self, rect: WindowRect) {
        if let Some(window) = self.window.as_mut() {
            window.set_monitor(glfw::WindowMode::Windowed, rect.x, rect.y, rect.width, rect.height, None);
        }
    }

    fn swap_buffers(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.swap_buffers();
        }
    }

    fn set_swap_interval(&mut self, vsync: bool) {
        self.glfw.set_swap_interval(if vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });
    }

    fn clipboard(&self) -> Option<String> {
        self.window.as_ref().and_then(|w| w.get_clipboard_string())
    }

    fn set_clipboard(&mut self, text: &str) {
        if let Some(window) = self.window.as_mut() {
            window.set_clipboard_string(text);
        }
    }

    fn set_cursor(&mut self, cursor: CursorShape) {
        let shape = match cursor {
            CursorShape::Arrow => glfw::StandardCursor::Arrow,
            CursorShape::IBeam => glfw::StandardCursor::IBeam,
            CursorShape::Crosshair => glfw::StandardCursor::Crosshair,
            CursorShape::Hand => glfw::StandardCursor::Hand,
            CursorShape::HResize => glfw::StandardCursor::HResize,
            CursorShape::VResize => glfw::StandardCursor::VResize,
        };
        if let Some(window) = self.window.as_mut() {
            window.set_cursor(Some(glfw::Cursor::standard(shape)));
        }
    }

    fn dpi(&self) -> f32 {
        self.dpi
    }

    fn destroy(&mut self) {
        if self.window.take().is_some() {
            log::info!("GLFW window destroyed");
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_callback_does_not_panic() {
        log_errors(glfw::Error::FormatUnavailable, "clipboard is not text".to_string());
        log_errors(glfw::Error::VersionUnavailable, "no 3.3 core context".to_string());
    }

    #[test]
    fn test_key_and_button_mapping() {
        assert_eq!(map_key(glfw::Key::Escape), Some(KeyCode::Escape));
        assert_eq!(map_button(glfw::MouseButton::Button1), Some(MouseButton::Left));
    }
}
