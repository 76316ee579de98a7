//! Scripted window backend
//!
//! [`HeadlessBackend`] replays events at chosen iterations of the event pump
//! and records what the frame loop did to the window (titles, swaps,
//! fullscreen toggles). Together with
//! [`HeadlessRender`](crate::render::headless::HeadlessRender) and
//! [`SteppingClock`](crate::foundation::time::SteppingClock) it runs the
//! whole orchestrator without a display.
//!
//! Like GLFW, mode switches report their new framebuffer size through the
//! next event pump rather than synchronously.

use std::any::Any;
use std::collections::BTreeMap;

use crate::render::window::backend::{CursorShape, WindowBackend, WindowEvent, WindowRect};

/// Window backend driven by a script instead of a platform
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    size: (u32, u32),
    position: (i32, i32),
    monitor: Option<(u32, u32)>,
    should_close: bool,
    close_after: Option<usize>,
    script: BTreeMap<usize, Vec<WindowEvent>>,
    pending: Vec<WindowEvent>,
    polls: usize,
    titles: Vec<String>,
    swaps: usize,
    vsync: Option<bool>,
    fullscreen: bool,
    clipboard: Option<String>,
    cursor: CursorShape,
    dpi: f32,
    destroyed: bool,
}

impl HeadlessBackend {
    /// A window of the given framebuffer size on a 1920x1080 monitor
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            position: (0, 0),
            monitor: Some((1920, 1080)),
            should_close: false,
            close_after: None,
            script: BTreeMap::new(),
            pending: Vec::new(),
            polls: 0,
            titles: Vec::new(),
            swaps: 0,
            vsync: None,
            fullscreen: false,
            clipboard: None,
            cursor: CursorShape::Arrow,
            dpi: 96.0,
            destroyed: false,
        }
    }

    /// Request close once the event pump has run `polls` times
    pub fn close_after(mut self, polls: usize) -> Self {
        self.close_after = Some(polls);
        self
    }

    /// Deliver `event` from the `poll`-th pump (1-based)
    pub fn with_event(mut self, poll: usize, event: WindowEvent) -> Self {
        self.script.entry(poll).or_default().push(event);
        self
    }

    /// Place the window on screen
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = (x, y);
        self
    }

    /// Pretend no monitor is attached
    pub fn without_monitor(mut self) -> Self {
        self.monitor = None;
        self
    }

    /// Times the event pump ran
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Every title set, oldest first
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Times the back buffer was presented
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Last swap interval request
    pub fn vsync(&self) -> Option<bool> {
        self.vsync
    }

    /// True while in fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Current cursor shape
    pub fn cursor(&self) -> CursorShape {
        self.cursor
    }

    /// True once [`WindowBackend::destroy`] ran
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl WindowBackend for HeadlessBackend {
    fn should_close(&self) -> bool {
        self.should_close || self.destroyed
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }

    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.polls += 1;
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.script.remove(&self.polls).unwrap_or_default());
        for event in &events {
            match *event {
                WindowEvent::Resized(width, height) => self.size = (width, height),
                WindowEvent::CloseRequested => self.should_close = true,
                _ => {}
            }
        }
        if self.close_after.is_some_and(|n| self.polls >= n) {
            self.should_close = true;
        }
        events
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn position(&self) -> (i32, i32) {
        self.position
    }

    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn set_fullscreen(&mut self) -> Option<(u32, u32)> {
        let size = self.monitor?;
        self.fullscreen = true;
        self.position = (0, 0);
        self.size = size;
        self.pending.push(WindowEvent::Resized(size.0, size.1));
        Some(size)
    }

    fn set_windowed(&mut self, rect: WindowRect) {
        self.fullscreen = false;
        self.position = (rect.x, rect.y);
        self.size = (rect.width, rect.height);
        self.pending.push(WindowEvent::Resized(rect.width, rect.height));
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }

    fn set_swap_interval(&mut self, vsync: bool) {
        self.vsync = Some(vsync);
    }

    fn clipboard(&self) -> Option<String> {
        self.clipboard.clone()
    }

    fn set_clipboard(&mut self, text: &str) {
        self.clipboard = Some(text.to_string());
    }

    fn set_cursor(&mut self, cursor: CursorShape) {
        self.cursor = cursor;
    }

    fn dpi(&self) -> f32 {
        self.dpi
    }

    fn destroy(&mut self) {
        self.destroyed = true;
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
    fn test_script_delivers_on_chosen_poll() {
        let mut backend = HeadlessBackend::new(10, 10).with_event(2, WindowEvent::Resized(20, 30));

        assert!(backend.poll_events().is_empty());
        assert_eq!(backend.poll_events(), vec![WindowEvent::Resized(20, 30)]);
        assert_eq!(backend.size(), (20, 30));
    }

    #[test]
    fn test_close_after_polls() {
        let mut backend = HeadlessBackend::new(10, 10).close_after(2);
        backend.poll_events();
        assert!(!backend.should_close());
        backend.poll_events();
        assert!(backend.should_close());
    }

    #[test]
    fn test_fullscreen_without_monitor_fails() {
        let mut backend = HeadlessBackend::new(10, 10).without_monitor();
        assert_eq!(backend.set_fullscreen(), None);
        assert!(!backend.is_fullscreen());
    }

    #[test]
    fn test_mode_switch_resizes_on_next_poll() {
        let mut backend = HeadlessBackend::new(10, 10);
        assert_eq!(backend.set_fullscreen(), Some((1920, 1080)));
        assert_eq!(backend.poll_events(), vec![WindowEvent::Resized(1920, 1080)]);
        assert!(backend.poll_events().is_empty());
    }
}
