//! Keyboard state for the frame loop.
//!
//! An explicit [`InputState`] owned by the caller replaces process-wide key
//! arrays: the frame loop feeds it `winit` window events and rotates the
//! snapshot once per frame. Current and previous frame pressed-key sets make
//! `key_down` / `key_up` edge queries cheap.

use rustc_hash::FxHashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pressed-key snapshots for the current and previous frame.
#[derive(Debug, Default)]
pub struct InputState {
    current: FxHashSet<KeyCode>,
    previous: FxHashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the snapshots. Call once per frame, before polling events.
    pub fn begin_frame(&mut self) {
        self.previous = self.current.clone();
    }

    /// Feed a window event. Non-keyboard events are ignored.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(code) = event.physical_key {
                match event.state {
                    ElementState::Pressed => self.press(code),
                    ElementState::Released => self.release(code),
                }
            }
        }
    }

    /// Mark a key as held down.
    pub fn press(&mut self, code: KeyCode) {
        self.current.insert(code);
    }

    /// Mark a key as released.
    pub fn release(&mut self, code: KeyCode) {
        self.current.remove(&code);
    }

    /// Whether the key is held down this frame.
    pub fn key(&self, code: KeyCode) -> bool {
        self.current.contains(&code)
    }

    /// Whether the key went down between the previous frame and this one.
    pub fn key_down(&self, code: KeyCode) -> bool {
        self.current.contains(&code) && !self.previous.contains(&code)
    }

    /// Whether the key was released between the previous frame and this one.
    pub fn key_up(&self, code: KeyCode) -> bool {
        !self.current.contains(&code) && self.previous.contains(&code)
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
