// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Backend-agnostic input events and the per-frame input snapshot.
//!
//! Each frame the run loop resets an [`InputState`] and an [`InputQueue`], then lets
//! the platform's input source push events through an [`InputCollector`]. The state
//! is always brought up to date; the queue only keeps a bounded record and drops
//! events past its capacity.

use crate::config::MAX_INPUT_EVENTS;

/// A keyboard key known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Key {
    /// A key the backend could not map.
    #[default]
    Unknown = 0,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Space bar.
    Space,
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
    /// Letter Q.
    Q,
    /// Letter W.
    W,
    /// Letter A.
    A,
    /// Letter S.
    S,
    /// Letter D.
    D,
}

impl Key {
    /// Number of distinct keys, for dense per-key tables.
    pub const COUNT: usize = Key::D as usize + 1;

    /// Dense index of the key in `0..Key::COUNT`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// The key went down.
    Press,
    /// The key went up.
    Release,
    /// The key is held and the backend emitted an auto-repeat.
    Repeat,
}

/// An engine-internal representation of a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// The left mouse button.
    Left,
    /// The right mouse button.
    Right,
    /// The middle mouse button.
    Middle,
    /// The back mouse button (typically on the side).
    Back,
    /// The forward mouse button (typically on the side).
    Forward,
    /// Another mouse button, identified by a numeric code.
    Other(u16),
}

impl MouseButton {
    fn bit(self) -> Option<u8> {
        match self {
            MouseButton::Left => Some(1 << 0),
            MouseButton::Right => Some(1 << 1),
            MouseButton::Middle => Some(1 << 2),
            MouseButton::Back => Some(1 << 3),
            MouseButton::Forward => Some(1 << 4),
            MouseButton::Other(_) => None,
        }
    }
}

/// A single user input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key changed state.
    Key {
        /// The key.
        key: Key,
        /// What happened to it.
        action: KeyAction,
    },
    /// The pointer moved to a new position, in surface pixels.
    MouseMoved {
        /// Horizontal position.
        x: i32,
        /// Vertical position.
        y: i32,
    },
    /// A mouse button changed state.
    MouseButton {
        /// The button.
        button: MouseButton,
        /// `true` when pressed, `false` when released.
        pressed: bool,
    },
    /// The mouse wheel was scrolled.
    MouseWheel {
        /// The horizontal scroll delta.
        delta_x: f32,
        /// The vertical scroll delta.
        delta_y: f32,
    },
}

impl InputEvent {
    /// Shorthand for a key press.
    pub const fn key_pressed(key: Key) -> Self {
        InputEvent::Key {
            key,
            action: KeyAction::Press,
        }
    }

    /// Shorthand for a key release.
    pub const fn key_released(key: Key) -> Self {
        InputEvent::Key {
            key,
            action: KeyAction::Release,
        }
    }
}

/// The input snapshot for one frame.
///
/// Level state (`key_down`) persists across frames; edge flags (`key_just_pressed`,
/// `key_just_released`, `any_input`) are cleared by [`begin_frame`](Self::begin_frame).
#[derive(Debug, Clone)]
pub struct InputState {
    down: [bool; Key::COUNT],
    just_pressed: [bool; Key::COUNT],
    just_released: [bool; Key::COUNT],
    mouse_position: (i32, i32),
    mouse_buttons: u8,
    any_input: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            down: [false; Key::COUNT],
            just_pressed: [false; Key::COUNT],
            just_released: [false; Key::COUNT],
            mouse_position: (0, 0),
            mouse_buttons: 0,
            any_input: false,
        }
    }
}

impl InputState {
    /// Creates a state with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-frame edge flags.
    pub fn begin_frame(&mut self) {
        self.just_pressed = [false; Key::COUNT];
        self.just_released = [false; Key::COUNT];
        self.any_input = false;
    }

    /// Folds `event` into the state.
    pub fn apply(&mut self, event: &InputEvent) {
        self.any_input = true;
        match *event {
            InputEvent::Key { key, action } => self.apply_key(key, action),
            InputEvent::MouseMoved { x, y } => self.mouse_position = (x, y),
            InputEvent::MouseButton { button, pressed } => {
                if let Some(bit) = button.bit() {
                    if pressed {
                        self.mouse_buttons |= bit;
                    } else {
                        self.mouse_buttons &= !bit;
                    }
                }
            }
            InputEvent::MouseWheel { .. } => {}
        }
    }

    fn apply_key(&mut self, key: Key, action: KeyAction) {
        let idx = key.index();
        match action {
            KeyAction::Press => {
                // A press of a key already held is not a new edge.
                if !self.down[idx] {
                    self.down[idx] = true;
                    self.just_pressed[idx] = true;
                }
            }
            KeyAction::Release => {
                if self.down[idx] {
                    self.down[idx] = false;
                    self.just_released[idx] = true;
                }
            }
            KeyAction::Repeat => self.down[idx] = true,
        }
    }

    /// Whether `key` is currently held.
    pub fn key_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    /// Whether `key` went down this frame.
    pub fn key_just_pressed(&self, key: Key) -> bool {
        self.just_pressed[key.index()]
    }

    /// Whether `key` went up this frame.
    pub fn key_just_released(&self, key: Key) -> bool {
        self.just_released[key.index()]
    }

    /// Last known pointer position.
    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse_position
    }

    /// Whether `button` is currently held. Always `false` for [`MouseButton::Other`].
    pub fn mouse_button_down(&self, button: MouseButton) -> bool {
        button.bit().is_some_and(|bit| self.mouse_buttons & bit != 0)
    }

    /// Whether any event arrived this frame.
    pub fn any_input(&self) -> bool {
        self.any_input
    }
}

/// A bounded per-frame record of input events.
///
/// The storage is allocated once; pushes past [`capacity`](Self::capacity) are
/// dropped and counted.
#[derive(Debug, Clone)]
pub struct InputQueue {
    events: Vec<InputEvent>,
    capacity: usize,
    dropped: usize,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::with_capacity(MAX_INPUT_EVENTS)
    }
}

impl InputQueue {
    /// Creates a queue holding up to [`MAX_INPUT_EVENTS`] events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue holding up to `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Empties the queue and resets the drop counter. Called at frame start.
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// Records `event`. Returns `false` if the queue was full and the event was dropped.
    pub fn push(&mut self, event: InputEvent) -> bool {
        if self.events.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.events.push(event);
        true
    }

    /// The events recorded this frame, in arrival order.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of recorded events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether further pushes will be dropped.
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Events dropped since the last [`clear`](Self::clear).
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Routes events from an input source into the state and the queue.
pub struct InputCollector<'a> {
    state: &'a mut InputState,
    queue: &'a mut InputQueue,
}

impl<'a> InputCollector<'a> {
    /// Creates a collector writing into `state` and `queue`.
    pub fn new(state: &'a mut InputState, queue: &'a mut InputQueue) -> Self {
        Self { state, queue }
    }

    /// Applies `event` to the state and records it.
    ///
    /// Returns whether the event was recorded; the state is updated either way.
    pub fn push(&mut self, event: InputEvent) -> bool {
        self.state.apply(&event);
        self.queue.push(event)
    }

    /// The state being updated.
    pub fn state(&self) -> &InputState {
        self.state
    }

    /// The queue being filled.
    pub fn queue(&self) -> &InputQueue {
        self.queue
    }
}
