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

//! Provides abstractions over the host platform.
//!
//! The engine never talks to a terminal, window or input device directly. A
//! platform adapter implements [`Surface`] to receive finished frames and
//! [`InputSource`] to feed events into the per-frame input snapshot.

pub mod input;

pub use input::{
    InputCollector, InputEvent, InputQueue, InputState, Key, KeyAction, MouseButton,
};

use crate::error::SurfaceError;
use crate::gfx::PixelFrame;

/// A presentation target for finished frames (terminal, window, file, ...).
pub trait Surface {
    /// Outputs `frame`. The frame is only borrowed for the duration of the call.
    fn present(&mut self, frame: &PixelFrame<'_>) -> Result<(), SurfaceError>;
}

/// A platform input backend.
pub trait InputSource {
    /// Polls every pending event and pushes it into `collector`.
    fn pump(&mut self, collector: &mut InputCollector<'_>);
}
