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

//! The public-facing Software Development Kit (SDK) for Strata.
//! This crate provides a small and stable API to write an application, hand it
//! to the [`Engine`], and run it against any presentation surface.

pub mod config;
pub mod engine;
pub mod platform;

pub use config::{EngineConfig, RunLoopConfig};
pub use engine::{Engine, RunStats};
pub use platform::{ChannelInputSource, HeadlessSurface};

use strata_data::FrameContext;

pub mod prelude {
    pub use crate::{Application, Engine, EngineConfig, HeadlessSurface, RunLoopConfig, RunStats};
    pub use strata_core::gfx::{PixelCanvas, PixelFrame, Rgba8};
    pub use strata_core::platform::{InputEvent, InputSource, Key, Surface};
    pub use strata_core::{JobLane, JobSystem, TaskGroup, TaskValue};
    pub use strata_data::queue::{RenderQueue, SortKey, SpriteView};
    pub use strata_data::{FrameContext, Phase, PhaseScheduler};
}

/// The application driven by the [`Engine`].
///
/// Every hook receives the same read-only [`FrameContext`] for the frame. Draw
/// commands are pushed into `ctx.queue`, from this thread or from jobs started
/// on `ctx.jobs`.
pub trait Application {
    /// Called once per frame after input was pumped, before any update.
    fn on_input(&mut self, _ctx: &FrameContext<'_>) {}

    /// Called for game logic. With a fixed timestep it may run zero or several
    /// times per frame, each time with `ctx.dt_seconds` set to the fixed step.
    ///
    /// Returning `false` stops the run loop before the frame is rendered.
    fn update(&mut self, ctx: &FrameContext<'_>) -> bool;

    /// Called once per frame to push draw commands.
    fn render(&mut self, _ctx: &FrameContext<'_>) {}
}
