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

//! Rendering lane - turns a frame's command queue into pixels

use strata_core::gfx::FramebufferMut;
use strata_data::queue::RenderQueue;
use strata_data::FrameContext;

mod blend;
mod font;
mod primitives;
mod target;
mod tile_rasterizer;

pub use blend::{blend_over, tint};
pub use font::{glyph, CELL_HEIGHT, CELL_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use target::{ClipRect, TileTarget, Tiles};
pub use tile_rasterizer::{TileRasterizer, DEFAULT_TILE_SIZE};

/// What one rasterization pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterStats {
    /// Commands replayed (per tile).
    pub commands: usize,
    /// Tiles painted.
    pub tiles: usize,
}

/// A trait defining the behavior of a rendering lane.
///
/// A rendering lane consumes the published commands of a [`RenderQueue`] and
/// paints them into a CPU framebuffer. The run loop only talks to this trait, so
/// the rasterization strategy can be swapped without touching it.
pub trait RenderLane: Send + Sync {
    /// Returns a human-readable identifier for this rendering strategy.
    ///
    /// Used for logging and diagnostics (e.g., "TileRaster").
    fn strategy_name(&self) -> &'static str;

    /// Paints the frame.
    ///
    /// # Arguments
    ///
    /// * `ctx`: The frame context; its job system may be used to parallelize.
    /// * `queue`: The command queue of the frame. No push may be in flight.
    /// * `framebuffer`: The destination. Fully painted when the call returns.
    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        queue: &RenderQueue,
        framebuffer: &mut FramebufferMut<'_>,
    ) -> RasterStats;
}
