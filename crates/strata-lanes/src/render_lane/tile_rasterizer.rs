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

//! Tile-parallel software rasterizer.

use super::primitives::draw;
use super::target::{TileTarget, Tiles};
use super::{RasterStats, RenderLane};
use strata_core::gfx::FramebufferMut;
use strata_core::job::{JobLane, TaskGroup};
use strata_data::queue::{Command, RenderQueue};
use strata_data::FrameContext;

/// Default tile edge, in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Rasterizes a [`RenderQueue`] into a framebuffer, one task per square tile.
///
/// Commands are painted in sort-key order; commands with equal keys keep their
/// queue index order. Every tile replays the whole sorted list and clips each
/// write to its own rectangle, so tasks never share a pixel and need no locking.
///
/// The rasterizer keeps its sort buffers between frames. Once they have grown to
/// the queue capacity, rendering a frame allocates nothing.
#[derive(Debug)]
pub struct TileRasterizer {
    tile_size: u32,
    keys: Vec<u64>,
    sorted: Vec<Command>,
}

impl Default for TileRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl TileRasterizer {
    /// Creates a rasterizer with `tile_size` pixel tiles (clamped to at least 1).
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            keys: Vec::new(),
            sorted: Vec::new(),
        }
    }

    /// Creates a rasterizer whose buffers already hold `commands` entries.
    pub fn with_capacity(tile_size: u32, commands: usize) -> Self {
        Self {
            tile_size: tile_size.max(1),
            keys: Vec::with_capacity(commands),
            sorted: Vec::with_capacity(commands),
        }
    }

    /// The tile edge, in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Paints every published command of `queue` into `framebuffer`.
    ///
    /// One task per tile is started on the Engine lane of `ctx.jobs`; the call
    /// returns once all of them have finished. Without worker threads the tiles
    /// are painted inline, with identical output.
    pub fn execute(
        &mut self,
        ctx: &FrameContext<'_>,
        queue: &RenderQueue,
        framebuffer: &mut FramebufferMut<'_>,
    ) -> RasterStats {
        let commands = self.sort(queue);
        let tiles = Tiles::count_for(framebuffer.width(), framebuffer.height(), self.tile_size);
        if framebuffer.is_empty() {
            return RasterStats { commands, tiles: 0 };
        }

        let (sorted, tile_size) = (&self.sorted[..], self.tile_size);
        TaskGroup::scope(ctx.jobs, JobLane::Engine, |group| {
            for mut tile in Tiles::new(framebuffer, tile_size) {
                group.run(move || {
                    for cmd in sorted {
                        draw(&mut tile, cmd, queue);
                    }
                });
            }
            group.wait();
        });

        log::trace!(
            "Frame {}: rasterized {commands} commands over {tiles} tiles",
            ctx.frame_index
        );
        RasterStats { commands, tiles }
    }

    /// Paints `queue` into `framebuffer` on the calling thread as a single tile.
    pub fn execute_serial(&mut self, queue: &RenderQueue, framebuffer: &mut FramebufferMut<'_>) -> RasterStats {
        let commands = self.sort(queue);
        if framebuffer.is_empty() {
            return RasterStats { commands, tiles: 0 };
        }
        let mut target = TileTarget::full(framebuffer);
        for cmd in &self.sorted {
            draw(&mut target, cmd, queue);
        }
        RasterStats { commands, tiles: 1 }
    }

    /// Fills `self.sorted` with the published commands in paint order.
    fn sort(&mut self, queue: &RenderQueue) -> usize {
        self.keys.clear();
        self.sorted.clear();
        if self.keys.capacity() < queue.capacity() {
            self.keys.reserve(queue.capacity());
            self.sorted.reserve(queue.capacity());
        }

        // Sort key in the high half, queue index in the low half: equal keys fall
        // back to index order and the result does not depend on the sort algorithm.
        self.keys.extend(
            queue
                .iter()
                .enumerate()
                .map(|(i, cmd)| (u64::from(cmd.sort_key.raw()) << 32) | i as u64),
        );
        self.keys.sort_unstable();

        self.sorted.extend(
            self.keys
                .iter()
                .filter_map(|&k| queue.get((k & 0xFFFF_FFFF) as usize)),
        );
        self.sorted.len()
    }
}

impl RenderLane for TileRasterizer {
    fn strategy_name(&self) -> &'static str {
        "TileRaster"
    }

    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        queue: &RenderQueue,
        framebuffer: &mut FramebufferMut<'_>,
    ) -> RasterStats {
        self.execute(ctx, queue, framebuffer)
    }
}
