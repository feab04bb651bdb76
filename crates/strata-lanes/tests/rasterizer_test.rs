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

use std::time::{Duration, Instant};
use strata_core::gfx::{FramebufferMut, PixelCanvas, Rgba8};
use strata_core::job::{JobSystem, WorkerPool};
use strata_core::platform::{InputQueue, InputState};
use strata_core::JobSystemConfig;
use strata_data::queue::{RenderQueue, SortKey, SpriteView};
use strata_data::FrameContext;
use strata_lanes::{RasterStats, RenderLane, TileRasterizer};

const RED: u32 = 0xFF00_00FF;
const BLUE: u32 = 0x0000_FFFF;

// --- Test Setup ---

fn rasterize(jobs: &dyn JobSystem, queue: &RenderQueue, canvas: &mut PixelCanvas, tile_size: u32) -> RasterStats {
    let (input, events) = (InputState::new(), InputQueue::new());
    let ctx = FrameContext::new(jobs, queue, &input, &events);
    let mut raster = TileRasterizer::new(tile_size);
    raster.execute(&ctx, queue, &mut canvas.as_framebuffer_mut())
}

/// Small xorshift generator so scenes are reproducible without extra dependencies.
struct Rng(u32);

impl Rng {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn range(&mut self, lo: i32, hi: i32) -> i32 {
        lo + (self.next() % (hi - lo) as u32) as i32
    }
}

static CHECKER: [u32; 12] = [
    0xFFFF_FFFF, 0x0000_00FF, 0xFF00_0080, 0x1111_1111, //
    0x0000_00FF, 0xFFFF_FFFF, 0x00FF_0040, 0x1111_1111, //
    0x8080_80FF, 0x2040_60A0, 0x0000_0000, 0x1111_1111,
];

/// Pushes a scene touching every primitive, with translucent colors and
/// shapes straddling tile borders and the canvas edge.
fn push_random_scene(queue: &RenderQueue, seed: u32, count: usize) {
    let mut rng = Rng(seed);
    let sprite = SpriteView::from_static(&CHECKER, 3, 3, 4).unwrap();
    queue.clear(Rgba8::new(10, 20, 30, 255), SortKey::new(0, 0, 0)).unwrap();

    for i in 0..count {
        let key = SortKey::new(rng.range(0, 4) as u8, rng.range(0, 64) as u16, i as u16);
        let color = Rgba8::unpack(rng.next() | 0x10);
        let (x, y) = (rng.range(-20, 100), rng.range(-20, 80));
        let (a, b) = (rng.range(-10, 40), rng.range(-10, 40));
        let _ = match rng.range(0, 11) {
            0 => queue.put_pixel(x, y, color, key),
            1 => queue.fill_rect(x, y, a, b, color, key),
            2 => queue.blend_rect(x, y, a, b, color, key),
            3 => queue.rect_outline(x, y, a, b, rng.range(0, 6), color, key),
            4 => queue.hline(x, x + a, y, color, key),
            5 => queue.vline(x, y, y + b, color, key),
            6 => queue.line(x, y, x + a * 2, y + b, color, key),
            7 => queue.fill_circle(x, y, rng.range(-2, 25), color, key),
            8 => queue.circle(x, y, rng.range(-2, 30), color, key),
            9 => queue.sprite(x, y, sprite, color, key),
            _ => queue.text(x, y, rng.range(0, 4), "Tile 42!\nok", color, key),
        };
    }
}

// --- Tests ---

#[test]
fn test_two_by_two_scenario() {
    // --- 1. ARRANGE ---
    let pool = WorkerPool::inline();
    let queue = RenderQueue::new(4, 0);
    queue.clear(Rgba8::BLACK, SortKey::new(0, 0, 0)).unwrap();
    queue.fill_rect(0, 0, 2, 2, Rgba8::RED, SortKey::new(0, 1, 0)).unwrap();
    queue.put_pixel(1, 1, Rgba8::BLUE, SortKey::new(0, 2, 0)).unwrap();
    let mut canvas = PixelCanvas::new(2, 2);

    // --- 2. ACT ---
    let stats = rasterize(&pool, &queue, &mut canvas, 64);

    // --- 3. ASSERT ---
    assert_eq!(canvas.pixels(), &[RED, RED, RED, BLUE]);
    assert_eq!(stats, RasterStats { commands: 3, tiles: 1 });
    assert_eq!(queue.dropped(), 0);
}

#[test]
fn test_paint_order_follows_sort_keys_not_push_order() {
    let pool = WorkerPool::inline();
    let queue = RenderQueue::new(8, 0);
    // Pushed as 5, 1, 3: painted as 1, 3, 5, so order 5 wins.
    queue.fill_rect(0, 0, 1, 1, Rgba8::GREEN, SortKey::new(0, 5, 0)).unwrap();
    queue.fill_rect(0, 0, 1, 1, Rgba8::RED, SortKey::new(0, 1, 0)).unwrap();
    queue.fill_rect(0, 0, 1, 1, Rgba8::BLUE, SortKey::new(0, 3, 0)).unwrap();
    let mut canvas = PixelCanvas::new(1, 1);

    rasterize(&pool, &queue, &mut canvas, 64);
    assert_eq!(canvas.pixels(), &[Rgba8::GREEN.pack()]);
}

#[test]
fn test_layer_dominates_order_and_tie() {
    let pool = WorkerPool::inline();
    let queue = RenderQueue::new(8, 0);
    queue.put_pixel(0, 0, Rgba8::RED, SortKey::new(1, 0, 0)).unwrap();
    queue.put_pixel(0, 0, Rgba8::BLUE, SortKey::new(0, 4095, 4095)).unwrap();
    // Same layer and order: the tie field decides.
    queue.put_pixel(1, 0, Rgba8::GREEN, SortKey::new(0, 7, 2)).unwrap();
    queue.put_pixel(1, 0, Rgba8::WHITE, SortKey::new(0, 7, 1)).unwrap();
    let mut canvas = PixelCanvas::new(2, 1);

    rasterize(&pool, &queue, &mut canvas, 64);
    assert_eq!(canvas.pixels(), &[RED, Rgba8::GREEN.pack()]);
}

#[test]
fn test_parallel_tiles_match_serial_raster() {
    // --- 1. ARRANGE ---
    let pool = WorkerPool::new(&JobSystemConfig::with_workers(4));
    let (w, h) = (83, 61);

    for seed in [0x1234_5678u32, 0xDEAD_BEEF, 7] {
        let queue = RenderQueue::new(512, 4096);
        push_random_scene(&queue, seed, 400);

        // --- 2. ACT ---
        let mut serial = PixelCanvas::new(w, h);
        let serial_stats = TileRasterizer::new(64).execute_serial(&queue, &mut serial.as_framebuffer_mut());

        let mut tiled = PixelCanvas::new(w, h);
        let tiled_stats = rasterize(&pool, &queue, &mut tiled, 7);

        let mut inline = PixelCanvas::new(w, h);
        rasterize(&WorkerPool::inline(), &queue, &mut inline, 16);

        // --- 3. ASSERT ---
        assert_eq!(serial_stats.commands, tiled_stats.commands);
        assert_eq!(tiled_stats.tiles, 12 * 9);
        assert!(serial.pixels() == tiled.pixels(), "tiled raster differs for seed {seed:#x}");
        assert!(serial.pixels() == inline.pixels(), "inline raster differs for seed {seed:#x}");
    }
}

#[test]
fn test_huge_primitives_cost_only_their_visible_part() {
    // --- 1. ARRANGE ---
    let pool = WorkerPool::new(&JobSystemConfig::with_workers(4));
    let queue = RenderQueue::new(16, 0);
    let far = 1_000_000_000;
    let big = 500_000_000;
    let paint = Rgba8::new(200, 40, 90, 160);
    queue.line(-far, 10, far, 11, paint, SortKey::new(0, 0, 0)).unwrap();
    queue.line(20, -far, 21, far, paint, SortKey::new(0, 1, 0)).unwrap();
    queue.fill_circle(32, 32, big, Rgba8::new(0, 0, 255, 40), SortKey::new(0, 2, 0)).unwrap();
    queue.circle(32, 32, big, paint, SortKey::new(0, 3, 0)).unwrap();
    // Passes through (32, 32) from far above.
    queue.circle(32, 32 - big, big, Rgba8::WHITE, SortKey::new(0, 4, 0)).unwrap();

    // --- 2. ACT ---
    let start = Instant::now();
    let mut serial = PixelCanvas::new(64, 64);
    TileRasterizer::new(64).execute_serial(&queue, &mut serial.as_framebuffer_mut());
    let mut tiled = PixelCanvas::new(64, 64);
    let stats = rasterize(&pool, &queue, &mut tiled, 16);
    let mut inline = PixelCanvas::new(64, 64);
    rasterize(&WorkerPool::inline(), &queue, &mut inline, 16);
    let elapsed = start.elapsed();

    // --- 3. ASSERT ---
    assert_eq!(stats.tiles, 16);
    assert!(serial.pixels() == tiled.pixels(), "tiled raster differs from serial");
    assert!(serial.pixels() == inline.pixels(), "inline raster differs from serial");
    assert!(elapsed < Duration::from_secs(2), "huge primitives took {elapsed:?}");

    // The disc covers the whole canvas. Each line steps once, halfway along, so the
    // visible parts sit on row 11 and column 21. The last circle touches the center.
    assert!(serial.pixels().iter().all(|&p| p != 0));
    assert_eq!(serial.pixel(32, 32), Some(u32::MAX));
    assert_ne!(serial.pixel(0, 11), serial.pixel(0, 40));
    assert_eq!(serial.pixel(0, 10), serial.pixel(0, 40));
    assert_ne!(serial.pixel(21, 0), serial.pixel(40, 0));
    assert_eq!(serial.pixel(20, 0), serial.pixel(40, 0));
}

#[test]
fn test_sub_view_target_respects_stride() {
    let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));
    let queue = RenderQueue::new(8, 0);
    queue.clear(Rgba8::RED, SortKey::new(0, 0, 0)).unwrap();
    queue.fill_rect(-5, -5, 100, 100, Rgba8::new(0, 0, 255, 255), SortKey::new(0, 1, 0)).unwrap();
    queue.put_pixel(0, 0, Rgba8::WHITE, SortKey::new(0, 2, 0)).unwrap();

    // Paint only the 3x2 rectangle at (1, 1) of a 6x4 canvas.
    let mut pixels = vec![0u32; 6 * 4];
    let mut fb = FramebufferMut::new(&mut pixels, 6, 4, 6).unwrap();
    let mut view = fb.sub_view(1, 1, 3, 2).unwrap();
    let (input, events) = (InputState::new(), InputQueue::new());
    let ctx = FrameContext::new(&pool, &queue, &input, &events);
    let stats = TileRasterizer::new(2).render(&ctx, &queue, &mut view);
    assert_eq!(stats.tiles, 2);

    for y in 0..4 {
        for x in 0..6 {
            let p = pixels[y * 6 + x];
            let inside = (1..4).contains(&x) && (1..3).contains(&y);
            match (inside, x, y) {
                (true, 1, 1) => assert_eq!(p, u32::MAX),
                (true, _, _) => assert_eq!(p, BLUE),
                (false, _, _) => assert_eq!(p, 0, "pixel ({x}, {y}) outside the view was written"),
            }
        }
    }
}

#[test]
fn test_repeated_frames_reuse_the_queue() {
    let pool = WorkerPool::new(&JobSystemConfig::with_workers(2));
    let mut queue = RenderQueue::new(16, 64);
    let mut raster = TileRasterizer::new(8);
    let mut canvas = PixelCanvas::new(20, 20);
    let (input, events) = (InputState::new(), InputQueue::new());

    for frame in 0..5u8 {
        queue.begin_frame();
        let shade = Rgba8::rgb(frame * 40, 0, 0);
        queue.clear(shade, SortKey::default()).unwrap();
        queue.text(0, 0, 1, "A", Rgba8::WHITE, SortKey::new(1, 0, 0)).unwrap();

        let ctx = FrameContext::new(&pool, &queue, &input, &events).with_timing(frame as u64, 0.016, 0.0);
        let stats = raster.execute(&ctx, &queue, &mut canvas.as_framebuffer_mut());
        assert_eq!(stats.commands, 2);
        assert_eq!(canvas.pixel(19, 19), Some(shade.pack()));
        // Top-left of 'A' is blank, column 1 row 0 is lit.
        assert_eq!(canvas.pixel(0, 0), Some(shade.pack()));
        assert_eq!(canvas.pixel(1, 0), Some(u32::MAX));
    }
}
