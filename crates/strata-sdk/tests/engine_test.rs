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

use anyhow::Result;
use strata_core::gfx::Rgba8;
use strata_core::platform::{InputEvent, Key};
use strata_core::{ConfigError, JobLane, JobSystemConfig, TaskGroup};
use strata_data::queue::SortKey;
use strata_data::FrameContext;
use strata_sdk::{Application, ChannelInputSource, Engine, EngineConfig, HeadlessSurface, RunLoopConfig};
use tempfile::tempdir;

// --- Test Setup: a small application ---

#[derive(Default)]
struct Painter {
    updates: u32,
    stop_after: Option<u32>,
    seen_space: bool,
    last_dt: f64,
    update_times: Vec<f64>,
}

impl Application for Painter {
    fn on_input(&mut self, ctx: &FrameContext<'_>) {
        if ctx.input.key_just_pressed(Key::Space) {
            self.seen_space = true;
        }
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> bool {
        self.updates += 1;
        self.last_dt = ctx.dt_seconds;
        self.update_times.push(ctx.time_seconds);
        self.stop_after.map_or(true, |n| self.updates < n)
    }

    fn render(&mut self, ctx: &FrameContext<'_>) {
        let queue = ctx.queue;
        queue.clear(Rgba8::BLACK, SortKey::new(0, 0, 0)).unwrap();
        // Four producers on worker threads, one quadrant each.
        TaskGroup::scope(ctx.jobs, JobLane::User, |group| {
            for i in 0..4i32 {
                group.run(move || {
                    let (x, y) = ((i % 2) * 8, (i / 2) * 8);
                    let _ = queue.fill_rect(x, y, 8, 8, Rgba8::RED, SortKey::new(1, i as u16, 0));
                });
            }
        });
        if self.seen_space {
            let _ = queue.put_pixel(0, 0, Rgba8::WHITE, SortKey::new(2, 0, 0));
        }
    }
}

fn small_config(workers: u32) -> EngineConfig {
    EngineConfig {
        width: 16,
        height: 16,
        tile_size: 5,
        jobs: if workers == 0 {
            JobSystemConfig::single_threaded()
        } else {
            JobSystemConfig::with_workers(workers)
        },
        ..Default::default()
    }
}

// --- Tests ---

#[test]
fn test_one_step_presents_exactly_one_frame() -> Result<()> {
    // --- 1. ARRANGE ---
    let mut engine = Engine::new(small_config(2))?;
    let mut surface = HeadlessSurface::with_size(16, 16);
    let mut app = Painter::default();

    // --- 2. ACT ---
    let keep_running = engine.step(&mut app, &mut surface, None, 1.0 / 60.0)?;

    // --- 3. ASSERT ---
    assert!(keep_running);
    assert_eq!(surface.frames_presented(), 1);
    assert_eq!(engine.frame_index(), 1);
    let frame = surface.last_frame().unwrap();
    assert!(frame.pixels.iter().all(|&p| p == Rgba8::RED.pack()));
    Ok(())
}

#[test]
fn test_run_stops_when_update_returns_false() -> Result<()> {
    let mut engine = Engine::new(small_config(3))?;
    let mut surface = HeadlessSurface::new();
    let mut app = Painter {
        stop_after: Some(5),
        ..Default::default()
    };

    let stats = engine.run(&mut app, &mut surface, None)?;

    // The fifth update asks to stop, so its frame is never rendered.
    assert_eq!(app.updates, 5);
    assert_eq!(stats.updates, 5);
    assert_eq!(stats.frames, 4);
    assert_eq!(surface.frames_presented(), 4);
    Ok(())
}

#[test]
fn test_run_honours_max_frames() -> Result<()> {
    let mut config = small_config(0);
    config.run_loop.max_frames = 3;
    let mut engine = Engine::new(config)?;
    let mut surface = HeadlessSurface::new();

    let stats = engine.run(&mut Painter::default(), &mut surface, None)?;
    assert_eq!(stats.frames, 3);
    assert_eq!(surface.frames_presented(), 3);
    Ok(())
}

#[test]
fn test_fixed_timestep_runs_whole_steps_only() -> Result<()> {
    let mut config = small_config(1);
    config.run_loop = RunLoopConfig {
        fixed_timestep: true,
        fixed_dt: 0.25,
        max_dt: 1.0,
        ..Default::default()
    };
    let mut engine = Engine::new(config)?;
    let mut surface = HeadlessSurface::new();
    let mut app = Painter::default();

    engine.step(&mut app, &mut surface, None, 0.1)?;
    assert_eq!(app.updates, 0);
    // Frames are still rendered without an update.
    assert_eq!(surface.frames_presented(), 1);

    engine.step(&mut app, &mut surface, None, 0.9)?;
    assert_eq!(app.updates, 4);
    assert_eq!(app.last_dt, 0.25);

    // Clamped to max_dt: 1.0 + the 0.0 left over gives four more steps, not forty.
    engine.step(&mut app, &mut surface, None, 10.0)?;
    assert_eq!(app.updates, 8);
    Ok(())
}

#[test]
fn test_fixed_steps_advance_simulated_time() -> Result<()> {
    // --- 1. ARRANGE ---
    let mut config = small_config(0);
    config.run_loop = RunLoopConfig {
        fixed_timestep: true,
        fixed_dt: 0.25,
        max_dt: 1.0,
        ..Default::default()
    };
    let mut engine = Engine::new(config)?;
    let mut surface = HeadlessSurface::new();
    let mut app = Painter::default();

    // --- 2. ACT ---
    engine.step(&mut app, &mut surface, None, 0.75)?;
    engine.step(&mut app, &mut surface, None, 0.5)?;

    // --- 3. ASSERT ---
    // One distinct timestamp per step, ending on the frame clock.
    assert_eq!(app.update_times, vec![0.25, 0.5, 0.75, 1.0, 1.25]);
    Ok(())
}

#[test]
fn test_channel_input_reaches_the_application() -> Result<()> {
    let mut engine = Engine::new(small_config(2))?;
    let mut surface = HeadlessSurface::new();
    let (sender, mut input) = ChannelInputSource::channel();
    let mut app = Painter::default();

    engine.step(&mut app, &mut surface, Some(&mut input), 0.016)?;
    assert!(!app.seen_space);

    sender.send(InputEvent::key_pressed(Key::Space)).unwrap();
    engine.step(&mut app, &mut surface, Some(&mut input), 0.016)?;
    assert!(app.seen_space);
    assert_eq!(surface.last_frame().unwrap().pixel(0, 0), Some(u32::MAX));
    Ok(())
}

#[test]
fn test_dropped_commands_are_counted() -> Result<()> {
    struct Flood;
    impl Application for Flood {
        fn update(&mut self, _ctx: &FrameContext<'_>) -> bool {
            true
        }
        fn render(&mut self, ctx: &FrameContext<'_>) {
            for i in 0..10 {
                let _ = ctx.queue.put_pixel(i, 0, Rgba8::WHITE, SortKey::default());
            }
            let _ = ctx.queue.text(0, 2, 1, "too long for the arena", Rgba8::WHITE, SortKey::default());
        }
    }

    let mut config = small_config(0);
    config.queue_capacity = 4;
    config.text_arena_bytes = 8;
    let mut engine = Engine::new(config)?;
    let mut surface = HeadlessSurface::new();

    engine.step(&mut Flood, &mut surface, None, 0.0)?;
    engine.step(&mut Flood, &mut surface, None, 0.0)?;
    let stats = engine.stats();
    assert_eq!(stats.dropped_commands, 2 * 6);
    assert_eq!(stats.dropped_text, 2);
    Ok(())
}

#[test]
fn test_parallel_and_inline_engines_render_the_same_frame() -> Result<()> {
    let mut frames = Vec::new();
    for workers in [0, 4] {
        let mut engine = Engine::new(small_config(workers))?;
        let mut surface = HeadlessSurface::new();
        engine.step(&mut Painter::default(), &mut surface, None, 0.016)?;
        frames.push(engine.canvas().pixels().to_vec());
    }
    assert_eq!(frames[0], frames[1]);
    Ok(())
}

#[test]
fn test_engine_config_from_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{ "width": 40, "height": 30, "run_loop": { "max_frames": 2 } }"#)?;

    let config = EngineConfig::from_path(&path)?;
    assert_eq!((config.width, config.height), (40, 30));

    let mut engine = Engine::new(config)?;
    let stats = engine.run(&mut Painter::default(), &mut HeadlessSurface::with_size(40, 30), None)?;
    assert_eq!(stats.frames, 2);

    let missing = EngineConfig::from_path(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io { .. }));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected_by_the_engine() {
    let config = EngineConfig {
        width: 0,
        ..Default::default()
    };
    assert!(Engine::new(config).is_err());
}
