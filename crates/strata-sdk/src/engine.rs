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

//! The frame loop: input, update, render, rasterize, present.

use crate::config::EngineConfig;
use crate::Application;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use strata_core::gfx::PixelCanvas;
use strata_core::job::{JobSystem, WorkerPool};
use strata_core::platform::{InputCollector, InputQueue, InputSource, InputState, Surface};
use strata_data::{FrameContext, RenderQueue};
use strata_lanes::{RenderLane, TileRasterizer};

/// Counters accumulated over the frames an [`Engine`] has run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunStats {
    /// Frames presented.
    pub frames: u64,
    /// Calls to [`Application::update`].
    pub updates: u64,
    /// Draw commands dropped because the queue was full.
    pub dropped_commands: u64,
    /// Text commands dropped because the arena was full.
    pub dropped_text: u64,
    /// Input events dropped because the event record was full.
    pub dropped_input: u64,
    /// Wall time spent in [`Engine::run`].
    pub elapsed: Duration,
}

/// Owns the per-frame machinery and drives an [`Application`].
///
/// The engine owns one worker pool, one command queue, one render lane and the
/// canvas. Nothing is global: two engines in one process do not share anything.
pub struct Engine {
    config: EngineConfig,
    jobs: WorkerPool,
    queue: RenderQueue,
    lane: Box<dyn RenderLane>,
    canvas: PixelCanvas,
    input_state: InputState,
    input_queue: InputQueue,
    frame_index: u64,
    time_seconds: f64,
    accumulator: f64,
    stats: RunStats,
}

impl Engine {
    /// Validates `config` and builds every subsystem.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().context("Invalid engine configuration")?;

        let jobs = WorkerPool::new(&config.jobs);
        let queue = RenderQueue::new(config.queue_capacity, config.text_arena_bytes);
        let lane: Box<dyn RenderLane> =
            Box::new(TileRasterizer::with_capacity(config.tile_size, config.queue_capacity));

        log::info!(
            "Strata engine: {}x{} canvas, {} workers, {} command slots, render lane '{}'",
            config.width,
            config.height,
            jobs.worker_count(),
            queue.capacity(),
            lane.strategy_name()
        );

        Ok(Self {
            canvas: PixelCanvas::new(config.width, config.height),
            config,
            jobs,
            queue,
            lane,
            input_state: InputState::new(),
            input_queue: InputQueue::new(),
            frame_index: 0,
            time_seconds: 0.0,
            accumulator: 0.0,
            stats: RunStats::default(),
        })
    }

    /// Replaces the render lane.
    pub fn with_render_lane(mut self, lane: Box<dyn RenderLane>) -> Self {
        log::info!("Render lane switched to '{}'", lane.strategy_name());
        self.lane = lane;
        self
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine's job system.
    pub fn jobs(&self) -> &dyn JobSystem {
        &self.jobs
    }

    /// The canvas holding the last rasterized frame.
    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }

    /// Index of the next frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Counters so far.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Runs frames until the application stops or `max_frames` is reached.
    pub fn run<A>(
        &mut self,
        app: &mut A,
        surface: &mut dyn Surface,
        mut input: Option<&mut dyn InputSource>,
    ) -> Result<RunStats>
    where
        A: Application + ?Sized,
    {
        let run_loop = self.config.run_loop.clone();
        let frame_budget =
            (run_loop.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / run_loop.target_fps as f64));
        log::info!("Strata engine: run loop starting ({run_loop:?})");

        let start = Instant::now();
        let mut prev = start;
        let mut frames_this_run = 0u64;
        loop {
            if run_loop.max_frames != 0 && frames_this_run >= run_loop.max_frames {
                log::info!("Reached the frame limit ({}), stopping.", run_loop.max_frames);
                break;
            }

            let now = Instant::now();
            let dt = now.duration_since(prev).as_secs_f64();
            prev = now;

            let source = input.as_mut().map(|src| &mut **src as &mut dyn InputSource);
            if !self.step(app, surface, source, dt)? {
                log::info!("Application requested shutdown after {} frames.", self.stats.frames);
                break;
            }
            frames_this_run += 1;

            if let Some(budget) = frame_budget {
                let spent = now.elapsed();
                if spent < budget {
                    std::thread::sleep(budget - spent);
                }
            }
        }

        self.stats.elapsed += start.elapsed();
        log::info!(
            "Run loop finished: {} frames, {} updates, {} dropped commands in {:.2?}",
            self.stats.frames,
            self.stats.updates,
            self.stats.dropped_commands,
            self.stats.elapsed
        );
        Ok(self.stats)
    }

    /// Runs exactly one frame with a measured frame time of `dt_seconds`.
    ///
    /// Returns `Ok(false)` without rendering when the application asks to stop.
    pub fn step<A>(
        &mut self,
        app: &mut A,
        surface: &mut dyn Surface,
        input: Option<&mut dyn InputSource>,
        dt_seconds: f64,
    ) -> Result<bool>
    where
        A: Application + ?Sized,
    {
        let run_loop = &self.config.run_loop;
        let dt = if dt_seconds.is_finite() {
            dt_seconds.clamp(0.0, run_loop.max_dt)
        } else {
            0.0
        };
        self.time_seconds += dt;

        // --- Input ---
        self.input_state.begin_frame();
        self.input_queue.clear();
        if let Some(source) = input {
            source.pump(&mut InputCollector::new(&mut self.input_state, &mut self.input_queue));
        }
        self.stats.dropped_input += self.input_queue.dropped() as u64;

        self.queue.begin_frame();
        let ctx = FrameContext::new(&self.jobs, &self.queue, &self.input_state, &self.input_queue)
            .with_timing(self.frame_index, dt, self.time_seconds);

        app.on_input(&ctx);

        // --- Update ---
        if run_loop.fixed_timestep {
            self.accumulator += dt;
            // Each step is stamped with the time at its end; the last one never
            // runs ahead of the frame clock.
            let mut step_time = self.time_seconds - self.accumulator;
            while self.accumulator >= run_loop.fixed_dt {
                step_time += run_loop.fixed_dt;
                let step_ctx = ctx.with_timing(self.frame_index, run_loop.fixed_dt, step_time);
                let keep_running = app.update(&step_ctx);
                self.stats.updates += 1;
                self.jobs.wait_idle();
                if !keep_running {
                    return Ok(false);
                }
                self.accumulator -= run_loop.fixed_dt;
            }
        } else {
            let keep_running = app.update(&ctx);
            self.stats.updates += 1;
            self.jobs.wait_idle();
            if !keep_running {
                return Ok(false);
            }
        }

        // --- Render ---
        app.render(&ctx);
        self.jobs.wait_idle();

        let (dropped, text_dropped) = (self.queue.dropped(), self.queue.text_dropped());
        if dropped > 0 || text_dropped > 0 {
            log::warn!(
                "Frame {}: dropped {dropped} commands and {text_dropped} text commands (capacity {}, text arena {} bytes)",
                self.frame_index,
                self.queue.capacity(),
                self.queue.text_capacity()
            );
        }
        self.stats.dropped_commands += dropped as u64;
        self.stats.dropped_text += text_dropped as u64;

        let raster = self
            .lane
            .render(&ctx, &self.queue, &mut self.canvas.as_framebuffer_mut());
        log::debug!(
            "Frame {}: dt {:.4}s, {} commands over {} tiles",
            self.frame_index,
            dt,
            raster.commands,
            raster.tiles
        );

        surface
            .present(&self.canvas.frame())
            .with_context(|| format!("Failed to present frame {}", self.frame_index))?;

        self.frame_index += 1;
        self.stats.frames += 1;
        Ok(true)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("workers", &self.jobs.worker_count())
            .field("render_lane", &self.lane.strategy_name())
            .field("frame_index", &self.frame_index)
            .field("stats", &self.stats)
            .finish()
    }
}
