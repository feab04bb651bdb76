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

// Strata Sandbox
// Headless demo: runs a fixed number of frames and saves the last one as a PNG.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use strata_sdk::prelude::*;
use strata_sdk::ChannelInputSource;

const BALL_COUNT: usize = 48;
const PRODUCERS: usize = 4;

#[rustfmt::skip]
static BADGE: [u32; 16] = [
    0xFFFFFFFF, 0xFFCC00FF, 0xFFCC00FF, 0xFFFFFFFF,
    0xFFCC00FF, 0x00000000, 0x00000000, 0xFFCC00FF,
    0xFFCC00FF, 0x00000000, 0x00000000, 0xFFCC00FF,
    0xFFFFFFFF, 0xFFCC00FF, 0xFFCC00FF, 0xFFFFFFFF,
];

#[derive(Debug, Clone, Copy)]
struct Ball {
    pos: [f64; 2],
    vel: [f64; 2],
    radius: i32,
    color: Rgba8,
}

/// The application-owned store the phase scheduler works on.
#[derive(Debug)]
struct World {
    width: f64,
    height: f64,
    gravity: f64,
    balls: Vec<Ball>,
    bounces: u64,
}

impl World {
    fn new(width: u32, height: u32) -> Self {
        let palette = [Rgba8::RED, Rgba8::GREEN, Rgba8::BLUE, Rgba8::YELLOW, Rgba8::CYAN, Rgba8::MAGENTA];
        let balls = (0..BALL_COUNT)
            .map(|i| {
                let t = i as f64;
                Ball {
                    pos: [(t * 37.0) % width as f64, (t * 23.0) % (height as f64 / 2.0)],
                    vel: [((t * 1.7).sin()) * 60.0, 0.0],
                    radius: 3 + (i % 5) as i32,
                    color: palette[i % palette.len()].with_alpha(200),
                }
            })
            .collect();
        Self {
            width: width as f64,
            height: height as f64,
            gravity: 240.0,
            balls,
            bounces: 0,
        }
    }
}

fn build_scheduler() -> PhaseScheduler<World> {
    let mut scheduler = PhaseScheduler::new();

    scheduler.add_write_system(Phase::PreUpdate, |ctx: &FrameContext<'_>, world: &mut World| {
        let dv = world.gravity * ctx.dt_seconds;
        for ball in &mut world.balls {
            ball.vel[1] += dv;
        }
    });

    scheduler.add_write_system(Phase::Update, |ctx: &FrameContext<'_>, world: &mut World| {
        let (w, h) = (world.width, world.height);
        let mut bounces = 0;
        for ball in &mut world.balls {
            let r = ball.radius as f64;
            ball.pos[0] += ball.vel[0] * ctx.dt_seconds;
            ball.pos[1] += ball.vel[1] * ctx.dt_seconds;
            if ball.pos[0] < r || ball.pos[0] > w - r {
                ball.vel[0] = -ball.vel[0];
                ball.pos[0] = ball.pos[0].clamp(r, w - r);
                bounces += 1;
            }
            if ball.pos[1] > h - r {
                ball.vel[1] = -ball.vel[1] * 0.9;
                ball.pos[1] = h - r;
                bounces += 1;
            }
        }
        world.bounces += bounces;
    });

    scheduler.add_read_system(Phase::PostUpdate, |ctx: &FrameContext<'_>, world: &World| {
        if ctx.frame_index % 60 == 0 {
            let energy: f64 = world
                .balls
                .iter()
                .map(|b| 0.5 * (b.vel[0] * b.vel[0] + b.vel[1] * b.vel[1]))
                .sum();
            log::debug!("Frame {}: kinetic energy {energy:.0}", ctx.frame_index);
        }
    });

    scheduler.add_read_system(Phase::PostUpdate, |_ctx: &FrameContext<'_>, world: &World| {
        let escaped = world
            .balls
            .iter()
            .filter(|b| b.pos[0] < 0.0 || b.pos[0] > world.width)
            .count();
        if escaped > 0 {
            log::warn!("{escaped} balls left the playfield");
        }
    });

    scheduler
}

struct SandboxApp {
    world: World,
    scheduler: PhaseScheduler<World>,
    paused: bool,
    quit: bool,
}

impl Application for SandboxApp {
    fn on_input(&mut self, ctx: &FrameContext<'_>) {
        if ctx.input.key_just_pressed(Key::Space) {
            self.paused = !self.paused;
            log::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
        }
        if ctx.input.key_just_pressed(Key::Escape) || ctx.input.key_just_pressed(Key::Q) {
            self.quit = true;
        }
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> bool {
        if self.quit {
            return false;
        }
        if !self.paused {
            self.scheduler.tick(ctx, &mut self.world);
        }
        true
    }

    fn render(&mut self, ctx: &FrameContext<'_>) {
        let queue = ctx.queue;
        let (w, h) = (self.world.width as i32, self.world.height as i32);
        let _ = queue.clear(Rgba8::rgb(12, 14, 28), SortKey::new(0, 0, 0));
        let _ = queue.rect_outline(0, 0, w, h, 2, Rgba8::rgb(80, 80, 120), SortKey::new(3, 0, 0));
        let _ = queue.hline(0, w - 1, h - 12, Rgba8::rgb(50, 50, 70), SortKey::new(0, 1, 0));

        // Several producers push into the same queue; paint order comes from the keys.
        let balls = &self.world.balls;
        let chunk = balls.len().div_ceil(PRODUCERS).max(1);
        TaskGroup::scope(ctx.jobs, JobLane::User, |group| {
            for (c, slice) in balls.chunks(chunk).enumerate() {
                group.run(move || {
                    for (i, ball) in slice.iter().enumerate() {
                        let key = SortKey::new(1, (ball.pos[1] as i32).clamp(0, 4095) as u16, (c * chunk + i) as u16);
                        let (x, y) = (ball.pos[0] as i32, ball.pos[1] as i32);
                        let _ = queue.fill_circle(x, y, ball.radius, ball.color, key);
                        let _ = queue.circle(x, y, ball.radius, Rgba8::WHITE.with_alpha(90), key.with_tie(SortKey::MAX_TIE));
                    }
                });
            }
        });

        if let Some(badge) = SpriteView::from_static(&BADGE, 4, 4, 4) {
            let _ = queue.sprite(w - 10, 6, badge, Rgba8::WHITE, SortKey::new(2, 0, 0));
        }
        let hud = format!("FRAME {}  BOUNCES {}", ctx.frame_index, self.world.bounces);
        let _ = queue.text(6, 6, 1, &hud, Rgba8::WHITE, SortKey::new(4, 0, 0));
        let _ = queue.line(6, 16, 6 + (ctx.frame_index % 100) as i32, 16, Rgba8::GREEN, SortKey::new(4, 1, 0));
    }
}

fn load_config() -> Result<EngineConfig> {
    match std::env::var_os("STRATA_CONFIG") {
        Some(path) => EngineConfig::from_path(&path)
            .with_context(|| format!("Failed to load engine config from {}", PathBuf::from(&path).display())),
        None => Ok(EngineConfig {
            width: 320,
            height: 180,
            run_loop: RunLoopConfig {
                fixed_timestep: true,
                max_frames: 180,
                target_fps: 60,
                ..Default::default()
            },
            ..Default::default()
        }),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("strata_sandbox.png"));

    let config = load_config()?;
    let (width, height) = (config.width, config.height);
    let mut engine = Engine::new(config)?;
    let mut surface = HeadlessSurface::with_size(width, height);

    // Scripted input: pause after one second, resume half a second later.
    let (sender, mut input) = ChannelInputSource::channel();
    let script = std::thread::spawn(move || {
        for delay in [Duration::from_secs(1), Duration::from_millis(500)] {
            std::thread::sleep(delay);
            let tap = [InputEvent::key_pressed(Key::Space), InputEvent::key_released(Key::Space)];
            if tap.into_iter().any(|event| sender.send(event).is_err()) {
                break;
            }
        }
    });

    let mut app = SandboxApp {
        world: World::new(width, height),
        scheduler: build_scheduler(),
        paused: false,
        quit: false,
    };
    let stats = engine.run(&mut app, &mut surface, Some(&mut input))?;
    log::info!("Sandbox finished: {stats:?}");
    drop(input);
    let _ = script.join();

    let frame = surface.last_frame().context("No frame was presented")?;
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.serialize_rgba8888())
        .context("Frame size does not match its pixel data")?;
    image
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Saved last frame to {}", output.display());
    Ok(())
}
