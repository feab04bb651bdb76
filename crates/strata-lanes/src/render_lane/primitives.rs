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

//! Replays single draw commands into a clipped target.
//!
//! Every primitive except `Clear` blends with [`blend_over`](super::blend::blend_over),
//! and every pixel is touched at most once per command. The outcome for a pixel
//! therefore depends only on the command list, never on how the canvas was tiled.

use super::blend::tint;
use super::font::{glyph, CELL_HEIGHT, CELL_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::target::TileTarget;
use strata_data::queue::{Command, Op, RenderQueue};

/// Draws `cmd` into `target`. Payloads are resolved through `queue`.
pub fn draw(target: &mut TileTarget<'_>, cmd: &Command, queue: &RenderQueue) {
    let color = cmd.color;
    let (x0, y0, x1, y1) = (cmd.x0 as i64, cmd.y0 as i64, cmd.x1 as i64, cmd.y1 as i64);
    match cmd.op {
        Op::Clear => target.overwrite_all(color),
        Op::PutPixel => target.plot(x0, y0, color),
        Op::FillRect | Op::BlendRect => target.fill(x0, y0, x1, y1, color),
        Op::RectOutline => rect_outline(target, x0, y0, x1, y1, cmd.param as i64, color),
        Op::HLine => target.hspan(x0, x1, y0, color),
        Op::VLine => target.vspan(x0, y0, y1, color),
        Op::Line => line(target, x0, y0, x1, y1, color),
        Op::FillCircle => fill_circle(target, x0, y0, cmd.param as i64, color),
        Op::Circle => circle(target, x0, y0, cmd.param as i64, color),
        Op::Sprite => sprite(target, cmd, queue),
        Op::Text => text(target, cmd, queue),
    }
}

/// Inner border of the `w` x `h` rectangle, as four non-overlapping bands.
#[allow(clippy::too_many_arguments)]
fn rect_outline(target: &mut TileTarget<'_>, x: i64, y: i64, w: i64, h: i64, t: i64, color: u32) {
    if w <= 0 || h <= 0 || t <= 0 {
        return;
    }
    let top = t.min(h);
    let bottom = t.min(h - top);
    target.fill(x, y, w, top, color);
    target.fill(x, y + h - bottom, w, bottom, color);

    let middle = h - top - bottom;
    if middle > 0 {
        let left = t.min(w);
        let right = t.min(w - left);
        target.fill(x, y + top, left, middle, color);
        target.fill(x + w - right, y + top, right, middle, color);
    }
}

/// Bresenham line. Only the steps whose major coordinate lies inside the clip are
/// visited; the minor coordinate of step `n` is computed in closed form, so every
/// tile sees the pixels a full walk from `(x0, y0)` would produce.
fn line(target: &mut TileTarget<'_>, x0: i64, y0: i64, x1: i64, y1: i64, color: u32) {
    let clip = target.clip();
    if clip.rejects(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)) {
        return;
    }
    let (dx, dy) = ((x1 - x0).abs(), (y1 - y0).abs());
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    if dx >= dy {
        let Some((first, last)) = steps_within(x0, sx, dx, clip.x0, clip.x1) else {
            return;
        };
        for n in first..=last {
            target.plot(x0 + sx * n, y0 + sy * minor_offset(n, dx, dy), color);
        }
    } else {
        let Some((first, last)) = steps_within(y0, sy, dy, clip.y0, clip.y1) else {
            return;
        };
        for n in first..=last {
            target.plot(x0 + sx * minor_offset(n, dy, dx), y0 + sy * n, color);
        }
    }
}

/// The step range `[first, last]` within `0..=len` for which `start + step * n`
/// lies in `[lo, hi)`.
fn steps_within(start: i64, step: i64, len: i64, lo: i64, hi: i64) -> Option<(i64, i64)> {
    let (first, last) = if step > 0 {
        ((lo - start).max(0), (hi - 1 - start).min(len))
    } else {
        ((start - (hi - 1)).max(0), (start - lo).min(len))
    };
    (first <= last).then_some((first, last))
}

/// Minor-axis offset after `n` major steps: `round(n * minor / major)`, halves
/// rounded up, which is where the Bresenham error term puts it.
fn minor_offset(n: i64, major: i64, minor: i64) -> i64 {
    if major == 0 {
        return 0;
    }
    let (n, major, minor) = (n as i128, major as i128, minor as i128);
    ((2 * minor * n + major) / (2 * major)) as i64
}

/// Filled disc of every pixel whose center lies within `r + 1/2` of the center
/// (`dx² + dy² <= r² + r`). This is the boundary the midpoint decision variable
/// tests against, so the [`circle`] outline of the same radius lies inside it.
/// Only rows inside the clip are visited, one span each.
fn fill_circle(target: &mut TileTarget<'_>, cx: i64, cy: i64, r: i64, color: u32) {
    let clip = target.clip();
    if r <= 0 || clip.rejects(cx - r, cy - r, cx + r, cy + r) {
        return;
    }
    let limit = r as i128 * r as i128 + r as i128;
    let top = (cy - r).max(clip.y0);
    let bottom = (cy + r).min(clip.y1 - 1);
    for y in top..=bottom {
        let dy = (y - cy) as i128;
        let half = isqrt(limit - dy * dy) as i64;
        target.hspan(cx - half, cx + half, y, color);
    }
}

/// Midpoint circle outline.
///
/// The walk over the first octant plots `(x(y), y)` for `y = 0, 1, ..` while
/// `x >= y`, where `x(y)` is the largest `x` with `x² - x + y² < r²`. Each octant
/// point has `y` as one of the coordinates of every reflection, so only the `y`
/// values whose reflections can land inside the clip are evaluated.
fn circle(target: &mut TileTarget<'_>, cx: i64, cy: i64, r: i64, color: u32) {
    let clip = target.clip();
    if r <= 0 || clip.rejects(cx - r, cy - r, cx + r, cy + r) {
        return;
    }
    let (lx, hx) = (clip.x0 - cx, clip.x1 - 1 - cx);
    let (ly, hy) = (clip.y0 - cy, clip.y1 - 1 - cy);
    let mut ranges = [
        (lx.max(0), hx.min(r)),
        ((-hx).max(0), (-lx).min(r)),
        (ly.max(0), hy.min(r)),
        ((-hy).max(0), (-ly).min(r)),
    ];
    ranges.sort_unstable();

    // Ranges may overlap; each y is visited once.
    let mut next = 0;
    for (lo, hi) in ranges {
        if lo > hi {
            continue;
        }
        for y in lo.max(next)..=hi {
            if let Some(x) = octant_x(r, y).filter(|&x| x >= y) {
                plot8(target, cx, cy, x, y, color);
            }
        }
        next = next.max(hi + 1);
    }
}

/// `x(y)` of the midpoint walk, or `None` once `y` is past the circle.
fn octant_x(r: i64, y: i64) -> Option<i64> {
    let t = r as i128 * r as i128 - y as i128 * y as i128 - 1;
    if t < 0 {
        return None;
    }
    // Largest x with x(x - 1) <= t, i.e. (2x - 1)² <= 4t + 1.
    Some(((isqrt(4 * t + 1) + 1) / 2) as i64)
}

/// Floor of the square root of `n`, or 0 for `n <= 0`.
fn isqrt(n: i128) -> i128 {
    if n <= 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as i128;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

/// The eight octant reflections of (`x`, `y`), each distinct point once.
fn plot8(target: &mut TileTarget<'_>, cx: i64, cy: i64, x: i64, y: i64, color: u32) {
    let points = [
        (cx + x, cy + y),
        (cx - x, cy + y),
        (cx + x, cy - y),
        (cx - x, cy - y),
        (cx + y, cy + x),
        (cx - y, cy + x),
        (cx + y, cy - x),
        (cx - y, cy - x),
    ];
    for (i, &(px, py)) in points.iter().enumerate() {
        if !points[..i].contains(&(px, py)) {
            target.plot(px, py, color);
        }
    }
}

fn sprite(target: &mut TileTarget<'_>, cmd: &Command, queue: &RenderQueue) {
    let Some(view) = queue.sprite_payload(cmd) else {
        return;
    };
    if view.is_empty() {
        return;
    }
    let (dx, dy) = (cmd.x0 as i64, cmd.y0 as i64);
    let clip = target.clip();
    let x_start = dx.max(clip.x0);
    let x_end = (dx + view.width() as i64).min(clip.x1);
    let y_start = dy.max(clip.y0);
    let y_end = (dy + view.height() as i64).min(clip.y1);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    for y in y_start..y_end {
        let Some(row) = view.row((y - dy) as u32) else {
            continue;
        };
        for x in x_start..x_end {
            let src = row[(x - dx) as usize];
            target.plot(x, y, tint(src, cmd.color));
        }
    }
}

fn text(target: &mut TileTarget<'_>, cmd: &Command, queue: &RenderQueue) {
    let Some(bytes) = queue.text_payload(cmd) else {
        return;
    };
    let scale = cmd.param as i64;
    if scale < 1 || bytes.is_empty() {
        return;
    }
    let clip = target.clip();
    let (origin_x, mut pen_y) = (cmd.x0 as i64, cmd.y0 as i64);
    let mut pen_x = origin_x;

    for &byte in bytes {
        if byte == b'\n' {
            pen_x = origin_x;
            pen_y += CELL_HEIGHT as i64 * scale;
            continue;
        }
        let glyph_w = GLYPH_WIDTH as i64 * scale;
        let glyph_h = GLYPH_HEIGHT as i64 * scale;
        if !clip.rejects(pen_x, pen_y, pen_x + glyph_w - 1, pen_y + glyph_h - 1) {
            for (col, bits) in glyph(byte).iter().enumerate() {
                for row in 0..GLYPH_HEIGHT {
                    if bits & (1 << row) != 0 {
                        target.fill(
                            pen_x + col as i64 * scale,
                            pen_y + row as i64 * scale,
                            scale,
                            scale,
                            cmd.color,
                        );
                    }
                }
            }
        }
        pen_x += CELL_WIDTH as i64 * scale;
    }
}
