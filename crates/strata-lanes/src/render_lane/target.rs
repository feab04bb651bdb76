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

//! Disjoint, clipped write access to parts of one framebuffer.

use super::blend::blend_over;
use std::marker::PhantomData;
use strata_core::gfx::FramebufferMut;

/// Half-open pixel rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    /// Left edge, included.
    pub x0: i64,
    /// Top edge, included.
    pub y0: i64,
    /// Right edge, excluded.
    pub x1: i64,
    /// Bottom edge, excluded.
    pub y1: i64,
}

impl ClipRect {
    /// Whether the inclusive box `[min_x, max_x] x [min_y, max_y]` misses the clip.
    #[inline]
    pub fn rejects(&self, min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> bool {
        max_x < self.x0 || max_y < self.y0 || min_x >= self.x1 || min_y >= self.y1
    }

    /// Pixel count.
    pub fn area(&self) -> u64 {
        ((self.x1 - self.x0) * (self.y1 - self.y0)) as u64
    }
}

/// Write access to one rectangle of a framebuffer.
///
/// Every write goes through the clip, so a target never touches a pixel outside
/// its rectangle. Targets handed out by [`Tiles`] cover disjoint rectangles and
/// may be moved to different threads.
pub struct TileTarget<'fb> {
    base: *mut u32,
    stride: usize,
    clip: ClipRect,
    _fb: PhantomData<&'fb mut [u32]>,
}

// SAFETY: a target only dereferences pixels inside its clip, clips of live
// targets never overlap, and the framebuffer stays mutably borrowed for 'fb.
unsafe impl Send for TileTarget<'_> {}

impl<'fb> TileTarget<'fb> {
    /// A single target covering the whole framebuffer.
    pub fn full(fb: &'fb mut FramebufferMut<'_>) -> Self {
        let clip = ClipRect {
            x0: 0,
            y0: 0,
            x1: fb.width() as i64,
            y1: fb.height() as i64,
        };
        Self {
            stride: fb.stride() as usize,
            base: fb.pixels_mut().as_mut_ptr(),
            clip,
            _fb: PhantomData,
        }
    }

    /// The rectangle this target may write.
    #[inline]
    pub fn clip(&self) -> ClipRect {
        self.clip
    }

    /// # Safety
    ///
    /// (`x`, `y`) must lie inside the clip.
    #[inline]
    unsafe fn ptr_at(&self, x: i64, y: i64) -> *mut u32 {
        // SAFETY: the caller keeps (x, y) inside the clip, which lies inside the
        // framebuffer the base pointer was taken from.
        unsafe { self.base.add(y as usize * self.stride + x as usize) }
    }

    /// The current value at (`x`, `y`), if inside the clip.
    pub fn get(&self, x: i64, y: i64) -> Option<u32> {
        let c = self.clip;
        if x < c.x0 || x >= c.x1 || y < c.y0 || y >= c.y1 {
            return None;
        }
        // SAFETY: bounds checked against the clip above.
        Some(unsafe { *self.ptr_at(x, y) })
    }

    /// Blends `color` into (`x`, `y`).
    #[inline]
    pub fn plot(&mut self, x: i64, y: i64, color: u32) {
        let c = self.clip;
        if x < c.x0 || x >= c.x1 || y < c.y0 || y >= c.y1 {
            return;
        }
        // SAFETY: bounds checked against the clip above.
        unsafe {
            let p = self.ptr_at(x, y);
            *p = blend_over(*p, color);
        }
    }

    /// Blends `color` into row `y` from `x0` to `x1`, both included.
    pub fn hspan(&mut self, x0: i64, x1: i64, y: i64, color: u32) {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        self.fill(lo, y, hi - lo + 1, 1, color);
    }

    /// Blends `color` into column `x` from `y0` to `y1`, both included.
    pub fn vspan(&mut self, x: i64, y0: i64, y1: i64, color: u32) {
        let (lo, hi) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        self.fill(x, lo, 1, hi - lo + 1, color);
    }

    /// Blends `color` into the `w` x `h` rectangle at (`x`, `y`).
    pub fn fill(&mut self, x: i64, y: i64, w: i64, h: i64, color: u32) {
        if w <= 0 || h <= 0 || color & 0xFF == 0 {
            return;
        }
        let c = self.clip;
        let (x0, x1) = (x.max(c.x0), (x + w).min(c.x1));
        let (y0, y1) = (y.max(c.y0), (y + h).min(c.y1));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let opaque = color & 0xFF == 0xFF;
        for row in y0..y1 {
            // SAFETY: `x0..x1` x `row` lies inside the clip.
            let span = unsafe {
                std::slice::from_raw_parts_mut(self.ptr_at(x0, row), (x1 - x0) as usize)
            };
            if opaque {
                span.fill(color);
            } else {
                for p in span {
                    *p = blend_over(*p, color);
                }
            }
        }
    }

    /// Overwrites every pixel of the clip, alpha included.
    pub fn overwrite_all(&mut self, color: u32) {
        let c = self.clip;
        for row in c.y0..c.y1 {
            // SAFETY: full clip rows.
            let span = unsafe {
                std::slice::from_raw_parts_mut(self.ptr_at(c.x0, row), (c.x1 - c.x0) as usize)
            };
            span.fill(color);
        }
    }
}

impl std::fmt::Debug for TileTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileTarget").field("clip", &self.clip).finish()
    }
}

/// Splits a framebuffer into square tiles, row-major, without allocating.
///
/// The tiles are disjoint and together cover every visible pixel exactly once;
/// tiles on the right and bottom edges are cut to the canvas.
pub struct Tiles<'fb> {
    base: *mut u32,
    stride: usize,
    width: i64,
    height: i64,
    size: i64,
    next_x: i64,
    next_y: i64,
    _fb: PhantomData<&'fb mut [u32]>,
}

impl<'fb> Tiles<'fb> {
    /// Tiles of `tile_size` pixels (at least 1) over `fb`.
    pub fn new(fb: &'fb mut FramebufferMut<'_>, tile_size: u32) -> Self {
        let (width, height) = if fb.is_empty() {
            (0, 0)
        } else {
            (fb.width() as i64, fb.height() as i64)
        };
        Self {
            stride: fb.stride() as usize,
            base: fb.pixels_mut().as_mut_ptr(),
            width,
            height,
            size: tile_size.max(1) as i64,
            next_x: 0,
            next_y: 0,
            _fb: PhantomData,
        }
    }

    /// Number of tiles for a `width` x `height` canvas.
    pub fn count_for(width: u32, height: u32, tile_size: u32) -> usize {
        let size = tile_size.max(1);
        width.div_ceil(size) as usize * height.div_ceil(size) as usize
    }
}

impl<'fb> Iterator for Tiles<'fb> {
    type Item = TileTarget<'fb>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.width == 0 || self.next_y >= self.height {
            return None;
        }
        let clip = ClipRect {
            x0: self.next_x,
            y0: self.next_y,
            x1: (self.next_x + self.size).min(self.width),
            y1: (self.next_y + self.size).min(self.height),
        };
        self.next_x += self.size;
        if self.next_x >= self.width {
            self.next_x = 0;
            self.next_y += self.size;
        }
        Some(TileTarget {
            base: self.base,
            stride: self.stride,
            clip,
            _fb: PhantomData,
        })
    }
}
