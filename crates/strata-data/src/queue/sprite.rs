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

use std::ptr::NonNull;

/// A borrowed view of externally owned RGBA8888 sprite pixels.
///
/// Sprite commands carry this view instead of a copy of the pixels. The view
/// erases the lifetime of the storage, so whoever creates one promises that the
/// pixels stay alive and unmodified until the frame that references them has
/// been rasterized. [`SpriteView::from_static`] is the only safe constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteView {
    ptr: NonNull<u32>,
    width: u32,
    height: u32,
    stride: u32,
}

// SAFETY: a view is a read-only window; the constructor contract guarantees the
// pixels are immutable and alive while any view exists.
unsafe impl Send for SpriteView {}
// SAFETY: see above.
unsafe impl Sync for SpriteView {}

fn required_len(width: u32, height: u32, stride: u32) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    (height as usize - 1) * stride as usize + width as usize
}

impl SpriteView {
    /// Creates a view over `width` x `height` pixels whose rows are `stride` pixels apart.
    ///
    /// Returns `None` for a null pointer or `stride < width`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to at least `(height - 1) * stride + width` readable pixels
    /// that stay alive and unmodified until every command referencing the view has
    /// been rasterized.
    pub unsafe fn from_raw(ptr: *const u32, width: u32, height: u32, stride: u32) -> Option<Self> {
        if stride < width {
            return None;
        }
        NonNull::new(ptr.cast_mut()).map(|ptr| Self {
            ptr,
            width,
            height,
            stride,
        })
    }

    /// Creates a view over `pixels`.
    ///
    /// Returns `None` if `pixels` is too short for the requested geometry or
    /// `stride < width`.
    ///
    /// # Safety
    ///
    /// `pixels` must stay alive and unmodified until every command referencing the
    /// view has been rasterized.
    pub unsafe fn from_slice(pixels: &[u32], width: u32, height: u32, stride: u32) -> Option<Self> {
        if stride < width || pixels.len() < required_len(width, height, stride) {
            return None;
        }
        Some(Self {
            ptr: NonNull::from(pixels).cast(),
            width,
            height,
            stride,
        })
    }

    /// Creates a view over pixels that live for the whole program.
    pub fn from_static(pixels: &'static [u32], width: u32, height: u32, stride: u32) -> Option<Self> {
        // SAFETY: 'static shared data outlives every frame and cannot be mutated.
        unsafe { Self::from_slice(pixels, width, height, stride) }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in pixels.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Whether the sprite covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The visible pixels of row `y`.
    pub fn row(&self, y: u32) -> Option<&[u32]> {
        if y >= self.height || self.width == 0 {
            return None;
        }
        let start = y as usize * self.stride as usize;
        // SAFETY: the constructor contract covers `(height - 1) * stride + width`
        // pixels, and `start + width` never exceeds that for `y < height`.
        Some(unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().add(start), self.width as usize) })
    }

    /// The pixel at (`x`, `y`), if inside the sprite.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.row(y).and_then(|row| row.get(x as usize).copied())
    }
}
