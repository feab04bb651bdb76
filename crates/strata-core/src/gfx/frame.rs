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

//! Framebuffer views and the owned `PixelCanvas`.

use super::color::Rgba8;

/// Memory layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// One `u32` per pixel, `0xRRGGBBAA`.
    #[default]
    Rgba8888,
}

impl PixelFormat {
    /// Size of one pixel in bytes.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
        }
    }
}

/// Minimum slice length for a `width` x `height` image with the given row stride.
fn required_len(width: u32, height: u32, stride: u32) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    (height as usize - 1) * stride as usize + width as usize
}

/// An immutable view of a finished frame, handed to presentation surfaces.
#[derive(Debug, Clone, Copy)]
pub struct PixelFrame<'a> {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    /// Distance between the starts of two consecutive rows, in pixels.
    pub stride: u32,
    /// Pixel encoding.
    pub format: PixelFormat,
    /// Pixel storage, row-major.
    pub pixels: &'a [u32],
}

impl<'a> PixelFrame<'a> {
    /// Wraps a tightly packed buffer.
    pub fn new(width: u32, height: u32, pixels: &'a [u32]) -> Self {
        Self::with_stride(width, height, width, pixels)
    }

    /// Wraps a buffer whose rows are `stride` pixels apart.
    pub fn with_stride(width: u32, height: u32, stride: u32, pixels: &'a [u32]) -> Self {
        Self {
            width,
            height,
            stride,
            format: PixelFormat::Rgba8888,
            pixels,
        }
    }

    /// Whether the descriptor is consistent with its storage.
    pub fn valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.stride >= self.width
            && self.pixels.len() >= required_len(self.width, self.height, self.stride)
    }

    /// The visible pixels of row `y`.
    pub fn row(&self, y: u32) -> Option<&'a [u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// The pixel at (`x`, `y`), if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x as usize])
    }

    /// Copies the visible pixels out as tightly packed `R, G, B, A` bytes.
    ///
    /// Returns an empty vector for an invalid frame. Presentation should prefer
    /// the zero-copy view; this is meant for capture and transport.
    pub fn serialize_rgba8888(&self) -> Vec<u8> {
        if !self.valid() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            if let Some(row) = self.row(y) {
                for &p in row {
                    out.extend_from_slice(&p.to_be_bytes());
                }
            }
        }
        out
    }

    /// The raw storage reinterpreted as bytes, in native `u32` byte order,
    /// including any row padding.
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.pixels)
    }
}

/// A mutable view of a pixel buffer with an arbitrary row stride.
#[derive(Debug)]
pub struct FramebufferMut<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'a> FramebufferMut<'a> {
    /// Wraps `pixels` as a `width` x `height` image with rows `stride` pixels apart.
    ///
    /// Returns `None` if `stride < width` or the slice is too short.
    pub fn new(pixels: &'a mut [u32], width: u32, height: u32, stride: u32) -> Option<Self> {
        if stride < width || pixels.len() < required_len(width, height, stride) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// Visible width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Visible height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in pixels.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Whether the view covers no pixel at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The underlying storage, padding included.
    pub fn pixels(&self) -> &[u32] {
        self.pixels
    }

    /// The underlying storage, padding included.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        self.pixels
    }

    /// The pixel at (`x`, `y`), if inside the view.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.stride as usize + x as usize)
            .copied()
    }

    /// Overwrites the pixel at (`x`, `y`); out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.stride as usize + x as usize;
        if let Some(p) = self.pixels.get_mut(idx) {
            *p = color;
        }
    }

    /// Overwrites every visible pixel, leaving row padding untouched.
    pub fn fill(&mut self, color: u32) {
        let (w, stride) = (self.width as usize, self.stride as usize);
        for y in 0..self.height as usize {
            self.pixels[y * stride..y * stride + w].fill(color);
        }
    }

    /// A view of the sub-rectangle at (`x`, `y`) of size `width` x `height`,
    /// clipped to this view. Returns `None` when the clipped rectangle is empty.
    pub fn sub_view(&mut self, x: u32, y: u32, width: u32, height: u32) -> Option<FramebufferMut<'_>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let w = width.min(self.width - x);
        let h = height.min(self.height - y);
        if w == 0 || h == 0 {
            return None;
        }
        let start = y as usize * self.stride as usize + x as usize;
        let len = required_len(w, h, self.stride);
        Some(FramebufferMut {
            pixels: &mut self.pixels[start..start + len],
            width: w,
            height: h,
            stride: self.stride,
        })
    }

    /// An immutable frame descriptor over the same pixels.
    pub fn as_frame(&self) -> PixelFrame<'_> {
        PixelFrame::with_stride(self.width, self.height, self.stride, self.pixels)
    }
}

/// An owned, tightly packed RGBA8888 pixel buffer.
#[derive(Debug, Clone, Default)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelCanvas {
    /// Allocates a `width` x `height` canvas cleared to transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self::default();
        canvas.resize(width, height);
        canvas
    }

    /// Reallocates the canvas; the previous contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, 0);
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Overwrites every pixel with `color`.
    pub fn clear(&mut self, color: Rgba8) {
        self.pixels.fill(color.pack());
    }

    /// Overwrites one pixel; coordinates outside the canvas are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = color.pack();
    }

    /// The pixel at (`x`, `y`), if inside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Raw pixel storage.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Raw pixel storage.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// A zero-copy frame descriptor for presentation.
    pub fn frame(&self) -> PixelFrame<'_> {
        PixelFrame::new(self.width, self.height, &self.pixels)
    }

    /// A mutable view for rasterization.
    pub fn as_framebuffer_mut(&mut self) -> FramebufferMut<'_> {
        FramebufferMut {
            pixels: &mut self.pixels,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}
