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

use strata_core::gfx::PixelFrame;
use strata_core::platform::Surface;
use strata_core::SurfaceError;

/// A [`Surface`] with no output device that keeps a copy of the last frame.
///
/// Used for tests, capture, and running without a terminal or window.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    expected_size: Option<(u32, u32)>,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    frames_presented: u64,
}

impl HeadlessSurface {
    /// A surface accepting frames of any size.
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that rejects frames not sized `width` x `height`.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            expected_size: Some((width, height)),
            ..Self::default()
        }
    }

    /// Number of frames successfully presented.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// The last presented frame, tightly packed.
    pub fn last_frame(&self) -> Option<PixelFrame<'_>> {
        (self.frames_presented > 0).then(|| PixelFrame::new(self.width, self.height, &self.pixels))
    }
}

impl Surface for HeadlessSurface {
    fn present(&mut self, frame: &PixelFrame<'_>) -> Result<(), SurfaceError> {
        if !frame.valid() {
            return Err(SurfaceError::InvalidFrame("descriptor does not match its storage"));
        }
        if let Some((width, height)) = self.expected_size {
            if (frame.width, frame.height) != (width, height) {
                return Err(SurfaceError::SizeMismatch {
                    width,
                    height,
                    got_width: frame.width,
                    got_height: frame.height,
                });
            }
        }

        // Reuses the buffer; only a size change reallocates.
        self.pixels.clear();
        for y in 0..frame.height {
            if let Some(row) = frame.row(y) {
                self.pixels.extend_from_slice(row);
            }
        }
        self.width = frame.width;
        self.height = frame.height;
        self.frames_presented += 1;
        log::trace!("Headless surface: presented frame #{}", self.frames_presented);
        Ok(())
    }
}
