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

//! Pixel storage and color types.
//!
//! Every pixel is a `u32` packed as `0xRRGGBBAA`. Rows may be padded: a row
//! `stride` (in pixels) can exceed the visible width.

pub mod color;
pub mod frame;

pub use self::color::Rgba8;
pub use self::frame::{FramebufferMut, PixelCanvas, PixelFormat, PixelFrame};
