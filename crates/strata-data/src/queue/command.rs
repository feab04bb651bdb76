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

use super::sort_key::SortKey;
use super::sprite::SpriteView;
use strata_core::gfx::Rgba8;

/// The primitive a [`Command`] draws.
///
/// How the geometry fields are read depends on the op:
///
/// | op            | `x0`, `y0`   | `x1`, `y1`       | `param`    | payload  |
/// |---------------|--------------|------------------|------------|----------|
/// | `Clear`       | -            | -                | -          | -        |
/// | `PutPixel`    | position     | -                | -          | -        |
/// | `FillRect`    | origin       | width, height    | -          | -        |
/// | `BlendRect`   | origin       | width, height    | -          | -        |
/// | `RectOutline` | origin       | width, height    | thickness  | -        |
/// | `HLine`       | start x, y   | end x (incl.), - | -          | -        |
/// | `VLine`       | x, start y   | -, end y (incl.) | -          | -        |
/// | `Line`        | start        | end              | -          | -        |
/// | `FillCircle`  | center       | -                | radius     | -        |
/// | `Circle`      | center       | -                | radius     | -        |
/// | `Sprite`      | destination  | -                | -          | sprite   |
/// | `Text`        | origin       | -                | scale      | text     |
///
/// For `Sprite` the color is a tint multiplied into each pixel; for `Text` it is
/// the glyph color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Op {
    /// Overwrite the whole target, alpha included.
    #[default]
    Clear,
    /// Write a single pixel.
    PutPixel,
    /// Fill a rectangle.
    FillRect,
    /// Fill a rectangle with source-over alpha blending.
    BlendRect,
    /// Stroke the inside border of a rectangle.
    RectOutline,
    /// Horizontal line.
    HLine,
    /// Vertical line.
    VLine,
    /// Arbitrary line.
    Line,
    /// Filled circle.
    FillCircle,
    /// One-pixel circle outline.
    Circle,
    /// Copy of an external pixel block.
    Sprite,
    /// Fixed-cell debug text.
    Text,
}

/// A range of bytes in a [`RenderQueue`](super::RenderQueue) text arena.
///
/// Spans are only handed out by the queue after their bytes are written, and are
/// only honoured during the frame that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSpan {
    pub(crate) epoch: u64,
    pub(crate) offset: u32,
    pub(crate) len: u32,
}

impl TextSpan {
    /// Byte offset in the arena.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the span holds no byte.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Out-of-line data attached to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Payload {
    /// Nothing attached.
    #[default]
    None,
    /// Externally owned sprite pixels.
    Sprite(SpriteView),
    /// Bytes copied into the queue's text arena.
    Text(TextSpan),
}

/// One draw command. Immutable once published in a queue.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Command {
    /// The primitive.
    pub op: Op,
    /// Packed `0xRRGGBBAA` color.
    pub color: u32,
    /// Paint order.
    pub sort_key: SortKey,
    /// First geometry coordinate; see [`Op`].
    pub x0: i32,
    /// Second geometry coordinate; see [`Op`].
    pub y0: i32,
    /// Third geometry coordinate; see [`Op`].
    pub x1: i32,
    /// Fourth geometry coordinate; see [`Op`].
    pub y1: i32,
    /// Op-specific scalar (radius, thickness, scale).
    pub param: i32,
    /// Attached data.
    pub payload: Payload,
}

impl Command {
    /// A command with zeroed geometry and no payload.
    pub fn new(op: Op, color: Rgba8, sort_key: SortKey) -> Self {
        Self {
            op,
            color: color.pack(),
            sort_key,
            ..Default::default()
        }
    }

    /// Sets the four geometry coordinates.
    pub fn with_coords(mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        self.x0 = x0;
        self.y0 = y0;
        self.x1 = x1;
        self.y1 = y1;
        self
    }

    /// Sets the op-specific scalar.
    pub fn with_param(mut self, param: i32) -> Self {
        self.param = param;
        self
    }

    /// Attaches a payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The color, unpacked.
    pub fn rgba(&self) -> Rgba8 {
        Rgba8::unpack(self.color)
    }
}
