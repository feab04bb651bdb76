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

use std::fmt;

/// The paint order of a command.
///
/// A 32-bit composite, most significant field first:
///
/// | bits  | field | range      |
/// |-------|-------|------------|
/// | 31-24 | layer | `0..=255`  |
/// | 23-12 | order | `0..=4095` |
/// | 11-0  | tie   | `0..=4095` |
///
/// Comparing two keys compares layer, then order, then tie. Lower keys are painted
/// first, so higher keys end up on top.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SortKey(u32);

impl SortKey {
    /// Largest representable `order` value.
    pub const MAX_ORDER: u16 = 0x0FFF;
    /// Largest representable `tie` value.
    pub const MAX_TIE: u16 = 0x0FFF;

    const ORDER_SHIFT: u32 = 12;
    const LAYER_SHIFT: u32 = 24;
    const FIELD_MASK: u32 = 0x0FFF;

    /// Builds a key. `order` and `tie` saturate at 4095.
    pub const fn new(layer: u8, order: u16, tie: u16) -> Self {
        let order = if order > Self::MAX_ORDER { Self::MAX_ORDER } else { order };
        let tie = if tie > Self::MAX_TIE { Self::MAX_TIE } else { tie };
        Self(
            ((layer as u32) << Self::LAYER_SHIFT)
                | ((order as u32) << Self::ORDER_SHIFT)
                | tie as u32,
        )
    }

    /// Wraps an already packed key.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The packed value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The layer field.
    pub const fn layer(self) -> u8 {
        (self.0 >> Self::LAYER_SHIFT) as u8
    }

    /// The order field.
    pub const fn order(self) -> u16 {
        ((self.0 >> Self::ORDER_SHIFT) & Self::FIELD_MASK) as u16
    }

    /// The tie field.
    pub const fn tie(self) -> u16 {
        (self.0 & Self::FIELD_MASK) as u16
    }

    /// The same key with a different tie field.
    pub const fn with_tie(self, tie: u16) -> Self {
        Self::new(self.layer(), self.order(), tie)
    }
}

impl From<u32> for SortKey {
    fn from(raw: u32) -> Self {
        SortKey(raw)
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey")
            .field("layer", &self.layer())
            .field("order", &self.order())
            .field("tie", &self.tie())
            .finish()
    }
}
