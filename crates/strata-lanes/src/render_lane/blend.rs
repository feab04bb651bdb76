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

//! 8-bit compositing on packed `0xRRGGBBAA` pixels.

#[inline]
const fn channels(p: u32) -> [u32; 4] {
    [(p >> 24) & 0xFF, (p >> 16) & 0xFF, (p >> 8) & 0xFF, p & 0xFF]
}

#[inline]
const fn pack(r: u32, g: u32, b: u32, a: u32) -> u32 {
    (r << 24) | (g << 16) | (b << 8) | a
}

/// Composites `src` over `dst` (source-over, straight alpha).
///
/// Source alpha 255 replaces `dst`, source alpha 0 leaves it untouched. Otherwise
/// each color channel is `(s * sa + d * (255 - sa)) / 255` and the output alpha is
/// `sa + da * (255 - sa) / 255`, all in integer arithmetic.
#[inline]
pub fn blend_over(dst: u32, src: u32) -> u32 {
    let sa = src & 0xFF;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let [sr, sg, sb, _] = channels(src);
    let [dr, dg, db, da] = channels(dst);
    let inv = 255 - sa;
    pack(
        (sr * sa + dr * inv) / 255,
        (sg * sa + dg * inv) / 255,
        (sb * sa + db * inv) / 255,
        sa + da * inv / 255,
    )
}

/// Multiplies every channel of `src`, alpha included, by the matching channel of
/// `tint` (`c * t / 255`). A white opaque tint is the identity.
#[inline]
pub fn tint(src: u32, tint: u32) -> u32 {
    if tint == u32::MAX {
        return src;
    }
    let [sr, sg, sb, sa] = channels(src);
    let [tr, tg, tb, ta] = channels(tint);
    pack(sr * tr / 255, sg * tg / 255, sb * tb / 255, sa * ta / 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_source_overwrites() {
        assert_eq!(blend_over(0x1122_33FF, 0xAABB_CCFF), 0xAABB_CCFF);
    }

    #[test]
    fn test_transparent_source_is_a_no_op() {
        assert_eq!(blend_over(0x1122_3344, 0xFFFF_FF00), 0x1122_3344);
    }

    #[test]
    fn test_half_alpha_over_opaque_black() {
        // White at alpha 128 over opaque black.
        let out = blend_over(0x0000_00FF, 0xFFFF_FF80);
        let c = 255 * 128 / 255;
        let a = 128 + 255 * 127 / 255;
        assert_eq!(out, (c << 24) | (c << 16) | (c << 8) | a);
        assert_eq!(out & 0xFF, 255);
    }

    #[test]
    fn test_blend_onto_transparent_keeps_source_alpha() {
        let out = blend_over(0, 0xFF00_0040);
        assert_eq!(out & 0xFF, 0x40);
        assert_eq!(out >> 24, 255 * 0x40 / 255);
    }

    #[test]
    fn test_tint() {
        assert_eq!(tint(0x80FF_40FF, 0xFFFF_FFFF), 0x80FF_40FF);
        assert_eq!(tint(0xFFFF_FFFF, 0xFF00_00FF), 0xFF00_00FF);
        assert_eq!(tint(0xFFFF_FFFF, 0x8080_8080), 0x8080_8080);
        assert_eq!(tint(0x1234_5678, 0x0000_0000), 0);
    }
}
