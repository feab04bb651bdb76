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

//! The built-in 5x7 debug font.
//!
//! Each glyph is five column bytes; bit 0 is the top row, bit 6 the bottom row.
//! Glyphs sit in a 6x8 cell, leaving one blank column and one blank row as spacing.

/// Glyph width in pixels.
pub const GLYPH_WIDTH: i32 = 5;
/// Glyph height in pixels.
pub const GLYPH_HEIGHT: i32 = 7;
/// Horizontal advance per character, in unscaled pixels.
pub const CELL_WIDTH: i32 = 6;
/// Vertical advance per line, in unscaled pixels.
pub const CELL_HEIGHT: i32 = 8;

const FIRST: u8 = 0x20;
const LAST: u8 = 0x5F;

#[rustfmt::skip]
static GLYPHS: [[u8; 5]; (LAST - FIRST + 1) as usize] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x14, 0x08, 0x3E, 0x08, 0x14], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x01, 0x01], // 'F'
    [0x3E, 0x41, 0x41, 0x51, 0x32], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x03, 0x04, 0x78, 0x04, 0x03], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
];

/// The column bytes for `byte`.
///
/// Lowercase letters use the uppercase glyphs; anything else outside
/// `0x20..=0x5F` renders as `'?'`.
pub fn glyph(byte: u8) -> &'static [u8; 5] {
    let c = byte.to_ascii_uppercase();
    let c = if (FIRST..=LAST).contains(&c) { c } else { b'?' };
    &GLYPHS[(c - FIRST) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_pixel(byte: u8, col: i32, row: i32) -> bool {
        if !(0..GLYPH_WIDTH).contains(&col) || !(0..GLYPH_HEIGHT).contains(&row) {
            return false;
        }
        glyph(byte)[col as usize] & (1 << row) != 0
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(glyph(b'a'), glyph(b'A'));
        assert_eq!(glyph(b'z'), glyph(b'Z'));
    }

    #[test]
    fn test_unknown_bytes_render_as_question_mark() {
        assert_eq!(glyph(0x7F), glyph(b'?'));
        assert_eq!(glyph(b'{'), glyph(b'?'));
        assert_eq!(glyph(0xC3), glyph(b'?'));
        assert_eq!(glyph(b'\t'), glyph(b'?'));
    }

    #[test]
    fn test_glyph_bits() {
        // '!' is a single column with a gap above the dot.
        assert!(glyph_pixel(b'!', 2, 0));
        assert!(glyph_pixel(b'!', 2, 4));
        assert!(!glyph_pixel(b'!', 2, 5));
        assert!(glyph_pixel(b'!', 2, 6));
        assert!(!glyph_pixel(b'!', 1, 0));
        // Outside the 5x7 box.
        assert!(!glyph_pixel(b'#', 5, 0));
        assert!(!glyph_pixel(b'#', 0, 7));
    }

    #[test]
    fn test_space_is_blank() {
        assert!(glyph(b' ').iter().all(|&c| c == 0));
    }
}
