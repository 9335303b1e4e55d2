//! Single-byte text encodings and default-font metrics.
//!
//! Only what the rewriter needs: decoding simple-font strings without a
//! ToUnicode map, encoding replacement text for the inserted Helvetica font,
//! and Helvetica advance widths so inserted text has a measurable extent.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Byte used for characters WinAnsi cannot represent
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Unicode values for WinAnsi bytes 0x80..=0x9F (0 where undefined)
const WIN_ANSI_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0,
    0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

static WIN_ANSI_REVERSE: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    (0u8..=255)
        .filter_map(|b| win_ansi_to_char(b).map(|c| (c, b)))
        .collect()
});

/// Decode one WinAnsi byte
pub fn win_ansi_to_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => match WIN_ANSI_HIGH[(byte - 0x80) as usize] {
            0 => None,
            code => char::from_u32(code as u32),
        },
        // Latin-1 control range carries no glyphs
        0x00..=0x1F | 0x7F => None,
        _ => Some(byte as char),
    }
}

/// Encode a string to WinAnsi bytes.
///
/// Returns the bytes and the number of characters that had to be replaced.
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, usize) {
    let mut replaced = 0;
    let bytes = text
        .chars()
        .map(|c| match WIN_ANSI_REVERSE.get(&c) {
            Some(&b) => b,
            None => {
                replaced += 1;
                REPLACEMENT_BYTE
            }
        })
        .collect();
    (bytes, replaced)
}

/// Resolve a glyph name from an `/Encoding /Differences` array.
///
/// Handles single-character names, `uniXXXX` names and the punctuation names
/// that show up in practice; anything else yields `None`.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    let c = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" | "quoteright" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "quoteleft" => '\u{2018}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        _ => return None,
    };
    Some(c)
}

/// Helvetica advance widths for codes 32..=126, in glyph space units
pub const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// First code covered by [`HELVETICA_WIDTHS`]
pub const HELVETICA_FIRST_CHAR: u8 = 32;

/// Width used for Helvetica codes outside the ASCII table
pub const HELVETICA_DEFAULT_WIDTH: f64 = 556.0;

/// Helvetica advance width of a WinAnsi code, in glyph space units
pub fn helvetica_width(code: u8) -> f64 {
    code.checked_sub(HELVETICA_FIRST_CHAR)
        .and_then(|i| HELVETICA_WIDTHS.get(i as usize))
        .map(|&w| w as f64)
        .unwrap_or(HELVETICA_DEFAULT_WIDTH)
}
