//! Conversion between key text and the byte sequences stored in the trie.
//!
//! Keys are stored as UTF-8 with one exception: U+0000 is written as the
//! overlong pair `C0 80`, so the terminal code `0` never appears inside a key.

use crate::TrieError;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// Encodes a string into its stored byte sequence.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        push_code_point(&mut out, c as u32);
    }
    out
}

/// Encodes UTF-16 code units, pairing surrogate halves into one code point.
///
/// # Errors
///
/// Returns [`TrieError::MalformedSurrogate`] if a high surrogate is not
/// followed by a low surrogate, or a low surrogate appears on its own.
pub fn encode_utf16(units: &[u16]) -> Result<Vec<u8>, TrieError> {
    let mut out = Vec::with_capacity(units.len() * 3);
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        let code_point = if HIGH_SURROGATES.contains(&unit) {
            match units.get(i + 1) {
                Some(&low) if LOW_SURROGATES.contains(&low) => {
                    i += 1;
                    0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                }
                _ => return Err(TrieError::MalformedSurrogate { index: i }),
            }
        } else if LOW_SURROGATES.contains(&unit) {
            return Err(TrieError::MalformedSurrogate { index: i });
        } else {
            u32::from(unit)
        };
        push_code_point(&mut out, code_point);
        i += 1;
    }
    Ok(out)
}

fn push_code_point(out: &mut Vec<u8>, cp: u32) {
    if cp == 0 {
        out.extend_from_slice(&[0xC0, 0x80]);
    } else if cp < 0x80 {
        out.push(cp as u8);
    } else if cp < 0x800 {
        out.push(0xC0 | (cp >> 6) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    } else if cp < 0x1_0000 {
        out.push(0xE0 | (cp >> 12) as u8);
        out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    } else {
        out.push(0xF0 | (cp >> 18) as u8);
        out.push(0x80 | ((cp >> 12) & 0x3F) as u8);
        out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
        out.push(0x80 | (cp & 0x3F) as u8);
    }
}

/// Iterates the code points of a stored byte sequence.
///
/// Truncated trailing sequences read missing continuation bytes as zero bits.
struct CodePoints<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl CodePoints<'_> {
    #[inline]
    fn continuation(&mut self) -> u32 {
        let b = self.bytes.get(self.pos).copied().unwrap_or(0x80);
        self.pos += 1;
        u32::from(b & 0x3F)
    }
}

impl Iterator for CodePoints<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let b1 = u32::from(*self.bytes.get(self.pos)?);
        self.pos += 1;
        let cp = if b1 < 0x80 {
            b1
        } else if b1 >> 5 == 0x06 {
            ((b1 & 0x1F) << 6) | self.continuation()
        } else if b1 >> 4 == 0x0E {
            let b2 = self.continuation();
            let b3 = self.continuation();
            ((b1 & 0x0F) << 12) | (b2 << 6) | b3
        } else {
            let b2 = self.continuation();
            let b3 = self.continuation();
            let b4 = self.continuation();
            ((b1 & 0x07) << 18) | (b2 << 12) | (b3 << 6) | b4
        };
        Some(cp)
    }
}

/// Decodes a stored byte sequence back into UTF-16 code units, re-emitting
/// surrogate pairs for code points at or above U+10000.
pub fn decode_utf16(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len());
    for cp in (CodePoints { bytes, pos: 0 }) {
        if cp < 0x1_0000 {
            out.push(cp as u16);
        } else {
            let v = cp - 0x1_0000;
            out.push(0xD800 | ((v >> 10) & 0x3FF) as u16);
            out.push(0xDC00 | (v & 0x3FF) as u16);
        }
    }
    out
}

/// Decodes a stored byte sequence back into a string.
///
/// Code points that are not valid scalar values are replaced with U+FFFD.
pub fn decode(bytes: &[u8]) -> String {
    CodePoints { bytes, pos: 0 }
        .map(|cp| char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
