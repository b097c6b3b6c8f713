//! Text decoding for dump files of unknown provenance.
//!
//! Dumps exported from Windows tools usually arrive as UTF-16 with a byte
//! order mark, everything else as UTF-8 or a single-byte code page. The
//! candidates are tried in a fixed order and the first clean decode wins.
//!
//! A single-byte decode that yields NUL characters is treated as a failure:
//! dump text never contains NUL, but BOM-less UTF-16 is full of them and
//! would otherwise be accepted as UTF-8 or latin-1.

use std::fmt;

/// Candidate encodings, in the order they are attempted.
pub const CANDIDATE_ENCODINGS: [TextEncoding; 5] = [
    TextEncoding::Utf16,
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Utf16Le,
    TextEncoding::Utf16Be,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-16 with a mandatory byte order mark, which selects the endianness.
    Utf16,
    Utf8,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf16Le => "utf-16-le",
            TextEncoding::Utf16Be => "utf-16-be",
        }
    }

    /// Decodes `bytes`, returning `None` on any malformed sequence.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf16 => match bytes {
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
                _ => None,
            },
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .ok()
                .filter(|text| !text.contains('\0'))
                .map(str::to_owned),
            TextEncoding::Latin1 => {
                if bytes.contains(&0) {
                    return None;
                }
                Some(bytes.iter().map(|&b| char::from(b)).collect())
            }
            TextEncoding::Utf16Le if looks_big_endian(bytes) => None,
            TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            TextEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        }
    }
}

/// True when more code units carry a zero in their first byte than in their
/// second, which is how ASCII-heavy big-endian UTF-16 looks.
fn looks_big_endian(bytes: &[u8]) -> bool {
    let (zero_first, zero_second) =
        bytes
            .chunks_exact(2)
            .fold((0usize, 0usize), |(first, second), pair| match (pair[0], pair[1]) {
                (0, b) if b != 0 => (first + 1, second),
                (a, 0) if a != 0 => (first, second + 1),
                _ => (first, second),
            });
    zero_first > zero_second
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }

    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Tries every candidate encoding in order and returns the first one that
/// decodes `bytes` cleanly, together with the decoded text.
pub fn decode_with_fallback(bytes: &[u8]) -> Option<(TextEncoding, String)> {
    CANDIDATE_ENCODINGS.iter().find_map(|encoding| {
        let text = encoding.decode(bytes);
        if text.is_none() {
            tracing::debug!("Input is not valid {}", encoding);
        }
        text.map(|text| (*encoding, text))
    })
}
