/*!
 * Raw and cleaned text types.
 *
 * `RawText` stores UTF-16 code units exactly as extracted from a document
 * element, so unpaired surrogate halves survive as data instead of being
 * rejected at the boundary. `CleanText` can only be produced by the
 * sanitizer and is always well-formed.
 */

use std::fmt;
use std::ops::Deref;

/// A contiguous run of a `RawText`: either well-formed text or one lone surrogate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Well-formed Unicode scalar values
    Text(String),
    /// An unpaired UTF-16 surrogate code unit
    LoneSurrogate(u16),
}

/// Text as extracted from a document; may be ill-formed
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RawText {
    units: Vec<u16>,
}

impl RawText {
    /// Create an empty raw text
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap UTF-16 code units, keeping unpaired surrogates
    pub fn from_utf16(units: impl Into<Vec<u16>>) -> Self {
        Self { units: units.into() }
    }

    /// Build from code points; values above U+10FFFF are dropped,
    /// surrogate-range values are kept as lone units
    pub fn from_code_points<I: IntoIterator<Item = u32>>(points: I) -> Self {
        let mut units = Vec::new();
        for point in points {
            if (0xD800..=0xDFFF).contains(&point) {
                units.push(point as u16);
            } else if let Some(c) = char::from_u32(point) {
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
            }
        }
        Self { units }
    }

    /// Underlying code units
    pub fn as_units(&self) -> &[u16] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Whether any surrogate appears outside a valid high/low pair
    pub fn has_lone_surrogates(&self) -> bool {
        char::decode_utf16(self.units.iter().copied()).any(|r| r.is_err())
    }

    /// Split into well-formed runs and lone surrogates, in order
    pub fn pieces(&self) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for decoded in char::decode_utf16(self.units.iter().copied()) {
            match decoded {
                Ok(c) => current.push(c),
                Err(e) => {
                    if !current.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut current)));
                    }
                    pieces.push(Piece::LoneSurrogate(e.unpaired_surrogate()));
                }
            }
        }
        if !current.is_empty() {
            pieces.push(Piece::Text(current));
        }
        pieces
    }

    /// Convert to a `String`, replacing each lone surrogate with `placeholder`
    pub fn to_string_with(&self, placeholder: char) -> String {
        char::decode_utf16(self.units.iter().copied())
            .map(|r| r.unwrap_or(placeholder))
            .collect()
    }

    /// Convert to a `String` using U+FFFD for lone surrogates
    pub fn to_string_lossy(&self) -> String {
        self.to_string_with(char::REPLACEMENT_CHARACTER)
    }

    /// Render for log lines: lone surrogates appear as `\u{d83d}` escapes
    pub fn escaped(&self) -> String {
        render_pieces(&self.pieces())
    }
}

/// Render pieces the way `RawText::escaped` does
pub(crate) fn render_pieces(pieces: &[Piece]) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(s) => out.push_str(s),
            Piece::LoneSurrogate(unit) => out.push_str(&format!("\\u{{{:x}}}", unit)),
        }
    }
    out
}

impl fmt::Debug for RawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawText({:?})", self.escaped())
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self { units: text.encode_utf16().collect() }
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<&String> for RawText {
    fn from(text: &String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<&CleanText> for RawText {
    fn from(text: &CleanText) -> Self {
        Self::from(text.as_str())
    }
}

/// Text that has passed every sanitizer pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CleanText(String);

impl CleanText {
    /// Only the sanitizer builds clean text
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for CleanText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CleanText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CleanText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for CleanText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CleanText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for CleanText {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

impl From<CleanText> for String {
    fn from(text: CleanText) -> Self {
        text.0
    }
}
