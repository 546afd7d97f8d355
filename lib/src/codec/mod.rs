//! Physical key encoding.
//!
//! A key is laid out as
//!
//! ```text
//! <index prefix> (<tag><body><SEP>){per slot} <lengths block> <lengths block width>
//! ```
//!
//! Values come first so that a range scan over a key prefix sees terms in
//! their natural order; the fixed-width length headers trail and are located
//! from the end of the key.

pub mod fpstring;
pub mod quad;
pub mod term;

use crate::error::{Result, StoreError};

pub use quad::{QuadReader, QuadWriter};
pub use term::{read_term, write_term};

/// Field separator. Sorts below every printable character.
pub const SEP: &str = "\0\0";

/// Appended to a key prefix to form an upper bound above every key that
/// starts with the prefix.
pub const BOUNDARY: &str = "\u{10FFFF}";

/// Width in chars of one length header.
pub const LENGTH_WIDTH: usize = 4;

/// Largest field length (UTF-8 bytes) a header can represent.
pub const MAX_FIELD_LEN: usize = 36 * 36 * 36 * 36 - 1;

pub mod tags {
    pub const NAMED_NODE: char = '0';
    pub const BLANK_NODE: char = '1';
    pub const GENERIC_LITERAL: char = '2';
    pub const STRING_LITERAL: char = '3';
    pub const LANG_LITERAL: char = '4';
    pub const NUMERIC_LITERAL: char = '5';
    pub const DEFAULT_GRAPH: char = '6';
    pub const DATE_TIME_LITERAL: char = '7';
}

/// Body written for the default graph.
pub const DEFAULT_GRAPH_BODY: &str = "dg";

/// One term encoded once per write and reused for every index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTerm {
    pub tag: char,
    /// Concatenated fixed-width length headers.
    pub lengths: String,
    /// Body without the tag.
    pub value: String,
}

impl SerializedTerm {
    /// The part of the body that defines this term's position among terms of
    /// the same tag: the sortable number for numerics and date-times, the
    /// whole body otherwise.
    pub fn sort_region(&self) -> &str {
        match self.tag {
            tags::NUMERIC_LITERAL | tags::DATE_TIME_LITERAL => self
                .value
                .get(..fpstring::ENCODED_WIDTH)
                .unwrap_or(&self.value),
            _ => &self.value,
        }
    }
}

/// Cursor over a key being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingState {
    pub key_offset: usize,
    pub lengths_offset: usize,
}

pub(crate) fn encode_length(len: usize) -> Result<String> {
    if len > MAX_FIELD_LEN {
        return Err(StoreError::codec(format!(
            "field of {} bytes exceeds the maximum of {}",
            len, MAX_FIELD_LEN
        )));
    }
    let mut digits = [b'0'; LENGTH_WIDTH];
    let mut n = len;
    for slot in digits.iter_mut().rev() {
        let d = (n % 36) as u8;
        *slot = if d < 10 { b'0' + d } else { b'a' + d - 10 };
        n /= 36;
    }
    Ok(digits.iter().map(|b| *b as char).collect())
}

pub(crate) fn decode_length(header: &str) -> Result<usize> {
    if header.len() != LENGTH_WIDTH {
        return Err(StoreError::codec(format!("malformed length header {:?}", header)));
    }
    header.chars().try_fold(0usize, |acc, c| {
        c.to_digit(36)
            .map(|d| acc * 36 + d as usize)
            .ok_or_else(|| StoreError::codec(format!("malformed length header {:?}", header)))
    })
}

/// Bounds-checked substring; slicing outside the key or through a
/// multi-byte char is a codec error.
pub(crate) fn slice(key: &str, start: usize, len: usize) -> Result<&str> {
    start
        .checked_add(len)
        .and_then(|end| key.get(start..end))
        .ok_or_else(|| {
            StoreError::codec(format!(
                "slice {}..+{} out of bounds for key of {} bytes",
                start,
                len,
                key.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_headers_are_fixed_width_base36() {
        assert_eq!(encode_length(0).unwrap(), "0000");
        assert_eq!(encode_length(35).unwrap(), "000z");
        assert_eq!(encode_length(36).unwrap(), "0010");
        assert_eq!(encode_length(129).unwrap(), "003l");
        assert_eq!(encode_length(MAX_FIELD_LEN).unwrap(), "zzzz");
        assert!(encode_length(MAX_FIELD_LEN + 1).is_err());
        for n in [0, 1, 129, 5000, MAX_FIELD_LEN] {
            assert_eq!(decode_length(&encode_length(n).unwrap()).unwrap(), n);
        }
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(decode_length("00").is_err());
        assert!(decode_length("00!0").is_err());
    }

    #[test]
    fn slice_checks_bounds() {
        assert_eq!(slice("abcdef", 1, 3).unwrap(), "bcd");
        assert!(slice("abc", 2, 5).is_err());
        assert!(slice("é", 1, 1).is_err());
    }
}
