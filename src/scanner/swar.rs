// Variant C: word-at-a-time SWAR chunked scanner.
//
// Unquoted runs are skipped eight bytes per iteration: one u64 load plus the
// classic zero-byte trick tests a whole word against each structural byte at
// once. A word with a hit drops to byte granularity at the exact offset of
// the first structural byte (trailing zeros / 8). The sub-8-byte tail scans
// byte-by-byte.
//
// Quoted regions always take the byte-granular path: escape handling needs
// one byte of look-ahead, and quoted bytes are a minority of typical CSV.
// Crossing an arbitrary 8-byte boundary is harmless because the word loop
// only ever runs outside quotes.

use std::borrow::Cow;

use crate::core::field::{FieldSpan, QUOTE};
use crate::core::pool::span_pool;
use crate::core::record::OffsetRecord;
use crate::error::ParseError;
use crate::scanner::{
    is_terminator, scan_quoted, skip_terminator, spans_to_row, DEFAULT_DELIMITER,
};

const LO_BITS: u64 = 0x0101_0101_0101_0101;
const HI_BITS: u64 = 0x8080_8080_8080_8080;

/// High bit of each byte lane set iff that byte of `word` equals `needle`.
///
/// `x = word XOR broadcast(needle)` has a zero byte exactly at the matches;
/// `(x - 0x01..01) & !x & 0x80..80` then lights the matching lanes.
#[inline]
fn lanes_eq(word: u64, needle: u8) -> u64 {
    let x = word ^ (LO_BITS * needle as u64);
    x.wrapping_sub(LO_BITS) & !x & HI_BITS
}

#[inline]
fn load_word(input: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&input[pos..pos + 8]);
    u64::from_le_bytes(bytes)
}

/// Advance from `pos` to the next structural byte (delimiter, quote, CR, LF)
/// or to end of input, eight bytes at a time.
#[inline]
fn scan_unquoted(input: &[u8], mut pos: usize, delimiter: u8) -> usize {
    while pos + 8 <= input.len() {
        let word = load_word(input, pos);
        let hits = lanes_eq(word, delimiter)
            | lanes_eq(word, b'\n')
            | lanes_eq(word, b'\r')
            | lanes_eq(word, QUOTE);
        if hits == 0 {
            pos += 8;
            continue;
        }
        return pos + (hits.trailing_zeros() >> 3) as usize;
    }
    while pos < input.len() {
        let byte = input[pos];
        if byte == delimiter || byte == QUOTE || is_terminator(byte) {
            break;
        }
        pos += 1;
    }
    pos
}

/// Parse one record starting at or after `pos`. Same contract as the scalar
/// step; only the unquoted-content skip differs.
fn next_record(
    input: &[u8],
    mut pos: usize,
    delimiter: u8,
    spans: &mut Vec<FieldSpan>,
) -> Result<Option<usize>, ParseError> {
    spans.clear();

    while pos < input.len() && is_terminator(input[pos]) {
        pos = skip_terminator(input, pos);
    }
    if pos >= input.len() {
        return Ok(None);
    }

    loop {
        if pos < input.len() && input[pos] == QUOTE {
            let (span, after_quote) = scan_quoted(input, pos)?;
            spans.push(span);
            pos = after_quote;
            if pos >= input.len() {
                return Ok(Some(pos));
            }
            let byte = input[pos];
            if byte == delimiter {
                pos += 1;
                continue;
            }
            if is_terminator(byte) {
                return Ok(Some(skip_terminator(input, pos)));
            }
            return Err(ParseError::junk(pos, byte));
        }

        let start = pos;
        pos = scan_unquoted(input, pos, delimiter);
        if pos >= input.len() {
            spans.push(FieldSpan::plain(start, pos));
            return Ok(Some(pos));
        }
        let byte = input[pos];
        if byte == delimiter {
            spans.push(FieldSpan::plain(start, pos));
            pos += 1;
            continue;
        }
        if is_terminator(byte) {
            spans.push(FieldSpan::plain(start, pos));
            return Ok(Some(skip_terminator(input, pos)));
        }
        // A quote at the field's first byte would have opened a quoted field
        // above, so this one is mid-field.
        return Err(ParseError::unexpected_quote(pos));
    }
}

/// Parse the whole input into rows of field views.
pub fn parse(input: &[u8]) -> Result<Vec<Vec<Cow<'_, [u8]>>>, ParseError> {
    parse_with_delimiter(input, DEFAULT_DELIMITER)
}

/// [`parse`] with a custom single-byte field delimiter.
pub fn parse_with_delimiter(input: &[u8], delimiter: u8) -> Result<Vec<Vec<Cow<'_, [u8]>>>, ParseError> {
    let mut rows = Vec::with_capacity(input.len() / 50 + 1);
    let mut spans = span_pool().acquire();
    let mut pos = 0;
    while let Some(next) = next_record(input, pos, delimiter, &mut spans)? {
        rows.push(spans_to_row(input, &spans));
        pos = next;
    }
    Ok(rows)
}

/// Parse the whole input into packed offset records.
pub fn parse_offset_records(input: &[u8]) -> Result<Vec<OffsetRecord>, ParseError> {
    let mut records = Vec::with_capacity(input.len() / 50 + 1);
    let mut spans = span_pool().acquire();
    let mut pos = 0;
    while let Some(next) = next_record(input, pos, DEFAULT_DELIMITER, &mut spans)? {
        records.push(OffsetRecord::from_spans(input, &spans));
        pos = next;
    }
    Ok(records)
}
