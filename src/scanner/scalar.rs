// Variant A: scalar byte-at-a-time reference scanner.
//
// The behavioral oracle: every other variant must match this one record for
// record, error for error. Fields come out as content spans; extraction
// borrows from the input unless a doubled quote forces an owned buffer.

use std::borrow::Cow;

use crate::core::field::{FieldSpan, QUOTE};
use crate::core::pool::span_pool;
use crate::core::record::OffsetRecord;
use crate::error::ParseError;
use crate::scanner::{
    is_terminator, scan_quoted, skip_terminator, spans_to_row, DEFAULT_DELIMITER,
};

/// Parse one record starting at or after `pos`, replacing `spans` with the
/// record's content spans.
///
/// Blank lines before the record are consumed silently. Returns
/// `Ok(Some(next_pos))` when a record was produced and `Ok(None)` at end of
/// input. This is the single step the streaming and parallel surfaces reuse.
pub(crate) fn next_record(
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
        loop {
            if pos >= input.len() {
                spans.push(FieldSpan::plain(start, pos));
                return Ok(Some(pos));
            }
            let byte = input[pos];
            if byte == delimiter {
                spans.push(FieldSpan::plain(start, pos));
                pos += 1;
                break;
            }
            if is_terminator(byte) {
                spans.push(FieldSpan::plain(start, pos));
                return Ok(Some(skip_terminator(input, pos)));
            }
            if byte == QUOTE {
                return Err(ParseError::unexpected_quote(pos));
            }
            pos += 1;
        }
    }
}

/// Parse the whole input into rows of field views.
///
/// Fields borrow from `input` wherever possible; only quoted fields
/// containing `""` are decoded into owned buffers. The returned rows are
/// valid for as long as `input` is live and unmodified.
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
    parse_offset_records_with_delimiter(input, DEFAULT_DELIMITER)
}

/// [`parse_offset_records`] with a custom single-byte field delimiter.
pub fn parse_offset_records_with_delimiter(
    input: &[u8],
    delimiter: u8,
) -> Result<Vec<OffsetRecord>, ParseError> {
    let mut records = Vec::with_capacity(input.len() / 50 + 1);
    let mut spans = span_pool().acquire();
    let mut pos = 0;
    while let Some(next) = next_record(input, pos, delimiter, &mut spans)? {
        records.push(OffsetRecord::from_spans(input, &spans));
        pos = next;
    }
    Ok(records)
}
