// Row-parallel parse using rayon.
//
// Phase 1 (single-threaded): find record start positions with a quote-aware
// sweep that does no field work. Phase 2: parse each record independently on
// the rayon pool via the reference single-record step, materializing owned
// fields since rows cross thread boundaries.
//
// Outputs and errors match the reference scanner exactly; when several rows
// fail, the error with the smallest byte offset wins. If the sweep ends
// inside a quoted region the row split is unreliable, so the whole input is
// re-parsed serially to produce the reference diagnostic.

use rayon::prelude::*;

use crate::core::field::QUOTE;
use crate::error::ParseError;
use crate::scanner::{is_terminator, scalar, skip_terminator, DEFAULT_DELIMITER};

/// Parse the whole input in parallel, returning owned rows.
pub fn parse_parallel(input: &[u8]) -> Result<Vec<Vec<Vec<u8>>>, ParseError> {
    parse_parallel_with_delimiter(input, DEFAULT_DELIMITER)
}

/// [`parse_parallel`] with a custom single-byte field delimiter.
pub fn parse_parallel_with_delimiter(
    input: &[u8],
    delimiter: u8,
) -> Result<Vec<Vec<Vec<u8>>>, ParseError> {
    let starts = match record_starts(input) {
        Some(starts) => starts,
        // Input ends inside a quoted region; the serial parse reports the
        // exact failure.
        None => return parse_serial_owned(input, delimiter),
    };

    let parsed: Vec<Result<Vec<Vec<u8>>, ParseError>> = starts
        .into_par_iter()
        .map(|start| {
            let mut spans = Vec::new();
            scalar::next_record(input, start, delimiter, &mut spans).map(|_| {
                spans
                    .iter()
                    .map(|span| {
                        crate::core::field::span_to_cow(input, *span).into_owned()
                    })
                    .collect()
            })
        })
        .collect();

    if let Some(err) = parsed
        .iter()
        .filter_map(|row| row.as_ref().err())
        .min_by_key(|err| err.offset)
    {
        return Err(*err);
    }

    Ok(parsed.into_iter().filter_map(Result::ok).collect())
}

/// Quote-aware sweep for record start positions. Blank lines produce no
/// start. Returns None when the input ends inside a quoted region.
fn record_starts(input: &[u8]) -> Option<Vec<usize>> {
    let mut starts = Vec::with_capacity(input.len() / 50 + 1);
    let mut pos = 0;
    let mut in_quotes = false;
    let mut pending_start = true;

    while pos < input.len() {
        let byte = input[pos];
        if in_quotes {
            if byte == QUOTE {
                if pos + 1 < input.len() && input[pos + 1] == QUOTE {
                    pos += 2;
                    continue;
                }
                in_quotes = false;
            }
            pos += 1;
            continue;
        }
        if is_terminator(byte) {
            pending_start = true;
            pos = skip_terminator(input, pos);
            continue;
        }
        if pending_start {
            starts.push(pos);
            pending_start = false;
        }
        if byte == QUOTE {
            in_quotes = true;
        }
        pos += 1;
    }

    if in_quotes {
        None
    } else {
        Some(starts)
    }
}

fn parse_serial_owned(input: &[u8], delimiter: u8) -> Result<Vec<Vec<Vec<u8>>>, ParseError> {
    let rows = scalar::parse_with_delimiter(input, delimiter)?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(|field| field.into_owned()).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parallel_simple() {
        let rows = parse_parallel(b"a,b,c\n1,2,3\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(rows[1], vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn test_parallel_quoted_newline() {
        let rows = parse_parallel(b"a,\"line1\nline2\",c\nd,e,f\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], b"line1\nline2".to_vec());
    }

    #[test]
    fn test_parallel_many_rows_matches_scalar() {
        let mut input = Vec::new();
        for i in 0..2000 {
            input.extend_from_slice(format!("{i},{},\"q{}\"\n", i + 1, i + 2).as_bytes());
        }
        let parallel = parse_parallel(&input).unwrap();
        let serial = parse_serial_owned(&input, b',').unwrap();
        assert_eq!(parallel, serial);
    }

    #[test]
    fn test_parallel_skips_blank_lines() {
        let rows = parse_parallel(b"a\n\n\nb\n").unwrap();
        assert_eq!(rows, vec![vec![b"a".to_vec()], vec![b"b".to_vec()]]);
    }

    #[test]
    fn test_first_error_in_input_order_wins() {
        let err = parse_parallel(b"fine\nbad\"one\nworse\"two\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedQuoteInUnquotedField);
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_unclosed_quote_falls_back_to_serial_diagnostic() {
        let input: &[u8] = b"a,b\nc,\"open\nstill open";
        let parallel_err = parse_parallel(input).unwrap_err();
        let serial_err = scalar::parse(input).unwrap_err();
        assert_eq!(parallel_err, serial_err);
        assert_eq!(parallel_err.kind, ErrorKind::UnclosedQuotedField);
        assert_eq!(parallel_err.offset, 6);
    }

    #[test]
    fn test_record_starts_positions() {
        assert_eq!(record_starts(b"a,b\nc,d\n"), Some(vec![0, 4]));
        assert_eq!(record_starts(b"\n\na\n"), Some(vec![2]));
        assert_eq!(record_starts(b""), Some(vec![]));
        assert_eq!(record_starts(b"\"open"), None);
    }
}
