// rapidcsv: RFC 4180 CSV decoding core with cross-validated scanners.
//
// Library safety: no unwrap/expect outside tests. Fallible paths return
// ParseError and propagate with `?`.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//
// Scanner variants (all produce identical records and identical errors):
// A: Scalar byte-at-a-time reference (scanner::scalar)
// B: Table-driven DFA, for validation and teaching (scanner::dfa)
// C: SWAR word-at-a-time chunked scanner (scanner::swar)
// D: Two-stage SIMD scanner with scalar fallback (scanner::simd)
// Plus the streaming surface (scanner::streaming) and a rayon row-parallel
// convenience (scanner::parallel).
//
// Every field view borrows from the caller's input span unless a quoted
// field contains an escaped quote; the span must outlive every view. The
// core never mutates the input and never assumes null termination. Length
// zero is valid and parses to zero records.

pub mod core;
pub mod error;
pub mod scanner;

use std::borrow::Cow;

pub use crate::core::pool::{scratch_pool, Pool, PooledVec};
pub use crate::core::probe::vector_path_available;
pub use crate::core::record::OffsetRecord;
pub use crate::error::{ErrorKind, ParseError};
pub use crate::scanner::parallel::{parse_parallel, parse_parallel_with_delimiter};
pub use crate::scanner::scalar::{
    parse, parse_offset_records, parse_offset_records_with_delimiter, parse_with_delimiter,
};
pub use crate::scanner::simd::{SimdOptions, SimdScanner};
pub use crate::scanner::streaming::{StreamingOptions, StreamingScanner};
pub use crate::scanner::DEFAULT_DELIMITER;

/// Detach rows from the input span by copying every borrowed field.
pub fn to_owned_rows(rows: Vec<Vec<Cow<'_, [u8]>>>) -> Vec<Vec<Vec<u8>>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(|field| field.into_owned()).collect())
        .collect()
}

/// Rows as strings, replacing invalid UTF-8 with the replacement character.
pub fn to_string_rows(rows: &[Vec<Cow<'_, [u8]>>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|field| String::from_utf8_lossy(field).to_string())
                .collect()
        })
        .collect()
}
