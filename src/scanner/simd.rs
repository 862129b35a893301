// Variant D: two-stage SIMD scanner.
//
// Stage 1 classifies each 64-byte chunk into three bitmasks (quotes,
// delimiters, terminators) in O(1) per chunk: two 32-byte AVX2
// compare+movemask pairs per class, combined into one u64 with bit i for
// chunk byte i. A scalar mask builder covers the sub-64-byte tail, targets
// without the vector ISA, and factories configured with
// `use_vector_path: false`; Stage 2 is identical either way.
//
// Stage 2 walks the set bits of all three masks in ascending order,
// carrying the inside-quote state across chunk boundaries. Content runs
// produce no bits, so the walk touches only structural bytes. Delimiter and
// terminator bits seen while inside a quoted region are field content and
// are skipped. Escaped-quote pairs are cancelled in the walk itself with a
// one-byte peek and a skip cursor rather than a separate mask pass: the
// `Q & (Q >> 1)` formulation miscounts runs of three or more quotes and
// cannot see a pair straddling a chunk boundary, while the peek handles
// both and keeps the carried inside bit exact at every boundary. (A
// carry-less-multiply prefix-XOR over cleaned quote bits would be an
// equivalent branchless formulation.)
//
// At every closing-quote bit the next input byte must be the delimiter, a
// terminator, or end of input; anything else fails exactly where the
// reference scanner fails.

use std::borrow::Cow;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8, _mm256_set1_epi8,
};

use crate::core::field::{FieldSpan, QUOTE};
use crate::core::pool::span_pool;
use crate::core::probe::vector_path_available;
use crate::core::record::OffsetRecord;
use crate::error::ParseError;
use crate::scanner::{is_terminator, skip_terminator, spans_to_row, DEFAULT_DELIMITER};

/// Stage-1 chunk size in bytes.
const CHUNK: usize = 64;

/// Configuration for the two-stage scanner factory.
#[derive(Debug, Clone, Copy)]
pub struct SimdOptions {
    /// Use the vector Stage 1 when the hardware probe allows it.
    /// Set false to force the scalar fallback.
    pub use_vector_path: bool,
    /// Field delimiter. Must be ASCII for the vector path; `"`, CR, and LF
    /// are always structural regardless of this choice.
    pub delimiter: u8,
}

impl Default for SimdOptions {
    fn default() -> Self {
        SimdOptions {
            use_vector_path: true,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Per-chunk structural bitmasks. Bit i describes chunk byte i.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ChunkMasks {
    quotes: u64,
    delims: u64,
    terms: u64,
}

/// Two-stage scanner with a resolved Stage-1 implementation.
#[derive(Debug, Clone, Copy)]
pub struct SimdScanner {
    delimiter: u8,
    vectorized: bool,
}

impl SimdScanner {
    pub fn new() -> Self {
        Self::with_options(SimdOptions::default())
    }

    /// Build a scanner, probing the hardware on first use. Non-ASCII
    /// delimiters always get the scalar Stage 1.
    pub fn with_options(options: SimdOptions) -> Self {
        debug_assert!(
            options.delimiter != QUOTE && !is_terminator(options.delimiter),
            "delimiter collides with a structural byte"
        );
        let vectorized =
            options.use_vector_path && options.delimiter.is_ascii() && vector_path_available();
        SimdScanner {
            delimiter: options.delimiter,
            vectorized,
        }
    }

    /// True when Stage 1 runs on the vector unit.
    pub fn uses_vector_path(&self) -> bool {
        self.vectorized
    }

    /// Parse the whole input into rows of field views.
    pub fn parse<'a>(&self, input: &'a [u8]) -> Result<Vec<Vec<Cow<'a, [u8]>>>, ParseError> {
        let mut rows = Vec::with_capacity(input.len() / 50 + 1);
        self.each_record(input, |spans| rows.push(spans_to_row(input, spans)))?;
        Ok(rows)
    }

    /// Parse the whole input into packed offset records.
    pub fn parse_offset_records(&self, input: &[u8]) -> Result<Vec<OffsetRecord>, ParseError> {
        let mut records = Vec::with_capacity(input.len() / 50 + 1);
        self.each_record(input, |spans| {
            records.push(OffsetRecord::from_spans(input, spans))
        })?;
        Ok(records)
    }

    #[cfg(target_arch = "x86_64")]
    fn masks(&self, chunk: &[u8]) -> ChunkMasks {
        if self.vectorized && chunk.len() == CHUNK {
            // SAFETY: `vectorized` is set only when the probe reported AVX2,
            // and the chunk carries the full 64 bytes the loads read.
            unsafe { masks_avx2(chunk.as_ptr(), self.delimiter) }
        } else {
            scalar_masks(chunk, self.delimiter)
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn masks(&self, chunk: &[u8]) -> ChunkMasks {
        scalar_masks(chunk, self.delimiter)
    }

    /// Stage 2: walk the structural bitmasks and hand each record's content
    /// spans to `on_record`, in input order.
    fn each_record<F>(&self, input: &[u8], mut on_record: F) -> Result<(), ParseError>
    where
        F: FnMut(&[FieldSpan]),
    {
        struct QuotedState {
            open: usize,
            content_start: usize,
            needs_unescape: bool,
        }

        let len = input.len();
        let mut spans = span_pool().acquire();

        let mut field_start = 0usize;
        let mut field_closed = false;
        let mut quoted: Option<QuotedState> = None;
        // Events below this absolute position were consumed by a look-ahead
        // (the second quote of a pair, the LF of a CRLF).
        let mut resume_at = 0usize;

        let mut base = 0usize;
        while base < len {
            let chunk = &input[base..(base + CHUNK).min(len)];
            let m = self.masks(chunk);
            let mut events = m.quotes | m.delims | m.terms;
            while events != 0 {
                let bit = events.trailing_zeros() as usize;
                events &= events - 1;
                let p = base + bit;
                if p < resume_at {
                    continue;
                }
                let is_quote = (m.quotes >> bit) & 1 == 1;

                if let Some(q) = quoted.as_mut() {
                    if !is_quote {
                        // Delimiters and terminators inside quotes are content.
                        continue;
                    }
                    if p + 1 < len && input[p + 1] == QUOTE {
                        q.needs_unescape = true;
                        resume_at = p + 2;
                        continue;
                    }
                    // Closing quote; the byte after it must be structural.
                    spans.push(FieldSpan {
                        start: q.content_start,
                        end: p,
                        needs_unescape: q.needs_unescape,
                    });
                    quoted = None;
                    field_closed = true;
                    if p + 1 < len {
                        let next = input[p + 1];
                        if next != self.delimiter && !is_terminator(next) {
                            return Err(ParseError::junk(p + 1, next));
                        }
                    }
                    continue;
                }

                if is_quote {
                    if !field_closed && p == field_start {
                        quoted = Some(QuotedState {
                            open: p,
                            content_start: p + 1,
                            needs_unescape: false,
                        });
                    } else {
                        return Err(ParseError::unexpected_quote(p));
                    }
                    continue;
                }

                if (m.delims >> bit) & 1 == 1 {
                    if field_closed {
                        field_closed = false;
                    } else {
                        spans.push(FieldSpan::plain(field_start, p));
                    }
                    field_start = p + 1;
                    continue;
                }

                // Terminator.
                let next_pos = skip_terminator(input, p);
                if field_closed {
                    field_closed = false;
                    on_record(&spans);
                    spans.clear();
                } else if spans.is_empty() && p == field_start {
                    // Empty line: no record.
                } else {
                    spans.push(FieldSpan::plain(field_start, p));
                    on_record(&spans);
                    spans.clear();
                }
                field_start = next_pos;
                resume_at = next_pos;
            }
            base += chunk.len();
        }

        if let Some(q) = quoted {
            return Err(ParseError::unclosed(q.open));
        }
        if field_closed {
            on_record(&spans);
        } else if field_start < len || !spans.is_empty() {
            spans.push(FieldSpan::plain(field_start, len));
            on_record(&spans);
        }
        Ok(())
    }
}

impl Default for SimdScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage-1 fallback: build the chunk masks one byte at a time.
/// Also produces the masks for the final sub-64-byte tail.
fn scalar_masks(chunk: &[u8], delimiter: u8) -> ChunkMasks {
    let mut m = ChunkMasks::default();
    for (i, &byte) in chunk.iter().enumerate() {
        let bit = 1u64 << i;
        if byte == QUOTE {
            m.quotes |= bit;
        } else if byte == delimiter {
            m.delims |= bit;
        } else if is_terminator(byte) {
            m.terms |= bit;
        }
    }
    m
}

/// Stage-1 vector path: one full 64-byte chunk as two 32-byte AVX2 loads.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn masks_avx2(ptr: *const u8, delimiter: u8) -> ChunkMasks {
    let lo = _mm256_loadu_si256(ptr as *const __m256i);
    let hi = _mm256_loadu_si256(ptr.add(32) as *const __m256i);
    ChunkMasks {
        quotes: eq_mask(lo, hi, QUOTE),
        delims: eq_mask(lo, hi, delimiter),
        terms: eq_mask(lo, hi, b'\n') | eq_mask(lo, hi, b'\r'),
    }
}

/// Compare both 32-byte halves against `needle`, movemask into one u64.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn eq_mask(lo: __m256i, hi: __m256i, needle: u8) -> u64 {
    let splat = _mm256_set1_epi8(needle as i8);
    let lo_bits = _mm256_movemask_epi8(_mm256_cmpeq_epi8(lo, splat)) as u32 as u64;
    let hi_bits = _mm256_movemask_epi8(_mm256_cmpeq_epi8(hi, splat)) as u32 as u64;
    lo_bits | (hi_bits << 32)
}
