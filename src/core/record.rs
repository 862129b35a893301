// Packed offset record.
//
// One record = a packed byte region holding the decoded bytes of every field
// plus an offset array with one entry per field boundary. Field i is
// data[offsets[i]..offsets[i + 1]]; with F fields there are F + 1 offsets.
//
// Positions use u32 (4 GB cap, halves memory vs usize on 64-bit).

use std::borrow::Cow;

use crate::core::field::{span_to_cow, FieldSpan};
use crate::error::ParseError;

/// A record holding its decoded field bytes in one packed region.
///
/// Field access never copies: `field_bytes` borrows from the packed region,
/// and `field_str` borrows whenever the bytes are valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRecord {
    data: Vec<u8>,
    offsets: Vec<u32>,
}

impl OffsetRecord {
    /// Build a record from caller-supplied parts, validating the packing
    /// contract: offsets start at 0, end at `data.len()`, and never decrease.
    pub fn try_new(data: Vec<u8>, offsets: Vec<u32>) -> Result<OffsetRecord, ParseError> {
        if offsets.first() != Some(&0) {
            return Err(ParseError::invalid_target(0));
        }
        if offsets.last().map(|&o| o as usize) != Some(data.len()) {
            return Err(ParseError::invalid_target(offsets.len() - 1));
        }
        if let Some(i) = offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(ParseError::invalid_target(i + 1));
        }
        Ok(OffsetRecord { data, offsets })
    }

    /// Pack a record from content spans, unescaping where flagged.
    /// The offset array gains the current data length before each field and
    /// once more after the last.
    pub(crate) fn from_spans(input: &[u8], spans: &[FieldSpan]) -> OffsetRecord {
        let packed_len: usize = spans.iter().map(|s| s.end - s.start).sum();
        let mut data = Vec::with_capacity(packed_len);
        let mut offsets = Vec::with_capacity(spans.len() + 1);
        for span in spans {
            offsets.push(data.len() as u32);
            match span_to_cow(input, *span) {
                Cow::Borrowed(bytes) => data.extend_from_slice(bytes),
                Cow::Owned(bytes) => data.extend_from_slice(&bytes),
            }
        }
        offsets.push(data.len() as u32);
        OffsetRecord { data, offsets }
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Borrowed bytes of field `i`. Out-of-range indexes yield an empty slice.
    #[inline]
    pub fn field_bytes(&self, i: usize) -> &[u8] {
        if i + 1 >= self.offsets.len() {
            return &[];
        }
        &self.data[self.offsets[i] as usize..self.offsets[i + 1] as usize]
    }

    /// String view of field `i`. Borrows when the bytes are valid UTF-8.
    #[inline]
    pub fn field_str(&self, i: usize) -> Cow<'_, str> {
        String::from_utf8_lossy(self.field_bytes(i))
    }

    /// All fields as string views, in input order.
    pub fn fields(&self) -> Vec<Cow<'_, str>> {
        (0..self.field_count()).map(|i| self.field_str(i)).collect()
    }

    /// The packed byte region.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The field-boundary offsets into the packed region.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }
}
