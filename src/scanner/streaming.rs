// Streaming scanner surface.
//
// Pulls one record at a time from a byte span using the reference scanner's
// single-record step. A parse failure latches: `advance` returns false once
// and forever, and the error stays readable. Running past the last record is
// normal termination, not an error.

use std::borrow::Cow;

use crate::core::field::{span_to_cow, FieldSpan};
use crate::error::ParseError;
use crate::scanner::{scalar, DEFAULT_DELIMITER};

/// Options for [`StreamingScanner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingOptions {
    /// Reuse the record's backing storage across `advance` calls. Callers
    /// that retain a record must copy it before the next `advance`. When
    /// false (the default) every record gets fresh storage.
    pub reuse_record: bool,
}

/// Iterator-style scanner yielding one record per `advance`.
///
/// Field views borrow from the input span and stay valid until the next
/// `advance` at most.
pub struct StreamingScanner<'a> {
    input: &'a [u8],
    pos: usize,
    delimiter: u8,
    reuse_record: bool,
    spans: Vec<FieldSpan>,
    current: Vec<Cow<'a, [u8]>>,
    error: Option<ParseError>,
    done: bool,
}

impl<'a> StreamingScanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, StreamingOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: StreamingOptions) -> Self {
        Self::with_delimiter_and_options(input, DEFAULT_DELIMITER, options)
    }

    pub fn with_delimiter_and_options(
        input: &'a [u8],
        delimiter: u8,
        options: StreamingOptions,
    ) -> Self {
        StreamingScanner {
            input,
            pos: 0,
            delimiter,
            reuse_record: options.reuse_record,
            spans: Vec::new(),
            current: Vec::new(),
            error: None,
            done: false,
        }
    }

    /// Parse the next record. Returns true when one was produced; false at
    /// end of input or on a parse failure (check [`error`](Self::error)).
    pub fn advance(&mut self) -> bool {
        if self.done || self.error.is_some() {
            return false;
        }
        match scalar::next_record(self.input, self.pos, self.delimiter, &mut self.spans) {
            Ok(Some(next)) => {
                if self.reuse_record {
                    self.current.clear();
                } else {
                    self.current = Vec::with_capacity(self.spans.len());
                }
                for span in &self.spans {
                    self.current.push(span_to_cow(self.input, *span));
                }
                self.pos = next;
                true
            }
            Ok(None) => {
                self.done = true;
                false
            }
            Err(err) => {
                self.current.clear();
                self.error = Some(err);
                false
            }
        }
    }

    /// The most recently produced record; empty before the first successful
    /// `advance`. Valid until the next `advance`.
    pub fn current(&self) -> &[Cow<'a, [u8]>] {
        &self.current
    }

    /// The latched error, if `advance` failed.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }
}
