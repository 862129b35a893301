// Variant B: table-driven DFA scanner.
//
// Two pre-computed tables drive the whole parse: a byte→class map and a
// total (state, class)→(state, action) transition table. Unreachable cells
// resolve to the error transition. On typical CSV the table indirection is
// slower than the hand-coded scalar loop; the variant exists for validation
// and teaching, and its output must match the reference exactly.
//
// Fields are accumulated byte-by-byte (the AppendChar action), so this
// variant returns owned rows rather than borrowed views.

use crate::core::field::QUOTE;
use crate::error::ParseError;
use crate::scanner::DEFAULT_DELIMITER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Quote = 0,
    Delim = 1,
    Cr = 2,
    Lf = 3,
    Other = 4,
}

const CLASS_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start = 0,
    InUnquoted = 1,
    InQuoted = 2,
    AfterQuote = 3,
    EndField = 4,
    EndRecord = 5,
    Error = 6,
}

const STATE_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    AppendChar,
    EndField,
    EscapedQuote,
    Skip,
    Error,
}

struct Tables {
    class_of: [Class; 256],
    delta: [[(State, Action); CLASS_COUNT]; STATE_COUNT],
}

fn build_tables(delimiter: u8) -> Tables {
    let mut class_of = [Class::Other; 256];
    class_of[QUOTE as usize] = Class::Quote;
    class_of[delimiter as usize] = Class::Delim;
    class_of[b'\r' as usize] = Class::Cr;
    class_of[b'\n' as usize] = Class::Lf;

    use Action as A;
    use State::*;

    // Indexed by [state][class]; class order: Quote, Delim, Cr, Lf, Other.
    // Start doubles as the between-records state, which is what makes blank
    // lines and the LF of a CRLF pair disappear without special casing.
    let delta = [
        // Start
        [
            (InQuoted, A::Skip),
            (EndField, A::EndField),
            (Start, A::Skip),
            (Start, A::Skip),
            (InUnquoted, A::AppendChar),
        ],
        // InUnquoted
        [
            (Error, A::Error),
            (EndField, A::EndField),
            (EndRecord, A::EndField),
            (EndRecord, A::EndField),
            (InUnquoted, A::AppendChar),
        ],
        // InQuoted
        [
            (AfterQuote, A::None),
            (InQuoted, A::AppendChar),
            (InQuoted, A::AppendChar),
            (InQuoted, A::AppendChar),
            (InQuoted, A::AppendChar),
        ],
        // AfterQuote
        [
            (InQuoted, A::EscapedQuote),
            (EndField, A::EndField),
            (EndRecord, A::EndField),
            (EndRecord, A::EndField),
            (Error, A::Error),
        ],
        // EndField
        [
            (InQuoted, A::Skip),
            (EndField, A::EndField),
            (EndRecord, A::EndField),
            (EndRecord, A::EndField),
            (InUnquoted, A::AppendChar),
        ],
        // EndRecord behaves exactly like Start for the next byte.
        [
            (InQuoted, A::Skip),
            (EndField, A::EndField),
            (Start, A::Skip),
            (Start, A::Skip),
            (InUnquoted, A::AppendChar),
        ],
        // Error is absorbing.
        [
            (Error, A::Error),
            (Error, A::Error),
            (Error, A::Error),
            (Error, A::Error),
            (Error, A::Error),
        ],
    ];

    Tables { class_of, delta }
}

fn error_for(state: State, pos: usize, byte: u8) -> ParseError {
    match state {
        State::InUnquoted => ParseError::unexpected_quote(pos),
        // AfterQuote, plus the unreachable cells the table resolves to Error.
        _ => ParseError::junk(pos, byte),
    }
}

/// Parse the whole input into rows of owned fields.
pub fn parse_owned(input: &[u8]) -> Result<Vec<Vec<Vec<u8>>>, ParseError> {
    parse_owned_with_delimiter(input, DEFAULT_DELIMITER)
}

/// [`parse_owned`] with a custom single-byte field delimiter.
pub fn parse_owned_with_delimiter(
    input: &[u8],
    delimiter: u8,
) -> Result<Vec<Vec<Vec<u8>>>, ParseError> {
    let tables = build_tables(delimiter);

    let mut rows: Vec<Vec<Vec<u8>>> = Vec::new();
    let mut fields: Vec<Vec<u8>> = Vec::new();
    let mut field: Vec<u8> = Vec::new();
    let mut state = State::Start;
    let mut open_quote = 0usize;

    for (pos, &byte) in input.iter().enumerate() {
        let class = tables.class_of[byte as usize];
        let (next, action) = tables.delta[state as usize][class as usize];

        match action {
            Action::None | Action::Skip => {}
            Action::AppendChar => field.push(byte),
            Action::EscapedQuote => field.push(QUOTE),
            Action::EndField => fields.push(std::mem::take(&mut field)),
            Action::Error => return Err(error_for(state, pos, byte)),
        }

        if next == State::InQuoted && state != State::InQuoted && state != State::AfterQuote {
            open_quote = pos;
        }
        if next == State::EndRecord {
            rows.push(std::mem::take(&mut fields));
        }
        state = next;
    }

    match state {
        State::Start | State::EndRecord => {}
        State::InUnquoted | State::AfterQuote | State::EndField => {
            fields.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut fields));
        }
        State::InQuoted => return Err(ParseError::unclosed(open_quote)),
        // The Error action returns before the state is ever stored.
        State::Error => {}
    }

    Ok(rows)
}
