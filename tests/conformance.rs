// Cross-scanner conformance tests
//
// Each scenario runs through every scanner variant: scalar reference, DFA,
// SWAR, SIMD (vector and forced-fallback), streaming, parallel, and the
// offset-record surface. A new scenario automatically exercises all of them;
// failures pinpoint which variant diverges.

use rapidcsv::scanner::{dfa, scalar, swar};
use rapidcsv::{
    parse_offset_records, parse_parallel, ErrorKind, SimdOptions, SimdScanner, StreamingScanner,
};

use std::borrow::Cow;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cow_to_strings(rows: Vec<Vec<Cow<'_, [u8]>>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|f| String::from_utf8_lossy(&f).to_string())
                .collect()
        })
        .collect()
}

fn owned_to_strings(rows: Vec<Vec<Vec<u8>>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|f| String::from_utf8_lossy(&f).to_string())
                .collect()
        })
        .collect()
}

fn streaming_to_strings(input: &[u8]) -> Result<Vec<Vec<String>>, rapidcsv::ParseError> {
    let mut scanner = StreamingScanner::new(input);
    let mut rows = Vec::new();
    while scanner.advance() {
        rows.push(
            scanner
                .current()
                .iter()
                .map(|f| String::from_utf8_lossy(f).to_string())
                .collect(),
        );
    }
    match scanner.error() {
        Some(err) => Err(err),
        None => Ok(rows),
    }
}

fn simd_fallback() -> SimdScanner {
    SimdScanner::with_options(SimdOptions {
        use_vector_path: false,
        delimiter: b',',
    })
}

// ---------------------------------------------------------------------------
// Conformance macros
// ---------------------------------------------------------------------------

/// Runs a scenario through every variant and asserts they all produce
/// `expected`.
macro_rules! conformance {
    ($name:ident, input: $input:expr, expected: $expected:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let expected: Vec<Vec<&str>> = $expected;
            let expected: Vec<Vec<String>> = expected
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect();

            let scalar = cow_to_strings(scalar::parse(input).unwrap());
            assert_eq!(scalar, expected, "FAILED: scalar");

            let dfa = owned_to_strings(dfa::parse_owned(input).unwrap());
            assert_eq!(dfa, expected, "FAILED: dfa");

            let swar = cow_to_strings(swar::parse(input).unwrap());
            assert_eq!(swar, expected, "FAILED: swar");

            let simd = cow_to_strings(SimdScanner::new().parse(input).unwrap());
            assert_eq!(simd, expected, "FAILED: simd");

            let fallback = cow_to_strings(simd_fallback().parse(input).unwrap());
            assert_eq!(fallback, expected, "FAILED: simd fallback");

            let streaming = streaming_to_strings(input).unwrap();
            assert_eq!(streaming, expected, "FAILED: streaming");

            let parallel = owned_to_strings(parse_parallel(input).unwrap());
            assert_eq!(parallel, expected, "FAILED: parallel");

            let offsets: Vec<Vec<String>> = parse_offset_records(input)
                .unwrap()
                .iter()
                .map(|rec| rec.fields().iter().map(|f| f.to_string()).collect())
                .collect();
            assert_eq!(offsets, expected, "FAILED: offset records");
        }
    };
}

/// Runs a failing scenario through every variant and asserts they all report
/// the same error kind at the same byte offset.
macro_rules! conformance_error {
    ($name:ident, input: $input:expr, kind: $kind:expr, offset: $offset:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let kind: ErrorKind = $kind;
            let offset: usize = $offset;

            let check = |err: rapidcsv::ParseError, variant: &str| {
                assert_eq!(err.kind, kind, "FAILED kind: {variant}");
                assert_eq!(err.offset, offset, "FAILED offset: {variant}");
            };

            check(scalar::parse(input).unwrap_err(), "scalar");
            check(dfa::parse_owned(input).unwrap_err(), "dfa");
            check(swar::parse(input).unwrap_err(), "swar");
            check(SimdScanner::new().parse(input).unwrap_err(), "simd");
            check(simd_fallback().parse(input).unwrap_err(), "simd fallback");
            check(streaming_to_strings(input).unwrap_err(), "streaming");
            check(parse_parallel(input).unwrap_err(), "parallel");
            check(parse_offset_records(input).unwrap_err(), "offset records");
        }
    };
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

conformance!(
    three_by_three,
    input: b"a,b,c\nd,e,f\ng,h,i",
    expected: vec![
        vec!["a", "b", "c"],
        vec!["d", "e", "f"],
        vec!["g", "h", "i"]
    ]
);

conformance!(
    quoted_field_with_comma,
    input: b"\"aaa\",\"b,bb\",\"ccc\"",
    expected: vec![vec!["aaa", "b,bb", "ccc"]]
);

conformance!(
    quoted_field_with_newline,
    input: b"\"aaa\",\"b\nbb\",\"ccc\"",
    expected: vec![vec!["aaa", "b\nbb", "ccc"]]
);

conformance!(
    escaped_quote_decodes_to_one,
    input: b"\"aaa\",\"b\"\"bb\",\"ccc\"",
    expected: vec![vec!["aaa", "b\"bb", "ccc"]]
);

conformance!(
    blank_lines_skipped,
    input: b"a,b\n\n\nc,d",
    expected: vec![vec!["a", "b"], vec!["c", "d"]]
);

conformance!(
    crlf_line_endings,
    input: b"a,b\r\nc,d\r\n",
    expected: vec![vec!["a", "b"], vec!["c", "d"]]
);

conformance!(
    lone_cr_terminates,
    input: b"a,b\rc,d",
    expected: vec![vec!["a", "b"], vec!["c", "d"]]
);

conformance!(
    multiline_quoted_field,
    input: b"a,\"line1\nline2\",c\n",
    expected: vec![vec!["a", "line1\nline2", "c"]]
);

// ---------------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------------

conformance!(empty_input, input: b"", expected: vec![]);
conformance!(single_lf, input: b"\n", expected: vec![]);
conformance!(single_cr, input: b"\r", expected: vec![]);
conformance!(single_crlf, input: b"\r\n", expected: vec![]);

conformance!(
    trailing_terminator_no_extra_record,
    input: b"a,b\n",
    expected: vec![vec!["a", "b"]]
);

conformance!(
    lone_comma_two_empty_fields,
    input: b",",
    expected: vec![vec!["", ""]]
);

conformance!(
    quoted_empty_field,
    input: b"\"\"",
    expected: vec![vec![""]]
);

conformance!(
    four_quotes_one_literal,
    input: b"\"\"\"\"",
    expected: vec![vec!["\""]]
);

conformance!(
    cr_at_last_byte,
    input: b"a,b\r",
    expected: vec![vec!["a", "b"]]
);

conformance!(
    trailing_delimiter_empty_field,
    input: b"a,b,\n",
    expected: vec![vec!["a", "b", ""]]
);

conformance!(
    empty_fields_are_present_not_absent,
    input: b"a,,c\n,,\n",
    expected: vec![vec!["a", "", "c"], vec!["", "", ""]]
);

// ---------------------------------------------------------------------------
// Error scenarios: identical kind and offset everywhere
// ---------------------------------------------------------------------------

conformance_error!(
    unclosed_quote_at_zero,
    input: b"\"hello",
    kind: ErrorKind::UnclosedQuotedField,
    offset: 0
);

conformance_error!(
    unclosed_quote_mid_input,
    input: b"a,b\nc,\"open\nstill",
    kind: ErrorKind::UnclosedQuotedField,
    offset: 6
);

conformance_error!(
    unclosed_quote_ending_in_escape,
    input: b"a,\"x\"\"",
    kind: ErrorKind::UnclosedQuotedField,
    offset: 2
);

conformance_error!(
    quote_in_unquoted_field,
    input: b"hel\"lo",
    kind: ErrorKind::UnexpectedQuoteInUnquotedField,
    offset: 3
);

conformance_error!(
    junk_after_closing_quote,
    input: b"\"a\"x",
    kind: ErrorKind::JunkAfterClosingQuote,
    offset: 3
);

conformance_error!(
    junk_after_closing_quote_mid_record,
    input: b"one,\"two\" ,three",
    kind: ErrorKind::JunkAfterClosingQuote,
    offset: 9
);

// ---------------------------------------------------------------------------
// Bulk scenario: 10,000 rows x 10 columns of 50-byte fields
// ---------------------------------------------------------------------------

#[test]
fn bulk_ten_thousand_rows_byte_equal_across_scanners() {
    let mut input = Vec::with_capacity(10_000 * 10 * 51);
    for row in 0..10_000u32 {
        for col in 0..10u32 {
            if col > 0 {
                input.push(b',');
            }
            let cell = format!("r{row:07}c{col}-");
            // Pad every field to exactly 50 ASCII bytes.
            input.extend_from_slice(cell.as_bytes());
            input.extend(std::iter::repeat(b'v').take(50 - cell.len()));
        }
        input.push(b'\n');
    }

    let scalar_rows = scalar::parse(&input).unwrap();
    assert_eq!(scalar_rows.len(), 10_000);
    assert!(scalar_rows.iter().all(|row| row.len() == 10));
    assert!(scalar_rows
        .iter()
        .all(|row| row.iter().all(|f| f.len() == 50)));

    assert_eq!(swar::parse(&input).unwrap(), scalar_rows, "FAILED: swar");
    assert_eq!(
        SimdScanner::new().parse(&input).unwrap(),
        scalar_rows,
        "FAILED: simd"
    );
    assert_eq!(
        simd_fallback().parse(&input).unwrap(),
        scalar_rows,
        "FAILED: simd fallback"
    );
}

// ---------------------------------------------------------------------------
// Custom delimiter across variants
// ---------------------------------------------------------------------------

#[test]
fn semicolon_delimiter_across_variants() {
    let input: &[u8] = b"a;b;\"c;d\"\n1;2;3\n";
    let expected = vec![
        vec!["a".to_string(), "b".to_string(), "c;d".to_string()],
        vec!["1".to_string(), "2".to_string(), "3".to_string()],
    ];

    assert_eq!(
        cow_to_strings(scalar::parse_with_delimiter(input, b';').unwrap()),
        expected
    );
    assert_eq!(
        owned_to_strings(dfa::parse_owned_with_delimiter(input, b';').unwrap()),
        expected
    );
    assert_eq!(
        cow_to_strings(swar::parse_with_delimiter(input, b';').unwrap()),
        expected
    );
    let simd = SimdScanner::with_options(SimdOptions {
        use_vector_path: true,
        delimiter: b';',
    });
    assert_eq!(cow_to_strings(simd.parse(input).unwrap()), expected);
    assert_eq!(
        owned_to_strings(rapidcsv::parse_parallel_with_delimiter(input, b';').unwrap()),
        expected
    );
}

// ---------------------------------------------------------------------------
// Offset-record surface
// ---------------------------------------------------------------------------

#[test]
fn offset_record_consistency() {
    let input: &[u8] = b"a,\"b\"\"x\",c\n,,\nlast";
    let records = parse_offset_records(input).unwrap();
    let rows = scalar::parse(input).unwrap();
    assert_eq!(records.len(), rows.len());
    for (rec, row) in records.iter().zip(&rows) {
        assert_eq!(rec.field_count(), row.len());
        assert_eq!(rec.offsets().len(), rec.field_count() + 1);
        assert_eq!(rec.offsets()[0], 0);
        assert_eq!(
            *rec.offsets().last().unwrap() as usize,
            rec.data().len()
        );
        for (i, field) in row.iter().enumerate() {
            assert_eq!(rec.field_bytes(i), field.as_ref());
            assert_eq!(rec.field_str(i).as_bytes(), field.as_ref());
        }
    }
}

#[test]
fn simd_offset_records_match_scalar_offset_records() {
    let input: &[u8] = b"a,b\n\"q,q\",\"e\"\"e\"\nx,y\n";
    let scalar_recs = parse_offset_records(input).unwrap();
    let simd_recs = SimdScanner::new().parse_offset_records(input).unwrap();
    let swar_recs = swar::parse_offset_records(input).unwrap();
    assert_eq!(scalar_recs, simd_recs);
    assert_eq!(scalar_recs, swar_recs);
}

// ---------------------------------------------------------------------------
// Pool hygiene
// ---------------------------------------------------------------------------

#[test]
fn pools_balance_after_success_and_failure() {
    // Any leak accumulates one checkout per iteration; concurrent tests hold
    // at most a handful of transient guards.
    for _ in 0..64 {
        let _ = scalar::parse(b"a,\"e\"\"s\"\nok,row\n").unwrap();
        let _ = scalar::parse(b"a,\"e\"\"s\"\nbad\"row").unwrap_err();
        let _ = SimdScanner::new().parse(b"a,\"e\"\"s\"\nbad\"row").unwrap_err();
        let _ = swar::parse(b"bad\"row").unwrap_err();
    }
    assert!(rapidcsv::scratch_pool().outstanding() < 32);
}
