//! Purpose: Regression coverage for parse diagnostics (kind, message, offset).
//! Exports: Integration tests only.
//! Role: Verify the text and position callers see for representative malformed input.
//! Invariants: Offsets are byte positions into the input, counted from zero.
use tablejson::api::{Codec, ErrorKind, ParseOptions};

fn parse_err(text: &str) -> tablejson::api::Error {
    Codec::new().parse(text).expect_err("input should be rejected")
}

#[test]
fn missing_closing_bracket_reports_end_of_input() {
    let err = parse_err("[1,2");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        err.message(),
        Some("expected char ',' or ']' but got end of input instead")
    );
    assert_eq!(err.offset(), Some(4));
}

#[test]
fn missing_object_value_points_at_the_brace() {
    let err = parse_err(r#"{"a":}"#);
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), Some("unexpected char '}'"));
    assert_eq!(err.offset(), Some(5));
}

#[test]
fn missing_colon_names_expected_and_actual() {
    let err = parse_err(r#"{"a" 1}"#);
    assert_eq!(err.message(), Some("expected char ':' but got char '1' instead"));
    assert_eq!(err.offset(), Some(5));
}

#[test]
fn invalid_escape_points_at_the_escaped_byte() {
    let err = parse_err(r#""a\zb""#);
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), Some("unexpected char 'z' in \\ control sequence"));
    assert_eq!(err.offset(), Some(3));
}

#[test]
fn unterminated_string_reports_end_of_input() {
    let err = parse_err(r#"["abc"#);
    assert_eq!(err.message(), Some("unterminated string"));
    assert_eq!(err.offset(), Some(5));
}

#[test]
fn fraction_without_suffix_is_rejected() {
    let err = parse_err("1/2");
    assert_eq!(
        err.message(),
        Some("expected char 'r' after fraction \"1/2\" but got end of input instead")
    );
}

#[test]
fn second_decimal_point_is_rejected() {
    let err = parse_err("1.2.3");
    assert_eq!(err.message(), Some("unexpected trailing char '.'"));
    assert_eq!(err.offset(), Some(3));
}

#[test]
fn zero_denominator_is_a_syntax_error_at_the_literal() {
    let err = parse_err("[1/0r]");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.offset(), Some(1));
}

#[test]
fn control_bytes_are_described_in_hex() {
    let err = parse_err("\u{1}");
    assert_eq!(err.message(), Some("unexpected byte 0x01"));
    assert_eq!(err.offset(), Some(0));
}

#[test]
fn strict_blank_reports_the_newline_position() {
    let codec = Codec::new().with_options(ParseOptions {
        strict_blank: true,
        ..ParseOptions::default()
    });
    let err = codec.parse("[1,\n2]").expect_err("newline should be rejected");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), Some("unexpected byte 0x0a"));
    assert_eq!(err.offset(), Some(3));
}

#[test]
fn depth_limit_reports_the_opening_bracket() {
    let codec = Codec::new().with_options(ParseOptions {
        max_depth: Some(1),
        ..ParseOptions::default()
    });
    let err = codec.parse("[[]]").expect_err("nesting should be rejected");
    assert_eq!(err.kind(), ErrorKind::DepthLimit);
    assert_eq!(err.message(), Some("nesting depth exceeds 1"));
    assert_eq!(err.offset(), Some(1));
}

#[test]
fn non_string_constructor_tag_is_a_type_mismatch() {
    let err = parse_err(r#"{"@json_constructor":1r}"#);
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn display_includes_kind_message_and_offset() {
    let err = parse_err("[1,2");
    assert_eq!(
        err.to_string(),
        "Syntax: expected char ',' or ']' but got end of input instead (offset: 4)"
    );
}
