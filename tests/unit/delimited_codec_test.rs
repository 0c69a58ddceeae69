//! Unit tests for the delimited codec: quoting rules, escapes and malformed input.

use credvault::services::delimited_codec::{
    decode_row, encode_row, CodecConfig, Field, RowBuilder, RowParser, NULL_SENTINEL,
};
use credvault::types::errors::CodecError;
use rstest::rstest;

#[rstest]
#[case("plain", "plain")]
#[case("tab\there", "tab\there")]
#[case("a,b", "\"a,b\"")]
#[case("line1\nline2", "\"line1\\nline2\"")]
#[case("say \"x\"", "\"say \\\"x\\\"\"")]
#[case("back\\slash", "back\\slash")]
#[case("back\\slash,", "\"back\\\\slash,\"")]
fn test_string_encoding(#[case] value: &str, #[case] encoded: &str) {
    let mut builder = RowBuilder::new();
    builder.append(value);
    assert_eq!(builder.as_str(), encoded);

    let decoded = decode_row(encoded);
    assert_eq!(decoded, vec![Some(value.to_string())]);
}

#[test]
fn test_mixed_row() {
    let fields: Vec<Field> = vec![
        "name".into(),
        Field::Null,
        (-12i64).into(),
        false.into(),
        ','.into(),
        Some("x,y").into(),
    ];
    let row = encode_row(fields);
    assert_eq!(row, format!("name,{},-12,false,\",\",\"x,y\"\n", NULL_SENTINEL));
    assert_eq!(
        decode_row(&row),
        vec![
            Some("name".to_string()),
            None,
            Some("-12".to_string()),
            Some("false".to_string()),
            Some(",".to_string()),
            Some("x,y".to_string()),
        ]
    );
}

#[test]
fn test_empty_field_list_encodes_to_empty_text() {
    let fields: Vec<Field> = Vec::new();
    assert_eq!(encode_row(fields), "");
    assert!(decode_row("").is_empty());
}

#[test]
fn test_multiple_rows() {
    let mut builder = RowBuilder::new();
    builder.append("a").append(1i64).new_line();
    builder.append("b,c").new_line();
    let text = builder.finish();

    let mut parser = RowParser::new(&text);
    assert!(parser.at_row_start());
    assert_eq!(parser.next_row(), vec![Some("a".to_string()), Some("1".to_string())]);
    assert!(parser.at_row_start());
    assert_eq!(parser.next_row(), vec![Some("b,c".to_string())]);
    assert!(!parser.has_next());
}

#[test]
fn test_custom_config() {
    let config = CodecConfig {
        column_divider: ';',
        row_divider: '|',
        string_separator: '\'',
    };
    let mut builder = RowBuilder::with_config(config);
    builder.append("a,b").append("c;d").new_line();
    assert_eq!(builder.as_str(), "a,b;'c;d'|");

    let mut parser = RowParser::with_config(builder.as_str(), config);
    assert_eq!(parser.next_row(), vec![Some("a,b".to_string()), Some("c;d".to_string())]);
}

#[test]
fn test_unknown_escape_kept_literally() {
    assert_eq!(decode_row("\"a\\tb\""), vec![Some("a\\tb".to_string())]);
}

#[test]
fn test_unterminated_quote_recovers() {
    let mut parser = RowParser::new("\"open,never closed");
    let fields: Vec<_> = parser.by_ref().collect();
    assert_eq!(fields, vec![Some("open,never closed".to_string())]);
    assert_eq!(parser.errors(), &[CodecError::UnterminatedField(0)]);
}

#[test]
fn test_parser_at_end_returns_none() {
    let mut parser = RowParser::new("x");
    assert_eq!(parser.next_field().as_deref(), Some("x"));
    assert_eq!(parser.next_field(), None);
    assert!(parser.next_row().is_empty());
}
