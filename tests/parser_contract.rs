//! Differential checks against serde_json on the subset of JSON both parsers agree on, plus the
//! places where this parser is deliberately more lenient.

use json_prefix::{JsonParseErrorKind, JsonParser, JsonValue, Map, ParserConfig};

fn parser() -> JsonParser {
    JsonParser::new(ParserConfig::default().with_keyword_literals(true))
}

fn from_serde(v: &serde_json::Value) -> JsonValue {
    match v {
        serde_json::Value::Null => JsonValue::Null,
        serde_json::Value::Bool(b) => JsonValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => JsonValue::Int(i),
            None => JsonValue::Double(n.as_f64().unwrap()),
        },
        serde_json::Value::String(s) => JsonValue::String(s.clone()),
        serde_json::Value::Array(a) => JsonValue::Array(a.iter().map(from_serde).collect()),
        serde_json::Value::Object(o) => {
            let mut m = Map::default();
            for (k, v) in o {
                m.insert(k.clone(), from_serde(v));
            }
            JsonValue::Object(m)
        }
    }
}

fn assert_differential_parity(input: &str) {
    let ours = parser().parse_document(input);
    let theirs = serde_json::from_str::<serde_json::Value>(input);
    match (ours, theirs) {
        (Ok(a), Ok(b)) => assert_eq!(a, from_serde(&b), "value mismatch for {input:?}"),
        (Err(_), Err(_)) => {}
        (left, right) => panic!("outcome mismatch for {input:?}: ours={left:?}, serde={right:?}"),
    }
}

#[test]
fn corpus_valid_payloads_match_serde() {
    let corpus = [
        r#"{"work":996,"school":[985,[211,101]]}"#,
        r#"[1, 2, 3, {"x": true, "y": null}]"#,
        r#"{"nested": {"arr": [{"k": "v"}, [], {}]}}"#,
        r#"{"escapes": "tab\there \"quoted\" back\\slash \/ \b\f\n\r"}"#,
        r#"[3.5, -0.25e2, 1e3, 12345678901234567890, -9223372036854775808]"#,
        "  \n[ \"padded\" ]\t",
        r#"{"a":1,"a":2}"#,
    ];

    for case in corpus {
        assert_differential_parity(case);
    }
}

#[test]
fn corpus_invalid_payloads_rejected_by_both() {
    let corpus = [
        "",
        "   ",
        "[1,}]",
        r#"{"a":1"#,
        r#""abc"#,
        "{1:2}",
        "+",
        "-.",
        "]",
        "[1] x",
        "1e400",
        "[1e400]",
    ];

    for case in corpus {
        assert_differential_parity(case);
    }
}

#[test]
fn nesting_within_limit_matches_serde() {
    let depth = 100;
    let input = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    assert_differential_parity(&input);

    let depth = 1000;
    let input = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let err = parser().parse_document(&input).unwrap_err();
    assert!(matches!(
        err.kind(),
        JsonParseErrorKind::DepthLimitExceeded { .. }
    ));
    assert!(serde_json::from_str::<serde_json::Value>(&input).is_err());
}

#[test]
fn separators_are_lenient_unlike_serde() {
    for (input, expected) in [
        (
            "[1 2]",
            JsonValue::Array(vec![JsonValue::Int(1), JsonValue::Int(2)]),
        ),
        ("[1,]", JsonValue::Array(vec![JsonValue::Int(1)])),
        (r#"{"a" 1}"#, {
            let mut m = Map::default();
            m.insert("a".to_string(), JsonValue::Int(1));
            JsonValue::Object(m)
        }),
    ] {
        assert!(serde_json::from_str::<serde_json::Value>(input).is_err());
        assert_eq!(parser().parse_document(input).unwrap(), expected);
    }
}

#[test]
fn prefix_parse_reports_consumed_length() {
    let input = r#"{"a":[1,2]} {"b":3}"#;
    let (first, consumed) = parser().parse(input).unwrap();
    assert_eq!(consumed, 11);
    assert_eq!(first["a"][1], JsonValue::Int(2));

    let (second, rest) = parser().parse(&input[consumed..]).unwrap();
    assert_eq!(consumed + rest, input.len());
    assert_eq!(second["b"], JsonValue::Int(3));
}
