//! Purpose: End-to-end properties of the codec through the public API.
//! Exports: Integration tests only.
//! Role: Pin round-trip, key-order, constructor, escape, and malformed-input behavior.
//! Invariants: Expected texts are exact; whitespace in compact output is a regression.
use std::cell::RefCell;
use std::rc::Rc;

use bstr::BString;
use tablejson::api::{
    Callable, Codec, CustomObject, ErrorKind, JSON_KEYS_KEY, Rational, Record, Table, Value,
    serialize,
};

fn parse(text: impl AsRef<[u8]>) -> tablejson::api::Result<Value> {
    Codec::new().parse(text)
}

fn compact(value: &Value) -> BString {
    serialize(value, false).expect("serialize")
}

fn pretty(value: &Value) -> BString {
    serialize(value, true).expect("serialize")
}

fn plain_samples() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Boolean(true),
        Value::Boolean(false),
        Value::Number(0.0),
        Value::Number(-17.0),
        Value::Number(3.141592653589793),
        Value::Number(1e21),
        Value::Number(5e-324),
        Value::from(""),
        Value::from("plain"),
        Value::from("quote \" apostrophe ' backslash \\ tab \t newline \n"),
        Value::string(&b"raw \xff bytes"[..]),
        Value::array(Vec::new()),
        Value::array(vec![
            Value::Null,
            Value::array(vec![Value::Boolean(false), Value::from("x")]),
            Value::Number(-0.25),
            Value::array(Vec::new()),
        ]),
    ]
}

#[test]
fn plain_values_round_trip_compactly() {
    for value in plain_samples() {
        let text = compact(&value);
        let back = parse(&text).unwrap_or_else(|err| panic!("{text}: {err}"));
        assert_eq!(back, value, "text: {text}");
    }
}

#[test]
fn rationals_round_trip_exactly() {
    let samples = [
        Rational::zero(false),
        Rational::zero(true),
        Rational::from_integer(42),
        Rational::from_integer(-42),
        Rational::new(false, 1, 3).unwrap(),
        Rational::new(true, 6, 4).unwrap(),
        Rational::new(false, u64::MAX, u64::MAX - 1).unwrap(),
    ];
    for rational in samples {
        let text = compact(&Value::Rational(rational));
        let Value::Rational(back) = parse(&text).unwrap_or_else(|err| panic!("{text}: {err}"))
        else {
            panic!("{text} did not parse as a rational");
        };
        assert_eq!(back.is_negative(), rational.is_negative(), "text: {text}");
        assert_eq!(back.numerator(), rational.numerator(), "text: {text}");
        assert_eq!(back.denominator(), rational.denominator(), "text: {text}");
    }
    assert_eq!(compact(&Value::Rational(Rational::zero(true))), "-0r");
    assert_ne!(parse("-0r").unwrap(), parse("0r").unwrap());
}

#[test]
fn pretty_and_compact_parse_to_the_same_value() {
    let mut samples = plain_samples();
    samples.push(Value::array(vec![
        Value::integer(1),
        Value::array(vec![Value::array(vec![Value::from("deep")])]),
    ]));
    for value in samples {
        assert_eq!(
            parse(&pretty(&value)).unwrap(),
            parse(&compact(&value)).unwrap()
        );
    }
}

#[test]
fn declared_key_order_wins_over_table_order() {
    let table = Table::allocate(3);
    table.set("a", Value::Number(1.0)).unwrap();
    table.set("b", Value::Number(2.0)).unwrap();
    table
        .set(JSON_KEYS_KEY, Value::array(vec![Value::from("b"), Value::from("a")]))
        .unwrap();
    let value = Value::Table(table);

    assert_eq!(compact(&value), r#"{"b":2,"a":1,"@json_keys":["b","a"]}"#);
    assert_eq!(
        pretty(&value),
        "{\n\t\"b\" : 2,\n\t\"a\" : 1,\n\t\"@json_keys\" : [\n\t\t\"b\",\n\t\t\"a\"\n\t]\n}"
    );
    assert_eq!(parse(&compact(&value)).unwrap(), value);
}

#[test]
fn undeclared_properties_are_not_emitted() {
    let value = Value::table([
        ("shown", Value::Boolean(true)),
        ("hidden", Value::Boolean(false)),
        (JSON_KEYS_KEY, Value::array(vec![Value::from("shown")])),
    ]);
    assert_eq!(compact(&value), r#"{"shown":true,"@json_keys":["shown"]}"#);
}

#[test]
fn registered_constructor_receives_arguments_in_parameter_order() {
    let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let mut codec = Codec::new();
    codec.register_constructor(
        "Point",
        Callable::new("Point", move |args| {
            sink.borrow_mut().extend_from_slice(args);
            Ok(Value::table([("x", args[0].clone()), ("y", args[1].clone())]))
        }),
        vec!["x".to_string(), "y".to_string()],
    );

    let value = codec
        .parse(r#"{"x":1,"y":2,"@json_constructor":"Point"}"#)
        .unwrap();
    assert_eq!(*seen.borrow(), vec![Value::Number(1.0), Value::Number(2.0)]);
    let table = value.as_table().unwrap();
    assert_eq!(table.get("x"), Value::Number(1.0));
    assert!(table.get("@json_constructor").is_null());
}

#[test]
fn records_round_trip_through_their_constructor() {
    let mut codec = Codec::new();
    codec.register_record("Point", vec!["x".into(), "y".into()]);
    let text = r#"{"x":1r,"y":-2.5,"@json_constructor":"Point","@json_keys":["x","y"]}"#;
    let value = codec.parse(text).unwrap();
    let Value::Custom(object) = &value else {
        panic!("expected a record, got {value:?}");
    };
    assert_eq!(object.type_name(), "Point");
    assert_eq!(object.get_property("y"), Some(Value::Number(-2.5)));
    assert_eq!(codec.serialize(&value, false).unwrap(), text);

    let direct = Record::new("Point", vec![("x".into(), Value::integer(1))]);
    assert_eq!(direct.field("x"), Some(&Value::integer(1)));
}

#[test]
fn unknown_constructor_never_returns_the_raw_table() {
    let err = parse(r#"{"@json_constructor":"Nope"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownConstructor);
    assert_eq!(err.message(), Some("Invalid @json_constructor \"Nope\"."));
}

#[test]
fn constructor_errors_propagate_unchanged() {
    let mut codec = Codec::new();
    codec.register_constructor(
        "Fails",
        Callable::new("Fails", |_| {
            Err(tablejson::api::Error::new(ErrorKind::Callback).with_message("boom"))
        }),
        Vec::new(),
    );
    let err = codec.parse(r#"[{"@json_constructor":"Fails"}]"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Callback);
    assert_eq!(err.message(), Some("boom"));
}

#[test]
fn escapes_decode_and_invalid_escapes_fail() {
    assert_eq!(parse("\"a\\tb\\nc\"").unwrap(), Value::from("a\tb\nc"));
    assert_eq!(parse(r#""it\'s \"q\" \\""#).unwrap(), Value::from("it's \"q\" \\"));
    let err = parse(r#""bad \z""#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn malformed_input_fails_without_partial_trees() {
    for text in ["[1,2", "{\"a\":}", "{\"a\" 1}", "[1 2]", "\"open", "", "-", "1/2", "tru"] {
        let err = parse(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "input: {text:?}");
    }
}

#[test]
fn empty_containers() {
    assert_eq!(parse("[]").unwrap(), Value::array(Vec::new()));
    assert_eq!(parse(" [ ] ").unwrap(), Value::array(Vec::new()));
    assert_eq!(pretty(&Value::array(Vec::new())), "[]");

    let empty_keys = Value::table([(JSON_KEYS_KEY, Value::array(Vec::new()))]);
    assert_eq!(compact(&empty_keys), r#"{"@json_keys":[]}"#);
    assert_eq!(parse(&compact(&empty_keys)).unwrap(), empty_keys);
}

#[test]
fn fallback_uses_to_json_method_on_tables() {
    let table = Table::allocate(2);
    table.set("v", Value::integer(7)).unwrap();
    table
        .set(
            "toJSON",
            Value::from(Callable::new("toJSON", |args| {
                let this = args[0].as_table()?;
                Ok(Value::from(format!("\"v={}\"", this.get("v").as_number()?)))
            })),
        )
        .unwrap();
    assert_eq!(compact(&Value::Table(table)), r#""v=7""#);

    let err = serialize(&Value::table([("a", Value::Null)]), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn non_finite_numbers_are_unrepresentable() {
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = serialize(&Value::Number(n), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unrepresentable);
    }
}
