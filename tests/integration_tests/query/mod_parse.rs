use aggrelite::query::{CmpOp, Filter, parse_filter, parse_filter_json};
use bson::{Bson, doc};

#[test]
fn implicit_equality_and_implicit_and() {
    assert_eq!(parse_filter(&doc! {}).unwrap(), Filter::True);
    assert_eq!(parse_filter(&doc! { "a": 1 }).unwrap(), Filter::eq("a", Bson::Int32(1)));
    let f = parse_filter(&doc! { "a": 1, "b": "x" }).unwrap();
    assert_eq!(f, Filter::And(vec![Filter::eq("a", Bson::Int32(1)), Filter::eq("b", Bson::String("x".into()))]));
}

#[test]
fn operator_documents() {
    let f = parse_filter(&doc! { "age": { "$gt": 30, "$lte": 40 } }).unwrap();
    assert_eq!(
        f,
        Filter::And(vec![
            Filter::Cmp { path: "age".into(), op: CmpOp::Gt, value: Bson::Int32(30) },
            Filter::Cmp { path: "age".into(), op: CmpOp::Lte, value: Bson::Int32(40) },
        ])
    );
    let f = parse_filter(&doc! { "t": { "$in": ["a", "b"] } }).unwrap();
    assert!(matches!(f, Filter::In { ref values, .. } if values.len() == 2));
    let f = parse_filter(&doc! { "t": { "$exists": 0 } }).unwrap();
    assert_eq!(f, Filter::Exists { path: "t".into(), exists: false });
    let f = parse_filter(&doc! { "t": { "$not": { "$eq": 1 } } }).unwrap();
    assert!(matches!(f, Filter::Not(_)));
}

#[test]
fn embedded_document_without_operators_is_literal() {
    let f = parse_filter(&doc! { "a": { "b": 1 } }).unwrap();
    assert_eq!(f, Filter::eq("a", Bson::Document(doc! { "b": 1 })));
}

#[test]
fn logical_operators() {
    let f = parse_filter(&doc! { "$or": [{ "a": 1 }, { "b": 2 }] }).unwrap();
    assert!(matches!(f, Filter::Or(ref v) if v.len() == 2));
    let f = parse_filter(&doc! { "$nor": [{ "a": 1 }] }).unwrap();
    assert!(matches!(f, Filter::Nor(_)));
}

#[test]
fn malformed_filters_are_errors() {
    for bad in [
        doc! { "$or": [] },
        doc! { "$and": 1 },
        doc! { "$and": [1] },
        doc! { "$where": "x" },
        doc! { "a": { "$in": 1 } },
        doc! { "a": { "$not": 1 } },
        doc! { "a": { "$foo": 1 } },
    ] {
        assert!(parse_filter(&bad).is_err(), "{bad} should not parse");
    }
}

#[test]
fn json_filters() {
    let f = parse_filter_json(r#"{"a": {"$in": [1, 2]}}"#).unwrap();
    assert_eq!(f, Filter::In { path: "a".into(), values: vec![Bson::Int32(1), Bson::Int32(2)] });
    let f = parse_filter_json(r#"{"big": 5000000000}"#).unwrap();
    assert_eq!(f, Filter::eq("big", Bson::Int64(5_000_000_000)));
    assert!(parse_filter_json("[1]").is_err());
    assert!(matches!(parse_filter_json("{"), Err(aggrelite::DbError::Json(_))));
}
