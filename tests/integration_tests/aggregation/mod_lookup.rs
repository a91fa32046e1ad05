use crate::integration_tests::_support::{
    CountingCollection, FailingCollection, FixedDatabase, orders_db, orders_lookup_config,
};
use aggrelite::aggregation::stream;
use aggrelite::{Collection, Database, DbError, LookupStage, Stage};
use bson::{Bson, doc};
use std::sync::Arc;

fn run(stage: &LookupStage, docs: Vec<aggrelite::Document>) -> Result<Vec<aggrelite::Document>, DbError> {
    stage.apply(stream(docs)).collect()
}

#[test]
fn joins_orders_customer_scenario() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "_id": 1, "customerId": 42 }]).unwrap();
    assert_eq!(out, vec![doc! { "_id": 1, "customerId": 42, "customer": [{ "_id": 42, "name": "Acme" }] }]);
}

#[test]
fn scalar_match_keeps_collection_order() {
    let db = Database::new("db");
    let items = db.create_collection("items").unwrap();
    items.insert_many(vec![
        doc! { "sku": "a", "n": 1 },
        doc! { "sku": "b", "n": 2 },
        doc! { "sku": "a", "n": 3 },
    ]);
    let config = doc! { "from": "items", "localField": "item", "foreignField": "sku", "as": "matched" };
    let stage = LookupStage::new(&config, &db).unwrap();
    let out = run(&stage, vec![doc! { "item": "a" }]).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].get_array("matched").unwrap(),
        &vec![Bson::Document(doc! { "sku": "a", "n": 1 }), Bson::Document(doc! { "sku": "a", "n": 3 })]
    );
}

#[test]
fn array_local_field_concatenates_in_element_order() {
    let db = Database::new("db");
    let tags = db.create_collection("tags").unwrap();
    tags.insert_many(vec![
        doc! { "k": 2, "v": "B" },
        doc! { "k": 1, "v": "A" },
        doc! { "k": 2, "v": "C" },
    ]);
    let config = doc! { "from": "tags", "localField": "keys", "foreignField": "k", "as": "found" };
    let stage = LookupStage::new(&config, &db).unwrap();
    let out = run(&stage, vec![doc! { "keys": [1, 2] }]).unwrap();
    let found: Vec<&str> = out[0]
        .get_array("found")
        .unwrap()
        .iter()
        .map(|b| b.as_document().unwrap().get_str("v").unwrap())
        .collect();
    assert_eq!(found, vec!["A", "B", "C"]);
}

#[test]
fn nested_arrays_are_resolved_recursively() {
    let db = Database::new("db");
    let col = db.create_collection("c").unwrap();
    col.insert_many(vec![doc! { "k": 1 }, doc! { "k": 2 }, doc! { "k": 3 }]);
    let stage = LookupStage::new(&doc! { "from": "c", "localField": "x", "foreignField": "k", "as": "r" }, &db).unwrap();
    let joined = stage.resolve(&doc! { "x": [3, [1, [2]]] }).unwrap();
    let keys: Vec<i32> = joined.iter().map(|d| d.get_i32("k").unwrap()).collect();
    assert_eq!(keys, vec![3, 1, 2]);
}

#[test]
fn no_match_drops_the_document() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "_id": 1, "customerId": 7 }, doc! { "_id": 2, "customerId": 42 }]).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get_i32("_id").unwrap(), 2);
}

#[test]
fn empty_array_local_field_matches_nothing() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    assert!(run(&stage, vec![doc! { "customerId": [] }]).unwrap().is_empty());
}

#[test]
fn missing_local_field_joins_as_null() {
    let db = Database::new("db");
    let col = db.create_collection("people").unwrap();
    col.insert_many(vec![doc! { "name": "no-team" }, doc! { "name": "null-team", "team": Bson::Null }, doc! { "name": "red", "team": "red" }]);
    let stage = LookupStage::new(&doc! { "from": "people", "localField": "team", "foreignField": "team", "as": "mates" }, &db).unwrap();
    let out = run(&stage, vec![doc! { "_id": 1 }]).unwrap();
    let names: Vec<&str> = out[0]
        .get_array("mates")
        .unwrap()
        .iter()
        .map(|b| b.as_document().unwrap().get_str("name").unwrap())
        .collect();
    assert_eq!(names, vec!["no-team", "null-team"]);
}

#[test]
fn dotted_local_field_reads_nested_value() {
    let db = orders_db();
    let config = doc! { "from": "orders", "localField": "ref.customer", "foreignField": "_id", "as": "customer" };
    let stage = LookupStage::new(&config, &db).unwrap();
    let out = run(&stage, vec![doc! { "ref": { "customer": 42 } }]).unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn numeric_types_match_by_value() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "customerId": 42.0 }, doc! { "customerId": 42_i64 }]).unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn nan_keys_join_to_nan_ids() {
    let db = Database::new("db");
    let col = db.create_collection("orders").unwrap();
    col.insert_many(vec![doc! { "_id": f64::NAN, "tag": "nan" }, doc! { "_id": 0.0, "tag": "zero" }]);
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "customerId": f64::NAN }]).unwrap();
    assert_eq!(out.len(), 1);
    let joined = out[0].get_array("customer").unwrap();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].as_document().unwrap().get_str("tag").unwrap(), "nan");
}

#[test]
fn large_longs_do_not_match_nearby_doubles() {
    let db = Database::new("db");
    let col = db.create_collection("orders").unwrap();
    col.insert_many(vec![doc! { "_id": 9_007_199_254_740_992.0 }, doc! { "_id": 9_007_199_254_740_993_i64 }]);
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "customerId": 9_007_199_254_740_993_i64 }]).unwrap();
    assert_eq!(
        out[0].get_array("customer").unwrap(),
        &vec![Bson::Document(doc! { "_id": 9_007_199_254_740_993_i64 })]
    );
    let out = run(&stage, vec![doc! { "customerId": 9_007_199_254_740_992_i64 }]).unwrap();
    assert_eq!(out[0].get_array("customer").unwrap(), &vec![Bson::Document(doc! { "_id": 9_007_199_254_740_992.0 })]);
}

#[test]
fn foreign_array_field_matches_any_element() {
    let db = Database::new("db");
    let col = db.create_collection("groups").unwrap();
    col.insert_document(doc! { "name": "admins", "members": ["ann", "bob"] });
    let stage = LookupStage::new(&doc! { "from": "groups", "localField": "user", "foreignField": "members", "as": "groups" }, &db).unwrap();
    let out = run(&stage, vec![doc! { "user": "bob" }]).unwrap();
    assert_eq!(out[0].get_array("groups").unwrap().len(), 1);
}

#[test]
fn existing_as_field_is_replaced_in_place() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let out = run(&stage, vec![doc! { "customer": "old", "customerId": 42 }]).unwrap();
    let keys: Vec<&String> = out[0].keys().collect();
    assert_eq!(keys, vec!["customer", "customerId"]);
    assert!(out[0].get_array("customer").is_ok());
}

#[test]
fn input_document_is_left_untouched() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let input = doc! { "_id": 1, "customerId": 42 };
    let snapshot = input.clone();
    let out = run(&stage, vec![input.clone()]).unwrap();
    assert_eq!(input, snapshot);
    assert!(!input.contains_key("customer"));
    assert!(out[0].contains_key("customer"));
}

#[test]
fn missing_target_collection_is_empty_and_not_created() {
    let db = Database::new("db");
    let config = doc! { "from": "ghosts", "localField": "a", "foreignField": "b", "as": "c" };
    let stage = LookupStage::new(&config, &db).unwrap();
    assert!(run(&stage, vec![doc! { "a": 1 }, doc! { "a": Bson::Null }]).unwrap().is_empty());
    assert!(db.get_collection("ghosts").is_none());
}

#[test]
fn resolves_target_without_creating_it() {
    let fixed = FixedDatabase::new(Arc::new(Collection::new("orders")));
    LookupStage::new(&orders_lookup_config(), &fixed).unwrap();
    assert_eq!(*fixed.requests.lock(), vec![("orders".to_string(), false)]);
}

#[test]
fn issues_one_equality_query_per_scalar() {
    let counting = Arc::new(CountingCollection::new(Arc::new(Collection::new("orders"))));
    let fixed = FixedDatabase::new(counting.clone());
    let stage = LookupStage::new(&orders_lookup_config(), &fixed).unwrap();
    let _ = run(&stage, vec![doc! { "customerId": [1, 2, [3]] }, doc! { "customerId": "x" }]).unwrap();
    assert_eq!(counting.calls(), 4);
    assert_eq!(counting.filters.lock()[3], doc! { "_id": "x" });
}

#[test]
fn operator_shaped_values_are_matched_literally() {
    let db = Database::new("db");
    let col = db.create_collection("c").unwrap();
    col.insert_many(vec![doc! { "k": { "$gt": 1 } }, doc! { "k": 5 }]);
    let stage = LookupStage::new(&doc! { "from": "c", "localField": "v", "foreignField": "k", "as": "r" }, &db).unwrap();
    let joined = stage.resolve(&doc! { "v": { "$gt": 1 } }).unwrap();
    assert_eq!(joined, vec![doc! { "k": { "$gt": 1 } }]);
}

#[test]
fn query_errors_propagate_unchanged() {
    let fixed = FixedDatabase::new(Arc::new(FailingCollection));
    let stage = LookupStage::new(&orders_lookup_config(), &fixed).unwrap();
    let err = run(&stage, vec![doc! { "customerId": 1 }]).unwrap_err();
    assert!(matches!(err, DbError::QueryError(ref m) if m == "storage unavailable"));
}

#[test]
fn upstream_errors_pass_through() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    let input: aggrelite::DocumentStream<'_> = Box::new(
        vec![Err(DbError::QueryError("upstream".into())), Ok(doc! { "customerId": 42 })].into_iter(),
    );
    let out: Vec<_> = stage.apply(input).collect();
    assert!(matches!(out[0], Err(DbError::QueryError(ref m)) if m == "upstream"));
    assert!(out[1].is_ok());
}

#[test]
fn output_is_lazy_and_stops_when_dropped() {
    let counting = Arc::new(CountingCollection::new(Arc::new(Collection::new("orders"))));
    let fixed = FixedDatabase::new(counting.clone());
    let stage = LookupStage::new(&orders_lookup_config(), &fixed).unwrap();
    let docs: Vec<_> = (0..10).map(|i| doc! { "customerId": i }).collect();
    let mut out = stage.apply(stream(docs));
    assert_eq!(counting.calls(), 0);
    // No matches anywhere: pulling once drains the input looking for output.
    assert!(out.next().is_none());
    assert_eq!(counting.calls(), 10);

    let docs: Vec<_> = (0..10).map(|_| doc! { "customerId": 1 }).collect();
    let seeded = Collection::new("orders");
    seeded.insert_document(doc! { "_id": 1 });
    let counting = Arc::new(CountingCollection::new(Arc::new(seeded)));
    let fixed = FixedDatabase::new(counting.clone());
    let stage = LookupStage::new(&orders_lookup_config(), &fixed).unwrap();
    let mut out = stage.apply(stream(docs));
    assert!(out.next().is_some());
    drop(out);
    assert_eq!(counting.calls(), 1);
}

#[test]
fn accessors_report_configuration() {
    let db = orders_db();
    let stage = LookupStage::new(&orders_lookup_config(), &db).unwrap();
    assert_eq!(stage.name(), "$lookup");
    assert_eq!(stage.from(), "orders");
    assert_eq!(stage.local_field(), "customerId");
    assert_eq!(stage.foreign_field(), "_id");
    assert_eq!(stage.as_field(), "customer");
}
