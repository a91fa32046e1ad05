#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum OptionValue {
    Str(String),
    Int(i32),
    Null,
}

#[derive(Arbitrary, Debug)]
struct Input {
    options: Vec<(String, OptionValue)>,
    local: Option<i32>,
}

fuzz_target!(|input: Input| {
    if input.options.len() > 16 { return; }
    let db = aggrelite::Database::new("fuzz");
    if let Ok(orders) = db.create_collection("orders") {
        orders.insert_document(bson::doc! {"_id": 1});
    }
    let mut config = bson::Document::new();
    for (key, value) in input.options {
        let value = match value {
            OptionValue::Str(s) => bson::Bson::String(s),
            OptionValue::Int(i) => bson::Bson::Int32(i),
            OptionValue::Null => bson::Bson::Null,
        };
        config.insert(key, value);
    }
    // Building and running the stage may fail but must not panic.
    if let Ok(stage) = aggrelite::LookupStage::new(&config, &db) {
        let mut doc = bson::Document::new();
        if let Some(v) = input.local {
            doc.insert(stage.local_field(), v);
        }
        let _ = aggrelite::Pipeline::new().with_stage(stage).execute(vec![doc]);
    }
});
