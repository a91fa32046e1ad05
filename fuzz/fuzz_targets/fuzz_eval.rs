#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(filter) = aggrelite::query::parse_filter_json(s) {
            let docs = [
                bson::doc! {"_id": 1, "customerId": 42, "name": "x"},
                bson::doc! {"_id": 2, "tags": ["a", "b"], "items": [{"sku": "p"}, {"sku": "q"}]},
                bson::doc! {"nested": {"z": 3}, "missing": null},
            ];
            for d in &docs {
                let _ = aggrelite::query::eval_filter(d, &filter);
            }
        }
    }
});
