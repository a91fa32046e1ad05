//! Document model helpers.
//!
//! Documents are plain `bson::Document`s: ordered, unique field names, value-like
//! `Clone`. This module adds the path and type-name helpers shared by the query
//! evaluator and the aggregation stages.

use bson::Bson;

pub use bson::Document;

pub(crate) const MAX_PATH_DEPTH: usize = 32;

/// Reads the value at a simple or dotted field path.
///
/// Dotted segments descend into nested documents. When a segment meets an array,
/// the rest of the path is applied to every document element and the values found
/// are gathered into an array. Returns `None` when nothing is found.
#[must_use]
pub fn get_path(doc: &Document, path: &str) -> Option<Bson> {
    if path.is_empty() {
        return None;
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() > MAX_PATH_DEPTH {
        return None;
    }
    let (first, rest) = parts.split_first()?;
    descend(doc.get(*first)?, rest)
}

fn descend(value: &Bson, rest: &[&str]) -> Option<Bson> {
    let Some((head, tail)) = rest.split_first() else {
        return Some(value.clone());
    };
    match value {
        Bson::Document(d) => descend(d.get(*head)?, tail),
        Bson::Array(items) => {
            let found: Vec<Bson> = items
                .iter()
                .filter(|item| matches!(item, Bson::Document(_)))
                .filter_map(|item| descend(item, rest))
                .collect();
            if found.is_empty() { None } else { Some(Bson::Array(found)) }
        }
        _ => None,
    }
}

/// Query-language type alias of a value, as used in error messages.
#[must_use]
pub const fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Binary(_) => "binData",
        Bson::Undefined => "undefined",
        Bson::ObjectId(_) => "objectId",
        Bson::Boolean(_) => "bool",
        Bson::DateTime(_) => "date",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::DbPointer(_) => "dbPointer",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::Symbol(_) => "symbol",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int",
        Bson::Timestamp(_) => "timestamp",
        Bson::Int64(_) => "long",
        Bson::Decimal128(_) => "decimal",
        Bson::MinKey => "minKey",
        Bson::MaxKey => "maxKey",
    }
}
