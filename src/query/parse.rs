use crate::document::Document;
use crate::errors::DbError;
use bson::Bson;

use super::types::{CmpOp, Filter, MAX_CLAUSES, MAX_IN_SET};

/// Parses a filter document such as `{ "age": { "$gt": 30 }, "name": "bob" }`.
///
/// Several top-level fields form an implicit `$and`; an empty document matches
/// everything.
///
/// # Errors
/// Returns `DbError::QueryError` for unknown operators or malformed operands.
pub fn parse_filter(filter: &Document) -> Result<Filter, DbError> {
    if filter.len() > MAX_CLAUSES {
        return Err(DbError::QueryError(format!("filter has more than {MAX_CLAUSES} fields")));
    }
    let clauses = filter
        .iter()
        .map(|(key, value)| parse_clause(key, value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Filter::all_of(clauses))
}

fn parse_clause(key: &str, value: &Bson) -> Result<Filter, DbError> {
    match key {
        "$and" => Ok(Filter::And(parse_filter_list(key, value)?)),
        "$or" => Ok(Filter::Or(parse_filter_list(key, value)?)),
        "$nor" => Ok(Filter::Nor(parse_filter_list(key, value)?)),
        _ if key.starts_with('$') => {
            Err(DbError::QueryError(format!("unknown top level operator: {key}")))
        }
        path => match value {
            Bson::Document(ops) if is_operator_document(ops) => parse_operators(path, ops),
            _ => Ok(Filter::eq(path, value.clone())),
        },
    }
}

fn parse_filter_list(op: &str, value: &Bson) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::QueryError(format!("{op} must be an array")));
    };
    if items.is_empty() {
        return Err(DbError::QueryError(format!("{op} must be a nonempty array")));
    }
    items
        .iter()
        .take(MAX_CLAUSES)
        .map(|item| match item {
            Bson::Document(d) => parse_filter(d),
            _ => Err(DbError::QueryError(format!("{op} entries must be objects"))),
        })
        .collect()
}

fn is_operator_document(d: &Document) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_operators(path: &str, ops: &Document) -> Result<Filter, DbError> {
    let mut clauses = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let clause = match op.as_str() {
            "$eq" => cmp(path, CmpOp::Eq, operand),
            "$ne" => cmp(path, CmpOp::Ne, operand),
            "$gt" => cmp(path, CmpOp::Gt, operand),
            "$gte" => cmp(path, CmpOp::Gte, operand),
            "$lt" => cmp(path, CmpOp::Lt, operand),
            "$lte" => cmp(path, CmpOp::Lte, operand),
            "$in" => Filter::In { path: path.to_string(), values: value_set(op, operand)? },
            "$nin" => Filter::Nin { path: path.to_string(), values: value_set(op, operand)? },
            "$exists" => Filter::Exists { path: path.to_string(), exists: is_truthy(operand) },
            "$not" => match operand {
                Bson::Document(inner) if is_operator_document(inner) => {
                    Filter::Not(Box::new(parse_operators(path, inner)?))
                }
                _ => return Err(DbError::QueryError("$not needs a document of operators".into())),
            },
            #[cfg(feature = "regex")]
            "$regex" => parse_regex(path, operand, ops.get("$options"))?,
            #[cfg(feature = "regex")]
            "$options" if ops.contains_key("$regex") => continue,
            other => return Err(DbError::QueryError(format!("unknown operator: {other}"))),
        };
        clauses.push(clause);
    }
    Ok(Filter::all_of(clauses))
}

fn cmp(path: &str, op: CmpOp, operand: &Bson) -> Filter {
    Filter::Cmp { path: path.to_string(), op, value: operand.clone() }
}

fn value_set(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(values) => Ok(values.iter().take(MAX_IN_SET).cloned().collect()),
        _ => Err(DbError::QueryError(format!("{op} needs an array"))),
    }
}

fn is_truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

#[cfg(feature = "regex")]
fn parse_regex(path: &str, operand: &Bson, options: Option<&Bson>) -> Result<Filter, DbError> {
    let Bson::String(pattern) = operand else {
        return Err(DbError::QueryError("$regex has to be a string".into()));
    };
    let case_insensitive = match options {
        None => false,
        Some(Bson::String(o)) => o.contains('i'),
        Some(_) => return Err(DbError::QueryError("$options has to be a string".into())),
    };
    Ok(Filter::Regex { path: path.to_string(), pattern: pattern.clone(), case_insensitive })
}

/// Parses a JSON filter (`{"field": {"$in": [1, 2]}}`) into a [`Filter`].
///
/// # Errors
/// Returns an error if the text is not JSON, is not an object, or is not a valid filter.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match json_to_bson(value) {
        Bson::Document(d) => parse_filter(&d),
        _ => Err(DbError::QueryError("filter must be a JSON object".into())),
    }
}

/// Plain JSON to BSON; integers that fit use `int`, wider ones `long`.
fn json_to_bson(value: serde_json::Value) -> Bson {
    use serde_json::Value as J;
    match value {
        J::Null => Bson::Null,
        J::Bool(b) => Bson::Boolean(b),
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        J::String(s) => Bson::String(s),
        J::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        J::Object(map) => {
            let mut doc = Document::new();
            for (k, v) in map {
                doc.insert(k, json_to_bson(v));
            }
            Bson::Document(doc)
        }
    }
}
