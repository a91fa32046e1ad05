use crate::document::{Document, MAX_PATH_DEPTH};
use bson::Bson;
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_IN_SET};

#[must_use]
pub fn eval_filter(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Nor(fs) => !fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => !field_values(doc, path).is_empty() == *exists,
        Filter::In { path, values } => is_in_set(doc, path, values),
        Filter::Nin { path, values } => !is_in_set(doc, path, values),
        Filter::Cmp { path, op, value } => match op {
            CmpOp::Eq => matches_eq(doc, path, value),
            CmpOp::Ne => !matches_eq(doc, path, value),
            CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
                candidates(&field_values(doc, path)).any(|v| ordered_match(v, *op, value))
            }
        },
        #[cfg(feature = "regex")]
        Filter::Regex { path, pattern, case_insensitive } => {
            let mut re = regex::RegexBuilder::new(pattern);
            re.case_insensitive(*case_insensitive).size_limit(1 << 20);
            let Ok(re) = re.build() else { return false };
            candidates(&field_values(doc, path))
                .any(|v| matches!(v, Bson::String(s) if re.is_match(s)))
        }
    }
}

/// Equality as the query language defines it: `null` also matches a missing field,
/// and an array field matches when the whole array or any element equals `value`.
fn matches_eq(doc: &Document, path: &str, value: &Bson) -> bool {
    let found = field_values(doc, path);
    if found.is_empty() {
        return matches!(value, Bson::Null);
    }
    found.iter().any(|v| values_equal(v, value))
        || candidates(&found).any(|v| values_equal(v, value))
}

fn is_in_set(doc: &Document, path: &str, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| matches_eq(doc, path, x))
}

/// Field values plus, for array values, their elements.
fn candidates<'a>(found: &'a [&'a Bson]) -> impl Iterator<Item = &'a Bson> + 'a {
    found.iter().flat_map(|v| match v {
        Bson::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![*other],
    })
}

/// All values reachable at `path`, descending through arrays of documents.
fn field_values<'a>(doc: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut out = Vec::new();
    if path.is_empty() || path.len() > 1024 {
        return out;
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() > MAX_PATH_DEPTH {
        return out;
    }
    if let Some((first, rest)) = parts.split_first()
        && let Some(v) = doc.get(*first)
    {
        collect_values(v, rest, &mut out);
    }
    out
}

fn collect_values<'a>(value: &'a Bson, rest: &[&str], out: &mut Vec<&'a Bson>) {
    let Some((head, tail)) = rest.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Bson::Document(d) => {
            if let Some(v) = d.get(*head) {
                collect_values(v, tail, out);
            }
        }
        Bson::Array(items) => {
            // A numeric segment selects that element and also a field of that
            // name inside embedded documents.
            if let Ok(idx) = head.parse::<usize>()
                && let Some(v) = items.get(idx)
            {
                collect_values(v, tail, out);
            }
            for item in items.iter().filter(|i| matches!(i, Bson::Document(_))) {
                collect_values(item, rest, out);
            }
        }
        _ => {}
    }
}

fn ordered_match(v: &Bson, op: CmpOp, value: &Bson) -> bool {
    let Some(ord) = compare_bson(v, value) else { return false };
    match op {
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Gte => ord != Ordering::Less,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Lte => ord != Ordering::Greater,
        CmpOp::Eq | CmpOp::Ne => false,
    }
}

/// A numeric value kept exact: integers stay integers.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(x: &Bson) -> Option<Num> {
    match x {
        Bson::Int32(i) => Some(Num::Int(i64::from(*i))),
        Bson::Int64(i) => Some(Num::Int(*i)),
        Bson::Double(f) => Some(Num::Float(*f)),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok().map(Num::Float),
        _ => None,
    }
}

// 2^63 as a double; every finite double below it in magnitude truncates into an i64.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Total order over numbers: NaN equals NaN and sorts below every other number.
fn compare_numbers(a: Num, b: Num) -> Ordering {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x.cmp(&y),
        (Num::Float(x), Num::Float(y)) => match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        },
        (Num::Int(i), Num::Float(f)) => compare_int_float(i, f),
        (Num::Float(f), Num::Int(i)) => compare_int_float(i, f).reverse(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn compare_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f < -I64_LIMIT {
        return Ordering::Greater;
    }
    if f >= I64_LIMIT {
        return Ordering::Less;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

/// Structural equality with numbers compared by value across int, long, double
/// and decimal.
#[must_use]
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|((kl, vl), (kr, vr))| kl == kr && values_equal(vl, vr))
        }
        _ => match (as_num(a), as_num(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y) == Ordering::Equal,
            _ => a == b,
        },
    }
}

/// Ordering within one comparable type class; `None` across classes.
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return Some(compare_numbers(x, y));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
