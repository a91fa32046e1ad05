use crate::collection::Collection;
use crate::document::Document;

use super::cursor::Cursor;
use super::eval::eval_filter;
use super::types::Filter;

/// Evaluates `filter` against a snapshot of the collection, in insertion order.
#[must_use]
pub fn find_docs(col: &Collection, filter: &Filter) -> Cursor {
    let start = std::time::Instant::now();
    let docs: Vec<Document> = col.with_documents(|all| {
        all.iter().filter(|d| eval_filter(d, filter)).cloned().collect()
    });
    log::trace!(
        "find: collection={}, filter={}, results={}, duration_us={}",
        col.name_str(),
        filter.type_name(),
        docs.len(),
        start.elapsed().as_micros()
    );
    Cursor::new(docs)
}

#[must_use]
pub fn count_docs(col: &Collection, filter: &Filter) -> usize {
    col.with_documents(|all| all.iter().filter(|d| eval_filter(d, filter)).count())
}
