//! The `$lookup` stage: an equality join against a second collection.

use crate::collection::QueryableCollection;
use crate::database::DatabaseHandle;
use crate::document::{Document, get_path};
use crate::errors::DbError;
use crate::logger::PIPELINE_TARGET;
use bson::Bson;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use super::options::{ensure_known_options, read_path_option, read_string_option};
use super::{DocumentStream, Stage};

const FROM: &str = "from";
const LOCAL_FIELD: &str = "localField";
const FOREIGN_FIELD: &str = "foreignField";
const AS: &str = "as";

static LOOKUP_OPTIONS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| [FROM, LOCAL_FIELD, FOREIGN_FIELD, AS].into_iter().collect());

/// Joins each input document with the documents of `from` whose `foreignField`
/// equals the input's `localField`, storing them as an array under `as`.
///
/// Input documents without any match are dropped from the output.
pub struct LookupStage {
    from: String,
    local_field: String,
    foreign_field: String,
    as_field: String,
    collection: Arc<dyn QueryableCollection>,
}

impl LookupStage {
    pub const NAME: &'static str = "$lookup";

    /// Validates `configuration` and resolves the target collection without
    /// creating it.
    ///
    /// # Errors
    /// `DbError::FailedToParse` for a missing, non-string or unknown option or an
    /// over-deep field path; any error
    /// the database raises while resolving `from`.
    pub fn new(configuration: &Document, db: &dyn DatabaseHandle) -> Result<Self, DbError> {
        let from = read_string_option(configuration, Self::NAME, FROM)?;
        let collection = db.resolve_collection(&from, false)?;
        let local_field = read_path_option(configuration, Self::NAME, LOCAL_FIELD)?;
        let foreign_field = read_path_option(configuration, Self::NAME, FOREIGN_FIELD)?;
        let as_field = read_string_option(configuration, Self::NAME, AS)?;
        ensure_known_options(configuration, Self::NAME, &LOOKUP_OPTIONS)?;
        log::debug!(
            target: PIPELINE_TARGET,
            "built {}: from={from}, localField={local_field}, foreignField={foreign_field}, as={as_field}",
            Self::NAME
        );
        Ok(Self { from, local_field, foreign_field, as_field, collection })
    }

    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    #[must_use]
    pub fn local_field(&self) -> &str {
        &self.local_field
    }

    #[must_use]
    pub fn foreign_field(&self) -> &str {
        &self.foreign_field
    }

    #[must_use]
    pub fn as_field(&self) -> &str {
        &self.as_field
    }

    /// All foreign documents joined to `document`; a missing local field joins as `null`.
    ///
    /// # Errors
    /// Propagates the target collection's query error unchanged.
    pub fn resolve(&self, document: &Document) -> Result<Vec<Document>, DbError> {
        let value = get_path(document, &self.local_field).unwrap_or(Bson::Null);
        self.lookup_value(&value)
    }

    /// Arrays are resolved element by element (recursively) and concatenated in
    /// element order; any other value is matched with one equality query.
    ///
    /// # Errors
    /// Propagates the target collection's query error unchanged.
    pub fn lookup_value(&self, value: &Bson) -> Result<Vec<Document>, DbError> {
        if let Bson::Array(items) = value {
            let mut joined = Vec::new();
            for item in items {
                joined.extend(self.lookup_value(item)?);
            }
            return Ok(joined);
        }
        let cursor = self.collection.query(&self.equality_filter(value))?;
        Ok(cursor.collect())
    }

    fn equality_filter(&self, value: &Bson) -> Document {
        let mut filter = Document::new();
        let operand = match value {
            // Keep a document that looks like an operator expression a literal.
            Bson::Document(d) if d.keys().next().is_some_and(|k| k.starts_with('$')) => {
                Bson::Document(bson::doc! { "$eq": value.clone() })
            }
            _ => value.clone(),
        };
        filter.insert(self.foreign_field.clone(), operand);
        filter
    }

    fn join(&self, document: Document) -> Result<Option<Document>, DbError> {
        let matches = self.resolve(&document)?;
        if matches.is_empty() {
            log::trace!(target: PIPELINE_TARGET, "{}: no match in {}, dropping document", Self::NAME, self.from);
            return Ok(None);
        }
        log::trace!(target: PIPELINE_TARGET, "{}: {} match(es) in {}", Self::NAME, matches.len(), self.from);
        let mut joined = document;
        joined.insert(self.as_field.clone(), Bson::Array(matches.into_iter().map(Bson::Document).collect()));
        Ok(Some(joined))
    }
}

impl Stage for LookupStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply<'a>(&'a self, input: DocumentStream<'a>) -> DocumentStream<'a> {
        Box::new(input.filter_map(move |item| item.and_then(|doc| self.join(doc)).transpose()))
    }
}

impl std::fmt::Debug for LookupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupStage")
            .field("from", &self.from)
            .field("local_field", &self.local_field)
            .field("foreign_field", &self.foreign_field)
            .field("as_field", &self.as_field)
            .finish_non_exhaustive()
    }
}
