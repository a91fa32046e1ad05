use crate::document::Document;
use crate::errors::DbError;
use crate::query::{self, Cursor, Filter};
use parking_lot::RwLock;

/// The read-only query capability aggregation stages need from a collection.
///
/// Implementations must be safe to query from several pipeline executions at once;
/// each call returns its own snapshot.
pub trait QueryableCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Returns every document matching `filter`.
    ///
    /// # Errors
    /// Returns an error if the filter is malformed or the backing store fails.
    fn query(&self, filter: &Document) -> Result<Cursor, DbError>;
}

/// An in-memory collection. Documents are kept in insertion order, which is also
/// the order query results are returned in.
pub struct Collection {
    name: String,
    documents: RwLock<Vec<Document>>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), documents: RwLock::new(Vec::new()) }
    }

    /// Returns the collection's name as a String (cloned).
    #[must_use]
    pub fn name_str(&self) -> String {
        self.name.clone()
    }

    pub fn insert_document(&self, document: Document) {
        self.documents.write().push(document);
    }

    /// Inserts all documents and returns how many were added.
    pub fn insert_many<I>(&self, documents: I) -> usize
    where
        I: IntoIterator<Item = Document>,
    {
        let mut store = self.documents.write();
        let before = store.len();
        store.extend(documents);
        store.len() - before
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.documents.read().len()
    }

    #[must_use]
    pub fn get_all_documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    #[must_use]
    pub fn find(&self, filter: &Filter) -> Cursor {
        query::find_docs(self, filter)
    }

    pub(crate) fn with_documents<R>(&self, f: impl FnOnce(&[Document]) -> R) -> R {
        f(&self.documents.read())
    }
}

impl QueryableCollection for Collection {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, filter: &Document) -> Result<Cursor, DbError> {
        let filter = query::parse_filter(filter)?;
        Ok(self.find(&filter))
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("count", &self.count())
            .finish()
    }
}
