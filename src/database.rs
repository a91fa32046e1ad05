use crate::collection::{Collection, QueryableCollection};
use crate::config::DatabaseOptions;
use crate::errors::DbError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Database-level collection lookup used by stages at construction time.
pub trait DatabaseHandle: Send + Sync {
    /// Resolves `name` to a collection.
    ///
    /// With `create_if_missing == false` an unknown name must not create anything;
    /// implementations may hand back an empty collection or reject the name.
    ///
    /// # Errors
    /// Returns an error if the implementation rejects the name.
    fn resolve_collection(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn QueryableCollection>, DbError>;
}

/// An in-memory database: a named set of collections.
pub struct Database {
    name: String,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Database {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), collections: RwLock::new(HashMap::new()) }
    }

    /// Creates a database from options, installing the database-scoped file logger
    /// when `enable_logging` is set.
    ///
    /// # Errors
    /// Returns `DbError::Io` if the log folder cannot be created.
    pub fn open(options: &DatabaseOptions) -> Result<Self, DbError> {
        if options.enable_logging {
            let base = options.log_dir.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
            std::fs::create_dir_all(&base)?;
            // A logger may already be installed by the host process; keep it.
            if let Err(e) = crate::logger::init_for_db_in(
                &base,
                &options.name,
                &options.log_level,
                options.log_retention,
            ) {
                log::debug!("database logger not installed: {e}");
            }
        }
        log::info!("open database: name={}", options.name);
        Ok(Self::new(options.name.clone()))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new, empty collection.
    ///
    /// # Errors
    /// Returns `DbError::InvalidCollectionName` or `DbError::CollectionAlreadyExists`.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        validate_collection_name(name)?;
        let mut map = self.collections.write();
        if map.contains_key(name) {
            return Err(DbError::CollectionAlreadyExists(name.to_string()));
        }
        let col = Arc::new(Collection::new(name));
        map.insert(name.to_string(), col.clone());
        log::info!("create collection: db={}, collection={name}", self.name);
        Ok(col)
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Drops a collection; returns whether it existed.
    pub fn drop_collection(&self, name: &str) -> bool {
        let removed = self.collections.write().remove(name).is_some();
        if removed {
            log::info!("drop collection: db={}, collection={name}", self.name);
        }
        removed
    }

    /// Lists the names of all collections, sorted.
    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DatabaseHandle for Database {
    fn resolve_collection(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn QueryableCollection>, DbError> {
        validate_collection_name(name)?;
        if let Some(col) = self.get_collection(name) {
            return Ok(col);
        }
        if create_if_missing {
            let mut map = self.collections.write();
            let col = map.entry(name.to_string()).or_insert_with(|| Arc::new(Collection::new(name)));
            return Ok(col.clone());
        }
        // Unknown and not created: an unregistered collection that never matches.
        log::debug!("resolve missing collection as empty: db={}, collection={name}", self.name);
        Ok(Arc::new(Collection::new(name)))
    }
}

fn validate_collection_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() || name.contains('$') || name.contains('\0') {
        return Err(DbError::InvalidCollectionName(name.to_string()));
    }
    Ok(())
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("collections", &self.list_collection_names())
            .finish()
    }
}
