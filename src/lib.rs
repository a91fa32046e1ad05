pub mod aggregation;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod errors;
pub mod logger;
pub mod query;

pub use crate::aggregation::{DocumentStream, LookupStage, Pipeline, Stage};
pub use crate::collection::{Collection, QueryableCollection};
pub use crate::config::DatabaseOptions;
pub use crate::database::{Database, DatabaseHandle};
pub use crate::document::Document;
pub use crate::errors::{DbError, ParseErrorKind};

/// Initializes the logging system.
///
/// Reads `log4rs.yaml` from the working directory when present and otherwise
/// falls back to the `AGGRELITE_LOG_*` environment variables.
///
/// # Errors
/// Returns an error if no logger could be installed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if std::path::Path::new("log4rs.yaml").exists() {
        return logger::init();
    }
    logger::configure_from_env()
}
