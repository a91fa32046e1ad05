use thiserror::Error;

/// Which part of a stage specification failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A required option is absent (or explicitly `null`).
    MissingOption,
    /// A required option is present with a non-string value.
    WrongType,
    /// A field-path option has more components than documents can be searched by.
    InvalidPath,
    /// The stage document carries an option the stage does not recognize.
    UnknownOption,
    /// The pipeline-level stage wrapper is malformed.
    InvalidStage,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{message}")]
    FailedToParse { kind: ParseErrorKind, key: String, message: String },

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Collection not found: {0}")]
    NoSuchCollection(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Invalid collection name: '{0}'")]
    InvalidCollectionName(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl DbError {
    pub(crate) fn failed_to_parse(kind: ParseErrorKind, key: &str, message: String) -> Self {
        Self::FailedToParse { kind, key: key.to_string(), message }
    }

    /// Numeric error code as reported to query-language clients.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::FailedToParse { .. } => 9,
            Self::QueryError(_) => 2,
            Self::NoSuchCollection(_) => 26,
            Self::CollectionAlreadyExists(_) => 48,
            Self::InvalidCollectionName(_) => 73,
            Self::Io(_) | Self::Json(_) | Self::Config(_) => 1,
        }
    }

    /// Stable code name paired with [`DbError::code`].
    #[must_use]
    pub const fn code_name(&self) -> &'static str {
        match self {
            Self::FailedToParse { .. } => "FailedToParse",
            Self::QueryError(_) => "BadValue",
            Self::NoSuchCollection(_) => "NamespaceNotFound",
            Self::CollectionAlreadyExists(_) => "NamespaceExists",
            Self::InvalidCollectionName(_) => "InvalidNamespace",
            Self::Io(_) | Self::Json(_) | Self::Config(_) => "InternalError",
        }
    }
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<toml::de::Error> for DbError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
