//! Option readers shared by stage constructors.
//!
//! Every failure is a `FailedToParse` error naming the offending option.

use crate::document::{Document, MAX_PATH_DEPTH, type_name};
use crate::errors::{DbError, ParseErrorKind};
use bson::Bson;
use std::collections::HashSet;

/// Reads a required string option. An explicit `null` counts as missing.
///
/// # Errors
/// `ParseErrorKind::MissingOption` when absent, `ParseErrorKind::WrongType` when not a
/// string.
pub fn read_string_option(config: &Document, stage: &str, key: &str) -> Result<String, DbError> {
    match config.get(key) {
        None | Some(Bson::Null) => Err(DbError::failed_to_parse(
            ParseErrorKind::MissingOption,
            key,
            format!("missing '{key}' option to {stage} stage specification: {config}"),
        )),
        Some(Bson::String(s)) => Ok(s.clone()),
        Some(other) => Err(DbError::failed_to_parse(
            ParseErrorKind::WrongType,
            key,
            format!("'{key}' option to {stage} must be a string, but was type {}", type_name(other)),
        )),
    }
}

/// Reads a required string option holding a dotted field path.
///
/// # Errors
/// As [`read_string_option`], plus `ParseErrorKind::InvalidPath` when the path has more
/// components than a lookup can follow.
pub fn read_path_option(config: &Document, stage: &str, key: &str) -> Result<String, DbError> {
    let path = read_string_option(config, stage, key)?;
    if path.split('.').count() > MAX_PATH_DEPTH {
        return Err(DbError::failed_to_parse(
            ParseErrorKind::InvalidPath,
            key,
            format!("'{key}' option to {stage} must have at most {MAX_PATH_DEPTH} path components: {path}"),
        ));
    }
    Ok(path)
}

/// Rejects the first option (in document order) that `known` does not contain.
///
/// # Errors
/// `ParseErrorKind::UnknownOption` naming the key.
pub fn ensure_known_options(
    config: &Document,
    stage: &str,
    known: &HashSet<&str>,
) -> Result<(), DbError> {
    match config.keys().find(|k| !known.contains(k.as_str())) {
        Some(unknown) => Err(DbError::failed_to_parse(
            ParseErrorKind::UnknownOption,
            unknown,
            format!("unknown argument to {stage}: {unknown}"),
        )),
        None => Ok(()),
    }
}
