//! Aggregation pipeline stages.
//!
//! A stage turns a lazy stream of documents into another lazy stream. Stages
//! compose by feeding one stage's output into the next; nothing is buffered
//! unless a stage's own algorithm needs it. Errors already in the stream are
//! passed through untouched.

mod lookup;
pub mod options;

pub use lookup::LookupStage;

use crate::database::DatabaseHandle;
use crate::document::{Document, type_name};
use crate::errors::{DbError, ParseErrorKind};
use crate::logger::PIPELINE_TARGET;
use bson::Bson;

/// A single-pass, pull-driven sequence of documents.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<Document, DbError>> + 'a>;

/// Wraps owned documents as a stream.
pub fn stream<'a, I>(docs: I) -> DocumentStream<'a>
where
    I: IntoIterator<Item = Document>,
    I::IntoIter: 'a,
{
    Box::new(docs.into_iter().map(Ok))
}

/// One operator of an aggregation pipeline.
///
/// Stages are immutable once built and may be shared by concurrent executions.
pub trait Stage: Send + Sync {
    /// Pipeline name of the stage, e.g. `$lookup`.
    fn name(&self) -> &'static str;

    fn apply<'a>(&'a self, input: DocumentStream<'a>) -> DocumentStream<'a>;
}

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pipeline from stage specifications such as
    /// `[{ "$lookup": { "from": .., "localField": .., "foreignField": .., "as": .. } }]`.
    ///
    /// # Errors
    /// `DbError::FailedToParse` for malformed or unknown stage specifications, plus
    /// whatever the individual stage constructors reject.
    pub fn parse(specs: &[Document], db: &dyn DatabaseHandle) -> Result<Self, DbError> {
        let mut pipeline = Self::new();
        for spec in specs {
            pipeline.stages.push(build_stage(spec, db)?);
        }
        log::debug!(target: PIPELINE_TARGET, "parsed pipeline: stages=[{}]", pipeline.stage_names().join(", "));
        Ok(pipeline)
    }

    pub fn push<S: Stage + 'static>(&mut self, stage: S) {
        self.stages.push(Box::new(stage));
    }

    #[must_use]
    pub fn with_stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.push(stage);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Chains every stage over `input`. Nothing runs until the result is pulled.
    pub fn apply<'a>(&'a self, input: DocumentStream<'a>) -> DocumentStream<'a> {
        self.stages.iter().fold(input, |acc, stage| stage.apply(acc))
    }

    /// Runs the pipeline to completion, stopping at the first error.
    ///
    /// # Errors
    /// The first error produced by any stage.
    pub fn execute(&self, docs: Vec<Document>) -> Result<Vec<Document>, DbError> {
        self.apply(stream(docs)).collect()
    }
}

fn build_stage(spec: &Document, db: &dyn DatabaseHandle) -> Result<Box<dyn Stage>, DbError> {
    let mut fields = spec.iter();
    let (Some((name, body)), None) = (fields.next(), fields.next()) else {
        return Err(DbError::failed_to_parse(
            ParseErrorKind::InvalidStage,
            "",
            "A pipeline stage specification object must contain exactly one field.".to_string(),
        ));
    };
    match name.as_str() {
        LookupStage::NAME => match body {
            Bson::Document(config) => Ok(Box::new(LookupStage::new(config, db)?)),
            other => Err(DbError::failed_to_parse(
                ParseErrorKind::InvalidStage,
                name,
                format!("the {name} stage specification must be an object, but found {}", type_name(other)),
            )),
        },
        _ => Err(DbError::failed_to_parse(
            ParseErrorKind::InvalidStage,
            name,
            format!("Unrecognized pipeline stage name: '{name}'"),
        )),
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stage_names()).finish()
    }
}
