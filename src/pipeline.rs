//! Stage traits and the pipeline orchestrator.
//!
//! A pipeline is one lazy, pull-based stream wired end to end:
//!
//! ```text
//! Source ──► Transform ──► ... ──► Transform ──► Sink
//! ```
//!
//! Every stage boundary is a [`RecordStream`]: records are produced one at a
//! time, on demand, so nothing is materialized in bulk unless a sink has to
//! batch (the remote sink does, because its upload mechanism needs one
//! complete file). Backpressure is implicit in the pull model: the sink only
//! asks for the next record when it is ready for one.
//!
//! Execution is single-threaded and strictly in data-dependency order: the
//! sink observes records in exactly the order the source and transforms
//! produce them, and a failing stage aborts the whole run. There is no retry
//! and no skip-and-continue.
//!
//! # Examples
//!
//! ```rust,ignore
//! use docflow::pipeline::PipelineBuilder;
//! use docflow::sources::FileSource;
//! use docflow::transforms::{ChunkingTransform, SentenceSplitter};
//! use docflow::sinks::JsonLineSink;
//!
//! let pipeline = PipelineBuilder::from_source(FileSource::new(roots))
//!     .then(SentenceSplitter::new())
//!     .then(ChunkingTransform::default())
//!     .sink(JsonLineSink::new("chunks.jsonl"));
//! pipeline.run(false).await?;
//! ```

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use crate::types::{DataRecord, DataflowError};

/// The currency of the pipeline: a pinned, boxed, lazy stream of records.
pub type RecordStream<T> = BoxStream<'static, Result<DataRecord<T>, DataflowError>>;

/// Initial stage: enumerates input documents and yields them lazily.
pub trait Source: Send + Sync {
    /// Payload type of the yielded records.
    type Item: Send + 'static;

    /// Stage name used in pipeline logging.
    fn name(&self) -> &'static str;

    /// Open the lazy record stream. Nothing is read until the stream is
    /// polled; the stream owns whatever state it needs.
    fn read(&self) -> RecordStream<Self::Item>;
}

/// Intermediate stage: maps one record to zero, one, or many records of a
/// possibly different payload type.
///
/// Transforms always return a sequence; a 1:1 transform returns a
/// single-element `Vec` and a filtering transform may return an empty one.
/// The orchestrator flattens each batch into the stream in order, which keeps
/// both transform shapes uniform without a second code path.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Payload type this transform consumes.
    type Input: Send + 'static;
    /// Payload type this transform produces.
    type Output: Send + 'static;

    /// Stage name used in pipeline logging.
    fn name(&self) -> &'static str;

    /// Process one record into its (possibly empty) expansion.
    async fn process(
        &self,
        record: DataRecord<Self::Input>,
    ) -> Result<Vec<DataRecord<Self::Output>>, DataflowError>;
}

/// Terminal stage: consumes the fully wired stream to completion as a side
/// effect. No data flows back into the pipeline.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Payload type this sink consumes.
    type Item: Send + 'static;

    /// Stage name used in pipeline logging.
    fn name(&self) -> &'static str;

    /// Drain the stream, persisting every record. Must not return before the
    /// stream is exhausted and all output is flushed.
    async fn write(&self, records: RecordStream<Self::Item>) -> Result<(), DataflowError>;
}

/// Rewire a stream through one transform, flattening each record's expansion.
fn pipe<T>(input: RecordStream<T::Input>, transform: T) -> RecordStream<T::Output>
where
    T: Transform + 'static,
{
    Box::pin(try_stream! {
        let mut input = input;
        while let Some(record) = input.next().await {
            let record = record?;
            for out in transform.process(record).await? {
                yield out;
            }
        }
    })
}

/// Builder that wires a source through an ordered chain of transforms.
///
/// The chain is typed: each [`then`](Self::then) call changes the payload
/// type flowing out of the builder, so a mis-ordered chain fails to compile
/// instead of failing at runtime. Wiring is cheap and lazy; no record moves
/// until [`Pipeline::run`] drains the stream.
pub struct PipelineBuilder<T> {
    stream: RecordStream<T>,
    source_name: &'static str,
    transform_names: Vec<&'static str>,
}

impl<T: Send + 'static> PipelineBuilder<T> {
    /// Start a pipeline from a source.
    pub fn from_source<S>(source: S) -> Self
    where
        S: Source<Item = T>,
    {
        Self {
            stream: source.read(),
            source_name: source.name(),
            transform_names: Vec::new(),
        }
    }

    /// Append a transform to the chain.
    #[must_use]
    pub fn then<Tr>(mut self, transform: Tr) -> PipelineBuilder<Tr::Output>
    where
        Tr: Transform<Input = T> + 'static,
    {
        self.transform_names.push(transform.name());
        PipelineBuilder {
            stream: pipe(self.stream, transform),
            source_name: self.source_name,
            transform_names: self.transform_names,
        }
    }

    /// Fix the terminal sink, producing a runnable [`Pipeline`].
    pub fn sink<K>(self, sink: K) -> Pipeline<K>
    where
        K: Sink<Item = T>,
    {
        Pipeline {
            stream: self.stream,
            sink,
            source_name: self.source_name,
            transform_names: self.transform_names,
        }
    }
}

/// A fully wired pipeline: one source, an ordered transform chain, one sink.
///
/// The stage list is fixed at construction and consumed by [`run`](Self::run).
pub struct Pipeline<K: Sink> {
    stream: RecordStream<K::Item>,
    sink: K,
    source_name: &'static str,
    transform_names: Vec<&'static str>,
}

impl<K: Sink> Pipeline<K> {
    /// Drive the pipeline to completion.
    ///
    /// With `debug` set, stage transitions are logged (source start, each
    /// transform wiring, sink start, completion); this is purely
    /// observational and never affects ordering or results. The first stage
    /// error aborts the run and is returned as-is.
    pub async fn run(self, debug: bool) -> Result<(), DataflowError> {
        if debug {
            tracing::info!(source = self.source_name, "pipeline starting");
            for name in &self.transform_names {
                tracing::info!(transform = name, "wired transform");
            }
            tracing::info!(sink = self.sink.name(), "writing to sink");
        }

        self.sink.write(self.stream).await?;

        if debug {
            tracing::info!("pipeline finished");
        }
        Ok(())
    }
}
