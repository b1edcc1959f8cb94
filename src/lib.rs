//! Composable dataflow pipelines for documentation ingestion.
//!
//! `docflow` turns trees of free-form text documents into overlapping,
//! size-bounded chunks suitable for a retrieval index, and ships them to a
//! destination store. The whole crate is one small abstraction applied
//! end to end: a [`Source`](pipeline::Source) streams records through an
//! ordered chain of [`Transform`](pipeline::Transform)s into a
//! [`Sink`](pipeline::Sink), all connected by lazy pull-based streams.
//!
//! ```text
//! FileSource ──► SentenceSplitter ──► ChunkingTransform ──┬─► JsonLineSink
//!   (docs)         (sentence lists)     (overlapping        │    (local JSONL)
//!                                        word-bounded       │
//!                                        chunks)            └─► DiscoveryEngineSink
//!                                                                (stage ► upload ► import)
//! ```
//!
//! Runs are all-or-nothing: the first failing stage aborts the pipeline.
//! Ingestion is an operator-triggered batch job, not a service, and the
//! design favors that simplicity throughout (no retries, no partial
//! recovery).

pub mod config;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod transforms;
pub mod transport;
pub mod types;

pub use config::{Destination, IngestConfig};
pub use pipeline::{Pipeline, PipelineBuilder, RecordStream, Sink, Source, Transform};
pub use sinks::{DiscoveryEngineSink, IndexRecord, JsonLineSink};
pub use sources::FileSource;
pub use transforms::{ChunkingConfig, ChunkingTransform, SentenceSplitter};
pub use transport::{GcloudTransport, Transport};
pub use types::{Chunk, DataRecord, DataflowError, Metadata};
