//! Terminal pipeline stages that persist the chunk stream.
//!
//! Both sinks share one serialized record shape ([`record::IndexRecord`]);
//! only the transport differs. [`JsonLineSink`] writes newline-delimited JSON
//! locally, [`DiscoveryEngineSink`] stages the same lines into a temp file,
//! uploads it to a bucket, and triggers a remote import.

pub mod discovery;
pub mod jsonl;
pub mod record;

pub use discovery::{DEFAULT_DISCOVERY_HOST, DiscoveryEngineSink};
pub use jsonl::JsonLineSink;
pub use record::IndexRecord;
