//! Initial pipeline stages that enumerate and yield raw documents.

pub mod file;

pub use file::{DEFAULT_EXTENSIONS, FileSource};
