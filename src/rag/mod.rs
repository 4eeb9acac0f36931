//! Retrieval-augmented generation.
//!
//! - `DocumentStore` / `SqliteDocumentStore`: chunk index keyed by file id
//! - `loader` and `splitter`: document text extraction and chunking
//! - `RagPipeline`: rewrite, retrieve, answer

pub mod loader;
pub mod pipeline;
pub mod splitter;
mod sqlite;
pub mod store;

pub use pipeline::{PipelineSettings, RagAnswer, RagPipeline};
pub use splitter::TextSplitter;
pub use sqlite::SqliteDocumentStore;
pub use store::{DocumentStore, RetrievedChunk, StoredChunk};
