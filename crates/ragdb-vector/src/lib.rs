pub mod ingest;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use ingest::{ingest_directory, IngestReport};
pub use search::VectorCollection;
pub use writer::ChunkWriter;
