pub mod config;
pub mod error;
pub mod index;
pub mod keys;
pub mod maintenance;
pub mod query;
pub mod store;
pub mod tokenizer;

pub use config::Config;
pub use error::{Error, Result};
pub use index::{ingest, ingest_file, DocId, Document, IngestOutcome, IngestReport};
pub use keys::Keyspace;
pub use maintenance::{clean, is_loaded, CleanReport};
pub use query::{complete, document, load, matching_ids};
pub use store::{MemoryStore, SledStore, Store};
pub use tokenizer::Expansion;
