use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading the corpus failed part way; `committed` lines stay indexed.
    #[error("ingestion aborted after {committed} documents: {source}")]
    Ingest {
        committed: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("WRONGTYPE key {0} holds a different kind of value")]
    WrongType(String),

    #[error("corrupt value under key {0}")]
    Corrupt(String),

    #[error("invalid key pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("empty query: at least one search term is required")]
    EmptyQuery,

    #[error("search term at position {0} is blank")]
    BlankTerm(usize),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Storage failures may be retried by callers around idempotent reads.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// True for errors caused by the caller's query rather than the store.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Error::EmptyQuery | Error::BlankTerm(_))
    }
}
