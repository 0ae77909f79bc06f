use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::keys::Keyspace;
use crate::store::Store;
use crate::tokenizer::{terms, Expansion};

pub type DocId = u64;

/// Postings are ordered by weight first; every posting currently carries this one.
pub const POSTING_WEIGHT: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestOutcome {
    Loaded,
    /// The document map already existed; nothing was written.
    AlreadyLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    pub documents: u64,
    /// Number of `(term, document)` pairs written.
    pub postings: u64,
    pub last_id: Option<DocId>,
}

impl IngestReport {
    fn already_loaded() -> Self {
        Self { outcome: IngestOutcome::AlreadyLoaded, documents: 0, postings: 0, last_id: None }
    }
}

/// Indexes `lines` unless a corpus is already present.
///
/// Each line gets the next id from the counter, is stored verbatim in the
/// document map and is added to the postings of every term it expands to.
/// A read error stops ingestion; lines before it stay indexed and the error
/// reports how many were committed.
pub fn ingest<S, I>(store: &S, keys: &Keyspace, expansion: &Expansion, lines: I) -> Result<IngestReport>
where
    S: Store + ?Sized,
    I: IntoIterator<Item = io::Result<String>>,
{
    let docs_key = keys.documents();
    if store.exists(&docs_key)? {
        tracing::info!(key = %docs_key, "corpus already loaded, skipping ingestion");
        return Ok(IngestReport::already_loaded());
    }
    ingest_unguarded(store, keys, expansion, lines)
}

/// Ingests a newline-delimited UTF-8 file; see [`ingest`].
pub fn ingest_file<S, P>(store: &S, keys: &Keyspace, expansion: &Expansion, path: P) -> Result<IngestReport>
where
    S: Store + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let docs_key = keys.documents();
    if store.exists(&docs_key)? {
        tracing::info!(key = %docs_key, "corpus already loaded, skipping ingestion");
        return Ok(IngestReport::already_loaded());
    }
    tracing::info!(path = %path.display(), "loading corpus");
    let reader = BufReader::new(File::open(path)?);
    ingest_unguarded(store, keys, expansion, reader.lines())
}

fn ingest_unguarded<S, I>(store: &S, keys: &Keyspace, expansion: &Expansion, lines: I) -> Result<IngestReport>
where
    S: Store + ?Sized,
    I: IntoIterator<Item = io::Result<String>>,
{
    let docs_key = keys.documents();
    let counter_key = keys.next_id();
    let mut report = IngestReport { outcome: IngestOutcome::Loaded, documents: 0, postings: 0, last_id: None };

    for line in lines {
        let line = line.map_err(|source| Error::Ingest { committed: report.documents, source })?;
        let id = next_id(store, &counter_key)?;
        let member = id.to_string();
        store.hset(&docs_key, &member, &line)?;
        tracing::debug!(id, line = %line, "indexing document");

        for term in terms(&line, expansion) {
            store.zadd(&keys.term(&term), &member, POSTING_WEIGHT)?;
            report.postings += 1;
        }
        report.documents += 1;
        report.last_id = Some(id);
    }

    tracing::info!(documents = report.documents, postings = report.postings, "ingestion complete");
    Ok(report)
}

fn next_id<S: Store + ?Sized>(store: &S, counter_key: &str) -> Result<DocId> {
    let raw = store.incr(counter_key)?;
    DocId::try_from(raw).map_err(|_| Error::Corrupt(counter_key.to_string()))
}
