use serde::Serialize;

use crate::error::Result;
use crate::keys::Keyspace;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub documents_removed: bool,
    pub counter_removed: bool,
    pub terms_removed: usize,
    pub scratch_removed: usize,
}

/// Whether a corpus has been loaded under `keys`.
pub fn is_loaded<S: Store + ?Sized>(store: &S, keys: &Keyspace) -> Result<bool> {
    store.exists(&keys.documents())
}

/// Removes every key of the index. Running it on an empty store is a no-op.
pub fn clean<S: Store + ?Sized>(store: &S, keys: &Keyspace) -> Result<CleanReport> {
    tracing::debug!(prefix = keys.prefix(), "cleaning index");
    let report = CleanReport {
        documents_removed: store.del(&keys.documents())?,
        counter_removed: store.del(&keys.next_id())?,
        terms_removed: store.del_matching(&keys.term_pattern())?,
        scratch_removed: store.del_matching(&keys.scratch_pattern())?,
    };
    tracing::info!(terms = report.terms_removed, scratch = report.scratch_removed, "index cleaned");
    Ok(report)
}
