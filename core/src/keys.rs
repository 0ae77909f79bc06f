use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::escape_glob;

pub const DEFAULT_PREFIX: &str = "acd";

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Names of every key the index uses, all under one prefix:
///
/// - `<prefix>.nextid`: document id counter
/// - `<prefix>.dcs`: hash of document id to raw line
/// - `<prefix>.trm.<term>`: sorted set of document ids per term
/// - `<prefix>.tmp.<pid>.<seq>`: per-query intersection results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Keyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_id(&self) -> String {
        format!("{}.nextid", self.prefix)
    }

    pub fn documents(&self) -> String {
        format!("{}.dcs", self.prefix)
    }

    pub fn term(&self, term: &str) -> String {
        format!("{}.trm.{}", self.prefix, term)
    }

    pub fn term_pattern(&self) -> String {
        format!("{}.trm.*", escape_glob(&self.prefix))
    }

    /// A key no other call in this process will receive.
    pub fn scratch(&self) -> String {
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        format!("{}.tmp.{}.{}", self.prefix, std::process::id(), seq)
    }

    pub fn scratch_pattern(&self) -> String {
        format!("{}.tmp.*", escape_glob(&self.prefix))
    }
}
