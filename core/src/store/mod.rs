//! Key-value primitives the index is written against.
//!
//! The shape follows the Redis commands the layout was designed around:
//! hashes for documents, a counter for ids and sorted sets for postings.
//! Sorted sets order members by `(weight, member bytes)`.

mod disk;
mod memory;
mod pattern;

pub use disk::SledStore;
pub use memory::MemoryStore;
pub use pattern::{escape_glob, KeyPattern};

use crate::error::Result;

pub trait Store: Send + Sync {
    fn exists(&self, key: &str) -> Result<bool>;

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// One entry per requested field, `None` where the field is absent.
    fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>>;

    /// Atomically increments the counter at `key`; a missing counter starts at 0.
    fn incr(&self, key: &str) -> Result<i64>;

    /// Returns `true` if `member` was not in the set before.
    fn zadd(&self, key: &str, member: &str, weight: f64) -> Result<bool>;

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;

    fn zcard(&self, key: &str) -> Result<usize>;

    /// Inclusive rank range; negative ranks count from the end (`-1` is the last member).
    fn zrange_with_weights(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>>;

    fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        Ok(self
            .zrange_with_weights(key, start, stop)?
            .into_iter()
            .map(|(member, _)| member)
            .collect())
    }

    /// Stores the members present in every source set into `dest`, summing weights.
    /// `dest` is replaced; an empty intersection leaves it absent.
    fn zinterstore(&self, dest: &str, sources: &[String]) -> Result<usize> {
        let mut smallest = None;
        for (i, source) in sources.iter().enumerate() {
            let card = self.zcard(source)?;
            if smallest.map_or(true, |(_, min)| card < min) {
                smallest = Some((i, card));
            }
        }

        let mut hits = Vec::new();
        if let Some((pivot, card)) = smallest {
            if card > 0 {
                'members: for (member, weight) in self.zrange_with_weights(&sources[pivot], 0, -1)? {
                    let mut total = weight;
                    for (i, other) in sources.iter().enumerate() {
                        if i == pivot {
                            continue;
                        }
                        match self.zscore(other, &member)? {
                            Some(w) => total += w,
                            None => continue 'members,
                        }
                    }
                    hits.push((member, total));
                }
            }
        }

        self.del(dest)?;
        for (member, weight) in &hits {
            self.zadd(dest, member, *weight)?;
        }
        Ok(hits.len())
    }

    /// Returns `true` if the key existed.
    fn del(&self, key: &str) -> Result<bool>;

    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    fn del_matching(&self, pattern: &str) -> Result<usize> {
        let mut removed = 0;
        for key in self.keys(pattern)? {
            if self.del(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Resolves a Redis rank range against a set of `len` members into a
/// half-open index range, or `None` when it selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, stop: isize) -> Option<std::ops::Range<usize>> {
    let len_i = len as isize;
    let mut start = if start < 0 { start + len_i } else { start };
    let mut stop = if stop < 0 { stop + len_i } else { stop };
    if start < 0 {
        start = 0;
    }
    if start > stop || start >= len_i {
        return None;
    }
    if stop >= len_i {
        stop = len_i - 1;
    }
    Some(start as usize..stop as usize + 1)
}

/// Maps a weight to a `u64` whose unsigned order equals the float order.
pub(crate) fn weight_to_ordered(weight: f64) -> u64 {
    let bits = weight.to_bits();
    if bits & (1 << 63) != 0 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

pub(crate) fn weight_from_ordered(ordered: u64) -> f64 {
    let bits = if ordered & (1 << 63) != 0 { ordered & !(1 << 63) } else { !ordered };
    f64::from_bits(bits)
}
