use sled::{Batch, Db, Tree};
use std::path::Path;

use super::{resolve_range, weight_from_ordered, weight_to_ordered, KeyPattern, Store};
use crate::error::{Error, Result};

const KINDS_TREE: &str = "kinds";
const COUNTERS_TREE: &str = "counters";
const HASHES_TREE: &str = "hashes";
const ZORDER_TREE: &str = "zorder";
const ZWEIGHTS_TREE: &str = "zweights";

const KIND_COUNTER: u8 = b'c';
const KIND_HASH: u8 = b'h';
const KIND_SORTED: u8 = b'z';

/// sled-backed store.
///
/// Every logical key is registered in `kinds`. Hash fields and sorted-set
/// members live in shared trees under `len(key) || key` prefixes; the
/// `zorder` tree appends the order-preserving weight and the member so that
/// a prefix scan yields members in `(weight, member)` order.
pub struct SledStore {
    db: Db,
    kinds: Tree,
    counters: Tree,
    hashes: Tree,
    zorder: Tree,
    zweights: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Self::with_db(db)
    }

    /// Store that is removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db)
    }

    fn with_db(db: Db) -> Result<Self> {
        Ok(Self {
            kinds: db.open_tree(KINDS_TREE)?,
            counters: db.open_tree(COUNTERS_TREE)?,
            hashes: db.open_tree(HASHES_TREE)?,
            zorder: db.open_tree(ZORDER_TREE)?,
            zweights: db.open_tree(ZWEIGHTS_TREE)?,
            db,
        })
    }

    /// Flushes dirty pages, returning the number of bytes written.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }

    fn kind(&self, key: &str) -> Result<Option<u8>> {
        Ok(self.kinds.get(key.as_bytes())?.and_then(|v| v.first().copied()))
    }

    /// Registers `key` as `kind`, failing if it already holds another kind.
    fn claim(&self, key: &str, kind: u8) -> Result<()> {
        match self.kind(key)? {
            Some(k) if k == kind => Ok(()),
            Some(_) => Err(Error::WrongType(key.to_string())),
            None => {
                self.kinds.insert(key.as_bytes(), vec![kind])?;
                Ok(())
            }
        }
    }

    /// `Ok(false)` when the key is absent.
    fn expect_kind(&self, key: &str, kind: u8) -> Result<bool> {
        match self.kind(key)? {
            None => Ok(false),
            Some(k) if k == kind => Ok(true),
            Some(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    fn remove_prefix(tree: &Tree, prefix: &[u8]) -> Result<()> {
        let mut batch = Batch::default();
        for k in tree.scan_prefix(prefix).keys() {
            batch.remove(k?);
        }
        tree.apply_batch(batch)?;
        Ok(())
    }
}

fn key_prefix(key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + key.len());
    out.extend_from_slice(&(key.len() as u32).to_be_bytes());
    out.extend_from_slice(key.as_bytes());
    out
}

fn compose(key: &str, tail: &[u8]) -> Vec<u8> {
    let mut out = key_prefix(key);
    out.extend_from_slice(tail);
    out
}

fn order_key(key: &str, weight: f64, member: &str) -> Vec<u8> {
    let mut out = key_prefix(key);
    out.extend_from_slice(&weight_to_ordered(weight).to_be_bytes());
    out.extend_from_slice(member.as_bytes());
    out
}

fn decode_i64(bytes: &[u8]) -> Option<i64> {
    <[u8; 8]>::try_from(bytes).ok().map(i64::from_be_bytes)
}

fn decode_f64(bytes: &[u8]) -> Option<f64> {
    <[u8; 8]>::try_from(bytes).ok().map(f64::from_be_bytes)
}

fn utf8(key: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::Corrupt(key.to_string()))
}

impl Store for SledStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.kinds.contains_key(key.as_bytes())?)
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.claim(key, KIND_HASH)?;
        self.hashes.insert(compose(key, field.as_bytes()), value.as_bytes())?;
        Ok(())
    }

    fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        if !self.expect_kind(key, KIND_HASH)? {
            return Ok(vec![None; fields.len()]);
        }
        fields
            .iter()
            .map(|field| match self.hashes.get(compose(key, field.as_bytes()))? {
                Some(v) => utf8(key, &v).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    fn incr(&self, key: &str) -> Result<i64> {
        self.claim(key, KIND_COUNTER)?;
        let updated = self.counters.update_and_fetch(key.as_bytes(), |old| {
            let current = old.and_then(decode_i64).unwrap_or(0);
            Some((current + 1).to_be_bytes().to_vec())
        })?;
        updated
            .as_deref()
            .and_then(decode_i64)
            .ok_or_else(|| Error::Corrupt(key.to_string()))
    }

    fn zadd(&self, key: &str, member: &str, weight: f64) -> Result<bool> {
        self.claim(key, KIND_SORTED)?;
        let weight_key = compose(key, member.as_bytes());
        let previous = self.zweights.insert(weight_key, weight.to_be_bytes().to_vec())?;
        match previous {
            Some(old) => {
                let old = decode_f64(&old).ok_or_else(|| Error::Corrupt(key.to_string()))?;
                if old.to_bits() != weight.to_bits() {
                    self.zorder.remove(order_key(key, old, member))?;
                    self.zorder.insert(order_key(key, weight, member), Vec::<u8>::new())?;
                }
                Ok(false)
            }
            None => {
                self.zorder.insert(order_key(key, weight, member), Vec::<u8>::new())?;
                Ok(true)
            }
        }
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        if !self.expect_kind(key, KIND_SORTED)? {
            return Ok(None);
        }
        match self.zweights.get(compose(key, member.as_bytes()))? {
            Some(v) => decode_f64(&v).map(Some).ok_or_else(|| Error::Corrupt(key.to_string())),
            None => Ok(None),
        }
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        if !self.expect_kind(key, KIND_SORTED)? {
            return Ok(0);
        }
        let mut n = 0;
        for k in self.zweights.scan_prefix(key_prefix(key)).keys() {
            k?;
            n += 1;
        }
        Ok(n)
    }

    fn zrange_with_weights(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>> {
        if !self.expect_kind(key, KIND_SORTED)? {
            return Ok(Vec::new());
        }
        let prefix = key_prefix(key);
        let mut members = Vec::new();
        for k in self.zorder.scan_prefix(&prefix).keys() {
            let k = k?;
            let rest = &k[prefix.len()..];
            if rest.len() < 8 {
                return Err(Error::Corrupt(key.to_string()));
            }
            let (weight, member) = rest.split_at(8);
            let weight = u64::from_be_bytes(weight.try_into().map_err(|_| Error::Corrupt(key.to_string()))?);
            members.push((utf8(key, member)?, weight_from_ordered(weight)));
        }
        match resolve_range(members.len(), start, stop) {
            Some(range) => Ok(members.drain(range).collect()),
            None => Ok(Vec::new()),
        }
    }

    fn del(&self, key: &str) -> Result<bool> {
        let Some(kind) = self.kind(key)? else {
            return Ok(false);
        };
        let prefix = key_prefix(key);
        match kind {
            KIND_COUNTER => {
                self.counters.remove(key.as_bytes())?;
            }
            KIND_HASH => Self::remove_prefix(&self.hashes, &prefix)?,
            KIND_SORTED => {
                Self::remove_prefix(&self.zorder, &prefix)?;
                Self::remove_prefix(&self.zweights, &prefix)?;
            }
            _ => return Err(Error::Corrupt(key.to_string())),
        }
        self.kinds.remove(key.as_bytes())?;
        Ok(true)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        let mut out = Vec::new();
        for k in self.kinds.scan_prefix(pattern.literal_prefix().as_bytes()).keys() {
            let k = k?;
            let key = std::str::from_utf8(&k).map_err(|_| Error::Corrupt(String::from_utf8_lossy(&k).into_owned()))?;
            if pattern.matches(key) {
                out.push(key.to_string());
            }
        }
        Ok(out)
    }
}
