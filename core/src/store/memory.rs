use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use super::{resolve_range, weight_from_ordered, weight_to_ordered, KeyPattern, Store};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct SortedSet {
    weights: HashMap<String, f64>,
    order: BTreeSet<(u64, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, weight: f64) -> bool {
        match self.weights.insert(member.to_string(), weight) {
            Some(old) => {
                if old.to_bits() != weight.to_bits() {
                    self.order.remove(&(weight_to_ordered(old), member.to_string()));
                    self.order.insert((weight_to_ordered(weight), member.to_string()));
                }
                false
            }
            None => {
                self.order.insert((weight_to_ordered(weight), member.to_string()));
                true
            }
        }
    }
}

#[derive(Debug)]
enum Value {
    Counter(i64),
    Hash(HashMap<String, String>),
    Sorted(SortedSet),
}

/// In-process store; each call takes the lock once, so `incr` is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.data.read().contains_key(key))
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut data = self.data.write();
        match data.entry(key.to_string()).or_insert_with(|| Value::Hash(HashMap::new())) {
            Value::Hash(map) => {
                map.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(Error::WrongType(key.to_string())),
        }
    }

    fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        let data = self.data.read();
        match data.get(key) {
            None => Ok(vec![None; fields.len()]),
            Some(Value::Hash(map)) => Ok(fields.iter().map(|f| map.get(f).cloned()).collect()),
            Some(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    fn incr(&self, key: &str) -> Result<i64> {
        let mut data = self.data.write();
        match data.entry(key.to_string()).or_insert(Value::Counter(0)) {
            Value::Counter(n) => {
                *n += 1;
                Ok(*n)
            }
            _ => Err(Error::WrongType(key.to_string())),
        }
    }

    fn zadd(&self, key: &str, member: &str, weight: f64) -> Result<bool> {
        let mut data = self.data.write();
        match data.entry(key.to_string()).or_insert_with(|| Value::Sorted(SortedSet::default())) {
            Value::Sorted(set) => Ok(set.insert(member, weight)),
            _ => Err(Error::WrongType(key.to_string())),
        }
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Value::Sorted(set)) => Ok(set.weights.get(member).copied()),
            Some(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        match self.data.read().get(key) {
            None => Ok(0),
            Some(Value::Sorted(set)) => Ok(set.order.len()),
            Some(_) => Err(Error::WrongType(key.to_string())),
        }
    }

    fn zrange_with_weights(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>> {
        let data = self.data.read();
        let set = match data.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::Sorted(set)) => set,
            Some(_) => return Err(Error::WrongType(key.to_string())),
        };
        let Some(range) = resolve_range(set.order.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(set
            .order
            .iter()
            .skip(range.start)
            .take(range.len())
            .map(|(w, m)| (m.clone(), weight_from_ordered(*w)))
            .collect())
    }

    fn del(&self, key: &str) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        let prefix = pattern.literal_prefix();
        let data = self.data.read();
        Ok(data
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| pattern.matches(k))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
