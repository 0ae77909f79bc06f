use crate::error::{Error, Result};
use crate::index::{DocId, Document};
use crate::keys::Keyspace;
use crate::store::Store;
use crate::tokenizer::query_tokens;

/// Deletes the intersection result when the query is done with it.
struct ScratchKey<'a, S: Store + ?Sized> {
    store: &'a S,
    key: String,
}

impl<S: Store + ?Sized> Drop for ScratchKey<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.del(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to remove scratch key");
        }
    }
}

fn term_keys<T: AsRef<str>>(keys: &Keyspace, terms: &[T]) -> Result<Vec<String>> {
    if terms.is_empty() {
        return Err(Error::EmptyQuery);
    }
    let mut out = Vec::with_capacity(terms.len());
    for (i, t) in terms.iter().enumerate() {
        let tokens = query_tokens(t.as_ref());
        if tokens.is_empty() {
            return Err(Error::BlankTerm(i));
        }
        out.extend(tokens.iter().map(|token| keys.term(token)));
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Ids of the documents matching every term, in postings order.
///
/// Postings order is member order: ids compare as strings, so `"10"` comes
/// before `"2"`.
pub fn matching_ids<S, T>(store: &S, keys: &Keyspace, terms: &[T]) -> Result<Vec<String>>
where
    S: Store + ?Sized,
    T: AsRef<str>,
{
    let mut sources = term_keys(keys, terms)?;
    if sources.len() == 1 {
        let key = sources.remove(0);
        return store.zrange(&key, 0, -1);
    }

    let scratch = ScratchKey { store, key: keys.scratch() };
    let matched = store.zinterstore(&scratch.key, &sources)?;
    tracing::debug!(terms = sources.len(), matched, "intersected postings");
    store.zrange(&scratch.key, 0, -1)
}

/// Looks up document texts by id. `None` when no ids are given; otherwise
/// one entry per id, `None` where the id is unknown.
pub fn load<S>(store: &S, keys: &Keyspace, ids: &[String]) -> Result<Option<Vec<Option<String>>>>
where
    S: Store + ?Sized,
{
    if ids.is_empty() {
        return Ok(None);
    }
    store.hmget(&keys.documents(), ids).map(Some)
}

/// Texts of the documents matching every term.
pub fn complete<S, T>(store: &S, keys: &Keyspace, terms: &[T]) -> Result<Vec<Option<String>>>
where
    S: Store + ?Sized,
    T: AsRef<str>,
{
    let ids = matching_ids(store, keys, terms)?;
    Ok(load(store, keys, &ids)?.unwrap_or_default())
}

pub fn document<S>(store: &S, keys: &Keyspace, id: DocId) -> Result<Option<Document>>
where
    S: Store + ?Sized,
{
    let mut texts = store.hmget(&keys.documents(), &[id.to_string()])?;
    Ok(texts.pop().flatten().map(|text| Document { id, text }))
}
