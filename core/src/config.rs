use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::keys::{Keyspace, DEFAULT_PREFIX};
use crate::tokenizer::Expansion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of the sled database.
    pub db_path: String,
    pub key_prefix: String,
    pub inclusive_end: bool,
    pub max_term_chars: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./acd-db".into(),
            key_prefix: DEFAULT_PREFIX.into(),
            inclusive_end: true,
            max_term_chars: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `ACD_DB_PATH`, `ACD_KEY_PREFIX`,
    /// `ACD_INCLUSIVE_END` and `ACD_MAX_TERM_CHARS`.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_vars(|name| std::env::var(name).ok())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Applies whichever variables `lookup` knows about.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ACD_DB_PATH") {
            self.db_path = v;
        }
        if let Some(v) = lookup("ACD_KEY_PREFIX") {
            self.key_prefix = v;
        }
        if let Some(v) = lookup("ACD_INCLUSIVE_END") {
            self.inclusive_end = parse_bool(&v).ok_or_else(|| Error::Config(format!("ACD_INCLUSIVE_END={v}")))?;
        }
        if let Some(v) = lookup("ACD_MAX_TERM_CHARS") {
            let cap = v.parse::<usize>().map_err(|_| Error::Config(format!("ACD_MAX_TERM_CHARS={v}")))?;
            self.max_term_chars = (cap > 0).then_some(cap);
        }
        Ok(self)
    }

    pub fn keyspace(&self) -> Keyspace {
        Keyspace::new(self.key_prefix.clone())
    }

    /// A `max_term_chars` of 0 means no cap, whichever source set it.
    pub fn expansion(&self) -> Expansion {
        Expansion { inclusive_end: self.inclusive_end, max_term_chars: self.max_term_chars.filter(|&c| c > 0) }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json_str(r#"{ "key_prefix": "names", "max_term_chars": 12 }"#).unwrap();
        assert_eq!(cfg.key_prefix, "names");
        assert_eq!(cfg.max_term_chars, Some(12));
        assert_eq!(cfg.db_path, "./acd-db");
        assert!(cfg.inclusive_end);
    }

    #[test]
    fn vars_override_defaults() {
        let vars: HashMap<&str, &str> =
            [("ACD_KEY_PREFIX", "x"), ("ACD_INCLUSIVE_END", "off"), ("ACD_MAX_TERM_CHARS", "0")].into();
        let cfg = Config::default().merge_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.keyspace().documents(), "x.dcs");
        assert!(!cfg.expansion().inclusive_end);
        assert_eq!(cfg.max_term_chars, None);
    }

    #[test]
    fn zero_cap_from_json_is_no_cap() {
        let cfg = Config::from_json_str(r#"{ "max_term_chars": 0 }"#).unwrap();
        let expansion = cfg.expansion();
        assert_eq!(expansion.max_term_chars, None);

        let store = crate::MemoryStore::new();
        let keys = cfg.keyspace();
        let lines = [Ok::<_, std::io::Error>("Otto Mustermann".to_string())];
        crate::ingest(&store, &keys, &expansion, lines).unwrap();
        assert_eq!(crate::complete(&store, &keys, &["ott"]).unwrap(), vec![Some("Otto Mustermann".to_string())]);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::default()
            .merge_vars(|k| (k == "ACD_MAX_TERM_CHARS").then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(Config::from_json_str("{ nope").is_err());
    }
}
