use regex::Regex;

use crate::error::{Error, Result};

/// Redis style key glob: `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
    literal_prefix: String,
}

impl KeyPattern {
    pub fn new(glob: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Pattern { pattern: glob.to_string(), reason: reason.to_string() };

        let mut re = String::from("(?s)^");
        let mut literal_prefix = String::new();
        let mut in_prefix = true;
        let mut chars = glob.chars();
        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    in_prefix = false;
                    re.push_str(".*");
                }
                '?' => {
                    in_prefix = false;
                    re.push('.');
                }
                '[' => {
                    in_prefix = false;
                    re.push('[');
                    if chars.clone().next() == Some('^') {
                        chars.next();
                        re.push('^');
                    }
                    // A `]` opening the class is a member, not the close.
                    let mut closed = false;
                    let mut first = true;
                    while let Some(c) = chars.next() {
                        match c {
                            ']' if !first => {
                                closed = true;
                                break;
                            }
                            '-' => re.push('-'),
                            '\\' => {
                                let escaped = chars.next().ok_or_else(|| invalid("dangling escape"))?;
                                re.push_str(&escape_char(escaped));
                            }
                            other => re.push_str(&escape_char(other)),
                        }
                        first = false;
                    }
                    if !closed {
                        return Err(invalid("unterminated character class"));
                    }
                    re.push(']');
                }
                '\\' => {
                    let escaped = chars.next().unwrap_or('\\');
                    if in_prefix {
                        literal_prefix.push(escaped);
                    }
                    re.push_str(&escape_char(escaped));
                }
                other => {
                    if in_prefix {
                        literal_prefix.push(other);
                    }
                    re.push_str(&escape_char(other));
                }
            }
        }
        re.push('$');
        let regex = Regex::new(&re).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self { regex, literal_prefix })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Leading part of the glob without wildcards; every match starts with it.
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }
}

/// Escapes glob metacharacters so `s` matches only itself.
pub fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_char(c: char) -> String {
    let mut buf = [0u8; 4];
    regex::escape(c.encode_utf8(&mut buf))
}
