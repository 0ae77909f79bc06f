use acd_core::tokenizer::{expand_token, normalize, query_tokens, terms, tokenize};
use acd_core::Expansion;

#[test]
fn it_splits_on_dots_dashes_and_whitespace() {
    let toks = tokenize("St.-Peter-Ording\tam  Meer");
    assert_eq!(toks, vec!["st", "peter", "ording", "am", "meer"]);
}

#[test]
fn it_folds_german_casing() {
    assert_eq!(normalize("ÄRGER überall"), "ärger überall");
    assert_eq!(normalize("GROẞE Straße"), "große straße");
    // decomposed umlaut composes to the same term
    assert_eq!(query_tokens("Mu\u{0308}ller"), vec!["müller"]);
    assert_eq!(query_tokens(" WOLF "), vec!["wolf"]);
    assert_eq!(query_tokens("Hans-Peter"), vec!["hans", "peter"]);
    assert!(query_tokens(" - ").is_empty());
}

#[test]
fn it_expands_every_substring_including_the_token() {
    let subs = expand_token("otto", &Expansion::default());
    assert_eq!(subs, vec!["o", "ot", "ott", "otto", "t", "tt", "tto", "t", "to", "o"]);

    let set = terms("Otto", &Expansion::default());
    let expected: Vec<&str> = vec!["o", "ot", "ott", "otto", "t", "to", "tt", "tto"];
    assert_eq!(set.iter().map(String::as_str).collect::<Vec<_>>(), expected);
}

#[test]
fn exclusive_end_drops_token_suffixes() {
    let exclusive = Expansion { inclusive_end: false, max_term_chars: None };
    let set = terms("otto", &exclusive);
    assert!(set.contains("ott"));
    assert!(set.contains("tt"));
    assert!(!set.contains("otto"));
    assert!(!set.contains("tto"));
    assert!(terms("a", &exclusive).is_empty());
}

#[test]
fn term_length_cap_skips_long_substrings() {
    let capped = Expansion { inclusive_end: true, max_term_chars: Some(2) };
    let set = terms("mustermann", &capped);
    assert!(set.iter().all(|t| t.chars().count() <= 2));
    assert!(set.contains("mu"));
    assert!(set.contains("nn"));
    assert!(!set.contains("mus"));
}

#[test]
fn terms_come_from_every_token() {
    let set = terms("Otto Mustermann", &Expansion::default());
    assert!(set.contains("ott"));
    assert!(set.contains("muster"));
    assert!(!set.contains("o m"));
    assert!(terms("  ", &Expansion::default()).is_empty());
}
