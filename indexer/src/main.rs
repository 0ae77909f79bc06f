use acd_core::{clean, complete, ingest_file, Config, Expansion, IngestOutcome, Keyspace, SledStore, Store};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

const DEMO_QUERIES: &[&[&str]] = &[
    &["Otto"],
    &["otto"],
    &["Wolf"],
    &["wang"],
    &["Ot", "Be"],
    &["Wo", "Ma"],
    &["Wol", "Bau"],
    &["zi", "li"],
    &["zi", "di", "li"],
];

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load a line corpus into the substring autocomplete index and run completions", long_about = None)]
struct Cli {
    /// `clean` to drop the index first and/or a corpus file to load, in either order
    #[arg(value_name = "clean|FILE")]
    args: Vec<String>,
    /// sled database directory
    #[arg(long)]
    db: Option<String>,
    /// Key prefix of the index
    #[arg(long)]
    prefix: Option<String>,
    /// JSON config file; ACD_* environment variables apply on top
    #[arg(long)]
    config: Option<PathBuf>,
    /// Whitespace separated terms to complete; replaces the demo queries
    #[arg(short, long = "query")]
    queries: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Invocation {
    clean: bool,
    file: Option<String>,
}

/// Reads the first two positional arguments: either may be `clean`
/// (case-insensitive), anything else is the corpus file, the later one winning.
fn parse_invocation(args: &[String]) -> Invocation {
    let mut inv = Invocation::default();
    for arg in args.iter().take(2) {
        if arg.eq_ignore_ascii_case("clean") {
            inv.clean = true;
        } else {
            inv.file = Some(arg.clone());
        }
    }
    inv
}

fn load_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => Config::from_json_file(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };
    let mut cfg = base.merge_vars(|name| std::env::var(name).ok())?;
    if let Some(db) = &cli.db {
        cfg.db_path = db.clone();
    }
    if let Some(prefix) = &cli.prefix {
        cfg.key_prefix = prefix.clone();
    }
    Ok(cfg)
}

fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    tracing::info!(op = label, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "time elapsed");
    out
}

/// What a run left behind that should fail the process once the store is flushed.
#[derive(Debug, Default)]
struct RunReport {
    ingest_error: Option<acd_core::Error>,
    failed_queries: usize,
}

/// Cleans, ingests and runs every query in turn. A failed ingest or query is
/// logged and recorded; the remaining queries still run.
fn run<S, W>(
    store: &S,
    keys: &Keyspace,
    expansion: &Expansion,
    inv: &Invocation,
    queries: &[Vec<String>],
    out: &mut W,
) -> Result<RunReport>
where
    S: Store + ?Sized,
    W: Write,
{
    let mut report = RunReport::default();
    if inv.clean {
        let cleaned = timed("clean", || clean(store, keys))?;
        tracing::info!(terms = cleaned.terms_removed, "removed index");
    }

    if let Some(file) = &inv.file {
        match timed("ingest", || ingest_file(store, keys, expansion, file)) {
            Ok(ingested) if ingested.outcome == IngestOutcome::AlreadyLoaded => {
                tracing::info!(key = %keys.documents(), "corpus already loaded");
            }
            Ok(ingested) => tracing::info!(documents = ingested.documents, postings = ingested.postings, "corpus loaded"),
            Err(e) => {
                tracing::error!(error = %e, file = %file, "ingestion failed");
                report.ingest_error = Some(e);
            }
        }
    }

    for terms in queries {
        if let Err(e) = show(store, keys, terms, out) {
            tracing::error!(error = %format!("{e:#}"), "query failed");
            report.failed_queries += 1;
        }
    }
    Ok(report)
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    if cli.args.len() > 2 {
        tracing::warn!(ignored = ?&cli.args[2..], "only the first two arguments are used");
    }
    let inv = parse_invocation(&cli.args);
    let cfg = load_config(&cli)?;
    let keys = cfg.keyspace();
    let expansion = cfg.expansion();

    let store = SledStore::open(&cfg.db_path).with_context(|| format!("opening database at {}", cfg.db_path))?;

    let queries: Vec<Vec<String>> = if cli.queries.is_empty() {
        DEMO_QUERIES.iter().map(|q| q.iter().map(|t| t.to_string()).collect()).collect()
    } else {
        cli.queries.iter().map(|q| q.split_whitespace().map(str::to_owned).collect()).collect()
    };
    let outcome = run(&store, &keys, &expansion, &inv, &queries, &mut std::io::stdout().lock());
    store.flush()?;

    let report = outcome?;
    if let Some(e) = report.ingest_error {
        return Err(e.into());
    }
    if report.failed_queries > 0 {
        anyhow::bail!("{} of {} queries failed", report.failed_queries, queries.len());
    }
    Ok(())
}

fn show<S, W>(store: &S, keys: &Keyspace, terms: &[String], out: &mut W) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    let label = terms.iter().map(|t| format!("'{t}'")).collect::<Vec<_>>().join(", ");
    writeln!(out, "search for {label}")?;
    let found = timed("complete", || complete(store, keys, terms))
        .with_context(|| format!("completing {label}"))?;
    for text in found.into_iter().flatten() {
        writeln!(out, "  {text}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acd_core::{ingest, MemoryStore};

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_in_either_position() {
        assert_eq!(parse_invocation(&args(&["clean", "names.txt"])), Invocation { clean: true, file: Some("names.txt".into()) });
        assert_eq!(parse_invocation(&args(&["names.txt", "CLEAN"])), Invocation { clean: true, file: Some("names.txt".into()) });
    }

    #[test]
    fn no_arguments_means_queries_only() {
        assert_eq!(parse_invocation(&[]), Invocation::default());
    }

    #[test]
    fn later_file_wins_and_extras_are_ignored() {
        assert_eq!(parse_invocation(&args(&["a.txt", "b.txt", "clean"])), Invocation { clean: false, file: Some("b.txt".into()) });
    }

    #[test]
    fn demo_sequence_ends_with_three_terms() {
        assert_eq!(DEMO_QUERIES.len(), 9);
        assert_eq!(DEMO_QUERIES[8], &["zi", "di", "li"]);
    }

    fn queries(v: &[&[&str]]) -> Vec<Vec<String>> {
        v.iter().map(|q| args(q)).collect()
    }

    fn preloaded(lines: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let lines = lines.iter().map(|l| Ok::<_, std::io::Error>(l.to_string()));
        ingest(&store, &Keyspace::default(), &Expansion::default(), lines).unwrap();
        store
    }

    fn corpus(dir: &tempfile::TempDir, name: &str, body: &[u8]) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn run_on(store: &MemoryStore, inv: &Invocation, qs: &[&[&str]]) -> (RunReport, String) {
        let mut out = Vec::new();
        let report = run(store, &Keyspace::default(), &Expansion::default(), inv, &queries(qs), &mut out).unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn clean_runs_before_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let file = corpus(&dir, "names.txt", b"Otto Mustermann\nWolfgang Maier\n");
        let store = preloaded(&["Olga Oldenburg"]);

        let inv = Invocation { clean: true, file: Some(file) };
        let (report, out) = run_on(&store, &inv, &[&["ol"], &["ott"]]);
        assert!(report.ingest_error.is_none());
        assert_eq!(report.failed_queries, 0);
        assert_eq!(out, "search for 'ol'\n  Wolfgang Maier\nsearch for 'ott'\n  Otto Mustermann\n");
    }

    #[test]
    fn loaded_store_skips_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let file = corpus(&dir, "names.txt", b"Otto Mustermann\n");
        let store = preloaded(&["Olga Oldenburg"]);

        let inv = Invocation { clean: false, file: Some(file) };
        let (report, out) = run_on(&store, &inv, &[&["o"]]);
        assert!(report.ingest_error.is_none());
        assert_eq!(out, "search for 'o'\n  Olga Oldenburg\n");
    }

    #[test]
    fn queries_still_run_after_a_broken_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let file = corpus(&dir, "broken.txt", b"Otto\n\xff\xfe\nWolf\n");
        let store = MemoryStore::new();

        let inv = Invocation { clean: false, file: Some(file) };
        let (report, out) = run_on(&store, &inv, &[&["ot"], &["wolf"]]);
        assert!(matches!(report.ingest_error, Some(acd_core::Error::Ingest { committed: 1, .. })));
        assert_eq!(out, "search for 'ot'\n  Otto\nsearch for 'wolf'\n");
    }

    #[test]
    fn missing_corpus_is_reported_alongside_results() {
        let dir = tempfile::tempdir().unwrap();
        let store = preloaded(&["Otto"]);
        let missing = dir.path().join("missing.txt").to_string_lossy().into_owned();

        let inv = Invocation { clean: false, file: Some(missing) };
        let (report, out) = run_on(&store, &inv, &[&["ot"]]);
        assert!(report.ingest_error.is_some());
        assert_eq!(out, "search for 'ot'\n  Otto\n");
    }

    #[test]
    fn failed_query_does_not_stop_the_rest() {
        let store = preloaded(&["Otto"]);
        let (report, out) = run_on(&store, &Invocation::default(), &[&[], &["tt"]]);
        assert_eq!(report.failed_queries, 1);
        assert_eq!(out, "search for \nsearch for 'tt'\n  Otto\n");
    }
}
