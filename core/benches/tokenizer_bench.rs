use acd_core::tokenizer::terms;
use acd_core::Expansion;
use criterion::{criterion_group, criterion_main, Criterion};

const NAMES: &str = "Otto Mustermann\nOttilie Bauer\nWolfgang Amadeus Maier-Lüdenscheid\nDr. Zita Lindner\nZilli Diedrich";

fn bench_terms(c: &mut Criterion) {
    let full = Expansion::default();
    let capped = Expansion { inclusive_end: true, max_term_chars: Some(6) };
    c.bench_function("terms_names", |b| b.iter(|| NAMES.lines().map(|l| terms(l, &full).len()).sum::<usize>()));
    c.bench_function("terms_names_capped", |b| {
        b.iter(|| NAMES.lines().map(|l| terms(l, &capped).len()).sum::<usize>())
    });
}

criterion_group!(benches, bench_terms);
criterion_main!(benches);
