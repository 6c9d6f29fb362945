//! Benchmarks for scripture parsing, quote alignment and TSV pivoting.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use rcpreview::{AlignOptions, Occurrence, QuoteMemo, QuoteSpec, align_quote, parse_usfm, pivot_tsv};
use rcpreview::tsv::{Annotator, bucket_rows, parse_tsv};

const UHB: &str = include_str!("../tests/fixtures/gen_1_uhb.usfm");
const ULT: &str = include_str!("../tests/fixtures/gen_1_ult.usfm");
const TN: &str = include_str!("../tests/fixtures/en_tn_GEN.tsv");

// ============================================================================
// Parsing
// ============================================================================

fn bench_parse_usfm(c: &mut Criterion) {
    c.bench_function("parse_usfm_aligned", |b| {
        b.iter(|| parse_usfm(black_box(ULT)));
    });
}

// ============================================================================
// Alignment
// ============================================================================

fn bench_align_quote(c: &mut Criterion) {
    let origin = parse_usfm(UHB);
    let target = parse_usfm(ULT);
    let options = AlignOptions::default();
    let single = QuoteSpec::new("בָּרָא אֱלֹהִים", "1:1", Occurrence::Nth(1));
    let split = QuoteSpec::new("בְּ⁠רֵאשִׁית & הָ⁠אָרֶץ", "1:1", Occurrence::Nth(1));

    c.bench_function("align_contiguous", |b| {
        b.iter(|| align_quote(black_box(&single), &origin, &target, &options));
    });
    c.bench_function("align_discontinuous", |b| {
        b.iter(|| align_quote(black_box(&split), &origin, &target, &options));
    });
}

// ============================================================================
// TSV
// ============================================================================

fn bench_pivot_tsv(c: &mut Criterion) {
    let origin = parse_usfm(UHB);
    let targets = vec![parse_usfm(ULT)];
    let options = AlignOptions::default();

    c.bench_function("pivot_tsv", |b| {
        b.iter(|| pivot_tsv(black_box(TN), Some(&origin), &targets, &options).unwrap());
    });

    let memo = QuoteMemo::new();
    c.bench_function("pivot_tsv_warm_memo", |b| {
        b.iter(|| {
            let mut pivot = bucket_rows(parse_tsv(black_box(TN)).unwrap());
            Annotator::new(Some(&origin), &targets).with_memo(&memo).annotate(&mut pivot);
            pivot
        });
    });
}

criterion_group!(benches, bench_parse_usfm, bench_align_quote, bench_pivot_tsv);
criterion_main!(benches);
