//! Benchmarks for segmentation throughput

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmseg_core::dictionary::{
    ColumnType, FieldValue, MemoryDictionary, MemoryDictionaryManager, Schema,
    BASE_DICTIONARY_NAME, FREQ_COLUMN,
};
use mmseg_core::{SegmentOptions, Segmentor};
use std::hint::black_box;
use std::sync::Arc;

const TERMS: &[(&str, u32)] = &[
    ("中", 900),
    ("国", 850),
    ("人", 800),
    ("民", 400),
    ("的", 2000),
    ("是", 1500),
    ("中国", 300),
    ("国人", 20),
    ("人民", 250),
    ("中国人", 40),
    ("中国人民", 30),
    ("国际", 120),
    ("组织", 110),
    ("研究", 90),
    ("研究生", 30),
    ("生命", 60),
    ("起源", 15),
    ("银行", 70),
];

fn build_segmentor() -> Segmentor {
    let schema = Schema::new().with_column(FREQ_COLUMN, ColumnType::U32);
    let mut base = MemoryDictionary::new(BASE_DICTIONARY_NAME, schema);
    for &(term, freq) in TERMS {
        base.insert(term, [(FREQ_COLUMN, FieldValue::U32(freq))])
            .unwrap();
    }
    let mut mgr = MemoryDictionaryManager::new();
    mgr.add(base).unwrap();
    Segmentor::new(Arc::new(mgr)).unwrap()
}

/// Generate test text of roughly `size_kb` kilobytes
fn generate_test_text(size_kb: usize) -> String {
    let base_text = "中国人民银行是国际组织的研究生命起源的中国人。";
    let repetitions = (size_kb * 1024) / base_text.len() + 1;
    base_text.repeat(repetitions)
}

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    let segmentor = build_segmentor();

    for size_kb in [1, 64, 1024] {
        let text = generate_test_text(size_kb);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_kb), &text, |b, text| {
            let mut status = segmentor
                .create_status(SegmentOptions::default())
                .unwrap();
            b.iter(|| {
                let mut next = Some(black_box(text.as_str()));
                let mut tagged = 0;
                loop {
                    tagged += segmentor.tokenize(0, next.take(), &mut status).unwrap();
                    if status.is_finished() {
                        break;
                    }
                }
                tagged
            });
        });
    }

    group.finish();
}

fn benchmark_block_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_capacity");
    let segmentor = build_segmentor();
    let text = generate_test_text(64);
    group.throughput(Throughput::Bytes(text.len() as u64));

    for capacity in [64, 512, 4096, 32768] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            let mut status = segmentor
                .create_status(SegmentOptions {
                    block_capacity: capacity,
                    ..Default::default()
                })
                .unwrap();
            b.iter(|| {
                let mut next = Some(black_box(text.as_str()));
                loop {
                    segmentor.tokenize(0, next.take(), &mut status).unwrap();
                    if status.is_finished() {
                        break;
                    }
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_tokenize, benchmark_block_capacity);
criterion_main!(benches);
