//! Micro-benchmark for field-ID validation and physical-column resolution
//! over a schema as wide as a real biobank export.

use std::collections::BTreeSet;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use biotab::fields::{field_columns, validate_field_ids};

fn wide_schema(num_fields: usize, instances: usize) -> Vec<String> {
    let mut columns = vec!["eid".to_string()];
    for field_id in 0..num_fields {
        for instance in 0..instances {
            columns.push(format!("{field_id}-{instance}.0"));
        }
    }
    columns
}

fn bench_field_resolution(c: &mut Criterion) {
    let columns = wide_schema(5_000, 4);
    let ids: BTreeSet<String> = (0..5_000).step_by(7).map(|i| i.to_string()).collect();

    c.bench_function("resolve_20k_columns", |b| {
        b.iter(|| field_columns(black_box(&columns), black_box(&ids)))
    });

    let raw: Vec<String> = (0..1_000).map(|i| format!(" {i} ")).collect();
    c.bench_function("validate_1k_ids", |b| {
        b.iter(|| validate_field_ids(black_box(&raw)).unwrap())
    });
}

criterion_group!(benches, bench_field_resolution);
criterion_main!(benches);
