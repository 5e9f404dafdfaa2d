//! Benchmarks for zone reduction and binary grid encoding.
//!
//! Run with: cargo bench --package grid-codec
//! Or: cargo bench --package grid-codec --bench reducer_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use grid_codec::{GridBinaryCodec, GridReducer, ProductColumn, ReductionInput};
use isoxml_common::Quantity;
use test_utils::{create_banded_raster, create_multi_product_raster, mark_border_out_of_field};
use unit_system::UnitConverter;

// =============================================================================
// REDUCTION BENCHMARKS
// =============================================================================

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    let converter = UnitConverter::default();
    let canonical = converter.canonical_for_code("l/ha");
    let products = vec![ProductColumn::new("PDT1", 0)];
    let out = Quantity::new(0.0, "l/ha");

    for size in [64usize, 256, 512] {
        let mut raster = create_banded_raster(size, size, 16, 5.0);
        mark_border_out_of_field(&mut raster, 2);
        let input = ReductionInput {
            raster: &raster,
            products: &products,
            rate_unit: Some("l/ha"),
            canonical,
            loss_of_signal: None,
            out_of_field: Some(&out),
        };

        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("banded_16", size), &input, |b, input| {
            let reducer = GridReducer::new(&converter);
            b.iter(|| reducer.reduce(black_box(input)))
        });
    }

    let products = vec![
        ProductColumn::new("PDT1", 0),
        ProductColumn::new("PDT2", 1),
        ProductColumn::new("PDT3", 2),
    ];
    let raster = create_multi_product_raster(256, 256, &[10.0, 2.0, 0.5], 0.25);
    let input = ReductionInput {
        raster: &raster,
        products: &products,
        rate_unit: Some("l/ha"),
        canonical,
        loss_of_signal: None,
        out_of_field: None,
    };
    group.throughput(Throughput::Elements(256 * 256));
    group.bench_function("three_products_256", |b| {
        let reducer = GridReducer::new(&converter);
        b.iter(|| reducer.reduce(black_box(&input)))
    });

    group.finish();
}

// =============================================================================
// BINARY ENCODING BENCHMARKS
// =============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_encode");
    let converter = UnitConverter::default();
    let products = vec![ProductColumn::new("PDT1", 0)];
    let codec = GridBinaryCodec::default();

    for levels in [8usize, 400] {
        let raster = create_banded_raster(512, 512, levels, 1.0);
        let input = ReductionInput {
            raster: &raster,
            products: &products,
            rate_unit: Some("l/ha"),
            canonical: converter.canonical_for_code("l/ha"),
            loss_of_signal: None,
            out_of_field: None,
        };
        let Ok(reduction) = GridReducer::new(&converter).reduce(&input) else {
            continue;
        };

        group.throughput(Throughput::Elements(reduction.grid.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("encode_512", levels),
            &reduction.grid,
            |b, grid| b.iter(|| codec.encode(black_box(grid))),
        );

        if let Ok(encoded) = codec.encode(&reduction.grid) {
            group.bench_with_input(
                BenchmarkId::new("decode_512", levels),
                &encoded,
                |b, encoded| b.iter(|| codec.decode_encoded(black_box(encoded))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_reduce, bench_encode);
criterion_main!(benches);
