#![allow(dead_code)]

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use ctm_estimator::encoder::{decode, encode, raw_space_size};
use ctm_estimator::enumerator::{EnumerationMode, Enumerator};
use ctm_estimator::filters::{CycleTwo, Escapee, RuntimeFilter};
use ctm_estimator::simulator::run;

const WARM_UP_TIME_MS: u64 = 500;
const MEASUREMENT_TIME_MS: u64 = 2000;

criterion_group!(
    benches,
    benchmark_encode_decode,
    benchmark_enumeration,
    benchmark_simulate_bb3,
    benchmark_simulate_bb4,
);
criterion_main!(benches);

fn benchmark_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Encoder");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(20);

    let n_states = 4;
    let limit = raw_space_size(n_states);

    group.bench_function("decode BB4 full range sample", |b| {
        b.iter(|| {
            let mut i = 0u128;
            while i < limit {
                let _ = decode(i, n_states).unwrap();
                i += 977;
            }
        })
    });

    group.bench_function("encode-decode round trip BB4", |b| {
        b.iter(|| {
            let mut i = 0u128;
            while i < limit {
                let table = decode(i, n_states).unwrap();
                assert_eq!(encode(&table), i);
                i += 977;
            }
        })
    });

    group.finish();
}

fn benchmark_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Enumerator");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(20);

    group.bench_function("chunk BB5 raw enumeration", |b| {
        let enumerator = Enumerator::new(5, EnumerationMode::Raw);
        b.iter(|| enumerator.chunks(10_000, 0))
    });

    group.bench_function("chunk BB5 reduced enumeration", |b| {
        let enumerator = Enumerator::new(5, EnumerationMode::Reduced);
        b.iter(|| enumerator.chunks(10_000, 0))
    });

    group.finish();
}

fn benchmark_simulate_bb3(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Simulate BB3");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));
    group.sample_size(10);

    group.bench_function("simulate BB3 raw enumeration, max_steps=500", |b| {
        b.iter(|| simulate_range(3, 500))
    });

    group.finish();
}

fn benchmark_simulate_bb4(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Simulate BB4");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));
    group.sample_size(10);

    group.bench_function("simulate BB4 reduced enumeration sample, max_steps=2000", |b| {
        b.iter(|| simulate_reduced_sample(4, 2_000))
    });

    group.finish();
}

fn simulate_range(n_states: usize, max_steps: u64) -> (u64, u64) {
    let enumerator = Enumerator::new(n_states, EnumerationMode::Raw);
    let mut processed = 0u64;
    let mut halting = 0u64;
    for chunk in enumerator.chunks(enumerator.size(), 0) {
        for index in chunk {
            let table = decode(index, n_states).unwrap();
            if table.has_no_halt_transition() {
                processed += 1;
                continue;
            }
            let filters: Vec<Box<dyn RuntimeFilter>> = vec![
                Box::new(Escapee::new(n_states as u8, 0)),
                Box::new(CycleTwo::new()),
            ];
            if matches!(
                run(&table, 0, max_steps, filters),
                ctm_estimator::simulator::SimulationOutcome::Halted(_)
            ) {
                halting += 1;
            }
            processed += 1;
        }
    }
    (processed, halting)
}

fn simulate_reduced_sample(n_states: usize, max_steps: u64) -> (u64, u64) {
    let enumerator = Enumerator::new(n_states, EnumerationMode::Reduced);
    let mut processed = 0u64;
    let mut halting = 0u64;
    // Sample every 101st index rather than the full reduced set, to keep the benchmark fast.
    for chunk in enumerator.chunks(enumerator.size(), 0) {
        let mut index = chunk.start;
        while index < chunk.end {
            let table = decode(index, n_states).unwrap();
            if !table.has_no_halt_transition() {
                let filters: Vec<Box<dyn RuntimeFilter>> = vec![
                    Box::new(Escapee::new(n_states as u8, 0)),
                    Box::new(CycleTwo::new()),
                ];
                if matches!(
                    run(&table, 0, max_steps, filters),
                    ctm_estimator::simulator::SimulationOutcome::Halted(_)
                ) {
                    halting += 1;
                }
            }
            processed += 1;
            index += 101;
        }
    }
    (processed, halting)
}
