// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the safety and detection scans.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deadlock_engine::{detect_deadlock, is_safe_state};
use resource_ledger::{Ledger, Pid, Process, ResourceType};

/// `processes` processes over 8 resource types. Every process holds one
/// instance of resource `i % 8` and waits for one instance of `(i + 1) % 8`.
/// With `processes` a multiple of 8 nothing is free, so both scans give up
/// after a full pass.
fn saturated(processes: usize) -> Ledger {
    const R: usize = 8;
    let per_resource = processes.div_ceil(R) as u32;
    let resources = (0..R as u32).map(|r| ResourceType::new(r, per_resource)).collect();
    let procs = (0..processes)
        .map(|i| {
            let mut max = vec![0; R];
            let mut alloc = vec![0; R];
            max[i % R] = 1;
            max[(i + 1) % R] += 1;
            alloc[i % R] = 1;
            Process::new(i as Pid, 0, 0, max).with_allocation(alloc).unwrap()
        })
        .collect();
    let mut ledger = Ledger::new(resources, procs).unwrap();
    for i in 0..processes {
        let r = (i + 1) % R;
        ledger.processes_mut()[i].set_request(r, 1).unwrap();
    }
    ledger.rebuild_matrices();
    ledger
}

fn bench_safety(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_safe_state");
    for n in [16, 64, 256] {
        let ledger = saturated(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ledger, |b, ledger| {
            b.iter(|| is_safe_state(black_box(ledger)).unwrap())
        });
    }
    group.finish();
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_deadlock");
    for n in [16, 64, 256] {
        let ledger = saturated(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ledger, |b, ledger| {
            b.iter_batched(
                || ledger.clone(),
                |mut l| detect_deadlock(&mut l).unwrap(),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_safety, bench_detection);
criterion_main!(benches);
