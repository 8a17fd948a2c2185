//! Frame throughput for growing whisker arrays.
//!
//! Run with: `cargo bench -p vibrissa`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use vibrissa::{ObjectKind, Parameters, Simulation};

const NAMES: [&str; 8] = ["LA0", "RA0", "LB1", "RB1", "LC1", "RC1", "LD2", "RD2"];
const INDICES: [usize; 8] = [0, 0, 7, 7, 13, 13, 20, 20];

fn params(n_whiskers: usize) -> Parameters {
    Parameters {
        object: ObjectKind::Wall.code(),
        whisker_names: NAMES[..n_whiskers].iter().map(|s| s.to_string()).collect(),
        whisker_index: INDICES[..n_whiskers].to_vec(),
        active: false,
        time_stop: 1e6,
        save: false,
        ..Parameters::default()
    }
}

fn bench_step_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_frame");
    group.sample_size(10);

    for &n in &[1, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut sim = match Simulation::from_parameters(&params(n)) {
                Ok(sim) => sim,
                Err(e) => panic!("bench setup failed: {e}"),
            };
            b.iter(|| sim.step_frame());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_step_frame);
criterion_main!(benches);
