use criterion::{
    BenchmarkId, Criterion, black_box, criterion_group, criterion_main,
};
use ibox::{
    eval::{BoxFunction, EvalConfig},
    types::IntervalBox,
};

#[path = "../tests/fixtures/mod.rs"]
mod fixtures;
use fixtures::FIXTURES;

pub fn run_bench<F: BoxFunction>(
    c: &mut Criterion,
    f: &F,
    test_name: &'static str,
    name: &'static str,
) {
    let b = IntervalBox::from_bounds(&[[-0.5, 1.25], [-1.0, 0.75]]).unwrap();
    let mut group = c.benchmark_group(test_name);
    group.bench_function(BenchmarkId::new(name, "box"), |bench| {
        bench.iter(|| black_box(f.eval_box(black_box(&b)).unwrap()))
    });
    group.bench_function(BenchmarkId::new(name, "raw"), |bench| {
        bench.iter(|| {
            let (ptr, len) = (black_box(b.as_ptr()), b.len());
            black_box(unsafe { f.eval_raw(ptr, len) }.unwrap())
        })
    });
}

pub fn test_single_calls(c: &mut Criterion) {
    for fixture in &FIXTURES {
        run_bench(c, &fixture.function(), fixture.name, "closure");
        run_bench(c, &fixture.tape(), fixture.name, "tape");
    }
}

pub fn test_batch(c: &mut Criterion) {
    let boxes: Vec<IntervalBox> = (0..1000)
        .map(|i| {
            let lo = i as f64 / 1000.0;
            IntervalBox::from_bounds(&[[lo, lo + 0.01], [-lo, 0.5]]).unwrap()
        })
        .collect();

    let mut group = c.benchmark_group("batch");
    for fixture in &FIXTURES {
        let tape = fixture.tape();
        for (threads, cfg) in [
            (
                "serial",
                EvalConfig {
                    threads: None,
                    ..Default::default()
                },
            ),
            ("parallel", EvalConfig::default()),
        ] {
            group.bench_function(BenchmarkId::new(fixture.name, threads), |b| {
                b.iter(|| black_box(cfg.eval_boxes(&tape, &boxes)))
            });
        }
    }
}

criterion_group!(benches, test_single_calls, test_batch);
criterion_main!(benches);
