use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use omf_core::dpf::DpfKey;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dpf");
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    group.throughput(Throughput::Elements(1));
    group.bench_function("gen", |bench| {
        bench.iter(|| {
            let keys = DpfKey::generate(black_box(511), 0, 1024, &mut rng);
            black_box(keys);
        });
    });

    let (key, _) = DpfKey::generate(511, 7, 1024, &mut rng);

    group.throughput(Throughput::Elements(1));
    group.bench_function("eval", |bench| {
        bench.iter(|| black_box(key.eval(black_box(700), 1024)));
    });

    for domain in [50u64, 1024] {
        group.throughput(Throughput::Elements(domain));
        group.bench_function(format!("eval_full/{domain}"), |bench| {
            bench.iter(|| black_box(key.eval_full(black_box(domain))));
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
