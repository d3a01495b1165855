use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lifecycle_di::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let container = Container::new();
    container
        .register_type::<u64>(StoragePolicy::GlobalSingleton)
        .with_factory(|_| 42u64)
        .register();

    // Prime the singleton
    let _ = container.resolve::<u64>().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = container.resolve::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                container
                    .register_type::<ExpensiveToCreate>(StoragePolicy::GlobalSingleton)
                    .with_factory(|_| ExpensiveToCreate {
                        data: (0..1000).collect(),
                    })
                    .register();
                container
            },
            |container| {
                let v = container.resolve::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_policies(c: &mut Criterion) {
    #[derive(Default)]
    struct Service {
        data: [u8; 64],
    }

    struct Page;

    let mut group = c.benchmark_group("policies");

    let isolated = Container::new();
    isolated
        .register_type::<Service>(StoragePolicy::IsolatedInstance)
        .with_default()
        .register();

    group.bench_function("isolated", |b| {
        b.iter(|| {
            let v = isolated.resolve::<Service>().unwrap();
            black_box(&v.data);
        })
    });

    let shared = Container::new();
    shared
        .register_type::<Service>(StoragePolicy::SharedDependencyBetweenInstances)
        .with_default()
        .register();
    let page = Arc::new(Page);
    let _ = shared.resolve_shared::<Service, _>(&page).unwrap();

    group.bench_function("shared_hit", |b| {
        b.iter(|| {
            let v = shared.resolve_shared::<Service, _>(&page).unwrap();
            black_box(&v.data);
        })
    });

    group.bench_function("shared_bind_and_retire", |b| {
        b.iter(|| {
            let fresh = Arc::new(Page);
            let v = shared.resolve_shared::<Service, _>(&fresh).unwrap();
            shared.container_class_is_dying(&fresh);
            black_box(&v.data);
        })
    });

    group.finish();
}

fn bench_trait_view(c: &mut Criterion) {
    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Default)]
    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    let container = Container::new();
    container
        .register_type::<English>(StoragePolicy::GlobalSingleton)
        .with_default()
        .as_type::<dyn Greeter, _>(|e| e as Arc<dyn Greeter>)
        .add_concrete_as_default()
        .register();

    let mut group = c.benchmark_group("concrete_vs_trait");
    group.bench_function("concrete", |b| {
        b.iter(|| black_box(container.resolve::<English>().unwrap()))
    });
    group.bench_function("trait", |b| {
        b.iter(|| black_box(container.resolve::<dyn Greeter>().unwrap().greet()))
    });
    group.finish();
}

fn bench_constructor_chain(c: &mut Criterion) {
    #[derive(Default)]
    struct Config;
    struct Pool {
        _config: Arc<Config>,
    }
    struct Repository {
        _pool: Arc<Pool>,
        _config: Arc<Config>,
    }

    let container = Container::new();
    container
        .register_type::<Config>(StoragePolicy::GlobalSingleton)
        .with_default()
        .register();
    container
        .register_type::<Pool>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::unary(|config: Arc<Config>| Pool { _config: config }))
        .register();
    container
        .register_type::<Repository>(StoragePolicy::IsolatedInstance)
        .with_constructor(Constructor::binary(|pool: Arc<Pool>, config: Arc<Config>| Repository {
            _pool: pool,
            _config: config,
        }))
        .register();

    c.bench_function("constructor_chain_depth_3", |b| {
        b.iter(|| black_box(container.resolve::<Repository>().unwrap()))
    });
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    let container = Container::new();
    container
        .register_type::<u64>(StoragePolicy::GlobalSingleton)
        .with_factory(|_| 42u64)
        .register();

    // Prime the singleton
    let _ = container.resolve::<u64>().unwrap();

    for &thread_count in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("singleton_threads", thread_count),
            &thread_count,
            |b, &threads| {
                b.iter_custom(|iters| {
                    let start = std::time::Instant::now();
                    crossbeam_utils::thread::scope(|s| {
                        for _ in 0..threads {
                            let container_ref = &container;
                            s.spawn(move |_| {
                                for _ in 0..iters / threads as u64 {
                                    let v = container_ref.resolve::<u64>().unwrap();
                                    black_box(v);
                                }
                            });
                        }
                    })
                    .unwrap();
                    start.elapsed()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_policies,
    bench_trait_view,
    bench_constructor_chain,
    bench_contention
);
criterion_main!(benches);
