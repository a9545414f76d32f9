use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sfcgraph::{
    GraphStore, InMemorySfcClient, InspectionPort, NetworkElement, RedirectionApi,
    RemoteGraphStore, SqliteGraphStore,
};

const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

fn bench_scales() -> &'static [usize] {
    #[cfg(feature = "bench-ci")]
    {
        &[100]
    }
    #[cfg(not(feature = "bench-ci"))]
    {
        &[500, 2_000]
    }
}

fn port(i: usize) -> InspectionPort {
    InspectionPort::new(
        NetworkElement::with_id(format!("in-{i}")),
        NetworkElement::with_id(format!("out-{i}")),
    )
}

fn populate<S: GraphStore>(api: &RedirectionApi<S>, ports: usize) {
    api.store()
        .required(|| {
            for i in 0..ports {
                api.register_inspection_port(Some(&port(i)))?;
            }
            Ok(())
        })
        .expect("populate");
}

fn bench_find_pair_by_endpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_pair_by_endpoints");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for &ports in bench_scales() {
        let probe = port(ports / 2);

        let local = RedirectionApi::new(SqliteGraphStore::open_in_memory().expect("store"));
        populate(&local, ports);
        group.bench_with_input(BenchmarkId::new("sqlite", ports), &probe, |b, probe| {
            b.iter(|| {
                local
                    .lookup()
                    .find_pair_by_endpoints(probe.ingress.as_ref(), probe.egress.as_ref())
                    .expect("lookup")
            })
        });

        let remote = RedirectionApi::new(RemoteGraphStore::new(InMemorySfcClient::new()));
        populate(&remote, ports);
        group.bench_with_input(BenchmarkId::new("remote_scan", ports), &probe, |b, probe| {
            b.iter(|| {
                remote
                    .lookup()
                    .find_pair_by_endpoints(probe.ingress.as_ref(), probe.egress.as_ref())
                    .expect("lookup")
            })
        });
    }
    group.finish();
}

fn bench_register_port(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_inspection_port");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    group.bench_function("sqlite", |b| {
        b.iter_batched(
            || RedirectionApi::new(SqliteGraphStore::open_in_memory().expect("store")),
            |api| api.register_inspection_port(Some(&port(0))).expect("register"),
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("remote", |b| {
        b.iter_batched(
            || RedirectionApi::new(RemoteGraphStore::new(InMemorySfcClient::new())),
            |api| api.register_inspection_port(Some(&port(0))).expect("register"),
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_find_pair_by_endpoints, bench_register_port);
criterion_main!(benches);
