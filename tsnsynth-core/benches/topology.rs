use criterion::{
    BenchmarkGroup, Criterion, black_box, criterion_group, criterion_main, measurement::WallTime,
};
use tsnsynth_core::{
    Context, Topology,
    generator::LinearBranches,
    measure::PerPriority,
    random::Range,
    stream::StreamFactory,
};

fn linear_branches(main_length: usize) -> LinearBranches {
    LinearBranches {
        main_length: Range::fixed(main_length),
        branches_per_main_switch: Range::fixed(2),
        branch_length: Range::fixed(3),
        hosts_per_branch_switch: Range::fixed(4),
        connect_to_ring: Range::fixed(true),
        ..LinearBranches::default()
    }
}

fn factory(num_streams: usize) -> StreamFactory {
    StreamFactory {
        num_streams,
        burst: Range::uniform(512, 8_000),
        rate: Range::log_uniform(10e3, 50e6),
        priority: Range::uniform(4, 7),
        ..StreamFactory::default()
    }
}

fn populated(main_length: usize, num_streams: usize) -> Topology {
    let mut context = Context::new();
    let mut topology = linear_branches(main_length).generate(&mut context).unwrap();
    let batch = factory(num_streams)
        .create_streams(&topology, &mut context)
        .unwrap();
    topology.add_streams(batch.streams).unwrap();
    topology
}

fn generate(c: &mut Criterion) {
    let generator = linear_branches(6);
    c.bench_function("generate", |b| {
        b.iter(|| generator.generate(black_box(&mut Context::new())).unwrap())
    });
}

fn shortest_path(c: &mut Criterion) {
    let topology = populated(6, 0);
    let hosts = topology.hosts();
    let (from, to) = (hosts[0], hosts[hosts.len() - 1]);

    c.bench_function("shortest_path", |b| {
        b.iter(|| topology.shortest_path(black_box(from), black_box(to)).unwrap())
    });
}

fn bench_guarantees_size(group: &mut BenchmarkGroup<'_, WallTime>, num_streams: usize) {
    let mut topology = populated(6, num_streams);
    let delays = PerPriority::new([1e3, 2e3, 3e3, 4e3, 5e3, 6e3, 7e3, 8e3]);

    group.bench_function(format!("{num_streams}"), |b| {
        b.iter(|| topology.update_guarantees_all_links(black_box(delays)))
    });
}

fn update_guarantees(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_guarantees_all_links");

    for num_streams in [10, 100, 1_000] {
        bench_guarantees_size(&mut group, num_streams);
    }

    group.finish();
}

criterion_group!(benches, generate, shortest_path, update_guarantees);
criterion_main!(benches);
