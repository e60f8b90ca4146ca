//! Build performance over synthetic allocations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use topotree::{Member, RecursivePartition, SpanningTreeGenerator, StaticTopology, TopologyOracle};

/// `hosts` hosts on a square grid, `per_host` members each
fn grid_cluster(hosts: u32, per_host: u32) -> (Vec<Member>, Arc<dyn TopologyOracle>) {
    let side = (hosts as f64).sqrt().ceil() as u32;
    let mut topo = StaticTopology::new();
    let mut members = Vec::new();
    for h in 0..hosts {
        topo.insert(h, [(h % side) as i32, (h / side) as i32]);
        for m in 0..per_host {
            members.push(Member::new(h * per_host + m, h));
        }
    }
    (members, Arc::new(topo))
}

fn benchmark_build(c: &mut Criterion) {
    for (hosts, per_host) in [(8, 8), (32, 32), (128, 32)] {
        let (members, oracle) = grid_cluster(hosts, per_host);
        let name = format!("build_{}_hosts_x_{}", hosts, per_host);
        c.bench_function(&name, |b| {
            b.iter(|| {
                let mut range = members.clone();
                let mut generator = RecursivePartition::new(Arc::clone(&oracle), false);
                let count = generator
                    .build_spanning_tree(&mut range, 4)
                    .expect("build succeeds");
                black_box((count, range))
            });
        });
    }
}

criterion_group!(benches, benchmark_build);
criterion_main!(benches);
