//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use topotree::{
    HostId, Member, ParticipantId, RecursivePartition, SpanningTreeGenerator, StaticTopology,
    TopologyOracle,
};

/// Install a subscriber so `RUST_LOG=topotree=debug` surfaces build events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `hosts` hosts with `per_host` members each; host `h` sits at
/// `(stride * h, 0)` and owns participants `h * per_host ..`.
pub fn line_cluster(hosts: u32, per_host: u32, stride: i32) -> (Vec<Member>, StaticTopology) {
    let mut topo = StaticTopology::new();
    let mut members = Vec::new();
    for h in 0..hosts {
        topo.insert(h, [stride * h as i32, 0]);
        for m in 0..per_host {
            members.push(Member::new(h * per_host + m, h));
        }
    }
    (members, topo)
}

/// Expand the whole tree by recursive builds; returns child -> parent.
pub fn expand_tree(
    members: &[Member],
    topo: &StaticTopology,
    max_branches: u32,
) -> HashMap<ParticipantId, ParticipantId> {
    let oracle: Arc<dyn TopologyOracle> = Arc::new(topo.clone());
    let mut range = members.to_vec();
    let mut edges = HashMap::new();
    expand(&oracle, &mut range, max_branches, &mut edges);
    edges
}

fn expand(
    oracle: &Arc<dyn TopologyOracle>,
    range: &mut [Member],
    max_branches: u32,
    edges: &mut HashMap<ParticipantId, ParticipantId>,
) {
    if range.len() <= 1 {
        return;
    }
    let mut generator = RecursivePartition::new(Arc::clone(oracle), false);
    let count = generator
        .build_spanning_tree(range, max_branches)
        .expect("build succeeds");
    let bounds: Vec<(usize, usize)> = (0..count)
        .map(|i| (generator.subtree_begin(i), generator.subtree_end(i)))
        .collect();
    let root = range[0].id;
    for (begin, end) in bounds {
        edges.insert(range[begin].id, root);
        expand(oracle, &mut range[begin..end], max_branches, edges);
    }
}

/// Assert every member reaches the root through parent links, with no
/// orphan and no cycle.
pub fn assert_reachable(members: &[Member], edges: &HashMap<ParticipantId, ParticipantId>) {
    let root = members[0].id;
    assert_eq!(edges.len(), members.len() - 1, "edge count");
    for member in members {
        let mut current = member.id;
        let mut hops = 0;
        while current != root {
            current = *edges
                .get(&current)
                .unwrap_or_else(|| panic!("participant {current} has no parent"));
            hops += 1;
            assert!(
                hops <= members.len(),
                "cycle following parents from {}",
                member.id
            );
        }
    }
}

/// Assert the per-host flattening shape: each host has exactly one member
/// with a parent outside the host (or no parent at all), and every other
/// member of the host is a direct child of that local root.
pub fn assert_host_flattening(members: &[Member], edges: &HashMap<ParticipantId, ParticipantId>) {
    let host_of: HashMap<ParticipantId, HostId> =
        members.iter().map(|m| (m.id, m.host)).collect();

    let mut hosts: HashMap<HostId, Vec<ParticipantId>> = HashMap::new();
    for member in members {
        hosts.entry(member.host).or_default().push(member.id);
    }

    for (host, ids) in hosts {
        let locals: Vec<ParticipantId> = ids
            .iter()
            .copied()
            .filter(|id| match edges.get(id) {
                Some(parent) => host_of[parent] != host,
                None => true,
            })
            .collect();
        assert_eq!(locals.len(), 1, "host {host} must have one local root");
        let local_root = locals[0];
        for id in ids {
            if id != local_root {
                assert_eq!(
                    edges[&id], local_root,
                    "member {id} of host {host} must attach to its local root"
                );
            }
        }
    }
}

/// Count tree edges crossing between each unordered pair of hosts.
pub fn inter_host_edge_counts(
    members: &[Member],
    edges: &HashMap<ParticipantId, ParticipantId>,
) -> HashMap<(HostId, HostId), usize> {
    let host_of: HashMap<ParticipantId, HostId> =
        members.iter().map(|m| (m.id, m.host)).collect();
    let mut counts = HashMap::new();
    for (child, parent) in edges {
        let (a, b) = (host_of[child], host_of[parent]);
        if a != b {
            let key = (a.min(b), a.max(b));
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}
