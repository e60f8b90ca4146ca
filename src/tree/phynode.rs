//! Physical host descriptors and host grouping
//!
//! Before partitioning, a member range is regrouped so each host's members
//! are contiguous; one `PhyNode` then stands for one host. Phynodes are
//! transient - built fresh for every build call from the current range and
//! discarded with it.

use std::collections::HashMap;

use tracing::warn;

use crate::member::{HostId, Member};
use crate::topology::{Coords, MeshShape, TopologyOracle};

/// One physical host: its members and its position in the mesh
#[derive(Debug, Clone)]
pub(crate) struct PhyNode {
    /// Host identifier
    pub(crate) host: HostId,

    /// Members on this host, local root first
    pub(crate) members: Vec<Member>,

    /// Host coordinates; empty when topology data is unavailable
    pub(crate) coords: Coords,
}

impl PhyNode {
    fn new(host: HostId) -> Self {
        Self {
            host,
            members: Vec::new(),
            coords: Coords::new(),
        }
    }

    /// Coordinate on `dim`, zero when the axis is unknown
    pub(crate) fn coord(&self, dim: usize) -> i32 {
        self.coords.get(dim).copied().unwrap_or(0)
    }
}

/// Group a member range by host, one `PhyNode` per host.
///
/// The host of `range[0]` owns the root and becomes phynode 0. With
/// `pre_grouped` the range is only scanned for host-id changes; otherwise
/// members are bucketed by host in first-encounter order and the range is
/// rewritten so each host's members are contiguous. Either way the relative
/// order of members within a host is preserved.
pub(crate) fn group_by_host(
    range: &mut [Member],
    pre_grouped: bool,
    oracle: &dyn TopologyOracle,
) -> Vec<PhyNode> {
    let mut phynodes: Vec<PhyNode> = Vec::new();

    if pre_grouped {
        for &member in range.iter() {
            match phynodes.last_mut() {
                Some(last) if last.host == member.host => last.members.push(member),
                _ => {
                    let mut phynode = PhyNode::new(member.host);
                    phynode.members.push(member);
                    phynodes.push(phynode);
                }
            }
        }
    } else {
        let mut slots: HashMap<HostId, usize> = HashMap::new();
        for &member in range.iter() {
            let slot = *slots.entry(member.host).or_insert_with(|| {
                phynodes.push(PhyNode::new(member.host));
                phynodes.len() - 1
            });
            phynodes[slot].members.push(member);
        }

        let mut pos = 0;
        for phynode in &phynodes {
            for &member in &phynode.members {
                range[pos] = member;
                pos += 1;
            }
        }
    }

    resolve_coordinates(&mut phynodes, oracle);
    phynodes
}

/// Attach oracle coordinates to each phynode.
///
/// If any host cannot be placed, every coordinate is cleared and the hosts
/// are treated as co-located - the build degrades to a host-aware but
/// topology-blind tree instead of failing.
fn resolve_coordinates(phynodes: &mut [PhyNode], oracle: &dyn TopologyOracle) {
    let mut degraded = false;
    for phynode in phynodes.iter_mut() {
        match oracle.coordinates(phynode.host) {
            Some(coords) => phynode.coords = coords,
            None => {
                warn!(
                    host = phynode.host,
                    "no coordinates for host, treating all hosts as co-located"
                );
                degraded = true;
                break;
            }
        }
    }

    if degraded {
        for phynode in phynodes.iter_mut() {
            phynode.coords.clear();
        }
    } else if let Some(shape) = oracle.shape() {
        translate_torus_coordinates(phynodes, shape);
    }
}

/// Rotate occupied coordinates on wrapping dimensions so the widest
/// unoccupied gap sits at the high end of the axis.
///
/// An allocation straddling the wrap boundary otherwise shows a spuriously
/// large spread and the partitioner splits hosts that are actually
/// adjacent.
fn translate_torus_coordinates(phynodes: &mut [PhyNode], shape: &MeshShape) {
    for dim in 0..shape.dims() {
        let extent = shape.extents[dim];
        if !shape.wraps[dim] || extent <= 0 {
            continue;
        }

        let mut occupied: Vec<i32> = phynodes
            .iter()
            .map(|p| p.coord(dim).rem_euclid(extent))
            .collect();
        occupied.sort_unstable();
        occupied.dedup();
        if occupied.len() < 2 {
            continue;
        }

        // widest circular gap between consecutive occupied values; the run
        // of hosts restarts right after it
        let mut run_start = occupied[0];
        let mut widest = occupied[0] + extent - occupied[occupied.len() - 1];
        for pair in occupied.windows(2) {
            let gap = pair[1] - pair[0];
            if gap > widest {
                widest = gap;
                run_start = pair[1];
            }
        }

        for phynode in phynodes.iter_mut() {
            if let Some(c) = phynode.coords.get_mut(dim) {
                *c = (c.rem_euclid(extent) - run_start).rem_euclid(extent);
            }
        }
    }
}
