//! Recursive bisection/trisection of phynodes
//!
//! Splits an ordered phynode slice into a requested number of contiguous,
//! spatially coherent groups: at every step the slice is ordered along the
//! axis of greatest coordinate spread and divided with group sizes within
//! one element of proportional. Partition counts divisible by three
//! trisect, everything else bisects. Work per level is linear in the slice
//! and slices shrink geometrically, so a whole partitioning stays O(n) for
//! a bounded branching factor.

use tracing::trace;

use crate::topology::{manhattan, MeshShape};

use super::phynode::PhyNode;

/// Split `nodes[start..end]` into `parts` groups, recording the start index
/// of each group in `cuts`. Requires `end - start >= parts >= 1`; no group
/// comes out empty.
pub(crate) fn partition(
    nodes: &mut [PhyNode],
    start: usize,
    end: usize,
    parts: usize,
    cuts: &mut Vec<usize>,
) {
    debug_assert!(start < end && end <= nodes.len());
    debug_assert!(parts >= 1 && parts <= end - start);

    if parts > 1 && end - start > 1 {
        if parts % 3 == 0 {
            trisect(nodes, start, end, parts, cuts);
        } else {
            bisect(nodes, start, end, parts, cuts);
        }
    } else {
        cuts.push(start);
    }
}

fn bisect(nodes: &mut [PhyNode], start: usize, end: usize, parts: usize, cuts: &mut Vec<usize>) {
    let dim = order_along_spread_axis(&mut nodes[start..end]);
    trace!(start, end, parts, dim, "bisecting phynode slice");

    let left_parts = parts - parts / 2;
    let mid = start + share(end - start, left_parts, parts);
    partition(nodes, start, mid, left_parts, cuts);
    partition(nodes, mid, end, parts - left_parts, cuts);
}

fn trisect(nodes: &mut [PhyNode], start: usize, end: usize, parts: usize, cuts: &mut Vec<usize>) {
    let dim = order_along_spread_axis(&mut nodes[start..end]);
    trace!(start, end, parts, dim, "trisecting phynode slice");

    let third = parts / 3;
    let len = end - start;
    let first = share(len, third, parts);
    let second = share(len - first, third, parts - third);
    let mid1 = start + first;
    let mid2 = mid1 + second;
    partition(nodes, start, mid1, third, cuts);
    partition(nodes, mid1, mid2, third, cuts);
    partition(nodes, mid2, end, third, cuts);
}

/// Members assigned to the first `num` of `den` partitions: proportional,
/// clamped so both sides can still fill their partition counts.
fn share(len: usize, num: usize, den: usize) -> usize {
    debug_assert!(num >= 1 && num < den && len >= den);
    let ideal = (len * num + den / 2) / den;
    ideal.max(num).min(len - (den - num))
}

/// Order the slice along its axis of maximum spread.
///
/// The sort key is `(coordinate, host id)` - a total order - so the result
/// cannot depend on how the sort handles ties. Returns the chosen axis.
fn order_along_spread_axis(slice: &mut [PhyNode]) -> usize {
    let dim = max_spread_dimension(slice);
    slice.sort_unstable_by_key(|p| (p.coord(dim), p.host));
    dim
}

/// Axis with the largest coordinate spread over the slice; ties break to
/// the lowest axis. Axis 0 when no coordinates are available.
fn max_spread_dimension(slice: &[PhyNode]) -> usize {
    let dims = slice.iter().map(|p| p.coords.len()).max().unwrap_or(0);
    let mut best_dim = 0;
    let mut best_spread = -1i64;
    for dim in 0..dims {
        let mut lo = i32::MAX;
        let mut hi = i32::MIN;
        for phynode in slice {
            let c = phynode.coord(dim);
            lo = lo.min(c);
            hi = hi.max(c);
        }
        let spread = hi as i64 - lo as i64;
        if spread > best_spread {
            best_spread = spread;
            best_dim = dim;
        }
    }
    best_dim
}

/// For each group delimited by `cuts`, move the phynode nearest the tree
/// root's host to the front; its first member becomes the subtree root.
/// Edges between hosts are then always between host roots, so any two
/// hosts share at most one edge.
pub(crate) fn choose_subtree_roots(
    nodes: &mut [PhyNode],
    cuts: &[usize],
    root_coords: &[i32],
    shape: Option<&MeshShape>,
) {
    for (i, &start) in cuts.iter().enumerate() {
        let end = cuts.get(i + 1).copied().unwrap_or(nodes.len());
        let mut best = start;
        for candidate in start + 1..end {
            let da = host_distance(shape, root_coords, &nodes[candidate].coords);
            let db = host_distance(shape, root_coords, &nodes[best].coords);
            if (da, nodes[candidate].host) < (db, nodes[best].host) {
                best = candidate;
            }
        }
        nodes.swap(start, best);
    }
}

fn host_distance(shape: Option<&MeshShape>, a: &[i32], b: &[i32]) -> i64 {
    match shape {
        Some(shape) => shape.distance(a, b),
        None => manhattan(a, b),
    }
}
