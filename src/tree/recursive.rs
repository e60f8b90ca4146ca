//! Recursive-partition spanning tree strategy
//!
//! Builds one tree level: members are grouped by host, the root's own host
//! is flattened beneath it, and the remaining hosts are split into at most
//! `max_branches` spatially coherent groups, each becoming one subtree
//! rooted at the host nearest the tree root. Works for any N-d mesh/torus,
//! including non-contiguous allocations with holes, and stays host-aware
//! when no topology information exists at all.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::member::Member;
use crate::topology::TopologyOracle;
use crate::TreeError;

use super::partition::{choose_subtree_roots, partition};
use super::phynode::group_by_host;
use super::SpanningTreeGenerator;

/// Phynode-aware recursive-partition tree generator
///
/// O(n) in the number of members for a bounded branching factor. Within a
/// host there is a single root member and every other member of that host
/// is its direct descendant; edges between hosts only connect host roots,
/// so there is at most one edge between any two hosts. The intra-host
/// flattening deliberately ignores `max_branches` - a host with many
/// members gives its root a correspondingly wide fan-out.
///
/// The same input always produces the same tree, on any process: the
/// runtime relies on participants agreeing on the shape without exchanging
/// a single message.
pub struct RecursivePartition {
    oracle: Arc<dyn TopologyOracle>,
    pre_grouped: bool,
    /// Subtree boundaries into the reordered range: subtree `i` spans
    /// `children[i]..children[i + 1]`
    children: Vec<usize>,
}

impl RecursivePartition {
    /// Create a generator backed by `oracle`.
    ///
    /// `pre_grouped` promises that build input arrives already grouped by
    /// host, enabling a single-scan grouping path. Input that breaks the
    /// promise produces a tree with more than one edge between hosts;
    /// callers that cannot guarantee grouping must pass `false`.
    pub fn new(oracle: Arc<dyn TopologyOracle>, pre_grouped: bool) -> Self {
        Self {
            oracle,
            pre_grouped,
            children: Vec::new(),
        }
    }
}

impl SpanningTreeGenerator for RecursivePartition {
    fn build_spanning_tree(
        &mut self,
        range: &mut [Member],
        max_branches: u32,
    ) -> Result<usize, TreeError> {
        if range.is_empty() {
            return Err(TreeError::EmptyRange);
        }
        if max_branches == 0 {
            return Err(TreeError::ZeroBranches);
        }

        self.children.clear();
        if range.len() == 1 {
            self.children.push(1);
            return Ok(0);
        }

        debug!(
            members = range.len(),
            max_branches, "building spanning tree level"
        );

        let mut phynodes = group_by_host(range, self.pre_grouped, self.oracle.as_ref());
        let (root_phynode, rest) = phynodes
            .split_first_mut()
            .expect("non-empty range yields at least one phynode");

        // members of the root's host attach directly, one leaf subtree each
        let mut pos = 1;
        for &member in &root_phynode.members[1..] {
            range[pos] = member;
            self.children.push(pos);
            pos += 1;
        }

        if !rest.is_empty() {
            let parts = (max_branches as usize).min(rest.len());
            let mut cuts = Vec::with_capacity(parts);
            partition(rest, 0, rest.len(), parts, &mut cuts);
            choose_subtree_roots(rest, &cuts, &root_phynode.coords, self.oracle.shape());

            for (i, &cut) in cuts.iter().enumerate() {
                let end = cuts.get(i + 1).copied().unwrap_or(rest.len());
                self.children.push(pos);
                for phynode in &rest[cut..end] {
                    for &member in &phynode.members {
                        range[pos] = member;
                        pos += 1;
                    }
                }
            }
        }

        debug_assert_eq!(pos, range.len(), "every member placed exactly once");
        self.children.push(range.len());
        Ok(self.children.len() - 1)
    }

    fn subtree_size(&self, subtree: usize) -> usize {
        debug_assert!(
            subtree + 1 < self.children.len(),
            "subtree {subtree} out of range"
        );
        self.children[subtree + 1] - self.children[subtree]
    }

    fn subtree_begin(&self, subtree: usize) -> usize {
        debug_assert!(
            subtree + 1 < self.children.len(),
            "subtree {subtree} out of range"
        );
        self.children[subtree]
    }

    fn subtree_end(&self, subtree: usize) -> usize {
        debug_assert!(
            subtree + 1 < self.children.len(),
            "subtree {subtree} out of range"
        );
        self.children[subtree + 1]
    }
}

impl fmt::Debug for RecursivePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursivePartition")
            .field("pre_grouped", &self.pre_grouped)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
