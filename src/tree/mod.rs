//! Spanning tree construction
//!
//! A spanning tree covers every participant of a collective operation,
//! rooted at a designated participant, and is used to route broadcast and
//! reduction traffic without all-to-all connectivity. Each participant
//! computes the tree independently from globally known input, so the
//! construction must be deterministic - determinism substitutes for
//! coordination messages.
//!
//! One `build` call produces a single level: the direct children of the
//! root and the contiguous sub-range each child's subtree occupies.
//! Descending into a subtree is another `build` over that sub-range.

mod partition;
mod phynode;
mod recursive;

pub use recursive::RecursivePartition;

use crate::member::Member;
use crate::TreeError;

/// Strategy contract for building one level of a collective spanning tree
///
/// Implementations are values chosen at construction time; any strategy
/// plugged into the runtime must keep the same guarantees the recursive
/// partition gives: the root stays in first position, every member lands in
/// exactly one subtree, and identical input produces an identical tree on
/// every process.
pub trait SpanningTreeGenerator {
    /// Compute the direct children of `range[0]` and reorder `range` so
    /// every subtree occupies a contiguous block, grouped by host.
    ///
    /// `max_branches` bounds the number of children on hosts other than the
    /// root's own; members of the root's host always attach directly (see
    /// [`RecursivePartition`]).
    ///
    /// Returns the number of direct children of the root.
    fn build_spanning_tree(
        &mut self,
        range: &mut [Member],
        max_branches: u32,
    ) -> Result<usize, TreeError>;

    /// Number of members in subtree `subtree`, its root included.
    ///
    /// Valid after a successful build for `subtree` below the returned
    /// child count; out-of-range indices panic with a descriptive message
    /// in debug builds and are unchecked in release builds.
    fn subtree_size(&self, subtree: usize) -> usize;

    /// Start position of subtree `subtree` in the reordered range; the
    /// member at this position is the subtree root. Same bounds contract
    /// as [`subtree_size`](Self::subtree_size).
    fn subtree_begin(&self, subtree: usize) -> usize;

    /// End position (exclusive) of subtree `subtree` in the reordered
    /// range. Same bounds contract as [`subtree_size`](Self::subtree_size).
    fn subtree_end(&self, subtree: usize) -> usize;
}
