//! # Topology-aware spanning trees for collective communication
//!
//! This library builds the communication spanning tree a parallel runtime
//! uses to implement broadcast, reduction and barrier patterns without
//! all-to-all connectivity.
//!
//! ## Core Algorithm
//!
//! 1. **Host grouping**: participants regrouped so each physical host is
//!    contiguous; one phynode per host
//! 2. **Recursive partition**: hosts split along the axis of maximum
//!    coordinate spread into at most `max_branches` balanced groups
//! 3. **Host flattening**: one root per host, every other member of that
//!    host a direct child of it; host pairs share at most one edge
//! 4. **Coordination-free agreement**: the construction is deterministic
//!    in its globally known input, so every participant computes the
//!    identical tree independently
//!
//! Construction is O(n) in the number of participants for a bounded
//! branching factor.
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use topotree::{Member, Membership, StaticTopology, TreeCache, TreeConfig};
//!
//! let mut topo = StaticTopology::new();
//! topo.insert(0, [0, 0]);
//! topo.insert(1, [10, 0]);
//! // eight participants, four per host
//! let members: Vec<Member> = (0..8).map(|id| Member::new(id, id / 4)).collect();
//!
//! let cache = TreeCache::new(
//!     Membership::new(members),
//!     0,
//!     Arc::new(topo),
//!     TreeConfig::default(),
//! )?;
//! let info = cache.tree_info(0)?;
//! assert!(info.parent.is_none());
//! assert!(info.child_count() >= 1);
//! # Ok::<(), topotree::TreeError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod cache;    // Descriptor cache and query facade
pub mod member;   // Participant and host identifiers
pub mod topology; // Topology oracle interface and coordinates
pub mod tree;     // Spanning tree generators

// Re-exports for convenience
pub use cache::{Membership, TreeCache, TreeInfo, TreeNeighbors};
pub use member::{HostId, Member, ParticipantId};
pub use topology::{Coords, MeshShape, StaticTopology, TopologyOracle};
pub use tree::{RecursivePartition, SpanningTreeGenerator};

use thiserror::Error;

/// Branching bound used by cached queries unless configured otherwise
pub const DEFAULT_BRANCH_FACTOR: u32 = 4;

/// Configuration for cached tree queries
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Max children a node may have on hosts other than its own (>= 1);
    /// members of a node's own host always attach directly
    pub branch_factor: u32,
}

impl TreeConfig {
    /// Configuration with a specific inter-host branching bound
    pub fn with_branch_factor(branch_factor: u32) -> Self {
        Self { branch_factor }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            branch_factor: DEFAULT_BRANCH_FACTOR,
        }
    }
}

/// Errors from tree construction and descriptor queries
///
/// All of these are contract violations surfaced to the caller before any
/// partition work begins; none is transient or retryable. Missing topology
/// data is deliberately *not* an error - the generator degrades to a
/// topology-blind tree instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Build requested over an empty member range
    #[error("member range is empty")]
    EmptyRange,

    /// A branching bound of zero can produce no tree
    #[error("max branches must be at least 1")]
    ZeroBranches,

    /// Requested tree root is not a known participant
    #[error("unknown tree root {0}")]
    UnknownRoot(ParticipantId),

    /// Local participant is missing from the membership view
    #[error("participant {0} is not in the current membership")]
    UnknownParticipant(ParticipantId),
}
