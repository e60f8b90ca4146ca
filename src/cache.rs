//! Tree descriptor cache and query facade
//!
//! Each process lazily computes, per requested root, the local
//! participant's parent and children in the tree rooted there. Membership
//! and topology are assumed stable for a run: entries are immutable once
//! built and never evicted. The cache is an explicitly owned service
//! object - the runtime creates it at startup, injects it wherever tree
//! queries are needed, and calls [`TreeCache::reset`] when membership
//! changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::member::{Member, ParticipantId};
use crate::topology::TopologyOracle;
use crate::tree::{RecursivePartition, SpanningTreeGenerator};
use crate::{TreeConfig, TreeError};

/// Process-wide membership view supplied by the runtime
///
/// Ordering is significant: every process must hold the same members in
/// the same order, since independently computed trees only agree when
/// their inputs do. Participant ids must be unique.
#[derive(Debug, Clone)]
pub struct Membership {
    members: Vec<Member>,
}

impl Membership {
    /// Wrap the runtime's member list
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the membership is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The members, in global order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a participant by id
    pub fn member(&self, id: ParticipantId) -> Option<Member> {
        self.members.iter().find(|m| m.id == id).copied()
    }
}

/// Parent and children of the local participant for one tree root
///
/// Never mutated after creation; shared out of the cache behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TreeInfo {
    /// Parent participant, `None` for the tree root itself
    pub parent: Option<ParticipantId>,

    /// Direct children, in subtree order
    pub children: Vec<ParticipantId>,
}

impl TreeInfo {
    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Neighbor view handed to diagnostics and monitoring tooling
///
/// A cheap handle over the cached descriptor: the children slice is owned
/// by the cache for its whole lifetime and must not be mutated or freed by
/// the caller - the borrow rules enforce what the original C API could
/// only document.
#[derive(Debug, Clone)]
pub struct TreeNeighbors {
    info: Arc<TreeInfo>,
}

impl TreeNeighbors {
    /// Parent participant, `None` for the tree root itself
    pub fn parent(&self) -> Option<ParticipantId> {
        self.info.parent
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.info.children.len()
    }

    /// Direct children, in subtree order
    pub fn children(&self) -> &[ParticipantId] {
        &self.info.children
    }
}

/// Lazy per-root descriptor cache for one local participant
///
/// Thread-safe: concurrent first queries for the same root may compute
/// redundantly, but only the first finished result is installed and every
/// caller observes that single entry. The computation is pure, so the
/// discarded duplicates are wasted work, never wrong answers.
pub struct TreeCache {
    membership: Membership,
    me: ParticipantId,
    oracle: Arc<dyn TopologyOracle>,
    config: TreeConfig,
    entries: RwLock<HashMap<ParticipantId, Arc<TreeInfo>>>,
    builds: AtomicUsize,
}

impl TreeCache {
    /// Create the cache for the local participant `me`.
    ///
    /// Fails fast on a zero branching factor or when `me` is missing from
    /// the membership.
    pub fn new(
        membership: Membership,
        me: ParticipantId,
        oracle: Arc<dyn TopologyOracle>,
        config: TreeConfig,
    ) -> Result<Self, TreeError> {
        if config.branch_factor == 0 {
            return Err(TreeError::ZeroBranches);
        }
        if membership.member(me).is_none() {
            return Err(TreeError::UnknownParticipant(me));
        }
        Ok(Self {
            membership,
            me,
            oracle,
            config,
            entries: RwLock::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        })
    }

    /// The local participant this cache answers for
    pub fn me(&self) -> ParticipantId {
        self.me
    }

    /// The membership view the cache was built over
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Parent and children of the local participant in the tree rooted at
    /// `root`, computed on first request and cached for the process
    /// lifetime.
    pub fn tree_info(&self, root: ParticipantId) -> Result<Arc<TreeInfo>, TreeError> {
        if let Some(info) = self
            .entries
            .read()
            .expect("tree cache lock poisoned")
            .get(&root)
        {
            return Ok(Arc::clone(info));
        }

        let root_member = self
            .membership
            .member(root)
            .ok_or(TreeError::UnknownRoot(root))?;
        let info = Arc::new(self.compute(root_member)?);
        self.builds.fetch_add(1, Ordering::Relaxed);

        // first finished result wins; concurrent duplicates are discarded
        let mut entries = self.entries.write().expect("tree cache lock poisoned");
        Ok(Arc::clone(entries.entry(root).or_insert(info)))
    }

    /// Plain neighbor query for diagnostics tooling.
    ///
    /// Always succeeds for a known `root` under the current static
    /// membership; an unknown root is a lookup failure with no partial
    /// result.
    pub fn neighbors(&self, root: ParticipantId) -> Result<TreeNeighbors, TreeError> {
        Ok(TreeNeighbors {
            info: self.tree_info(root)?,
        })
    }

    /// Drop every cached descriptor.
    ///
    /// The owning runtime calls this when membership changes; subsequent
    /// queries rebuild lazily against the new state.
    pub fn reset(&self) {
        self.entries
            .write()
            .expect("tree cache lock poisoned")
            .clear();
    }

    /// Number of descriptor computations performed so far.
    ///
    /// Repeated queries for a cached root do not increase it; concurrent
    /// first queries for one root may each count even though only one
    /// result is kept.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Descend the recursive partition from `root` until the local
    /// participant is the root of its own sub-range; its children are the
    /// subtree roots of that range and its parent is the root of the
    /// enclosing range.
    fn compute(&self, root: Member) -> Result<TreeInfo, TreeError> {
        debug!(root = root.id, me = self.me, "computing tree descriptor");

        // root first, everyone else in global membership order
        let mut range: Vec<Member> = Vec::with_capacity(self.membership.len());
        range.push(root);
        range.extend(
            self.membership
                .members()
                .iter()
                .copied()
                .filter(|m| m.id != root.id),
        );

        let mut generator = RecursivePartition::new(Arc::clone(&self.oracle), false);
        let mut parent = None;
        let (mut lo, mut hi) = (0, range.len());

        loop {
            let count =
                generator.build_spanning_tree(&mut range[lo..hi], self.config.branch_factor)?;
            if range[lo].id == self.me {
                let children = (0..count)
                    .map(|i| range[lo + generator.subtree_begin(i)].id)
                    .collect();
                return Ok(TreeInfo { parent, children });
            }

            parent = Some(range[lo].id);
            let mut next = None;
            for i in 0..count {
                let begin = lo + generator.subtree_begin(i);
                let end = lo + generator.subtree_end(i);
                if range[begin..end].iter().any(|m| m.id == self.me) {
                    next = Some((begin, end));
                    break;
                }
            }
            match next {
                Some((begin, end)) => {
                    lo = begin;
                    hi = end;
                }
                None => unreachable!("local participant is always inside one subtree"),
            }
        }
    }
}

impl fmt::Debug for TreeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCache")
            .field("me", &self.me)
            .field("members", &self.membership.len())
            .field("builds", &self.builds)
            .finish_non_exhaustive()
    }
}
