//! Topology oracle interface and coordinate types
//!
//! The oracle is supplied by the surrounding runtime: given a host, it
//! reports that host's coordinates in the allocation's N-dimensional
//! mesh/torus. The tree generator only consumes this interface - how
//! coordinates are discovered is out of scope. An oracle that knows
//! nothing is valid; the generator then degrades to host-aware but
//! topology-blind trees.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::member::HostId;

/// Coordinate vector of a host in the allocation mesh
pub type Coords = SmallVec<[i32; 3]>;

/// Shape of the allocation mesh, including which dimensions wrap around
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshShape {
    /// Extent of each dimension
    pub extents: SmallVec<[i32; 3]>,

    /// Whether each dimension is a torus dimension (wraps around)
    pub wraps: SmallVec<[bool; 3]>,
}

impl MeshShape {
    /// Mesh without wraparound in any dimension
    pub fn mesh(extents: impl IntoIterator<Item = i32>) -> Self {
        let extents: SmallVec<[i32; 3]> = extents.into_iter().collect();
        let wraps = extents.iter().map(|_| false).collect();
        Self { extents, wraps }
    }

    /// Torus wrapping around in every dimension
    pub fn torus(extents: impl IntoIterator<Item = i32>) -> Self {
        let extents: SmallVec<[i32; 3]> = extents.into_iter().collect();
        let wraps = extents.iter().map(|_| true).collect();
        Self { extents, wraps }
    }

    /// Number of dimensions
    pub fn dims(&self) -> usize {
        self.extents.len()
    }

    /// Hop distance between two coordinates, wrap-aware on torus dimensions
    pub fn distance(&self, a: &[i32], b: &[i32]) -> i64 {
        let dims = a.len().max(b.len());
        let mut total = 0i64;
        for dim in 0..dims {
            let av = a.get(dim).copied().unwrap_or(0);
            let bv = b.get(dim).copied().unwrap_or(0);
            let extent = self.extents.get(dim).copied().unwrap_or(0);
            let wraps = self.wraps.get(dim).copied().unwrap_or(false);
            let d = if wraps && extent > 0 {
                let d = (av - bv).rem_euclid(extent);
                d.min(extent - d)
            } else {
                (av - bv).abs()
            };
            total += d as i64;
        }
        total
    }
}

/// Manhattan distance between two coordinates, no wraparound
pub fn manhattan(a: &[i32], b: &[i32]) -> i64 {
    let dims = a.len().max(b.len());
    (0..dims)
        .map(|dim| {
            let av = a.get(dim).copied().unwrap_or(0);
            let bv = b.get(dim).copied().unwrap_or(0);
            (av - bv).abs() as i64
        })
        .sum()
}

/// Source of physical coordinates for hosts in the current allocation
///
/// Implementations must be consistent for the lifetime of a run: every
/// participant queries its own oracle instance independently, and the trees
/// they compute only agree if the oracles do.
pub trait TopologyOracle: Send + Sync {
    /// Coordinates of `host` in the allocation mesh, or `None` when unknown
    fn coordinates(&self, host: HostId) -> Option<Coords>;

    /// Shape of the allocation mesh, when known
    fn shape(&self) -> Option<&MeshShape> {
        None
    }
}

/// Table-backed oracle for tests, tooling and static allocations
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    coords: HashMap<HostId, Coords>,
    shape: Option<MeshShape>,
}

impl StaticTopology {
    /// Empty oracle; every lookup reports unknown until hosts are inserted
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty oracle that reports the given mesh shape
    pub fn with_shape(shape: MeshShape) -> Self {
        Self {
            coords: HashMap::new(),
            shape: Some(shape),
        }
    }

    /// Record the coordinates of `host`
    pub fn insert(&mut self, host: HostId, coords: impl IntoIterator<Item = i32>) {
        self.coords.insert(host, coords.into_iter().collect());
    }
}

impl TopologyOracle for StaticTopology {
    fn coordinates(&self, host: HostId) -> Option<Coords> {
        self.coords.get(&host).cloned()
    }

    fn shape(&self) -> Option<&MeshShape> {
        self.shape.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_distance_is_manhattan() {
        let shape = MeshShape::mesh([10, 10]);
        assert_eq!(shape.distance(&[1, 2], &[4, 0]), 5);
        assert_eq!(manhattan(&[1, 2], &[4, 0]), 5);
    }

    #[test]
    fn test_torus_distance_takes_the_short_way_around() {
        let shape = MeshShape::torus([10]);
        assert_eq!(shape.distance(&[1], &[9]), 2);
        assert_eq!(shape.distance(&[9], &[1]), 2);
        // plain manhattan would report 8
        assert_eq!(manhattan(&[1], &[9]), 8);
    }

    #[test]
    fn test_static_topology_lookup() {
        let mut topo = StaticTopology::new();
        topo.insert(7, [3, 4]);
        assert_eq!(topo.coordinates(7).unwrap().as_slice(), &[3, 4]);
        assert!(topo.coordinates(8).is_none());
        assert!(topo.shape().is_none());
    }
}
