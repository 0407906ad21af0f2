use crate::{iterator, topol::HasTopology};
use std::fmt::{Debug, Display};

/**
 * All elements of the mesh implement this trait. They are identified by their
 * index.
 */
pub trait Handle: Copy + 'static {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

/**
 * Vertex handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VH {
    idx: u32,
}

/**
 * Halfedge handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HH {
    idx: u32,
}

/**
 * Edge handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EH {
    idx: u32,
}

/**
 * Face handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FH {
    idx: u32,
}

/// Handle of the single model element.
///
/// Model properties are stored in a container with exactly one element, so
/// this handle always has index 0.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MH;

impl Handle for MH {
    fn index(&self) -> u32 {
        0
    }
}

macro_rules! impl_handle {
    ($type:ident, $name:literal) => {
        impl Handle for $type {
            fn index(&self) -> u32 {
                self.idx
            }
        }

        impl From<u32> for $type {
            fn from(idx: u32) -> Self {
                $type { idx }
            }
        }

        impl From<&u32> for $type {
            fn from(idx: &u32) -> Self {
                $type { idx: *idx }
            }
        }

        impl From<&mut u32> for $type {
            fn from(idx: &mut u32) -> Self {
                $type { idx: *idx }
            }
        }

        impl Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($name, "({})"), self.idx)
            }
        }

        impl Debug for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($name, "({})"), self.idx)
            }
        }
    };
}

impl_handle!(VH, "VH");
impl_handle!(HH, "HH");
impl_handle!(EH, "EH");
impl_handle!(FH, "FH");

impl Debug for MH {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MH")
    }
}

impl VH {
    /// The outgoing halfedge of this vertex, `None` if the vertex is isolated.
    pub fn halfedge(self, mesh: &impl HasTopology) -> Option<HH> {
        mesh.topology().vertex_halfedge(self)
    }

    /// Check if this vertex is valid for the `mesh`.
    ///
    /// The index has to be less than the number of vertices in the mesh, and
    /// the vertex must not be deleted.
    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_vertex(self)
    }

    /// Check if this vertex is manifold.
    ///
    /// A vertex is manifold if it has at most 1 outgoing boundary halfedge.
    /// ```text
    ///    .......|     .......|.......     ....\     /...
    ///    .......|     .......|.......     .....\   /....
    ///    .......|     .......|.......     ......\ /.....
    ///    -------v     -------v-------     -------v------
    ///    .......|     .......|.......     ....../ \.....
    ///    .......|     .......|.......     ...../   \....
    ///    .......|     .......|.......     ..../     \...
    ///    Manifold     Manifold            Not manifold
    /// ```
    pub fn is_manifold(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_manifold_vertex(self)
    }

    /// Check if this vertex is on the boundary of the `mesh`.
    ///
    /// Isolated vertices are considered boundary vertices.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_boundary_vertex(self)
    }

    /// Check if this vertex has no incident edges.
    pub fn is_isolated(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_isolated_vertex(self)
    }

    /// The number of edges incident on this vertex.
    pub fn valence(self, mesh: &impl HasTopology) -> usize {
        iterator::voh_ccw_iter(mesh.topology(), self).count()
    }
}

impl HH {
    /// The vertex this halfedge points to.
    pub fn head(self, mesh: &impl HasTopology) -> VH {
        mesh.topology().to_vertex(self)
    }

    /// The vertex this halfedge starts from.
    pub fn tail(self, mesh: &impl HasTopology) -> VH {
        mesh.topology().from_vertex(self)
    }

    /// The other halfedge of the same edge. This is computed from the index
    /// and doesn't need the mesh.
    pub fn opposite(self) -> HH {
        (self.idx ^ 1).into()
    }

    pub fn prev(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().prev_halfedge(self)
    }

    pub fn next(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().next_halfedge(self)
    }

    pub fn face(self, mesh: &impl HasTopology) -> Option<FH> {
        mesh.topology().halfedge_face(self)
    }

    /// The edge this halfedge belongs to.
    pub fn edge(self) -> EH {
        (self.idx >> 1).into()
    }

    /// Check if this halfedge is valid for the `mesh`.
    ///
    /// The index has to be less than the number of halfedges in the mesh, and
    /// its edge must not be deleted.
    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_halfedge(self)
    }

    /// Check if this halfedge is on the boundary of `mesh`.
    ///
    /// A halfedge is considered interior if it has a face incident on it.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_boundary_halfedge(self)
    }
}

impl EH {
    /// The pair of halfedges of this edge.
    pub fn halfedges(self) -> (HH, HH) {
        let hi = self.idx << 1;
        (hi.into(), (hi | 1).into())
    }

    /// One of the two halfedges. `false` gives the halfedge with index `2e`,
    /// `true` gives `2e + 1`.
    pub fn halfedge(self, flag: bool) -> HH {
        ((self.idx << 1) | if flag { 1 } else { 0 }).into()
    }

    /// The vertex the halfedge chosen by `flag` points to.
    pub fn vertex(self, mesh: &impl HasTopology, flag: bool) -> VH {
        self.halfedge(flag).head(mesh)
    }

    /// Check if this edge is valid for the `mesh`.
    ///
    /// The index has to be less than the number of edges in the mesh, and the
    /// edge must not be deleted.
    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_edge(self)
    }

    /// Check if the edge is a boundary edge.
    ///
    /// An edge is considered interior if it has two faces incident on both of its halfedges.
    pub fn is_boundary(self, mesh: &impl HasTopology) -> bool {
        let (h, oh) = self.halfedges();
        h.is_boundary(mesh) || oh.is_boundary(mesh)
    }
}

impl FH {
    pub fn halfedge(self, mesh: &impl HasTopology) -> HH {
        mesh.topology().face_halfedge(self)
    }

    /// Check if this face is valid for the `mesh`.
    ///
    /// The index has to be less than the number of faces in the mesh, and the
    /// face must not be deleted.
    pub fn is_valid(self, mesh: &impl HasTopology) -> bool {
        mesh.topology().is_valid_face(self)
    }

    /// The number of vertices of this face.
    pub fn valence(self, mesh: &impl HasTopology) -> usize {
        iterator::fh_ccw_iter(mesh.topology(), self).count()
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Vertex {
    pub(crate) halfedge: Option<HH>,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Halfedge {
    pub(crate) face: Option<FH>,
    pub(crate) vertex: VH,
    pub(crate) next: HH,
    pub(crate) prev: HH,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Edge {
    pub(crate) halfedges: [Halfedge; 2],
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct Face {
    pub(crate) halfedge: HH,
}

#[cfg(test)]
mod test {
    use super::{EH, HH, Handle, VH};
    use std::collections::HashSet;

    #[test]
    fn t_edge_halfedge_indices() {
        for ei in 0u32..16 {
            let e: EH = ei.into();
            let (h0, h1) = e.halfedges();
            assert_eq!(h0.index(), 2 * ei);
            assert_eq!(h1.index(), 2 * ei + 1);
            assert_eq!(e.halfedge(false), h0);
            assert_eq!(e.halfedge(true), h1);
            assert_eq!(h0.edge(), e);
            assert_eq!(h1.edge(), e);
        }
    }

    #[test]
    fn t_opposite_involution() {
        for hi in 0u32..32 {
            let h: HH = hi.into();
            assert_ne!(h.opposite(), h);
            assert_eq!(h.opposite().opposite(), h);
            assert_eq!(h.opposite().edge(), h.edge());
        }
    }

    #[test]
    fn t_handle_ordering_and_hashing() {
        let a: VH = 3u32.into();
        let b: VH = 5u32.into();
        assert!(a < b);
        assert_eq!(a, VH::from(&3u32));
        let set: HashSet<VH> = [a, b, 3u32.into()].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(format!("{}", a), "VH(3)");
        assert_eq!(format!("{:?}", HH::from(7u32)), "HH(7)");
    }
}
