use crate::{
    element::{EH, Edge, FH, Face, HH, Halfedge, Handle, MH, VH, Vertex},
    error::Error,
    iterator,
    property::{EProperty, FProperty, PropertyContainer, VProperty},
};

const DELETED_BORROWED: &str = "Deleted flags of the mesh are mutably borrowed";

/// Anything that has the connectivity of a halfedge mesh.
///
/// Implementors only need to provide access to the [`Topology`]. Everything
/// else, such as navigation between the elements and counting the elements, is
/// provided by this trait.
pub trait HasTopology {
    fn topology(&self) -> &Topology;

    fn num_vertices(&self) -> usize {
        self.topology().num_vertices()
    }

    fn num_halfedges(&self) -> usize {
        self.topology().num_halfedges()
    }

    fn num_edges(&self) -> usize {
        self.topology().num_edges()
    }

    fn num_faces(&self) -> usize {
        self.topology().num_faces()
    }

    fn num_deleted_vertices(&self) -> usize {
        self.topology().num_deleted_vertices()
    }

    fn num_deleted_edges(&self) -> usize {
        self.topology().num_deleted_edges()
    }

    fn num_deleted_faces(&self) -> usize {
        self.topology().num_deleted_faces()
    }

    fn has_garbage(&self) -> bool {
        self.topology().has_garbage()
    }

    /// Iterator over all the vertices that are not deleted.
    fn vertices(&self) -> impl Iterator<Item = VH> {
        self.topology().vertices()
    }

    /// Iterator over all the halfedges that are not deleted.
    fn halfedges(&self) -> impl Iterator<Item = HH> {
        self.topology().halfedges()
    }

    /// Iterator over all the edges that are not deleted.
    fn edges(&self) -> impl Iterator<Item = EH> {
        self.topology().edges()
    }

    /// Iterator over all the faces that are not deleted.
    fn faces(&self) -> impl Iterator<Item = FH> {
        self.topology().faces()
    }

    fn is_deleted_vertex(&self, v: VH) -> bool {
        self.topology().is_deleted_vertex(v)
    }

    fn is_deleted_halfedge(&self, h: HH) -> bool {
        self.topology().is_deleted_halfedge(h)
    }

    fn is_deleted_edge(&self, e: EH) -> bool {
        self.topology().is_deleted_edge(e)
    }

    fn is_deleted_face(&self, f: FH) -> bool {
        self.topology().is_deleted_face(f)
    }

    fn vertex_halfedge(&self, v: VH) -> Option<HH> {
        self.topology().vertex_halfedge(v)
    }

    fn to_vertex(&self, h: HH) -> VH {
        self.topology().to_vertex(h)
    }

    fn from_vertex(&self, h: HH) -> VH {
        self.topology().from_vertex(h)
    }

    fn next_halfedge(&self, h: HH) -> HH {
        self.topology().next_halfedge(h)
    }

    fn prev_halfedge(&self, h: HH) -> HH {
        self.topology().prev_halfedge(h)
    }

    fn opposite_halfedge(&self, h: HH) -> HH {
        h.opposite()
    }

    fn halfedge_face(&self, h: HH) -> Option<FH> {
        self.topology().halfedge_face(h)
    }

    fn halfedge_edge(&self, h: HH) -> EH {
        h.edge()
    }

    fn edge_halfedge(&self, e: EH, flag: bool) -> HH {
        e.halfedge(flag)
    }

    fn edge_vertex(&self, e: EH, flag: bool) -> VH {
        self.topology().edge_vertex(e, flag)
    }

    fn face_halfedge(&self, f: FH) -> HH {
        self.topology().face_halfedge(f)
    }

    fn cw_rotated_halfedge(&self, h: HH) -> HH {
        self.topology().cw_rotated_halfedge(h)
    }

    fn ccw_rotated_halfedge(&self, h: HH) -> HH {
        self.topology().ccw_rotated_halfedge(h)
    }

    fn find_halfedge(&self, from: VH, to: VH) -> Option<HH> {
        self.topology().find_halfedge(from, to)
    }

    fn find_edge(&self, a: VH, b: VH) -> Option<EH> {
        self.topology().find_edge(a, b)
    }

    fn is_boundary_vertex(&self, v: VH) -> bool {
        self.topology().is_boundary_vertex(v)
    }

    fn is_boundary_halfedge(&self, h: HH) -> bool {
        self.topology().is_boundary_halfedge(h)
    }

    fn is_boundary_edge(&self, e: EH) -> bool {
        self.topology().is_boundary_edge(e)
    }

    fn is_isolated_vertex(&self, v: VH) -> bool {
        self.topology().is_isolated_vertex(v)
    }

    fn is_manifold_vertex(&self, v: VH) -> bool {
        self.topology().is_manifold_vertex(v)
    }

    fn vertex_valence(&self, v: VH) -> usize {
        self.topology().vertex_valence(v)
    }

    fn face_valence(&self, f: FH) -> usize {
        self.topology().face_valence(f)
    }

    fn is_triangle_mesh(&self) -> bool {
        self.topology().is_triangle_mesh()
    }

    fn is_quad_mesh(&self) -> bool {
        self.topology().is_quad_mesh()
    }
}

impl HasTopology for Topology {
    fn topology(&self) -> &Topology {
        self
    }
}

/// An edge of a face being added, either one that already exists in the mesh,
/// or one that will be created once the face is accepted.
enum TentativeEdge {
    Old(HH),
    New {
        index: u32,
        from: VH,
        to: VH,
        prev: Option<HH>,
        next: Option<HH>,
        opp_prev: Option<HH>,
        opp_next: Option<HH>,
    },
}

/// Scratch space used when adding or deleting faces. Reusing it across many
/// calls to [`Topology::add_face`] avoids repeated allocations.
#[derive(Default)]
pub struct TopolCache {
    loop_halfedges: Vec<Option<HH>>,
    needs_adjust: Vec<bool>,
    next_cache: Vec<(HH, HH)>,
    vertex_cache: Vec<(VH, HH)>,
    tentative: Vec<TentativeEdge>,
    pub(crate) halfedges: Vec<HH>,
    pub(crate) vertices: Vec<VH>,
    pub(crate) edges: Vec<EH>,
    pub(crate) faces: Vec<FH>,
}

impl TopolCache {
    pub(crate) fn clear(&mut self) {
        self.loop_halfedges.clear();
        self.needs_adjust.clear();
        self.next_cache.clear();
        self.vertex_cache.clear();
        self.tentative.clear();
        self.halfedges.clear();
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
    }
}

/// Connectivity of a polygon mesh, and the properties defined on its
/// elements.
///
/// Each kind of element (vertices, halfedges, edges, faces and the model)
/// owns a [`PropertyContainer`], and the connectivity records are kept in
/// lockstep with those containers. Deleted elements are only flagged, and
/// stay in storage until [`Topology::garbage_collection`] is called.
pub struct Topology {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    pub(crate) vprops: PropertyContainer<VH>,
    pub(crate) hprops: PropertyContainer<HH>,
    pub(crate) eprops: PropertyContainer<EH>,
    pub(crate) fprops: PropertyContainer<FH>,
    pub(crate) mprops: PropertyContainer<MH>,
    pub(crate) vdeleted: VProperty<bool>,
    pub(crate) edeleted: EProperty<bool>,
    pub(crate) fdeleted: FProperty<bool>,
    pub(crate) num_deleted_vertices: usize,
    pub(crate) num_deleted_edges: usize,
    pub(crate) num_deleted_faces: usize,
}

impl Topology {
    pub fn new() -> Self {
        Self::with_capacity(0, 0, 0)
    }

    pub fn with_capacity(nverts: usize, nedges: usize, nfaces: usize) -> Self {
        let mut vprops = PropertyContainer::new();
        let mut eprops = PropertyContainer::new();
        let mut fprops = PropertyContainer::new();
        let vdeleted = vprops.create("v:deleted", false);
        let edeleted = eprops.create("e:deleted", false);
        let fdeleted = fprops.create("f:deleted", false);
        let mut topol = Topology {
            vertices: Vec::with_capacity(nverts),
            edges: Vec::with_capacity(nedges),
            faces: Vec::with_capacity(nfaces),
            vprops,
            hprops: PropertyContainer::new(),
            eprops,
            fprops,
            mprops: PropertyContainer::new_with_size(1),
            vdeleted,
            edeleted,
            fdeleted,
            num_deleted_vertices: 0,
            num_deleted_edges: 0,
            num_deleted_faces: 0,
        };
        topol
            .reserve(nverts, nedges, nfaces)
            .expect("Properties of a new topology cannot be borrowed");
        topol
    }

    /// Reserve memory for an additional number of vertices, edges and faces.
    pub fn reserve(&mut self, nverts: usize, nedges: usize, nfaces: usize) -> Result<(), Error> {
        self.vertices.reserve(nverts);
        self.edges.reserve(nedges);
        self.faces.reserve(nfaces);
        self.vprops.reserve(nverts)?;
        self.hprops.reserve(nedges * 2)?;
        self.eprops.reserve(nedges)?;
        self.fprops.reserve(nfaces)?;
        Ok(())
    }

    /// Remove all elements. The properties are kept, but they will have no
    /// values.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.vprops.ensure_unborrowed()?;
        self.hprops.ensure_unborrowed()?;
        self.eprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        self.vprops.clear()?;
        self.hprops.clear()?;
        self.eprops.clear()?;
        self.fprops.clear()?;
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.num_deleted_vertices = 0;
        self.num_deleted_edges = 0;
        self.num_deleted_faces = 0;
        Ok(())
    }

    /// Deep copy of the topology, including all the properties.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let vprops = self.vprops.try_clone()?;
        let eprops = self.eprops.try_clone()?;
        let fprops = self.fprops.try_clone()?;
        const ERR: &str = "Reserved property is missing";
        let vdeleted = vprops.get::<bool>("v:deleted").expect(ERR);
        let edeleted = eprops.get::<bool>("e:deleted").expect(ERR);
        let fdeleted = fprops.get::<bool>("f:deleted").expect(ERR);
        Ok(Topology {
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            faces: self.faces.clone(),
            vprops,
            hprops: self.hprops.try_clone()?,
            eprops,
            fprops,
            mprops: self.mprops.try_clone()?,
            vdeleted,
            edeleted,
            fdeleted,
            num_deleted_vertices: self.num_deleted_vertices,
            num_deleted_edges: self.num_deleted_edges,
            num_deleted_faces: self.num_deleted_faces,
        })
    }

    pub(crate) fn vertex(&self, v: VH) -> &Vertex {
        &self.vertices[v.index() as usize]
    }

    pub(crate) fn vertex_mut(&mut self, v: VH) -> &mut Vertex {
        &mut self.vertices[v.index() as usize]
    }

    pub(crate) fn halfedge(&self, h: HH) -> &Halfedge {
        &self.edges[(h.index() >> 1) as usize].halfedges[(h.index() & 1) as usize]
    }

    pub(crate) fn halfedge_mut(&mut self, h: HH) -> &mut Halfedge {
        &mut self.edges[(h.index() >> 1) as usize].halfedges[(h.index() & 1) as usize]
    }

    pub(crate) fn face(&self, f: FH) -> &Face {
        &self.faces[f.index() as usize]
    }

    pub(crate) fn face_mut(&mut self, f: FH) -> &mut Face {
        &mut self.faces[f.index() as usize]
    }

    pub fn vertex_halfedge(&self, v: VH) -> Option<HH> {
        self.vertex(v).halfedge
    }

    pub fn to_vertex(&self, h: HH) -> VH {
        self.halfedge(h).vertex
    }

    pub fn from_vertex(&self, h: HH) -> VH {
        self.halfedge(h.opposite()).vertex
    }

    pub fn prev_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).prev
    }

    pub fn next_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).next
    }

    pub fn opposite_halfedge(&self, h: HH) -> HH {
        h.opposite()
    }

    pub fn halfedge_face(&self, h: HH) -> Option<FH> {
        self.halfedge(h).face
    }

    pub fn halfedge_edge(&self, h: HH) -> EH {
        h.edge()
    }

    pub fn edge_halfedge(&self, e: EH, flag: bool) -> HH {
        e.halfedge(flag)
    }

    pub fn edge_vertex(&self, e: EH, flag: bool) -> VH {
        self.to_vertex(e.halfedge(flag))
    }

    pub fn face_halfedge(&self, f: FH) -> HH {
        self.face(f).halfedge
    }

    pub fn is_boundary_halfedge(&self, h: HH) -> bool {
        self.halfedge(h).face.is_none()
    }

    pub fn is_boundary_edge(&self, e: EH) -> bool {
        let (h, oh) = e.halfedges();
        self.is_boundary_halfedge(h) || self.is_boundary_halfedge(oh)
    }

    /// A vertex is on the boundary if its outgoing halfedge is on the
    /// boundary. The outgoing halfedges are kept such that this is true if
    /// any of the outgoing halfedges is on the boundary. Isolated vertices are
    /// considered boundary vertices.
    pub fn is_boundary_vertex(&self, v: VH) -> bool {
        match self.vertex(v).halfedge {
            Some(h) => self.is_boundary_halfedge(h),
            None => true,
        }
    }

    pub fn is_isolated_vertex(&self, v: VH) -> bool {
        self.vertex(v).halfedge.is_none()
    }

    pub fn cw_rotated_halfedge(&self, h: HH) -> HH {
        self.halfedge(h.opposite()).next
    }

    pub fn ccw_rotated_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).prev.opposite()
    }

    /// Number of vertices, including the ones that are deleted but not yet
    /// garbage collected.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_halfedges(&self) -> usize {
        self.num_edges() * 2
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_deleted_vertices(&self) -> usize {
        self.num_deleted_vertices
    }

    pub fn num_deleted_edges(&self) -> usize {
        self.num_deleted_edges
    }

    pub fn num_deleted_faces(&self) -> usize {
        self.num_deleted_faces
    }

    /// Check if any elements are deleted and waiting to be garbage collected.
    pub fn has_garbage(&self) -> bool {
        self.num_deleted_vertices > 0 || self.num_deleted_edges > 0 || self.num_deleted_faces > 0
    }

    pub fn is_deleted_vertex(&self, v: VH) -> bool {
        self.num_deleted_vertices > 0 && self.vdeleted.try_borrow().expect(DELETED_BORROWED)[v]
    }

    pub fn is_deleted_edge(&self, e: EH) -> bool {
        self.num_deleted_edges > 0 && self.edeleted.try_borrow().expect(DELETED_BORROWED)[e]
    }

    /// A halfedge is deleted when its edge is deleted.
    pub fn is_deleted_halfedge(&self, h: HH) -> bool {
        self.is_deleted_edge(h.edge())
    }

    pub fn is_deleted_face(&self, f: FH) -> bool {
        self.num_deleted_faces > 0 && self.fdeleted.try_borrow().expect(DELETED_BORROWED)[f]
    }

    pub fn is_valid_vertex(&self, v: VH) -> bool {
        (v.index() as usize) < self.num_vertices() && !self.is_deleted_vertex(v)
    }

    pub fn is_valid_halfedge(&self, h: HH) -> bool {
        (h.index() as usize) < self.num_halfedges() && !self.is_deleted_halfedge(h)
    }

    pub fn is_valid_edge(&self, e: EH) -> bool {
        (e.index() as usize) < self.num_edges() && !self.is_deleted_edge(e)
    }

    pub fn is_valid_face(&self, f: FH) -> bool {
        (f.index() as usize) < self.num_faces() && !self.is_deleted_face(f)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VH> {
        let skip = self.num_deleted_vertices > 0;
        let deleted = self.vdeleted.try_borrow().expect(DELETED_BORROWED);
        (0..(self.num_vertices() as u32))
            .map(VH::from)
            .filter(move |v| !(skip && deleted[*v]))
    }

    pub fn halfedges(&self) -> impl Iterator<Item = HH> {
        let skip = self.num_deleted_edges > 0;
        let deleted = self.edeleted.try_borrow().expect(DELETED_BORROWED);
        (0..(self.num_halfedges() as u32))
            .map(HH::from)
            .filter(move |h| !(skip && deleted[h.edge()]))
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> {
        let skip = self.num_deleted_edges > 0;
        let deleted = self.edeleted.try_borrow().expect(DELETED_BORROWED);
        (0..(self.num_edges() as u32))
            .map(EH::from)
            .filter(move |e| !(skip && deleted[*e]))
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> {
        let skip = self.num_deleted_faces > 0;
        let deleted = self.fdeleted.try_borrow().expect(DELETED_BORROWED);
        (0..(self.num_faces() as u32))
            .map(FH::from)
            .filter(move |f| !(skip && deleted[*f]))
    }

    pub fn find_halfedge(&self, from: VH, to: VH) -> Option<HH> {
        iterator::voh_ccw_iter(self, from).find(|h| self.to_vertex(*h) == to)
    }

    pub fn find_edge(&self, a: VH, b: VH) -> Option<EH> {
        self.find_halfedge(a, b).map(|h| h.edge())
    }

    pub fn is_manifold_vertex(&self, v: VH) -> bool {
        /* If just the first outgoing halfedge is on the boundary, it just means
         * the vertex is on the boundary. If the first outgoing halfedge is not
         * on the boundary, it implies the vertex is in the interior. In both
         * cases the vertex is manifold. If any outgoing halfedge apart from the
         * first is on the boundary, there is more than one gap when circulating
         * around the vertex, making it non-manifold. So we skip the first
         * halfedge and check the rest.
         */
        iterator::voh_ccw_iter(self, v)
            .skip(1)
            .all(|h| !self.is_boundary_halfedge(h))
    }

    pub fn vertex_valence(&self, v: VH) -> usize {
        iterator::voh_ccw_iter(self, v).count()
    }

    pub fn face_valence(&self, f: FH) -> usize {
        iterator::fh_ccw_iter(self, f).count()
    }

    pub fn is_triangle_mesh(&self) -> bool {
        self.faces().all(|f| self.face_valence(f) == 3)
    }

    pub fn is_quad_mesh(&self) -> bool {
        self.faces().all(|f| self.face_valence(f) == 4)
    }

    /// Make the outgoing halfedge of `v` a boundary halfedge, if there is one.
    pub(crate) fn adjust_outgoing_halfedge(&mut self, v: VH) {
        let h = iterator::voh_ccw_iter(self, v).find(|h| self.is_boundary_halfedge(*h));
        if let Some(h) = h {
            self.vertex_mut(v).halfedge = Some(h);
        }
    }

    pub(crate) fn link_halfedges(&mut self, hprev: HH, hnext: HH) {
        self.halfedge_mut(hprev).next = hnext;
        self.halfedge_mut(hnext).prev = hprev;
    }

    pub fn add_vertex(&mut self) -> Result<VH, Error> {
        let vi = self.vertices.len() as u32;
        self.vprops.push_value()?;
        self.vertices.push(Vertex { halfedge: None });
        Ok(vi.into())
    }

    /// Add `n` isolated vertices, and return the range of their indices.
    pub fn add_vertices(&mut self, n: usize) -> Result<std::ops::Range<u32>, Error> {
        let start = self.vertices.len() as u32;
        self.vprops.push_values(n)?;
        self.vertices
            .resize(self.vertices.len() + n, Vertex { halfedge: None });
        Ok(start..(start + n as u32))
    }

    /// Create a new edge from `from` to `to`. The halfedge pointing to `to` is
    /// linked between `prev` and `next`, and the opposite halfedge is linked
    /// between `opp_prev` and `opp_next`. The links of the neighbors are not
    /// touched.
    pub(crate) fn new_edge(
        &mut self,
        from: VH,
        to: VH,
        prev: HH,
        next: HH,
        opp_prev: HH,
        opp_next: HH,
    ) -> Result<EH, Error> {
        self.eprops.ensure_unborrowed()?;
        self.hprops.ensure_unborrowed()?;
        let ei = self.edges.len() as u32;
        self.eprops.push_value()?;
        self.hprops.push_values(2)?;
        self.edges.push(Edge {
            halfedges: [
                Halfedge {
                    face: None,
                    vertex: to,
                    next,
                    prev,
                },
                Halfedge {
                    face: None,
                    vertex: from,
                    next: opp_next,
                    prev: opp_prev,
                },
            ],
        });
        Ok(ei.into())
    }

    pub(crate) fn new_face(&mut self, halfedge: HH) -> Result<FH, Error> {
        let fi = self.faces.len() as u32;
        self.fprops.push_value()?;
        self.faces.push(Face { halfedge });
        Ok(fi.into())
    }

    /// Decide how a face with the given vertices will be added, without
    /// modifying anything. The decisions are recorded in `cache`.
    fn plan_face(&self, verts: &[VH], cache: &mut TopolCache) -> Result<(), Error> {
        if verts.len() < 3 {
            return Err(Error::InvalidFaceDegree(verts.len()));
        }
        if let Some(v) = verts.iter().find(|v| !self.is_valid_vertex(**v)) {
            return Err(Error::InvalidVertex(*v));
        }
        if verts
            .iter()
            .enumerate()
            .any(|(i, v)| verts[..i].contains(v))
        {
            return Err(Error::DegenerateFace);
        }
        cache.loop_halfedges.reserve(verts.len());
        cache.needs_adjust.reserve(verts.len());
        cache.next_cache.reserve(verts.len() * 6);
        // Check for topological errors.
        for i in 0..verts.len() {
            if !self.is_boundary_vertex(verts[i]) {
                // Ensure vertex is manifold.
                return Err(Error::ComplexVertex(verts[i]));
            }
            // Ensure edge is manifold.
            let h = self.find_halfedge(verts[i], verts[(i + 1) % verts.len()]);
            match h {
                Some(h) if !self.is_boundary_halfedge(h) => return Err(Error::ComplexHalfedge(h)),
                _ => {} // Do nothing.
            }
            cache.loop_halfedges.push(h);
            cache.needs_adjust.push(false);
        }
        // If a vertex has more than one gap between its faces, the patches
        // around it may need relinking to make room for the new face.
        for (prev, next) in (0..verts.len()).filter_map(|i| {
            match (
                cache.loop_halfedges[i],
                cache.loop_halfedges[(i + 1) % verts.len()],
            ) {
                (Some(prev), Some(next)) if self.next_halfedge(prev) != next => Some((prev, next)),
                _ => None,
            }
        }) {
            // Look for another gap around the vertex, rotating away from `next`.
            let mut out = next;
            let boundprev = loop {
                out = self.cw_rotated_halfedge(out);
                if out == next {
                    return Err(Error::PatchRelinkingFailed);
                }
                let inc = out.opposite();
                if inc != prev && self.is_boundary_halfedge(inc) {
                    break inc;
                }
            };
            let boundnext = self.next_halfedge(boundprev);
            if boundnext == next {
                return Err(Error::PatchRelinkingFailed);
            }
            debug_assert!(
                self.is_boundary_halfedge(boundprev) && self.is_boundary_halfedge(boundnext)
            );
            // The patch between `prev` and `next` is moved into the other gap.
            let pstart = self.next_halfedge(prev);
            let pend = self.prev_halfedge(next);
            cache.next_cache.extend_from_slice(&[
                (boundprev, pstart),
                (pend, boundnext),
                (prev, next),
            ]);
        }
        // Plan the boundary loop of the new face.
        cache.tentative.reserve(verts.len());
        {
            let mut ei = self.edges.len() as u32;
            cache
                .tentative
                .extend((0..verts.len()).map(|i| match cache.loop_halfedges[i] {
                    Some(h) => TentativeEdge::Old(h),
                    None => TentativeEdge::New {
                        index: {
                            let current = ei;
                            ei += 1;
                            current << 1
                        },
                        from: verts[i],
                        to: verts[(i + 1) % verts.len()],
                        prev: None,
                        next: None,
                        opp_prev: None,
                        opp_next: None,
                    },
                }));
        }
        for (i, j) in (0..verts.len()).map(|i| (i, (i + 1) % verts.len())) {
            let (e0, e1) = if j == 0 {
                let (right, left) = cache.tentative.split_at_mut(i);
                (&mut left[0], &mut right[0])
            } else {
                let (left, right) = cache.tentative.split_at_mut(j);
                (&mut left[left.len() - 1], &mut right[0])
            };
            let v = verts[j];
            match (e0, e1) {
                (TentativeEdge::Old(_), TentativeEdge::Old(innernext)) => {
                    cache.needs_adjust[j] = self.vertex_halfedge(v) == Some(*innernext);
                }
                (
                    TentativeEdge::New {
                        index: innerprev,
                        opp_prev,
                        next,
                        ..
                    },
                    TentativeEdge::Old(innernext),
                ) => {
                    let innernext = *innernext;
                    let innerprev: HH = innerprev.into();
                    let outernext = innerprev.opposite();
                    let boundprev = self.prev_halfedge(innernext);
                    cache.next_cache.push((boundprev, outernext));
                    *opp_prev = Some(boundprev);
                    cache.next_cache.push((innerprev, innernext));
                    *next = Some(innernext);
                    cache.vertex_cache.push((v, outernext));
                }
                (
                    TentativeEdge::Old(innerprev),
                    TentativeEdge::New {
                        index: innernext,
                        prev,
                        opp_next,
                        ..
                    },
                ) => {
                    let innerprev = *innerprev;
                    let innernext: HH = innernext.into();
                    let outerprev = innernext.opposite();
                    let boundnext = self.next_halfedge(innerprev);
                    cache.next_cache.push((outerprev, boundnext));
                    *opp_next = Some(boundnext);
                    cache.next_cache.push((innerprev, innernext));
                    *prev = Some(innerprev);
                    cache.vertex_cache.push((v, boundnext));
                }
                (
                    TentativeEdge::New {
                        index: innerprev,
                        next,
                        opp_prev,
                        ..
                    },
                    TentativeEdge::New {
                        index: innernext,
                        prev,
                        opp_next,
                        ..
                    },
                ) => {
                    let innerprev: HH = innerprev.into();
                    let innernext: HH = innernext.into();
                    let outernext = innerprev.opposite();
                    let outerprev = innernext.opposite();
                    if let Some(boundnext) = self.vertex_halfedge(v) {
                        let boundprev = self.prev_halfedge(boundnext);
                        cache
                            .next_cache
                            .extend(&[(boundprev, outernext), (outerprev, boundnext)]);
                        *next = Some(innernext);
                        *opp_prev = Some(boundprev);
                        *prev = Some(innerprev);
                        *opp_next = Some(boundnext);
                    } else {
                        cache.vertex_cache.push((v, outernext));
                        *next = Some(innernext);
                        *opp_prev = Some(outerprev);
                        *prev = Some(innerprev);
                        *opp_next = Some(outernext);
                    }
                }
            };
        }
        Ok(())
    }

    /// Allocate property values for the new edges and faces, all or nothing.
    fn alloc_elements(&mut self, nedges: usize, nfaces: usize) -> Result<(), Error> {
        self.eprops.ensure_unborrowed()?;
        self.hprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        self.eprops.push_values(nedges)?;
        self.hprops.push_values(nedges * 2)?;
        self.fprops.push_values(nfaces)?;
        Ok(())
    }

    /// Add a face with the given vertices, in counter-clockwise order.
    ///
    /// The face is rejected if that would make the mesh non-manifold, and the
    /// mesh is left untouched. Existing boundary halfedges between consecutive
    /// vertices are reused, and new edges are created for the rest.
    pub fn add_face(&mut self, verts: &[VH], cache: &mut TopolCache) -> Result<FH, Error> {
        cache.clear();
        if let Err(e) = self.plan_face(verts, cache) {
            log::warn!("Cannot add face {:?}: {}", verts, e);
            return Err(e);
        }
        let nedges = cache
            .tentative
            .iter()
            .filter(|t| matches!(t, TentativeEdge::New { .. }))
            .count();
        if let Err(e) = self.alloc_elements(nedges, 1) {
            log::warn!("Cannot add face {:?}: {}", verts, e);
            return Err(e);
        }
        // No more errors allowed from this point. If anything goes wrong, we
        // panic.
        cache.halfedges.reserve(cache.tentative.len());
        const ERR: &str = "Unable to create edge loop";
        for tedge in &cache.tentative {
            let h = match tedge {
                TentativeEdge::Old(h) => *h,
                TentativeEdge::New {
                    index,
                    from,
                    to,
                    prev,
                    next,
                    opp_prev,
                    opp_next,
                } => {
                    assert_eq!(
                        (*index >> 1) as usize,
                        self.edges.len(),
                        "Failed to create an edge loop"
                    );
                    self.edges.push(Edge {
                        halfedges: [
                            Halfedge {
                                face: None,
                                vertex: *to,
                                next: next.expect(ERR),
                                prev: prev.expect(ERR),
                            },
                            Halfedge {
                                face: None,
                                vertex: *from,
                                next: opp_next.expect(ERR),
                                prev: opp_prev.expect(ERR),
                            },
                        ],
                    });
                    index.into()
                }
            };
            cache.halfedges.push(h);
        }
        // Create the face.
        let fnew: FH = (self.faces.len() as u32).into();
        self.faces.push(Face {
            halfedge: *cache.halfedges.last().expect(ERR),
        });
        for h in &cache.halfedges {
            self.halfedge_mut(*h).face = Some(fnew);
        }
        for (prev, next) in cache.next_cache.drain(..) {
            self.link_halfedges(prev, next);
        }
        for (v, h) in cache.vertex_cache.drain(..) {
            self.vertex_mut(v).halfedge = Some(h);
        }
        // Adjust vertices' halfedge handles.
        for i in 0..verts.len() {
            if cache.needs_adjust[i] {
                self.adjust_outgoing_halfedge(verts[i]);
            }
        }
        Ok(fnew)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}
