use crate::{
    element::Handle,
    error::Error,
    iterator,
    mesh::{Adaptor, PolyMeshT},
    topol::Topology,
};

fn check_vertices(
    mesh: &Topology,
    edeleted: &[bool],
    hvisited: &mut [bool],
) -> Result<(), Error> {
    hvisited.fill(false);
    for v in mesh.vertices() {
        if let Some(h) = mesh.vertex_halfedge(v) {
            if h.index() as usize >= mesh.num_halfedges() {
                return Err(Error::InvalidHalfedge(h));
            }
            if edeleted[h.edge().index() as usize] {
                return Err(Error::DeletedHalfedge(h));
            }
            // The outgoing halfedge must be a boundary halfedge, or none of the
            // halfedges are boundary.
            if !mesh.is_boundary_halfedge(h)
                && iterator::voh_ccw_iter(mesh, v).any(|h| mesh.is_boundary_halfedge(h))
            {
                return Err(Error::OutgoingHalfedgeNotBoundary(v));
            }
            // Outgoing halfedge must point back to this vertex.
            if mesh.from_vertex(h) != v {
                return Err(Error::InvalidOutgoingHalfedges(v));
            }
        }
        // Check ccw iterator.
        for h in iterator::voh_ccw_iter(mesh, v) {
            if std::mem::replace(&mut hvisited[h.index() as usize], true) {
                return Err(Error::InvalidOutgoingHalfedges(v));
            }
        }
        // Check cw iterator.
        for h in iterator::voh_cw_iter(mesh, v) {
            if !std::mem::replace(&mut hvisited[h.index() as usize], false) {
                return Err(Error::InvalidOutgoingHalfedges(v));
            }
        }
    }
    Ok(())
}

fn check_edges(
    mesh: &Topology,
    vdeleted: &[bool],
    edeleted: &[bool],
    fdeleted: &[bool],
    hflags: &mut [bool],
) -> Result<(), Error> {
    for h in mesh.halfedges() {
        let head = mesh.to_vertex(h);
        let tail = mesh.from_vertex(h);
        if head == tail {
            return Err(Error::DegenerateHalfedge(h));
        }
        let hedge = mesh.halfedge(h);
        // Check for deleted.
        if edeleted[hedge.prev.edge().index() as usize] {
            return Err(Error::DeletedHalfedge(hedge.prev));
        }
        if edeleted[hedge.next.edge().index() as usize] {
            return Err(Error::DeletedHalfedge(hedge.next));
        }
        if vdeleted[hedge.vertex.index() as usize] {
            return Err(Error::DeletedVertex(hedge.vertex));
        }
        if let Some(f) = hedge.face {
            if fdeleted[f.index() as usize] {
                return Err(Error::DeletedFace(f));
            }
        }
        // Check connectivity.
        if mesh.next_halfedge(hedge.prev) != h
            || mesh.prev_halfedge(hedge.next) != h
            || head != mesh.from_vertex(hedge.next)
            || tail != mesh.to_vertex(hedge.prev)
        {
            return Err(Error::InvalidHalfedgeLink(h));
        }
        // Halfedge must be found in the circulators around head and tail.
        if !iterator::voh_ccw_iter(mesh, tail).any(|hh| hh == h)
            || !iterator::vih_ccw_iter(mesh, head).any(|hh| hh == h)
        {
            return Err(Error::InvalidHalfedgeVertexLink(h));
        }
    }
    // Every loop must be closed, and have the same face on all its halfedges.
    for h in mesh.halfedges() {
        if hflags[h.index() as usize] {
            continue;
        }
        let f = mesh.halfedge_face(h);
        for h in iterator::loop_ccw_iter(mesh, h) {
            if std::mem::replace(&mut hflags[h.index() as usize], true) {
                return Err(Error::InvalidLoopTopology(h));
            }
            if mesh.halfedge_face(h) != f {
                return Err(Error::InconsistentFaceInLoop(h));
            }
        }
    }
    for h in mesh.halfedges() {
        if !hflags[h.index() as usize] {
            continue;
        }
        for h in iterator::loop_ccw_iter(mesh, h) {
            if !std::mem::replace(&mut hflags[h.index() as usize], false) {
                return Err(Error::InvalidLoopTopology(h));
            }
        }
    }
    debug_assert!(hflags.iter().all(|f| !f));
    Ok(())
}

fn check_faces(mesh: &Topology, edeleted: &[bool]) -> Result<(), Error> {
    for f in mesh.faces() {
        let h = mesh.face_halfedge(f);
        if edeleted[h.edge().index() as usize] {
            return Err(Error::DeletedHalfedge(h));
        }
        if mesh.halfedge_face(h) != Some(f) {
            return Err(Error::InvalidFaceHalfedgeLink(f, h));
        }
    }
    Ok(())
}

impl Topology {
    /// Check the connectivity of all the live elements, and return the first
    /// error found.
    pub fn check_topology(&self) -> Result<(), Error> {
        let vdeleted = self.vdeleted.try_borrow()?;
        let edeleted = self.edeleted.try_borrow()?;
        let fdeleted = self.fdeleted.try_borrow()?;
        // To keep track of visited halfedges.
        let mut hvisited = vec![false; self.num_halfedges()].into_boxed_slice();
        check_vertices(self, &edeleted, &mut hvisited)?;
        check_edges(self, &vdeleted, &edeleted, &fdeleted, &mut hvisited)?;
        check_faces(self, &edeleted)?;
        Ok(())
    }
}

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    /// Check the topology of the mesh.
    ///
    /// This function will return an error if any errors are found in the topology.
    pub fn check_topology(&self) -> Result<(), Error> {
        self.topol.check_topology()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        element::{FH, Handle},
        error::Error,
        topol::test::{loop_mesh, quad_box, tetrahedron},
    };

    #[test]
    fn t_fixtures_are_valid() {
        quad_box().check_topology().expect("Topological errors found");
        loop_mesh()
            .check_topology()
            .expect("Topological errors found");
        tetrahedron()
            .check_topology()
            .expect("Topological errors found");
    }

    #[test]
    fn t_broken_face_link() {
        let mut qbox = quad_box();
        let h = qbox.face_halfedge(0.into());
        qbox.face_mut(0.into()).halfedge = h.opposite();
        assert!(matches!(
            qbox.check_topology(),
            Err(Error::InvalidFaceHalfedgeLink(f, _)) if f == FH::from(0u32)
        ));
    }

    #[test]
    fn t_broken_next_link() {
        let mut qbox = quad_box();
        let h = qbox.face_halfedge(1.into());
        let next = qbox.next_halfedge(h);
        qbox.halfedge_mut(h).next = qbox.next_halfedge(next);
        // The circulators notice this before the links are checked.
        assert!(matches!(
            qbox.check_topology(),
            Err(Error::InvalidOutgoingHalfedges(_)) | Err(Error::InvalidHalfedgeLink(_))
        ));
    }

    #[test]
    fn t_inconsistent_face_in_loop() {
        let mut qbox = quad_box();
        let h = qbox.face_halfedge(2.into());
        let h = qbox.next_halfedge(h);
        qbox.halfedge_mut(h).face = Some(3.into());
        assert!(matches!(
            qbox.check_topology(),
            Err(Error::InconsistentFaceInLoop(_))
        ));
    }

    #[test]
    fn t_outgoing_halfedge_not_boundary() {
        let mut mesh = loop_mesh();
        // Vertex 5 is on the boundary of the hole, but we point it to an
        // interior halfedge.
        let h = mesh
            .find_halfedge(5.into(), 1.into())
            .expect("Cannot find halfedge");
        assert!(!mesh.is_boundary_halfedge(h));
        mesh.vertex_mut(5.into()).halfedge = Some(h);
        assert!(matches!(
            mesh.check_topology(),
            Err(Error::OutgoingHalfedgeNotBoundary(v)) if v.index() == 5
        ));
    }
}
