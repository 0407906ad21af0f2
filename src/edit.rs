use crate::{
    element::{EH, FH, HH, Handle, VH},
    error::Error,
    iterator,
    mesh::{Adaptor, PolyMeshT},
    property::{EPropBuf, FPropBuf, VPropBuf},
    topol::{TopolCache, Topology},
};

/// Mark `handle` as deleted in `flags`, and increment `count` if it wasn't
/// already deleted.
macro_rules! tombstone {
    ($flags:expr, $handle:expr, $count:expr) => {
        if !std::mem::replace(&mut $flags[$handle], true) {
            $count += 1;
        }
    };
}

/// Old to new index map for compacting an array with the given keep mask. The
/// entries of the elements that are not kept are meaningless.
fn compact_map(keep: &[bool]) -> Vec<u32> {
    let mut next = 0u32;
    keep.iter()
        .map(|k| {
            let i = next;
            if *k {
                next += 1;
            }
            i
        })
        .collect()
}

fn retain_masked<T>(items: &mut Vec<T>, keep: &[bool]) {
    debug_assert_eq!(items.len(), keep.len());
    let mut mask = keep.iter();
    items.retain(|_| *mask.next().unwrap_or(&false));
}

impl Topology {
    fn delete_face_impl(
        &mut self,
        f: FH,
        vdeleted: &mut VPropBuf<bool>,
        edeleted: &mut EPropBuf<bool>,
        fdeleted: &mut FPropBuf<bool>,
        cache: &mut TopolCache,
    ) {
        if fdeleted[f] {
            return;
        }
        tombstone!(fdeleted, f, self.num_deleted_faces);
        let hcache = &mut cache.halfedges;
        let ecache = &mut cache.edges;
        let vcache = &mut cache.vertices;
        hcache.clear();
        ecache.clear();
        vcache.clear();
        hcache.extend(iterator::fh_ccw_iter(self, f));
        // Detach the face, and collect the edges that no longer have any faces.
        for h in hcache.iter() {
            self.halfedge_mut(*h).face = None;
            if self.is_boundary_halfedge(h.opposite()) {
                ecache.push(h.edge());
            }
            vcache.push(self.to_vertex(*h));
        }
        for e in ecache.iter() {
            let (h0, h1) = e.halfedges();
            let (v0, next0, prev0) = (
                self.to_vertex(h0),
                self.next_halfedge(h0),
                self.prev_halfedge(h0),
            );
            let (v1, next1, prev1) = (
                self.to_vertex(h1),
                self.next_halfedge(h1),
                self.prev_halfedge(h1),
            );
            self.link_halfedges(prev0, next1);
            self.link_halfedges(prev1, next0);
            tombstone!(edeleted, *e, self.num_deleted_edges);
            // Vertices left without edges are deleted.
            if self.vertex_halfedge(v0) == Some(h1) {
                if next0 == h1 {
                    tombstone!(vdeleted, v0, self.num_deleted_vertices);
                    self.vertex_mut(v0).halfedge = None;
                } else {
                    self.vertex_mut(v0).halfedge = Some(next0);
                }
            }
            if self.vertex_halfedge(v1) == Some(h0) {
                if next1 == h0 {
                    tombstone!(vdeleted, v1, self.num_deleted_vertices);
                    self.vertex_mut(v1).halfedge = None;
                } else {
                    self.vertex_mut(v1).halfedge = Some(next1);
                }
            }
        }
        for v in vcache.iter() {
            self.adjust_outgoing_halfedge(*v);
        }
    }

    /// Delete a face.
    ///
    /// The face is only marked as deleted. The edges of the face that are not
    /// shared with any other face are also deleted, and so are the vertices
    /// that are left without any edges. The deleted elements stay in storage
    /// until [`Self::garbage_collection`] is called. Deleting a face that is
    /// already deleted does nothing.
    pub fn delete_face(&mut self, f: FH, cache: &mut TopolCache) -> Result<(), Error> {
        let mut vprop = self.vdeleted.clone();
        let mut eprop = self.edeleted.clone();
        let mut fprop = self.fdeleted.clone();
        let mut vdeleted = vprop.try_borrow_mut()?;
        let mut edeleted = eprop.try_borrow_mut()?;
        let mut fdeleted = fprop.try_borrow_mut()?;
        self.delete_face_impl(f, &mut vdeleted, &mut edeleted, &mut fdeleted, cache);
        Ok(())
    }

    /// Delete an edge by deleting the faces incident on it.
    pub fn delete_edge(&mut self, e: EH, cache: &mut TopolCache) -> Result<(), Error> {
        let mut vprop = self.vdeleted.clone();
        let mut eprop = self.edeleted.clone();
        let mut fprop = self.fdeleted.clone();
        let mut vdeleted = vprop.try_borrow_mut()?;
        let mut edeleted = eprop.try_borrow_mut()?;
        let mut fdeleted = fprop.try_borrow_mut()?;
        if edeleted[e] {
            return Ok(());
        }
        let (h0, h1) = e.halfedges();
        for f in [self.halfedge_face(h0), self.halfedge_face(h1)]
            .into_iter()
            .flatten()
        {
            self.delete_face_impl(f, &mut vdeleted, &mut edeleted, &mut fdeleted, cache);
        }
        Ok(())
    }

    /// Delete a vertex, and all the faces incident on it. The vertex is
    /// deleted even if it is isolated.
    pub fn delete_vertex(&mut self, v: VH, cache: &mut TopolCache) -> Result<(), Error> {
        let mut vprop = self.vdeleted.clone();
        let mut eprop = self.edeleted.clone();
        let mut fprop = self.fdeleted.clone();
        let mut vdeleted = vprop.try_borrow_mut()?;
        let mut edeleted = eprop.try_borrow_mut()?;
        let mut fdeleted = fprop.try_borrow_mut()?;
        if vdeleted[v] {
            return Ok(());
        }
        let mut faces = std::mem::take(&mut cache.faces);
        faces.clear();
        faces.extend(iterator::vf_ccw_iter(self, v));
        for f in faces.iter() {
            self.delete_face_impl(*f, &mut vdeleted, &mut edeleted, &mut fdeleted, cache);
        }
        cache.faces = faces;
        tombstone!(vdeleted, v, self.num_deleted_vertices);
        self.vertex_mut(v).halfedge = None;
        Ok(())
    }

    /// Remove all deleted elements from storage.
    ///
    /// The surviving elements keep their relative order, but their indices
    /// change. Any handles held from before this call are invalidated. All
    /// properties are compacted along with the elements, so they fail with
    /// [`Error::BorrowedPropertyAccess`] if any of them is borrowed, before
    /// anything is modified.
    pub fn garbage_collection(&mut self) -> Result<(), Error> {
        self.vprops.ensure_unborrowed()?;
        self.hprops.ensure_unborrowed()?;
        self.eprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        if !self.has_garbage() {
            return Ok(());
        }
        let (nverts, nedges, nfaces) = (self.num_vertices(), self.num_edges(), self.num_faces());
        let vkeep: Vec<bool> = self.vdeleted.try_borrow()?.iter().map(|d| !d).collect();
        let ekeep: Vec<bool> = self.edeleted.try_borrow()?.iter().map(|d| !d).collect();
        let fkeep: Vec<bool> = self.fdeleted.try_borrow()?.iter().map(|d| !d).collect();
        let hkeep: Vec<bool> = ekeep.iter().flat_map(|k| [*k, *k]).collect();
        let vmap = compact_map(&vkeep);
        let emap = compact_map(&ekeep);
        let fmap = compact_map(&fkeep);
        let hmap = |h: HH| -> HH {
            ((emap[(h.index() >> 1) as usize] << 1) | (h.index() & 1)).into()
        };
        // Properties.
        self.vprops.compact(&vkeep)?;
        self.hprops.compact(&hkeep)?;
        self.eprops.compact(&ekeep)?;
        self.fprops.compact(&fkeep)?;
        // Connectivity.
        retain_masked(&mut self.vertices, &vkeep);
        retain_masked(&mut self.edges, &ekeep);
        retain_masked(&mut self.faces, &fkeep);
        for vertex in self.vertices.iter_mut() {
            vertex.halfedge = vertex.halfedge.map(hmap);
        }
        for edge in self.edges.iter_mut() {
            for hedge in edge.halfedges.iter_mut() {
                hedge.vertex = vmap[hedge.vertex.index() as usize].into();
                hedge.next = hmap(hedge.next);
                hedge.prev = hmap(hedge.prev);
                hedge.face = hedge.face.map(|f| fmap[f.index() as usize].into());
            }
        }
        for face in self.faces.iter_mut() {
            face.halfedge = hmap(face.halfedge);
        }
        self.vertices.shrink_to_fit();
        self.edges.shrink_to_fit();
        self.faces.shrink_to_fit();
        self.vprops.shrink_to_fit()?;
        self.hprops.shrink_to_fit()?;
        self.eprops.shrink_to_fit()?;
        self.fprops.shrink_to_fit()?;
        self.num_deleted_vertices = 0;
        self.num_deleted_edges = 0;
        self.num_deleted_faces = 0;
        log::debug!(
            "Garbage collection: {} -> {} vertices, {} -> {} edges, {} -> {} faces",
            nverts,
            self.num_vertices(),
            nedges,
            self.num_edges(),
            nfaces,
            self.num_faces()
        );
        Ok(())
    }

    /// Check if an edge can be flipped.
    ///
    /// Only interior edges shared by two triangles can be flipped, and only if
    /// the flipped edge doesn't already exist.
    pub fn is_flip_ok(&self, e: EH) -> bool {
        if !self.is_valid_edge(e) || self.is_boundary_edge(e) {
            return false;
        }
        let (h0, h1) = e.halfedges();
        let is_triangle = |h: HH| match self.halfedge_face(h) {
            Some(f) => self.face_valence(f) == 3,
            None => false,
        };
        if !is_triangle(h0) || !is_triangle(h1) {
            return false;
        }
        let v0 = self.to_vertex(self.next_halfedge(h0));
        let v1 = self.to_vertex(self.next_halfedge(h1));
        v0 != v1 && self.find_halfedge(v0, v1).is_none()
    }

    /// Flip an edge shared by two triangles, so that it connects the two
    /// vertices opposite to it. The edge keeps its index.
    pub fn flip_edge(&mut self, e: EH) -> Result<(), Error> {
        if !self.is_flip_ok(e) {
            return Err(Error::FlipNotAllowed(e));
        }
        let (a0, b0) = e.halfedges();
        let a1 = self.next_halfedge(a0);
        let a2 = self.next_halfedge(a1);
        let b1 = self.next_halfedge(b0);
        let b2 = self.next_halfedge(b1);
        let (va0, va1) = (self.to_vertex(a0), self.to_vertex(a1));
        let (vb0, vb1) = (self.to_vertex(b0), self.to_vertex(b1));
        let (fa, fb) = (self.halfedge_face(a0), self.halfedge_face(b0));
        // Rewire halfedge -> vertex.
        self.halfedge_mut(a0).vertex = va1;
        self.halfedge_mut(b0).vertex = vb1;
        // Rewire halfedge -> halfedge.
        self.link_halfedges(a0, a2);
        self.link_halfedges(a2, b1);
        self.link_halfedges(b1, a0);
        self.link_halfedges(b0, b2);
        self.link_halfedges(b2, a1);
        self.link_halfedges(a1, b0);
        // Rewire halfedge -> face.
        self.halfedge_mut(a1).face = fb;
        self.halfedge_mut(b1).face = fa;
        // Rewire face -> halfedge.
        if let Some(fa) = fa {
            self.face_mut(fa).halfedge = a0;
        }
        if let Some(fb) = fb {
            self.face_mut(fb).halfedge = b0;
        }
        // Rewire vertex -> halfedge.
        if self.vertex_halfedge(va0) == Some(b0) {
            self.vertex_mut(va0).halfedge = Some(a1);
        }
        if self.vertex_halfedge(vb0) == Some(a0) {
            self.vertex_mut(vb0).halfedge = Some(b1);
        }
        Ok(())
    }

    /// Check if it is safe to collapse the halfedge `h`, i.e. to merge its
    /// tail into its head.
    ///
    /// This only checks the topology, and doesn't account for the shape of
    /// the mesh. The one rings of the two vertices must only share the
    /// vertices opposite to the edge, and the collapse must not merge two
    /// different boundaries.
    pub fn is_collapse_ok(&self, h: HH) -> bool {
        if !self.is_valid_halfedge(h) {
            return false;
        }
        let oh = h.opposite();
        let v0 = self.to_vertex(oh);
        let v1 = self.to_vertex(h);
        // The edges of the triangles being collapsed must not both be on the
        // boundary.
        let opposite_vertex = |h: HH| -> Result<Option<VH>, ()> {
            if self.is_boundary_halfedge(h) {
                return Ok(None);
            }
            let h1 = self.next_halfedge(h);
            let h2 = self.next_halfedge(h1);
            if self.is_boundary_halfedge(h1.opposite()) && self.is_boundary_halfedge(h2.opposite())
            {
                return Err(());
            }
            Ok(Some(self.to_vertex(h1)))
        };
        let (vl, vr) = match (opposite_vertex(h), opposite_vertex(oh)) {
            (Ok(vl), Ok(vr)) => (vl, vr),
            _ => return false,
        };
        if vl == vr {
            return false;
        }
        // Collapsing an interior edge between two boundary vertices would join
        // two boundaries.
        if self.is_boundary_vertex(v0)
            && self.is_boundary_vertex(v1)
            && !self.is_boundary_halfedge(h)
            && !self.is_boundary_halfedge(oh)
        {
            return false;
        }
        // Link condition.
        iterator::vv_ccw_iter(self, v0).all(|v| {
            v == v1
                || Some(v) == vl
                || Some(v) == vr
                || self.find_halfedge(v, v1).is_none()
        })
    }

    fn collapse_degenerate_loop(
        &mut self,
        h: HH,
        edeleted: &mut EPropBuf<bool>,
        fdeleted: &mut FPropBuf<bool>,
    ) {
        let h1 = self.next_halfedge(h);
        let o = h.opposite();
        let o1 = h1.opposite();
        let v0 = self.to_vertex(h);
        let v1 = self.to_vertex(h1);
        let fh = self.halfedge_face(h);
        let fo = self.halfedge_face(o);
        debug_assert_eq!(self.next_halfedge(h1), h);
        debug_assert_ne!(h1, o);
        // Rewire halfedge -> halfedge.
        self.link_halfedges(h1, self.next_halfedge(o));
        self.link_halfedges(self.prev_halfedge(o), h1);
        // Rewire halfedge -> face.
        self.halfedge_mut(h1).face = fo;
        // Rewire vertex -> halfedge.
        self.vertex_mut(v0).halfedge = Some(h1);
        self.adjust_outgoing_halfedge(v0);
        self.vertex_mut(v1).halfedge = Some(o1);
        self.adjust_outgoing_halfedge(v1);
        // Rewire face -> halfedge.
        if let Some(fo) = fo {
            if self.face_halfedge(fo) == o {
                self.face_mut(fo).halfedge = h1;
            }
        }
        if let Some(fh) = fh {
            tombstone!(fdeleted, fh, self.num_deleted_faces);
        }
        tombstone!(edeleted, h.edge(), self.num_deleted_edges);
    }

    /// Collapse the halfedge `h`.
    ///
    /// The vertex at the start of the halfedge is deleted, and everything
    /// connected to it is rewired to the vertex the halfedge points to. Faces
    /// that degenerate into two sided loops are removed. The removed elements
    /// are only marked as deleted.
    pub fn collapse_edge(&mut self, h: HH, cache: &mut TopolCache) -> Result<(), Error> {
        if !self.is_collapse_ok(h) {
            return Err(Error::CollapseNotAllowed(h));
        }
        let mut vprop = self.vdeleted.clone();
        let mut eprop = self.edeleted.clone();
        let mut fprop = self.fdeleted.clone();
        let mut vdeleted = vprop.try_borrow_mut()?;
        let mut edeleted = eprop.try_borrow_mut()?;
        let mut fdeleted = fprop.try_borrow_mut()?;
        // Collect neighboring topology.
        let hn = self.next_halfedge(h);
        let hp = self.prev_halfedge(h);
        let o = h.opposite();
        let on = self.next_halfedge(o);
        let op = self.prev_halfedge(o);
        let fh = self.halfedge_face(h);
        let fo = self.halfedge_face(o);
        let vh = self.to_vertex(h);
        let vo = self.to_vertex(o);
        // Rewire halfedge -> vertex.
        let hcache = &mut cache.halfedges;
        hcache.clear();
        hcache.extend(iterator::vih_ccw_iter(self, vo));
        for ih in hcache.drain(..) {
            self.halfedge_mut(ih).vertex = vh;
        }
        // Rewire halfedge -> halfedge.
        self.link_halfedges(hp, hn);
        self.link_halfedges(op, on);
        // Rewire face -> halfedge.
        if let Some(fh) = fh {
            self.face_mut(fh).halfedge = hn;
        }
        if let Some(fo) = fo {
            self.face_mut(fo).halfedge = on;
        }
        // Rewire vertex -> halfedge.
        if self.vertex_halfedge(vh) == Some(o) {
            self.vertex_mut(vh).halfedge = Some(hn);
        }
        self.adjust_outgoing_halfedge(vh);
        self.vertex_mut(vo).halfedge = None;
        tombstone!(edeleted, h.edge(), self.num_deleted_edges);
        tombstone!(vdeleted, vo, self.num_deleted_vertices);
        // Triangles on either side are now two sided loops.
        if self.next_halfedge(self.next_halfedge(hp)) == hp {
            self.collapse_degenerate_loop(hp, &mut edeleted, &mut fdeleted);
        }
        if self.next_halfedge(self.next_halfedge(on)) == on {
            self.collapse_degenerate_loop(on, &mut edeleted, &mut fdeleted);
        }
        Ok(())
    }

    /// Split the face `f` into triangles, by connecting the first vertex of
    /// the face to all other vertices. The first triangle keeps the handle
    /// `f`, and the new faces and halfedges copy the properties of the
    /// original.
    pub fn triangulate_face(&mut self, f: FH) -> Result<(), Error> {
        self.hprops.ensure_unborrowed()?;
        self.eprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        let mut base = self.face_halfedge(f);
        let vstart = self.from_vertex(base);
        let prev = self.prev_halfedge(base);
        let mut next = self.next_halfedge(base);
        while self.to_vertex(self.next_halfedge(next)) != vstart {
            let next2 = self.next_halfedge(next);
            let fnew = self.new_face(base)?;
            let enew = self.new_edge(vstart, self.to_vertex(next), prev, next2, next, base)?;
            let (hnew, ohnew) = enew.halfedges();
            // Link the triangle created.
            self.link_halfedges(base, next);
            self.link_halfedges(next, ohnew);
            self.link_halfedges(ohnew, base);
            // Set face handles.
            self.halfedge_mut(base).face = Some(fnew);
            self.halfedge_mut(next).face = Some(fnew);
            self.halfedge_mut(ohnew).face = Some(fnew);
            // Copy properties.
            self.hprops.copy(prev, ohnew)?;
            self.hprops.copy(prev, hnew)?;
            self.fprops.copy(f, fnew)?;
            // For next iteration.
            base = hnew;
            next = next2;
        }
        // Last face takes the original face handle.
        self.face_mut(f).halfedge = base;
        self.link_halfedges(base, next);
        self.link_halfedges(self.next_halfedge(next), base);
        self.halfedge_mut(base).face = Some(f);
        Ok(())
    }

    /// Triangulate all faces.
    pub fn triangulate(&mut self) -> Result<(), Error> {
        // Faces created during triangulation are already triangles.
        for fi in 0..(self.num_faces() as u32) {
            let f: FH = fi.into();
            if !self.is_deleted_face(f) {
                self.triangulate_face(f)?;
            }
        }
        Ok(())
    }

    /// Split the edge `e` with the isolated vertex `v`, and return the newly
    /// created edge.
    ///
    /// The new edge spans from the tail of the first halfedge of `e` to `v`,
    /// and `e` spans the rest. If `copy_props` is true, the properties of `e`
    /// and its halfedges are copied to the new edge and its halfedges.
    pub fn split_edge(&mut self, e: EH, v: VH, copy_props: bool) -> Result<EH, Error> {
        if !self.is_valid_vertex(v) || !self.is_isolated_vertex(v) {
            return Err(Error::InvalidVertex(v));
        }
        let (h0, h1) = e.halfedges();
        let vfrom = self.from_vertex(h0);
        let (ph0, nh1) = (self.prev_halfedge(h0), self.next_halfedge(h1));
        let (f0, f1) = (self.halfedge_face(h0), self.halfedge_face(h1));
        // Create a new edge and rewire topology.
        let enew = self.new_edge(vfrom, v, ph0, h0, h1, nh1)?;
        let (hnew, ohnew) = enew.halfedges();
        // Rewire halfedge -> vertex.
        self.halfedge_mut(h1).vertex = v;
        // Rewire halfedge -> halfedge.
        self.link_halfedges(hnew, h0);
        self.link_halfedges(h1, ohnew);
        self.link_halfedges(ph0, hnew);
        self.link_halfedges(ohnew, nh1);
        // Rewire halfedge -> face.
        self.halfedge_mut(hnew).face = f0;
        self.halfedge_mut(ohnew).face = f1;
        // Rewire vertex -> halfedge.
        self.vertex_mut(v).halfedge = Some(h0);
        self.adjust_outgoing_halfedge(v);
        if self.vertex_halfedge(vfrom) == Some(h0) {
            self.vertex_mut(vfrom).halfedge = Some(hnew);
            self.adjust_outgoing_halfedge(vfrom);
        }
        if copy_props {
            self.eprops.copy(e, enew)?;
            self.hprops.copy_many(&[h0, h1], &[hnew, ohnew])?;
        }
        Ok(enew)
    }

    /// Split the face `f` into a fan of triangles around the isolated vertex
    /// `v`, with one triangle per halfedge of the face. The triangle
    /// containing the face's halfedge keeps the handle `f`, and the new
    /// faces copy the properties of `f`.
    pub fn split_face(&mut self, f: FH, v: VH, cache: &mut TopolCache) -> Result<(), Error> {
        if !self.is_valid_face(f) {
            return Err(Error::InvalidFace(f));
        }
        if !self.is_valid_vertex(v) || !self.is_isolated_vertex(v) {
            return Err(Error::InvalidVertex(v));
        }
        self.hprops.ensure_unborrowed()?;
        self.eprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        let hcache = &mut cache.halfedges;
        hcache.clear();
        hcache.extend(iterator::fh_ccw_iter(self, f));
        let n = hcache.len();
        // Spoke `i` runs from the head of the i-th halfedge to `v`. Its
        // halfedge pointing to `v` is in triangle `i`, and the opposite one is
        // in triangle `i + 1`.
        let first = self.num_edges() as u32;
        let spoke = |i: usize| -> (HH, HH) { EH::from(first + (i % n) as u32).halfedges() };
        for i in 0..n {
            let (hin, _) = spoke(i);
            let (_, hout_prev) = spoke(i + n - 1);
            let (hin_next, _) = spoke(i + 1);
            self.new_edge(
                self.to_vertex(hcache[i]),
                v,
                hcache[i],
                hout_prev,
                hin_next,
                hcache[(i + 1) % n],
            )?;
            debug_assert_eq!(self.to_vertex(hin), v);
        }
        for i in 0..n {
            let h = hcache[i];
            let (hin, _) = spoke(i);
            let (_, hout) = spoke(i + n - 1);
            let fi = if i == 0 {
                self.face_mut(f).halfedge = h;
                f
            } else {
                let fnew = self.new_face(h)?;
                self.fprops.copy(f, fnew)?;
                fnew
            };
            self.link_halfedges(h, hin);
            self.link_halfedges(hout, h);
            for h in [h, hin, hout] {
                self.halfedge_mut(h).face = Some(fi);
            }
        }
        self.vertex_mut(v).halfedge = Some(spoke(0).1);
        Ok(())
    }

    /// Check if an edge can be inserted from the head of `h0` to the head of
    /// `h1`, splitting their face in two.
    ///
    /// Both halfedges must belong to the same face, and must not be adjacent
    /// in it. The vertices must not already be connected by an edge.
    pub fn is_insert_edge_ok(&self, h0: HH, h1: HH) -> bool {
        if !self.is_valid_halfedge(h0) || !self.is_valid_halfedge(h1) || h0 == h1 {
            return false;
        }
        match (self.halfedge_face(h0), self.halfedge_face(h1)) {
            (Some(f0), Some(f1)) if f0 == f1 => {}
            _ => return false,
        }
        self.next_halfedge(h0) != h1
            && self.next_halfedge(h1) != h0
            && self
                .find_halfedge(self.to_vertex(h0), self.to_vertex(h1))
                .is_none()
    }

    /// Insert an edge from the head of `h0` to the head of `h1`, splitting
    /// their face in two. The face keeps `h0`, and the new face gets `h1` and
    /// copies the properties of the old face. Returns the new halfedge that
    /// follows `h0`.
    pub fn insert_edge(&mut self, h0: HH, h1: HH) -> Result<HH, Error> {
        if !self.is_insert_edge_ok(h0, h1) {
            return Err(Error::InsertEdgeNotAllowed(h0, h1));
        }
        self.hprops.ensure_unborrowed()?;
        self.eprops.ensure_unborrowed()?;
        self.fprops.ensure_unborrowed()?;
        let f0 = self.halfedge_face(h0).ok_or(Error::InsertEdgeNotAllowed(h0, h1))?;
        let (v0, v1) = (self.to_vertex(h0), self.to_vertex(h1));
        let h2 = self.next_halfedge(h0);
        let h3 = self.next_halfedge(h1);
        let (h4, h5) = self.new_edge(v0, v1, h0, h3, h1, h2)?.halfedges();
        let f1 = self.new_face(h1)?;
        self.fprops.copy(f0, f1)?;
        // Rewire halfedge -> halfedge.
        self.link_halfedges(h0, h4);
        self.link_halfedges(h4, h3);
        self.link_halfedges(h1, h5);
        self.link_halfedges(h5, h2);
        // Rewire halfedge -> face.
        self.halfedge_mut(h4).face = Some(f0);
        let mut h = h2;
        loop {
            self.halfedge_mut(h).face = Some(f1);
            h = self.next_halfedge(h);
            if h == h2 {
                break;
            }
        }
        // Rewire face -> halfedge.
        self.face_mut(f0).halfedge = h0;
        Ok(h4)
    }
}

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    /// Delete a face. See [`Topology::delete_face`].
    pub fn delete_face(&mut self, f: FH) -> Result<(), Error> {
        self.topol.delete_face(f, &mut self.cache)
    }

    /// Delete an edge, by deleting the faces incident on it.
    pub fn delete_edge(&mut self, e: EH) -> Result<(), Error> {
        self.topol.delete_edge(e, &mut self.cache)
    }

    /// Delete a vertex, and all the faces incident on it.
    pub fn delete_vertex(&mut self, v: VH) -> Result<(), Error> {
        self.topol.delete_vertex(v, &mut self.cache)
    }

    /// Remove all deleted elements from storage. All handles held from before
    /// this call are invalidated.
    pub fn garbage_collection(&mut self) -> Result<(), Error> {
        self.topol.garbage_collection()
    }

    pub fn is_flip_ok(&self, e: EH) -> bool {
        self.topol.is_flip_ok(e)
    }

    pub fn flip_edge(&mut self, e: EH) -> Result<(), Error> {
        self.topol.flip_edge(e)
    }

    /// Check if it is topologically safe to collapse the halfedge.
    pub fn is_collapse_ok(&self, h: HH) -> bool {
        self.topol.is_collapse_ok(h)
    }

    /// Collapse the halfedge `h`, merging its tail into its head. The position
    /// of the head is not changed.
    pub fn collapse_edge(&mut self, h: HH) -> Result<(), Error> {
        self.topol.collapse_edge(h, &mut self.cache)
    }

    /// Triangulate a face.
    ///
    /// This does not take the geometry / shape of the face into account. This
    /// only accounts for the topology of the face.
    pub fn triangulate_face(&mut self, f: FH) -> Result<(), Error> {
        self.topol.triangulate_face(f)
    }

    /// Triangulate all faces in this mesh.
    pub fn triangulate(&mut self) -> Result<(), Error> {
        self.topol.triangulate()
    }

    /// Split an edge with a new vertex at the given position.
    ///
    /// If successful, a tuple containing the new vertex and the new edge is
    /// returned.
    pub fn split_edge(
        &mut self,
        e: EH,
        pos: A::Vector,
        copy_props: bool,
    ) -> Result<(VH, EH), Error> {
        let v = self.add_vertex(pos)?;
        let enew = self.topol.split_edge(e, v, copy_props)?;
        Ok((v, enew))
    }

    /// Split a face into a fan of triangles around a new vertex at the given
    /// position, and return the new vertex.
    pub fn split_face(&mut self, f: FH, pos: A::Vector) -> Result<VH, Error> {
        if !self.topol.is_valid_face(f) {
            return Err(Error::InvalidFace(f));
        }
        let v = self.add_vertex(pos)?;
        self.topol.split_face(f, v, &mut self.cache)?;
        Ok(v)
    }

    pub fn is_insert_edge_ok(&self, h0: HH, h1: HH) -> bool {
        self.topol.is_insert_edge_ok(h0, h1)
    }

    /// Insert an edge from the head of `h0` to the head of `h1`. See
    /// [`Topology::insert_edge`].
    pub fn insert_edge(&mut self, h0: HH, h1: HH) -> Result<HH, Error> {
        self.topol.insert_edge(h0, h1)
    }
}
