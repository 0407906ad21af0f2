use crate::{
    element::{EH, FH, HH, VH},
    topol::{HasTopology, Topology},
};

/// Circulates the outgoing halfedges of a vertex. Stops when it comes back to
/// the halfedge it started from.
struct OutgoingHalfedgeIter<'a, const CCW: bool> {
    topol: &'a Topology,
    hstart: Option<HH>,
    hcurrent: Option<HH>,
}

impl Iterator for OutgoingHalfedgeIter<'_, true> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.prev_halfedge(current).opposite();
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

impl Iterator for OutgoingHalfedgeIter<'_, false> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.next_halfedge(current.opposite());
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

/// Follows the `next` (or `prev`) links from a halfedge until it comes back
/// to the start.
struct LoopHalfedgeIter<'a, const CCW: bool> {
    topol: &'a Topology,
    hstart: HH,
    hcurrent: Option<HH>,
}

impl Iterator for LoopHalfedgeIter<'_, true> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.next_halfedge(current);
                self.hcurrent = if next == self.hstart {
                    None
                } else {
                    Some(next)
                };
                Some(current)
            }
            None => None,
        }
    }
}

impl Iterator for LoopHalfedgeIter<'_, false> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.prev_halfedge(current);
                self.hcurrent = if next == self.hstart {
                    None
                } else {
                    Some(next)
                };
                Some(current)
            }
            None => None,
        }
    }
}

pub(crate) fn vv_ccw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = VH> + use<'_> {
    voh_ccw_iter(topol, v).map(|h| topol.to_vertex(h))
}

pub(crate) fn vv_cw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = VH> + use<'_> {
    voh_cw_iter(topol, v).map(|h| topol.to_vertex(h))
}

pub(crate) fn vih_ccw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    voh_ccw_iter(topol, v).map(|h| h.opposite())
}

pub(crate) fn vih_cw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    voh_cw_iter(topol, v).map(|h| h.opposite())
}

pub(crate) fn voh_ccw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    let h = topol.vertex_halfedge(v);
    OutgoingHalfedgeIter::<true> {
        topol,
        hstart: h,
        hcurrent: h,
    }
}

pub(crate) fn voh_cw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    let h = topol.vertex_halfedge(v);
    OutgoingHalfedgeIter::<false> {
        topol,
        hstart: h,
        hcurrent: h,
    }
}

pub(crate) fn ve_ccw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = EH> + use<'_> {
    voh_ccw_iter(topol, v).map(|h| h.edge())
}

pub(crate) fn ve_cw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = EH> + use<'_> {
    voh_cw_iter(topol, v).map(|h| h.edge())
}

pub(crate) fn vf_ccw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = FH> + use<'_> {
    voh_ccw_iter(topol, v).filter_map(|h| topol.halfedge_face(h))
}

pub(crate) fn vf_cw_iter(topol: &Topology, v: VH) -> impl Iterator<Item = FH> + use<'_> {
    voh_cw_iter(topol, v).filter_map(|h| topol.halfedge_face(h))
}

pub(crate) fn ev_iter(topol: &Topology, e: EH) -> impl Iterator<Item = VH> + use<'_> {
    eh_iter(e).map(|h| topol.to_vertex(h))
}

pub(crate) fn eh_iter(e: EH) -> impl Iterator<Item = HH> {
    [false, true].into_iter().map(move |flag| e.halfedge(flag))
}

pub(crate) fn ef_iter(topol: &Topology, e: EH) -> impl Iterator<Item = FH> + use<'_> {
    eh_iter(e).filter_map(|h| topol.halfedge_face(h))
}

pub(crate) fn fv_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = VH> + use<'_> {
    fh_ccw_iter(topol, f).map(|h| topol.to_vertex(h))
}

pub(crate) fn fv_cw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = VH> + use<'_> {
    fh_cw_iter(topol, f).map(|h| topol.to_vertex(h))
}

pub(crate) fn fh_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = HH> + use<'_> {
    loop_ccw_iter(topol, topol.face_halfedge(f))
}

pub(crate) fn fh_cw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = HH> + use<'_> {
    loop_cw_iter(topol, topol.face_halfedge(f))
}

pub(crate) fn fe_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = EH> + use<'_> {
    fh_ccw_iter(topol, f).map(|h| h.edge())
}

pub(crate) fn fe_cw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = EH> + use<'_> {
    fh_cw_iter(topol, f).map(|h| h.edge())
}

pub(crate) fn ff_ccw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = FH> + use<'_> {
    fh_ccw_iter(topol, f).filter_map(|h| topol.halfedge_face(h.opposite()))
}

pub(crate) fn ff_cw_iter(topol: &Topology, f: FH) -> impl Iterator<Item = FH> + use<'_> {
    fh_cw_iter(topol, f).filter_map(|h| topol.halfedge_face(h.opposite()))
}

pub(crate) fn loop_ccw_iter(topol: &Topology, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    LoopHalfedgeIter::<true> {
        topol,
        hstart: h,
        hcurrent: Some(h),
    }
}

pub(crate) fn loop_cw_iter(topol: &Topology, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    LoopHalfedgeIter::<false> {
        topol,
        hstart: h,
        hcurrent: Some(h),
    }
}

/// Circulators around the elements of a mesh.
///
/// Every circulator is a cheap value that holds a reference to the mesh, the
/// halfedge it started from and the current halfedge. It ends after coming
/// back to the start, so calling it again produces the same sequence.
/// Circulating around an isolated vertex yields nothing. This trait is
/// implemented for everything that implements [`HasTopology`].
pub trait HasIterators: HasTopology {
    /// Vertices adjacent to `v`, in counter-clockwise order.
    fn vv_ccw_iter(&self, v: VH) -> impl Iterator<Item = VH> {
        vv_ccw_iter(self.topology(), v)
    }

    /// Vertices adjacent to `v`, in clockwise order.
    fn vv_cw_iter(&self, v: VH) -> impl Iterator<Item = VH> {
        vv_cw_iter(self.topology(), v)
    }

    /// Halfedges pointing towards `v`, in counter-clockwise order.
    fn vih_ccw_iter(&self, v: VH) -> impl Iterator<Item = HH> {
        vih_ccw_iter(self.topology(), v)
    }

    fn vih_cw_iter(&self, v: VH) -> impl Iterator<Item = HH> {
        vih_cw_iter(self.topology(), v)
    }

    /// Halfedges starting at `v`, in counter-clockwise order.
    fn voh_ccw_iter(&self, v: VH) -> impl Iterator<Item = HH> {
        voh_ccw_iter(self.topology(), v)
    }

    fn voh_cw_iter(&self, v: VH) -> impl Iterator<Item = HH> {
        voh_cw_iter(self.topology(), v)
    }

    fn ve_ccw_iter(&self, v: VH) -> impl Iterator<Item = EH> {
        ve_ccw_iter(self.topology(), v)
    }

    fn ve_cw_iter(&self, v: VH) -> impl Iterator<Item = EH> {
        ve_cw_iter(self.topology(), v)
    }

    /// Faces incident on `v`, in counter-clockwise order. Gaps in the
    /// boundary are skipped.
    fn vf_ccw_iter(&self, v: VH) -> impl Iterator<Item = FH> {
        vf_ccw_iter(self.topology(), v)
    }

    fn vf_cw_iter(&self, v: VH) -> impl Iterator<Item = FH> {
        vf_cw_iter(self.topology(), v)
    }

    /// The two vertices of `e`.
    fn ev_iter(&self, e: EH) -> impl Iterator<Item = VH> {
        ev_iter(self.topology(), e)
    }

    /// The two halfedges of `e`.
    fn eh_iter(&self, e: EH) -> impl Iterator<Item = HH> {
        eh_iter(e)
    }

    /// Faces incident on `e`. There can be at most two.
    fn ef_iter(&self, e: EH) -> impl Iterator<Item = FH> {
        ef_iter(self.topology(), e)
    }

    /// Halfedges of `f`, following the `next` links.
    fn fh_ccw_iter(&self, f: FH) -> impl Iterator<Item = HH> {
        fh_ccw_iter(self.topology(), f)
    }

    fn fh_cw_iter(&self, f: FH) -> impl Iterator<Item = HH> {
        fh_cw_iter(self.topology(), f)
    }

    /// Vertices of `f`, in counter-clockwise order.
    fn fv_ccw_iter(&self, f: FH) -> impl Iterator<Item = VH> {
        fv_ccw_iter(self.topology(), f)
    }

    fn fv_cw_iter(&self, f: FH) -> impl Iterator<Item = VH> {
        fv_cw_iter(self.topology(), f)
    }

    fn fe_ccw_iter(&self, f: FH) -> impl Iterator<Item = EH> {
        fe_ccw_iter(self.topology(), f)
    }

    fn fe_cw_iter(&self, f: FH) -> impl Iterator<Item = EH> {
        fe_cw_iter(self.topology(), f)
    }

    /// Faces that share an edge with `f`.
    fn ff_ccw_iter(&self, f: FH) -> impl Iterator<Item = FH> {
        ff_ccw_iter(self.topology(), f)
    }

    fn ff_cw_iter(&self, f: FH) -> impl Iterator<Item = FH> {
        ff_cw_iter(self.topology(), f)
    }

    /// Halfedges of the loop containing `h`, following the `next` links.
    /// This works for boundary loops too.
    fn loop_ccw_iter(&self, h: HH) -> impl Iterator<Item = HH> {
        loop_ccw_iter(self.topology(), h)
    }

    fn loop_cw_iter(&self, h: HH) -> impl Iterator<Item = HH> {
        loop_cw_iter(self.topology(), h)
    }
}

impl<T> HasIterators for T where T: HasTopology {}

#[cfg(test)]
mod test {
    use crate::{
        element::Handle,
        iterator::{
            ef_iter, ev_iter, ff_ccw_iter, ff_cw_iter, fv_ccw_iter, fv_cw_iter, loop_ccw_iter,
            vf_ccw_iter, vf_cw_iter, vih_ccw_iter, vih_cw_iter, voh_ccw_iter, voh_cw_iter,
            vv_ccw_iter, vv_cw_iter,
        },
        topol::{
            Topology,
            test::{loop_mesh, quad_box},
        },
    };

    #[test]
    fn t_box_vv_ccw_iter() {
        let qbox = quad_box();
        for (vi, vis) in [
            (0u32, [4u32, 3, 1]),
            (1u32, [2u32, 5, 0]),
            (2u32, [3u32, 6, 1]),
            (3u32, [0u32, 7, 2]),
            (4u32, [5u32, 7, 0]),
            (5u32, [6u32, 4, 1]),
            (6u32, [7u32, 5, 2]),
            (7u32, [4u32, 6, 3]),
        ] {
            assert_eq!(
                vv_ccw_iter(&qbox, vi.into())
                    .map(|v| v.index())
                    .collect::<Vec<_>>(),
                vis
            );
        }
    }

    #[test]
    fn t_box_vv_cw_iter() {
        let qbox = quad_box();
        for (vi, fis) in [
            (0u32, [4, 1, 3]),
            (1u32, [2, 0, 5]),
            (2u32, [3, 1, 6]),
            (3u32, [0, 2, 7]),
            (4u32, [5, 0, 7]),
            (5u32, [6, 1, 4]),
            (6u32, [7, 2, 5]),
            (7u32, [4, 3, 6]),
        ] {
            assert_eq!(
                vv_cw_iter(&qbox, vi.into())
                    .map(|x| x.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_box_vih_iter() {
        let qbox = quad_box();
        for v in qbox.vertices() {
            assert!(
                vih_ccw_iter(&qbox, v).all(|h| qbox.to_vertex(h) == v && qbox.from_vertex(h) != v)
            );
            assert!(
                vih_cw_iter(&qbox, v).all(|h| qbox.to_vertex(h) == v && qbox.from_vertex(h) != v)
            );
        }
    }

    #[test]
    fn t_box_voh_iter() {
        let qbox = quad_box();
        for v in qbox.vertices() {
            assert!(
                voh_ccw_iter(&qbox, v).all(|h| qbox.from_vertex(h) == v && qbox.to_vertex(h) != v)
            );
            assert!(
                voh_cw_iter(&qbox, v).all(|h| qbox.from_vertex(h) == v && qbox.to_vertex(h) != v)
            );
            // Circulators are restartable and finite.
            let first: Vec<_> = voh_ccw_iter(&qbox, v).collect();
            let second: Vec<_> = voh_ccw_iter(&qbox, v).collect();
            assert_eq!(first, second);
            assert_eq!(first.len(), 3);
        }
    }

    #[test]
    fn t_box_vf_ccw_iter() {
        let qbox = quad_box();
        for (vi, fis) in [
            (0u32, [4u32, 0, 1]),
            (1u32, [2u32, 1, 0]),
            (2u32, [3u32, 2, 0]),
            (3u32, [4u32, 3, 0]),
            (4u32, [5u32, 4, 1]),
            (5u32, [5u32, 1, 2]),
            (6u32, [5u32, 2, 3]),
            (7u32, [5u32, 3, 4]),
        ] {
            assert_eq!(
                vf_ccw_iter(&qbox, vi.into())
                    .map(|x| x.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_box_vf_cw_iter() {
        let qbox = quad_box();
        for (vi, fis) in [
            (0u32, [4u32, 1, 0]),
            (1, [2, 0, 1]),
            (2, [3, 0, 2]),
            (3, [4, 0, 3]),
            (4, [5, 1, 4]),
            (5, [5, 2, 1]),
            (6, [5, 3, 2]),
            (7, [5, 4, 3]),
        ] {
            assert_eq!(
                vf_cw_iter(&qbox, vi.into())
                    .map(|x| x.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_box_fv_ccw_iter() {
        let qbox = quad_box();
        for (fi, vis) in [
            (0u32, [0, 3, 2, 1]),
            (1u32, [0, 1, 5, 4]),
            (2u32, [1, 2, 6, 5]),
            (3u32, [2, 3, 7, 6]),
            (4u32, [3, 0, 4, 7]),
            (5u32, [4, 5, 6, 7]),
        ] {
            assert_eq!(
                fv_ccw_iter(&qbox, fi.into())
                    .map(|x| x.index())
                    .collect::<Vec<_>>(),
                vis
            );
        }
    }

    #[test]
    fn t_box_fv_cw_iter() {
        let qbox = quad_box();
        for (fi, vis) in [
            (0u32, [0, 1, 2, 3]),
            (1u32, [0, 4, 5, 1]),
            (2u32, [1, 5, 6, 2]),
            (3u32, [2, 6, 7, 3]),
            (4u32, [3, 7, 4, 0]),
            (5u32, [4, 7, 6, 5]),
        ] {
            assert_eq!(
                fv_cw_iter(&qbox, fi.into())
                    .map(|x| x.index())
                    .collect::<Vec<_>>(),
                vis
            );
        }
    }

    #[test]
    fn t_box_ff_ccw_iter() {
        let qbox = quad_box();
        for (fi, fis) in [
            (0u32, [1, 4, 3, 2]),
            (1u32, [4, 0, 2, 5]),
            (2u32, [1, 0, 3, 5]),
            (3u32, [2, 0, 4, 5]),
            (4u32, [3, 0, 1, 5]),
            (5u32, [4, 1, 2, 3]),
        ] {
            assert_eq!(
                ff_ccw_iter(&qbox, fi.into())
                    .map(|f| f.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_box_ff_cw_iter() {
        let qbox = quad_box();
        for (fi, fis) in [
            (0u32, [1, 2, 3, 4]),
            (1u32, [4, 5, 2, 0]),
            (2u32, [1, 5, 3, 0]),
            (3u32, [2, 5, 4, 0]),
            (4u32, [3, 5, 1, 0]),
            (5u32, [4, 3, 2, 1]),
        ] {
            assert_eq!(
                ff_cw_iter(&qbox, fi.into())
                    .map(|f| f.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_box_edge_iters() {
        let qbox = quad_box();
        for e in qbox.edges() {
            let verts: Vec<_> = ev_iter(&qbox, e).collect();
            assert_eq!(verts.len(), 2);
            assert_ne!(verts[0], verts[1]);
            assert_eq!(ef_iter(&qbox, e).count(), 2);
        }
    }

    #[test]
    fn t_loop_mesh_vf_ccw_iter() {
        let topol = loop_mesh();
        for (v, fis) in [
            (0u32, vec![0u32]),
            (1, vec![1, 0]),
            (2, vec![2, 1]),
            (3, vec![2]),
            (4, vec![0, 3]),
            (5, vec![3, 0, 1]),
            (6, vec![1, 2, 4]),
            (7, vec![4, 2]),
            (8, vec![3, 5]),
            (9, vec![6, 5, 3]),
            (10, vec![4, 7, 6]),
            (11, vec![7, 4]),
            (12, vec![5]),
            (13, vec![5, 6]),
            (14, vec![6, 7]),
            (15, vec![7]),
        ] {
            assert_eq!(
                vf_ccw_iter(&topol, v.into())
                    .map(|i| i.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_loop_mesh_vf_cw_iter() {
        let topol = loop_mesh();
        for (v, fis) in [
            (0u32, vec![0u32]),
            (1, vec![0, 1]),
            (2, vec![1, 2]),
            (3, vec![2]),
            (4, vec![3, 0]),
            (5, vec![1, 0, 3]),
            (6, vec![4, 2, 1]),
            (7, vec![2, 4]),
            (8, vec![5, 3]),
            (9, vec![3, 5, 6]),
            (10, vec![6, 7, 4]),
            (11, vec![4, 7]),
            (12, vec![5]),
            (13, vec![6, 5]),
            (14, vec![7, 6]),
            (15, vec![7]),
        ] {
            assert_eq!(
                vf_cw_iter(&topol, v.into())
                    .map(|i| i.index())
                    .collect::<Vec<_>>(),
                fis
            );
        }
    }

    #[test]
    fn t_loop_mesh_boundary_loop() {
        let topol = loop_mesh();
        let h = topol
            .find_halfedge(1.into(), 0.into())
            .expect("Cannot find halfedge");
        assert!(topol.is_boundary_halfedge(h));
        // The outer boundary of the mesh has 12 edges, and the hole in the
        // middle has 4.
        assert_eq!(loop_ccw_iter(&topol, h).count(), 12);
        assert!(loop_ccw_iter(&topol, h).all(|h| topol.is_boundary_halfedge(h)));
        let h = topol
            .find_halfedge(5.into(), 6.into())
            .expect("Cannot find halfedge");
        assert!(topol.is_boundary_halfedge(h));
        assert_eq!(loop_ccw_iter(&topol, h).count(), 4);
    }

    #[test]
    fn t_isolated_vertex() {
        let mut topol = Topology::default();
        let v = topol.add_vertex().expect("Cannot add vertex");
        assert_eq!(voh_ccw_iter(&topol, v).count(), 0);
        assert_eq!(vv_cw_iter(&topol, v).count(), 0);
        assert_eq!(vf_ccw_iter(&topol, v).count(), 0);
    }
}
