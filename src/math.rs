use std::ops::{Add, Div, Mul, Sub};

use crate::{
    element::{EH, FH, HH, Handle, VH},
    error::Error,
    iterator,
    mesh::{
        Adaptor, CrossProductAdaptor, FloatScalarAdaptor, PolyMeshT, VectorAngleAdaptor,
        VectorLengthAdaptor, VectorNormalizeAdaptor,
    },
    property::{FProperty, VProperty},
    topol::HasTopology,
};

const FACE_NORMALS: &str = "f:normal";
const VERTEX_NORMALS: &str = "v:normal";

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
    A::Vector: Sub<Output = A::Vector>,
{
    /// Compute the vector spanning from the tail of the halfedge to its head.
    pub fn calc_halfedge_vector(&self, h: HH, points: &[A::Vector]) -> A::Vector {
        points[self.to_vertex(h).index() as usize] - points[self.from_vertex(h).index() as usize]
    }

    /// Similar to `calc_halfedge_vector`, except this function borrows the
    /// positions of the vertices and returns an error if that fails.
    pub fn try_calc_halfedge_vector(&self, h: HH) -> Result<A::Vector, Error> {
        let points = self.points.try_borrow()?;
        Ok(self.calc_halfedge_vector(h, &points))
    }
}

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: VectorLengthAdaptor<DIM>,
    A::Vector: Sub<Output = A::Vector>,
{
    /// Length of an edge. `points` must be the positions of the vertices.
    pub fn calc_edge_length(&self, e: EH, points: &[A::Vector]) -> A::Scalar {
        A::vector_length(self.calc_halfedge_vector(e.halfedge(false), points))
    }

    /// Length of an edge. The positions of the vertices are borrowed, and an
    /// error is returned if that fails.
    ///
    /// ```rust
    /// use hemesh::{use_glam::PolyMeshF32, HasTopology};
    ///
    /// let mut mesh = PolyMeshF32::new();
    /// let a = mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).expect("Cannot add vertex");
    /// let b = mesh.add_vertex(glam::vec3(3.0, 0.0, 0.0)).expect("Cannot add vertex");
    /// let c = mesh.add_vertex(glam::vec3(3.0, 4.0, 0.0)).expect("Cannot add vertex");
    /// mesh.add_tri_face(a, b, c).expect("Cannot add face");
    /// let e = mesh.find_edge(c, a).expect("Cannot find edge");
    /// assert_eq!(5.0, mesh.edge_length(e).expect("Cannot compute edge length"));
    /// ```
    pub fn edge_length(&self, e: EH) -> Result<A::Scalar, Error> {
        let points = self.points.try_borrow()?;
        Ok(self.calc_edge_length(e, &points))
    }
}

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
    A::Scalar: PartialOrd,
{
    /// The smallest and the largest corners of the axis aligned box containing
    /// all the vertices that are not deleted. `None` if there are no such
    /// vertices.
    pub fn bounding_box(&self) -> Result<Option<(A::Vector, A::Vector)>, Error> {
        let points = self.points.try_borrow()?;
        let mut verts = self.vertices();
        let first = match verts.next() {
            Some(v) => points[v],
            None => return Ok(None),
        };
        let init: [A::Scalar; DIM] = std::array::from_fn(|i| A::vector_coord(&first, i));
        let (lo, hi) = verts.fold((init, init), |(mut lo, mut hi), v| {
            let p = &points[v];
            for i in 0..DIM {
                let c = A::vector_coord(p, i);
                if c < lo[i] {
                    lo[i] = c;
                }
                if c > hi[i] {
                    hi[i] = c;
                }
            }
            (lo, hi)
        });
        Ok(Some((A::vector(lo), A::vector(hi))))
    }
}

impl<A> PolyMeshT<3, A>
where
    A: VectorNormalizeAdaptor<3> + FloatScalarAdaptor<3>,
    A::Scalar: Mul<Output = A::Scalar> + Add<Output = A::Scalar>,
    A::Vector: Add<Output = A::Vector> + Sub<Output = A::Vector>,
{
    /// Compute the face normal using Newell's method. The `points` must
    /// represent the positions of the vertices.
    ///
    /// Calling this in a hot loop with borrowed points can be faster than
    /// `try_calc_face_normal`, because it avoids repeated borrows.
    pub fn calc_face_normal(&self, f: FH, points: &[A::Vector]) -> A::Vector {
        let zero = A::scalarf64(0.0);
        let (x, y, z) = iterator::fh_ccw_iter(self.topology(), f).fold(
            (zero, zero, zero),
            |(x, y, z): (A::Scalar, A::Scalar, A::Scalar), h| {
                let pc = points[self.from_vertex(h).index() as usize];
                let pn = points[self.to_vertex(h).index() as usize];
                let (a, b) = (pc - pn, pc + pn);
                (
                    x + A::vector_coord(&a, 1) * A::vector_coord(&b, 2),
                    y + A::vector_coord(&a, 2) * A::vector_coord(&b, 0),
                    z + A::vector_coord(&a, 0) * A::vector_coord(&b, 1),
                )
            },
        );
        A::normalized_vec(A::vector([x, y, z]))
    }

    /// Similar to `calc_face_normal`, except this function borrows the
    /// positions of the vertices and returns an error if that fails.
    pub fn try_calc_face_normal(&self, f: FH) -> Result<A::Vector, Error> {
        let points = self.points.try_borrow()?;
        Ok(self.calc_face_normal(f, &points))
    }

    /// Compute the normals of all faces and store them in the `"f:normal"`
    /// property, which is added if it doesn't exist.
    pub fn update_face_normals(&mut self) -> Result<FProperty<A::Vector>, Error> {
        let mut fprop = self
            .face_property(FACE_NORMALS, A::zero_vector())
            .ok_or_else(|| Error::PropertyTypeMismatch(FACE_NORMALS.to_string()))?;
        {
            let mut fnormals = fprop.try_borrow_mut()?;
            let fnormals: &mut [A::Vector] = &mut fnormals;
            let points = self.points.try_borrow()?;
            for f in self.faces() {
                fnormals[f.index() as usize] = self.calc_face_normal(f, &points);
            }
        }
        Ok(fprop)
    }
}

impl<A> PolyMeshT<3, A>
where
    A: CrossProductAdaptor
        + VectorAngleAdaptor
        + VectorLengthAdaptor<3>
        + VectorNormalizeAdaptor<3>
        + FloatScalarAdaptor<3>,
    A::Scalar: Div<Output = A::Scalar> + PartialOrd,
    A::Vector:
        Add<Output = A::Vector> + Sub<Output = A::Vector> + Mul<A::Scalar, Output = A::Vector>,
{
    /// Compute the vertex normal as the sum of the normals of the incident
    /// sectors, each weighted by the angle of the sector at the vertex.
    ///
    /// Isolated vertices, and vertices whose sectors are all degenerate, get a
    /// zero vector.
    pub fn calc_vertex_normal(&self, v: VH, points: &[A::Vector]) -> A::Vector {
        let tiny = A::scalarf32(f32::MIN_POSITIVE);
        let p0 = points[v.index() as usize];
        let total = iterator::voh_ccw_iter(self.topology(), v)
            .filter(|h| !self.is_boundary_halfedge(*h))
            .fold(A::zero_vector(), |total, h| {
                let p1 = points[self.to_vertex(h).index() as usize] - p0;
                let p2 = points[self.from_vertex(self.prev_halfedge(h)).index() as usize] - p0;
                let n = A::cross_product(p1, p2);
                let len = A::vector_length(n);
                if len > tiny {
                    total + n * (A::vector_angle(p1, p2) / len)
                } else {
                    total
                }
            });
        if A::vector_length(total) > tiny {
            A::normalized_vec(total)
        } else {
            A::zero_vector()
        }
    }

    /// Similar to `calc_vertex_normal`, except this function borrows the
    /// positions of the vertices and returns an error if that fails.
    pub fn try_calc_vertex_normal(&self, v: VH) -> Result<A::Vector, Error> {
        let points = self.points.try_borrow()?;
        Ok(self.calc_vertex_normal(v, &points))
    }

    /// Compute the normals of all vertices and store them in the `"v:normal"`
    /// property, which is added if it doesn't exist.
    pub fn update_vertex_normals(&mut self) -> Result<VProperty<A::Vector>, Error> {
        let mut vprop = self
            .vertex_property(VERTEX_NORMALS, A::zero_vector())
            .ok_or_else(|| Error::PropertyTypeMismatch(VERTEX_NORMALS.to_string()))?;
        {
            let mut vnormals = vprop.try_borrow_mut()?;
            let vnormals: &mut [A::Vector] = &mut vnormals;
            let points = self.points.try_borrow()?;
            for v in self.vertices() {
                vnormals[v.index() as usize] = self.calc_vertex_normal(v, &points);
            }
        }
        Ok(vprop)
    }
}

#[cfg(all(test, feature = "use_glam"))]
mod test {
    use crate::{
        element::FH,
        error::Error,
        macros::assert_f32_eq,
        topol::HasTopology,
        use_glam::{PolyMeshF32, test::unit_box},
    };

    #[test]
    fn t_box_face_normals() {
        let qbox = unit_box();
        assert_eq!(
            qbox.faces()
                .map(|f| qbox
                    .try_calc_face_normal(f)
                    .expect("Cannot compute face normal"))
                .collect::<Vec<_>>(),
            &[
                glam::vec3(0.0, 0.0, -1.0),
                glam::vec3(0.0, -1.0, 0.0),
                glam::vec3(1.0, 0.0, 0.0),
                glam::vec3(0.0, 1.0, 0.0),
                glam::vec3(-1.0, 0.0, 0.0),
                glam::vec3(0.0, 0.0, 1.0),
            ]
        );
    }

    #[test]
    fn t_box_update_face_normals() {
        let mut qbox = unit_box();
        assert!(qbox.get_face_property::<glam::Vec3>("f:normal").is_none());
        let fnormals = qbox
            .update_face_normals()
            .expect("Cannot update face normals");
        assert!(
            qbox.get_face_property::<glam::Vec3>("f:normal")
                .is_some_and(|p| p.ptr_eq(&fnormals))
        );
        let fnormals = fnormals.try_borrow().expect("Cannot borrow face normals");
        assert_eq!(fnormals[FH::from(5u32)], glam::vec3(0.0, 0.0, 1.0));
    }

    #[test]
    fn t_face_normals_name_collision() {
        let mut qbox = unit_box();
        qbox.add_face_property("f:normal", 0u8)
            .expect("Cannot add property");
        assert!(matches!(
            qbox.update_face_normals(),
            Err(Error::PropertyTypeMismatch(_))
        ));
    }

    #[test]
    fn t_box_vertex_normals() {
        let mut qbox = unit_box();
        let expected = [
            glam::vec3(-1.0, -1.0, -1.0),
            glam::vec3(1.0, -1.0, -1.0),
            glam::vec3(1.0, 1.0, -1.0),
            glam::vec3(-1.0, 1.0, -1.0),
            glam::vec3(-1.0, -1.0, 1.0),
            glam::vec3(1.0, -1.0, 1.0),
            glam::vec3(1.0, 1.0, 1.0),
            glam::vec3(-1.0, 1.0, 1.0),
        ]
        .map(|v| v.normalize());
        let vnormals = qbox
            .update_vertex_normals()
            .expect("Cannot update vertex normals");
        let vnormals = vnormals.try_borrow().expect("Cannot borrow vertex normals");
        for (n, e) in vnormals.iter().zip(expected.iter()) {
            for i in 0..3 {
                assert_f32_eq!(n[i], e[i], 1e-6);
            }
        }
    }

    #[test]
    fn t_quad_vertex_normals() {
        let mut mesh = PolyMeshF32::new();
        let verts = mesh
            .add_vertices(&[
                glam::vec3(0.0, 0.0, 0.0),
                glam::vec3(2.0, 0.0, 0.0),
                glam::vec3(2.0, 1.0, 0.0),
                glam::vec3(0.0, 1.0, 0.0),
                glam::vec3(5.0, 5.0, 5.0),
            ])
            .expect("Cannot add vertices");
        assert_eq!(verts, 0..5);
        mesh.add_quad_face(0.into(), 1.into(), 2.into(), 3.into())
            .expect("Cannot add face");
        for v in 0u32..4 {
            let n = mesh
                .try_calc_vertex_normal(v.into())
                .expect("Cannot compute vertex normal");
            assert_f32_eq!(n.x, 0.0, 1e-6);
            assert_f32_eq!(n.y, 0.0, 1e-6);
            assert_f32_eq!(n.z, 1.0, 1e-6);
        }
        // Isolated vertex.
        assert_eq!(
            mesh.try_calc_vertex_normal(4.into())
                .expect("Cannot compute vertex normal"),
            glam::Vec3::ZERO
        );
    }

    #[test]
    fn t_box_edge_lengths() {
        let qbox = unit_box();
        for e in qbox.edges() {
            assert_eq!(1.0, qbox.edge_length(e).expect("Cannot compute edge length"));
        }
    }

    #[test]
    fn t_box_halfedge_vectors() {
        let qbox = unit_box();
        for h in qbox.halfedges() {
            let v = qbox
                .try_calc_halfedge_vector(h)
                .expect("Cannot compute halfedge vector");
            let ov = qbox
                .try_calc_halfedge_vector(h.opposite())
                .expect("Cannot compute halfedge vector");
            assert_eq!(v, -ov);
            assert_eq!(v.length(), 1.0);
        }
    }

    #[test]
    fn t_bounding_box() {
        let mut mesh = PolyMeshF32::new();
        assert!(
            mesh.bounding_box()
                .expect("Cannot compute bounding box")
                .is_none()
        );
        let mut qbox = unit_box();
        assert_eq!(
            qbox.bounding_box().expect("Cannot compute bounding box"),
            Some((glam::Vec3::ZERO, glam::Vec3::ONE))
        );
        let v = qbox
            .add_vertex(glam::vec3(5.0, -2.0, 0.5))
            .expect("Cannot add vertex");
        assert_eq!(
            qbox.bounding_box().expect("Cannot compute bounding box"),
            Some((glam::vec3(0.0, -2.0, 0.0), glam::vec3(5.0, 1.0, 1.0)))
        );
        // Deleted vertices are ignored.
        qbox.delete_vertex(v).expect("Cannot delete vertex");
        assert_eq!(
            qbox.bounding_box().expect("Cannot compute bounding box"),
            Some((glam::Vec3::ZERO, glam::Vec3::ONE))
        );
        mesh.add_vertex(glam::vec3(1.0, 2.0, 3.0))
            .expect("Cannot add vertex");
        assert_eq!(
            mesh.bounding_box().expect("Cannot compute bounding box"),
            Some((glam::vec3(1.0, 2.0, 3.0), glam::vec3(1.0, 2.0, 3.0)))
        );
    }
}
