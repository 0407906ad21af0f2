use std::ops::Range;

use crate::{
    element::{EH, FH, HH, MH, VH},
    error::Error,
    property::{Property, TPropData, VProperty},
    topol::{HasTopology, TopolCache, Topology},
};

/// This trait defines the geometric types used by a mesh.
///
/// A mesh stores the positions of its vertices as values of type
/// `Self::Vector`. `DIM` is the number of coordinates of a position, and
/// `Self::Scalar` is the type of a single coordinate.
pub trait Adaptor<const DIM: usize> {
    type Vector: Clone + Copy + 'static;
    type Scalar: Clone + Copy + 'static;

    /// Create a vector from its coordinates.
    fn vector(coords: [Self::Scalar; DIM]) -> Self::Vector;

    fn zero_vector() -> Self::Vector;

    /// Get the `i`-th coordinate of `v`.
    fn vector_coord(v: &Self::Vector, i: usize) -> Self::Scalar;
}

/// Adaptor to compute the length of a vector.
pub trait VectorLengthAdaptor<const DIM: usize>: Adaptor<DIM> {
    fn vector_length(v: Self::Vector) -> Self::Scalar;
}

/// Adaptor to normalize a vector.
pub trait VectorNormalizeAdaptor<const DIM: usize>: Adaptor<DIM> {
    fn normalized_vec(v: Self::Vector) -> Self::Vector;
}

/// Adaptor to compute the dot product of two vectors.
pub trait DotProductAdaptor<const DIM: usize>: Adaptor<DIM> {
    fn dot_product(a: Self::Vector, b: Self::Vector) -> Self::Scalar;
}

/// Adaptor to compute the angle between two 3d vectors, in radians.
pub trait VectorAngleAdaptor: Adaptor<3> {
    fn vector_angle(a: Self::Vector, b: Self::Vector) -> Self::Scalar;
}

/// Adaptor to compute the cross product of two 3d vectors.
pub trait CrossProductAdaptor: Adaptor<3> {
    fn cross_product(a: Self::Vector, b: Self::Vector) -> Self::Vector;
}

/// Adaptor for meshes whose scalar type is a floating point number.
pub trait FloatScalarAdaptor<const DIM: usize>: Adaptor<DIM> {
    fn scalarf32(val: f32) -> Self::Scalar;

    fn scalarf64(val: f64) -> Self::Scalar;

    fn to_f32(val: Self::Scalar) -> f32;

    fn to_f64(val: Self::Scalar) -> f64;
}

const POINTS_NAME: &str = "v:point";

/// A polygon mesh in `DIM` dimensions, with the geometric types provided by
/// the adaptor `A`.
///
/// The mesh owns a [`Topology`] and a vertex property named `"v:point"` that
/// holds the positions of the vertices. Everything about the connectivity of
/// the mesh is available through the [`HasTopology`] trait. Properties of
/// any type can be attached to the vertices, halfedges, edges, faces, and to
/// the mesh itself.
pub struct PolyMeshT<const DIM: usize, A>
where
    A: Adaptor<DIM>,
{
    pub(crate) topol: Topology,
    pub(crate) cache: TopolCache,
    pub(crate) points: VProperty<A::Vector>,
}

impl<const DIM: usize, A> HasTopology for PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    fn topology(&self) -> &Topology {
        &self.topol
    }
}

impl<const DIM: usize, A> Default for PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize, A> Clone for PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    /// Deep copy of the mesh and all its properties.
    ///
    /// # Panics
    ///
    /// If any of the properties of the mesh is mutably borrowed. Use
    /// [`PolyMeshT::try_clone`] to get an error instead.
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("Cannot clone a mesh while its properties are mutably borrowed")
    }
}

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    pub fn new() -> Self {
        Self::with_capacity(0, 0, 0)
    }

    /// Create a mesh with memory reserved for the given number of vertices,
    /// edges and faces.
    pub fn with_capacity(nverts: usize, nedges: usize, nfaces: usize) -> Self {
        let mut topol = Topology::with_capacity(nverts, nedges, nfaces);
        let points = topol.vprops.create(POINTS_NAME, A::zero_vector());
        PolyMeshT {
            topol,
            cache: TopolCache::default(),
            points,
        }
    }

    /// Deep copy of the mesh. The properties of the copy do not share their
    /// buffers with the properties of this mesh.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let topol = self.topol.try_clone()?;
        let points = topol
            .vprops
            .get::<A::Vector>(POINTS_NAME)
            .ok_or_else(|| Error::PropertyDoesNotExist(POINTS_NAME.to_string()))?;
        Ok(PolyMeshT {
            topol,
            cache: TopolCache::default(),
            points,
        })
    }

    /// Reserve memory for an additional number of vertices, edges and faces.
    pub fn reserve(&mut self, nverts: usize, nedges: usize, nfaces: usize) -> Result<(), Error> {
        self.topol.reserve(nverts, nedges, nfaces)
    }

    /// Remove all vertices, edges and faces. The properties are kept.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.cache.clear();
        self.topol.clear()
    }

    /// The positions of the vertices.
    pub fn points(&self) -> VProperty<A::Vector> {
        self.points.clone()
    }

    pub fn point(&self, v: VH) -> Result<A::Vector, Error> {
        self.points.get_cloned(v)
    }

    pub fn set_point(&mut self, v: VH, pos: A::Vector) -> Result<(), Error> {
        self.points.set(v, pos)
    }

    /// Add an isolated vertex at the given position.
    pub fn add_vertex(&mut self, pos: A::Vector) -> Result<VH, Error> {
        let v = self.topol.add_vertex()?;
        self.points.set(v, pos)?;
        Ok(v)
    }

    /// Add an isolated vertex for each of the given positions, and return the
    /// range of indices of the new vertices.
    pub fn add_vertices(&mut self, pos: &[A::Vector]) -> Result<Range<u32>, Error> {
        let range = self.topol.add_vertices(pos.len())?;
        let mut points = self.points.try_borrow_mut()?;
        let points: &mut [A::Vector] = &mut points;
        points[(range.start as usize)..(range.end as usize)].copy_from_slice(pos);
        Ok(range)
    }

    /// Add a face with the given vertices. The vertices are expected in
    /// counter-clockwise order, and the new face must not make the mesh
    /// non-manifold. If the face cannot be added, an error is returned and
    /// the mesh is left unchanged.
    pub fn add_face(&mut self, verts: &[VH]) -> Result<FH, Error> {
        self.topol.add_face(verts, &mut self.cache)
    }

    pub fn add_tri_face(&mut self, v0: VH, v1: VH, v2: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2])
    }

    pub fn add_quad_face(&mut self, v0: VH, v1: VH, v2: VH, v3: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2, v3])
    }

    /// Log the names of all the properties of this mesh.
    pub fn property_stats(&self) {
        log::info!(
            "vertex properties: [{}]",
            self.topol.vprops.properties().join(", ")
        );
        log::info!(
            "halfedge properties: [{}]",
            self.topol.hprops.properties().join(", ")
        );
        log::info!(
            "edge properties: [{}]",
            self.topol.eprops.properties().join(", ")
        );
        log::info!(
            "face properties: [{}]",
            self.topol.fprops.properties().join(", ")
        );
        log::info!(
            "model properties: [{}]",
            self.topol.mprops.properties().join(", ")
        );
    }
}

/// Implements the typed property API for one kind of element. The containers
/// are reached through the given field path on `self`. Properties whose names
/// appear in the reserved list cannot be removed or renamed.
macro_rules! impl_property_api {
    (
        kind: $kind:literal,
        handle: $handle:ty,
        store: $($store:ident).+,
        reserved: [$($reserved:literal),*],
        add: $add:ident,
        get: $get:ident,
        get_or_add: $get_or_add:ident,
        remove: $remove:ident,
        rename: $rename:ident,
        names: $names:ident,
        type_name: $type_name:ident $(,)?
    ) => {
        #[doc = concat!("Add a ", $kind, " property named `name`, with every value set to `default`.")]
        ///
        /// If a property with the same name and type already exists, it is
        /// returned. If the name is taken by a property of a different type,
        /// `None` is returned.
        pub fn $add<T: TPropData>(&mut self, name: &str, default: T) -> Option<Property<$handle, T>> {
            self$(.$store)+.add(name, default)
        }

        #[doc = concat!("Get the ", $kind, " property named `name`, if it exists and has type `T`.")]
        pub fn $get<T: TPropData>(&self, name: &str) -> Option<Property<$handle, T>> {
            self$(.$store)+.get(name)
        }

        #[doc = concat!("Get the ", $kind, " property named `name`, or add it if it doesn't exist.")]
        pub fn $get_or_add<T: TPropData>(
            &mut self,
            name: &str,
            default: T,
        ) -> Option<Property<$handle, T>> {
            self$(.$store)+.get_or_add(name, default)
        }

        #[doc = concat!("Remove a ", $kind, " property from the mesh.")]
        ///
        /// The handle stays readable, but its values no longer follow the
        /// elements of the mesh. Returns `Ok(false)` if the property doesn't
        /// belong to this mesh.
        pub fn $remove<T: TPropData>(&mut self, prop: &Property<$handle, T>) -> Result<bool, Error> {
            const RESERVED: &[&str] = &[$($reserved),*];
            if let Some(name) = RESERVED.iter().find(|name| {
                self$(.$store)+
                    .get::<T>(name)
                    .is_some_and(|p| p.ptr_eq(prop))
            }) {
                return Err(Error::ReservedProperty(name.to_string()));
            }
            Ok(self$(.$store)+.remove(prop))
        }

        #[doc = concat!("Rename a ", $kind, " property.")]
        pub fn $rename(&mut self, old: &str, new: &str) -> Result<(), Error> {
            const RESERVED: &[&str] = &[$($reserved),*];
            if let Some(name) = [old, new]
                .into_iter()
                .find(|n| RESERVED.iter().any(|r| r == n))
            {
                return Err(Error::ReservedProperty(name.to_string()));
            }
            if self$(.$store)+.get_type(old).is_none() {
                return Err(Error::PropertyDoesNotExist(old.to_string()));
            }
            if self$(.$store)+.rename(old, new) {
                Ok(())
            } else {
                Err(Error::PropertyNameTaken(new.to_string()))
            }
        }

        #[doc = concat!("Names of all the ", $kind, " properties.")]
        pub fn $names(&self) -> Vec<String> {
            self$(.$store)+.properties()
        }

        #[doc = concat!("Name of the value type of the ", $kind, " property named `name`.")]
        pub fn $type_name(&self, name: &str) -> Option<&'static str> {
            self$(.$store)+.get_type_name(name)
        }
    };
}

pub(crate) use impl_property_api;

impl<const DIM: usize, A> PolyMeshT<DIM, A>
where
    A: Adaptor<DIM>,
{
    impl_property_api! {
        kind: "vertex",
        handle: VH,
        store: topol.vprops,
        reserved: ["v:deleted", "v:point"],
        add: add_vertex_property,
        get: get_vertex_property,
        get_or_add: vertex_property,
        remove: remove_vertex_property,
        rename: rename_vertex_property,
        names: vertex_properties,
        type_name: vertex_property_type,
    }

    impl_property_api! {
        kind: "halfedge",
        handle: HH,
        store: topol.hprops,
        reserved: [],
        add: add_halfedge_property,
        get: get_halfedge_property,
        get_or_add: halfedge_property,
        remove: remove_halfedge_property,
        rename: rename_halfedge_property,
        names: halfedge_properties,
        type_name: halfedge_property_type,
    }

    impl_property_api! {
        kind: "edge",
        handle: EH,
        store: topol.eprops,
        reserved: ["e:deleted"],
        add: add_edge_property,
        get: get_edge_property,
        get_or_add: edge_property,
        remove: remove_edge_property,
        rename: rename_edge_property,
        names: edge_properties,
        type_name: edge_property_type,
    }

    impl_property_api! {
        kind: "face",
        handle: FH,
        store: topol.fprops,
        reserved: ["f:deleted"],
        add: add_face_property,
        get: get_face_property,
        get_or_add: face_property,
        remove: remove_face_property,
        rename: rename_face_property,
        names: face_properties,
        type_name: face_property_type,
    }

    impl_property_api! {
        kind: "model",
        handle: MH,
        store: topol.mprops,
        reserved: [],
        add: add_model_property,
        get: get_model_property,
        get_or_add: model_property,
        remove: remove_model_property,
        rename: rename_model_property,
        names: model_properties,
        type_name: model_property_type,
    }
}

#[cfg(all(test, feature = "use_glam"))]
mod test {
    use arrayvec::ArrayVec;

    use crate::{
        element::{Handle, VH},
        error::Error,
        topol::HasTopology,
        use_glam::PolyMeshF32,
    };

    fn quad(mesh: &mut PolyMeshF32) -> ArrayVec<VH, 4> {
        let verts: ArrayVec<VH, 4> = [
            glam::vec3(0.0, 0.0, 0.0),
            glam::vec3(1.0, 0.0, 0.0),
            glam::vec3(1.0, 1.0, 0.0),
            glam::vec3(0.0, 1.0, 0.0),
        ]
        .iter()
        .map(|p| mesh.add_vertex(*p).expect("Cannot add vertex"))
        .collect();
        mesh.add_quad_face(verts[0], verts[1], verts[2], verts[3])
            .expect("Cannot add face");
        verts
    }

    #[test]
    fn t_points() {
        let mut mesh = PolyMeshF32::new();
        let range = mesh
            .add_vertices(&[glam::vec3(1.0, 2.0, 3.0), glam::vec3(4.0, 5.0, 6.0)])
            .expect("Cannot add vertices");
        assert_eq!(range, 0..2);
        let v = mesh
            .add_vertex(glam::vec3(7.0, 8.0, 9.0))
            .expect("Cannot add vertex");
        assert_eq!(v.index(), 2);
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(
            mesh.point(1.into()).expect("Cannot read point"),
            glam::vec3(4.0, 5.0, 6.0)
        );
        mesh.set_point(1.into(), glam::vec3(0.0, 0.0, 0.0))
            .expect("Cannot set point");
        let points = mesh.points();
        let points = points.try_borrow().expect("Cannot borrow points");
        let points: &[glam::Vec3] = &points;
        assert_eq!(
            points,
            &[
                glam::vec3(1.0, 2.0, 3.0),
                glam::vec3(0.0, 0.0, 0.0),
                glam::vec3(7.0, 8.0, 9.0)
            ]
        );
    }

    #[test]
    fn t_add_vertices_while_points_borrowed() {
        let mut mesh = PolyMeshF32::new();
        let points = mesh.points();
        let _borrowed = points.try_borrow().expect("Cannot borrow points");
        assert!(matches!(
            mesh.add_vertex(glam::Vec3::ZERO),
            Err(Error::BorrowedPropertyAccess)
        ));
        assert_eq!(mesh.num_vertices(), 0);
    }

    #[test]
    fn t_quad_face() {
        let mut mesh = PolyMeshF32::new();
        let verts = quad(&mut mesh);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(mesh.num_halfedges(), 8);
        assert!(mesh.is_quad_mesh());
        assert!(verts.iter().all(|v| mesh.is_boundary_vertex(*v)));
        mesh.check_topology().expect("Topological errors found");
    }

    #[test]
    fn t_property_lifecycle() {
        let mut mesh = PolyMeshF32::new();
        quad(&mut mesh);
        let mut weights = mesh
            .add_vertex_property("v:weight", 1.0f32)
            .expect("Cannot add property");
        weights.set(2.into(), 5.0).expect("Cannot set value");
        // Same name and type gives the same property.
        let same = mesh
            .vertex_property("v:weight", 0.0f32)
            .expect("Cannot get property");
        assert!(same.ptr_eq(&weights));
        assert_eq!(same.get_cloned(2.into()).expect("Cannot read"), 5.0);
        // Same name, different type.
        assert!(mesh.add_vertex_property("v:weight", 0u8).is_none());
        assert!(mesh.get_vertex_property::<u8>("v:weight").is_none());
        assert_eq!(
            mesh.vertex_property_type("v:weight"),
            Some(std::any::type_name::<f32>())
        );
        // New vertices get the default value.
        let v = mesh.add_vertex(glam::Vec3::ONE).expect("Cannot add vertex");
        assert_eq!(weights.get_cloned(v).expect("Cannot read"), 1.0);
        mesh.rename_vertex_property("v:weight", "v:mass")
            .expect("Cannot rename property");
        assert!(mesh.get_vertex_property::<f32>("v:weight").is_none());
        assert!(mesh.get_vertex_property::<f32>("v:mass").is_some());
        assert!(matches!(
            mesh.rename_vertex_property("v:weight", "v:other"),
            Err(Error::PropertyDoesNotExist(_))
        ));
        assert!(
            mesh.remove_vertex_property(&weights)
                .expect("Cannot remove property")
        );
        assert!(
            !mesh
                .remove_vertex_property(&weights)
                .expect("Cannot remove property")
        );
        assert_eq!(
            mesh.vertex_properties(),
            vec!["v:deleted".to_string(), "v:point".to_string()]
        );
        // The detached handle is still readable, but no longer grows.
        mesh.add_vertex(glam::Vec3::ONE).expect("Cannot add vertex");
        assert_eq!(weights.len().expect("Cannot read length"), 5);
        assert_eq!(mesh.num_vertices(), 6);
    }

    #[test]
    fn t_reserved_properties() {
        let mut mesh = PolyMeshF32::new();
        quad(&mut mesh);
        let points = mesh.points();
        assert!(matches!(
            mesh.remove_vertex_property(&points),
            Err(Error::ReservedProperty(name)) if name == "v:point"
        ));
        let deleted = mesh
            .get_face_property::<bool>("f:deleted")
            .expect("Deleted flags are missing");
        assert!(matches!(
            mesh.remove_face_property(&deleted),
            Err(Error::ReservedProperty(_))
        ));
        assert!(matches!(
            mesh.rename_vertex_property("v:point", "v:position"),
            Err(Error::ReservedProperty(_))
        ));
        mesh.add_edge_property("e:sharp", false)
            .expect("Cannot add property");
        assert!(matches!(
            mesh.rename_edge_property("e:sharp", "e:deleted"),
            Err(Error::ReservedProperty(_))
        ));
        mesh.add_edge_property("e:crease", false)
            .expect("Cannot add property");
        assert!(matches!(
            mesh.rename_edge_property("e:sharp", "e:crease"),
            Err(Error::PropertyNameTaken(_))
        ));
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn t_model_property() {
        let mut mesh = PolyMeshF32::new();
        let mut name = mesh
            .add_model_property("m:name", String::from("quad"))
            .expect("Cannot add property");
        quad(&mut mesh);
        assert_eq!(name.value().expect("Cannot read"), "quad");
        name.set_value("square".to_string())
            .expect("Cannot write");
        let name = mesh
            .get_model_property::<String>("m:name")
            .expect("Cannot find property");
        assert_eq!(name.value().expect("Cannot read"), "square");
        assert_eq!(mesh.model_properties(), vec!["m:name".to_string()]);
    }

    #[test]
    fn t_clone_is_deep() {
        let mut mesh = PolyMeshF32::new();
        quad(&mut mesh);
        let mut ids = mesh
            .add_face_property("f:id", 7u32)
            .expect("Cannot add property");
        let copy = mesh.try_clone().expect("Cannot clone mesh");
        ids.set(0.into(), 11).expect("Cannot set value");
        mesh.set_point(0.into(), glam::Vec3::ONE)
            .expect("Cannot set point");
        let copied = copy
            .get_face_property::<u32>("f:id")
            .expect("Property was not cloned");
        assert_eq!(copied.get_cloned(0.into()).expect("Cannot read"), 7);
        assert_eq!(
            copy.point(0.into()).expect("Cannot read point"),
            glam::Vec3::ZERO
        );
        assert_eq!(copy.num_faces(), 1);
        copy.check_topology().expect("Topological errors found");
        // The copy's points are its own reserved column.
        let points = copy.points();
        assert!(
            copy.get_vertex_property::<glam::Vec3>("v:point")
                .is_some_and(|p| p.ptr_eq(&points))
        );
    }

    #[test]
    fn t_clear() {
        let mut mesh = PolyMeshF32::new();
        quad(&mut mesh);
        let ids = mesh
            .add_vertex_property("v:id", 0u32)
            .expect("Cannot add property");
        mesh.clear().expect("Cannot clear mesh");
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(ids.len().expect("Cannot read length"), 0);
        assert!(mesh.get_vertex_property::<u32>("v:id").is_some());
    }
}
