use crate::{
    element::{Handle, MH, VH},
    error::Error,
    mesh::{Adaptor, impl_property_api},
    property::{Property, PropertyContainer, TPropData, VProperty},
};

const POINTS_NAME: &str = "v:point";
const DELETED_NAME: &str = "v:deleted";

/// A set of points without any connectivity.
///
/// Like [`PolyMeshT`](crate::PolyMeshT), the positions are stored in a vertex
/// property named `"v:point"`, and any number of other vertex and model
/// properties can be attached. Deleted vertices are kept in storage until
/// [`PointCloudT::garbage_collection`] is called.
pub struct PointCloudT<const DIM: usize, A>
where
    A: Adaptor<DIM>,
{
    vprops: PropertyContainer<VH>,
    mprops: PropertyContainer<MH>,
    vdeleted: VProperty<bool>,
    points: VProperty<A::Vector>,
    num_deleted_vertices: usize,
}

impl<const DIM: usize, A> Default for PointCloudT<DIM, A>
where
    A: Adaptor<DIM>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize, A> Clone for PointCloudT<DIM, A>
where
    A: Adaptor<DIM>,
{
    /// # Panics
    ///
    /// If any of the properties is mutably borrowed.
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("Cannot clone a point cloud while its properties are mutably borrowed")
    }
}

impl<const DIM: usize, A> PointCloudT<DIM, A>
where
    A: Adaptor<DIM>,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(nverts: usize) -> Self {
        let mut vprops = PropertyContainer::new();
        let vdeleted = vprops.create(DELETED_NAME, false);
        let points = vprops.create(POINTS_NAME, A::zero_vector());
        vprops
            .reserve(nverts)
            .expect("Properties of a new point cloud cannot be borrowed");
        PointCloudT {
            vprops,
            mprops: PropertyContainer::new_with_size(1),
            vdeleted,
            points,
            num_deleted_vertices: 0,
        }
    }

    pub fn try_clone(&self) -> Result<Self, Error> {
        let vprops = self.vprops.try_clone()?;
        let vdeleted = vprops
            .get::<bool>(DELETED_NAME)
            .ok_or_else(|| Error::PropertyDoesNotExist(DELETED_NAME.to_string()))?;
        let points = vprops
            .get::<A::Vector>(POINTS_NAME)
            .ok_or_else(|| Error::PropertyDoesNotExist(POINTS_NAME.to_string()))?;
        Ok(PointCloudT {
            vprops,
            mprops: self.mprops.try_clone()?,
            vdeleted,
            points,
            num_deleted_vertices: self.num_deleted_vertices,
        })
    }

    /// Number of vertices, including the deleted vertices that are not yet
    /// garbage collected.
    pub fn num_vertices(&self) -> usize {
        self.vprops.len()
    }

    pub fn num_deleted_vertices(&self) -> usize {
        self.num_deleted_vertices
    }

    pub fn has_garbage(&self) -> bool {
        self.num_deleted_vertices > 0
    }

    pub fn is_deleted_vertex(&self, v: VH) -> bool {
        self.num_deleted_vertices > 0
            && self
                .vdeleted
                .try_borrow()
                .expect("Deleted flags of the point cloud are mutably borrowed")[v]
    }

    pub fn is_valid_vertex(&self, v: VH) -> bool {
        (v.index() as usize) < self.num_vertices() && !self.is_deleted_vertex(v)
    }

    /// Iterator over the vertices that are not deleted.
    pub fn vertices(&self) -> impl Iterator<Item = VH> {
        let skip = self.num_deleted_vertices > 0;
        let deleted = self
            .vdeleted
            .try_borrow()
            .expect("Deleted flags of the point cloud are mutably borrowed");
        (0..(self.num_vertices() as u32))
            .map(VH::from)
            .filter(move |v| !(skip && deleted[*v]))
    }

    pub fn add_vertex(&mut self, pos: A::Vector) -> Result<VH, Error> {
        let v: VH = (self.vprops.len() as u32).into();
        self.vprops.push_value()?;
        self.points.set(v, pos)?;
        Ok(v)
    }

    /// Mark the vertex as deleted. Deleting a vertex twice has no effect.
    pub fn delete_vertex(&mut self, v: VH) -> Result<(), Error> {
        if v.index() as usize >= self.num_vertices() {
            return Err(Error::InvalidVertex(v));
        }
        let mut deleted = self.vdeleted.try_borrow_mut()?;
        if !std::mem::replace(&mut deleted[v], true) {
            self.num_deleted_vertices += 1;
        }
        Ok(())
    }

    /// Remove the deleted vertices from storage. The surviving vertices keep
    /// their relative order, and the values of all vertex properties move
    /// with them.
    pub fn garbage_collection(&mut self) -> Result<(), Error> {
        if !self.has_garbage() {
            return Ok(());
        }
        self.vprops.ensure_unborrowed()?;
        let keep: Vec<bool> = {
            let deleted = self.vdeleted.try_borrow()?;
            deleted.iter().map(|d| !d).collect()
        };
        let before = self.vprops.len();
        self.vprops.compact(&keep)?;
        self.vprops.shrink_to_fit()?;
        self.num_deleted_vertices = 0;
        log::debug!(
            "Point cloud garbage collection removed {} of {} vertices",
            before - self.vprops.len(),
            before
        );
        Ok(())
    }

    /// Remove all vertices. The properties are kept.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.vprops.clear()?;
        self.num_deleted_vertices = 0;
        Ok(())
    }

    pub fn points(&self) -> VProperty<A::Vector> {
        self.points.clone()
    }

    pub fn point(&self, v: VH) -> Result<A::Vector, Error> {
        self.points.get_cloned(v)
    }

    pub fn set_point(&mut self, v: VH, pos: A::Vector) -> Result<(), Error> {
        self.points.set(v, pos)
    }

    /// Log the names of all the properties of this point cloud.
    pub fn property_stats(&self) {
        log::info!(
            "vertex properties: [{}]",
            self.vprops.properties().join(", ")
        );
        log::info!(
            "model properties: [{}]",
            self.mprops.properties().join(", ")
        );
    }

    impl_property_api! {
        kind: "vertex",
        handle: VH,
        store: vprops,
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
        kind: "model",
        handle: MH,
        store: mprops,
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
