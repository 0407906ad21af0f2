/*!
A halfedge based polygon mesh library, with named properties of any type
attached to the vertices, halfedges, edges and faces of a mesh.

# Overview

+ The connectivity of a mesh is represented by a halfedge data structure in
  [`Topology`]. Every edge is made of two opposite halfedges, and each
  halfedge knows the vertex it points to, the face it belongs to, and the
  next and previous halfedges around that face. The halfedges of an edge are
  never stored separately: halfedge `2e` and `2e + 1` belong to edge `e`.

+ Elements are referred to by handles: [`VH`], [`HH`], [`EH`] and [`FH`]. A
  handle is just an index, so it only means something together with the mesh
  it came from. Everything about the connectivity is available through the
  [`HasTopology`] trait, and the circulators that walk around vertices and
  faces through the [`HasIterators`] trait.

+ Data of any type can be attached to the elements as a [`Property`]. A
  property is a named column with exactly one value per element, that grows
  and shrinks with the mesh. Properties are shared handles with runtime
  checked borrows, so a property can be read while the mesh is being
  navigated.

+ Deleting elements only marks them as deleted. They are removed from the
  storage, along with their property values, when the garbage is collected.
  The surviving elements keep their order.

+ The generic polygon mesh type [`PolyMeshT<DIM, A>`] stores the positions of
  the vertices in a property named `"v:point"`. The geometric types are
  provided by an implementation of [`Adaptor`]. There are additional adaptor
  traits that can be optionally implemented to enable geometric features such
  as edge lengths and normals.

+ The `use_glam` feature, enabled by default, provides builtin adaptors and
  ready to use mesh types that use [`glam`](https://crates.io/crates/glam)
  for the geometry. These can be found in the [`use_glam`] module.

```rust
use hemesh::{use_glam::PolyMeshF32, HasIterators, HasTopology};

let mut mesh = PolyMeshF32::new();
let verts = mesh
    .add_vertices(&[
        glam::vec3(0.0, 0.0, 0.0),
        glam::vec3(1.0, 0.0, 0.0),
        glam::vec3(1.0, 1.0, 0.0),
        glam::vec3(0.0, 1.0, 0.0),
    ])
    .expect("Cannot add vertices");
let f = mesh
    .add_quad_face(0.into(), 1.into(), 2.into(), 3.into())
    .expect("Cannot add face");
assert_eq!(verts, 0..4);
assert_eq!(mesh.num_edges(), 4);
assert_eq!(mesh.fv_ccw_iter(f).count(), 4);
assert!(mesh.vertices().all(|v| mesh.is_boundary_vertex(v)));
```
*/

mod check;
mod edit;
mod element;
mod error;
mod iterator;
mod macros;
mod math;
mod mesh;
mod pointcloud;
mod property;
mod topol;

#[cfg(feature = "use_glam")]
pub mod use_glam;

pub use element::{EH, FH, HH, Handle, MH, VH};
pub use error::Error;
pub use iterator::HasIterators;
pub use mesh::{
    Adaptor, CrossProductAdaptor, DotProductAdaptor, FloatScalarAdaptor, PolyMeshT,
    VectorAngleAdaptor, VectorLengthAdaptor, VectorNormalizeAdaptor,
};
pub use pointcloud::PointCloudT;
pub use property::{
    EPropBuf, EProperty, FPropBuf, FProperty, HPropBuf, HProperty, MProperty, PropBuf, Property,
    PropertyContainer, TPropData, VPropBuf, VProperty,
};
pub use topol::{HasTopology, TopolCache, Topology};
