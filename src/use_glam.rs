/*!
This is an optional module that is enabled by the `use_glam` feature. It
provides mesh types that can be used out of the box, that use
[`glam`](https://docs.rs/glam/latest/glam/) to represent the geometry.
*/

use crate::{
    mesh::{
        Adaptor, CrossProductAdaptor, DotProductAdaptor, FloatScalarAdaptor, PolyMeshT,
        VectorAngleAdaptor, VectorLengthAdaptor, VectorNormalizeAdaptor,
    },
    pointcloud::PointCloudT,
};

/// Implements every adaptor for a glam vector type and its scalar type.
macro_rules! impl_glam_adaptor {
    ($adaptor:ident, $vector:ty, $scalar:ty) => {
        impl Adaptor<3> for $adaptor {
            type Vector = $vector;
            type Scalar = $scalar;

            fn vector(coords: [Self::Scalar; 3]) -> Self::Vector {
                <$vector>::from_array(coords)
            }

            fn zero_vector() -> Self::Vector {
                <$vector>::ZERO
            }

            fn vector_coord(v: &Self::Vector, i: usize) -> Self::Scalar {
                v[i]
            }
        }

        impl VectorLengthAdaptor<3> for $adaptor {
            fn vector_length(v: Self::Vector) -> Self::Scalar {
                v.length()
            }
        }

        impl VectorNormalizeAdaptor<3> for $adaptor {
            fn normalized_vec(v: Self::Vector) -> Self::Vector {
                v.normalize()
            }
        }

        impl DotProductAdaptor<3> for $adaptor {
            fn dot_product(a: Self::Vector, b: Self::Vector) -> Self::Scalar {
                a.dot(b)
            }
        }

        impl VectorAngleAdaptor for $adaptor {
            fn vector_angle(a: Self::Vector, b: Self::Vector) -> Self::Scalar {
                a.angle_between(b)
            }
        }

        impl CrossProductAdaptor for $adaptor {
            fn cross_product(a: Self::Vector, b: Self::Vector) -> Self::Vector {
                a.cross(b)
            }
        }

        impl FloatScalarAdaptor<3> for $adaptor {
            fn scalarf32(val: f32) -> Self::Scalar {
                val as $scalar
            }

            fn scalarf64(val: f64) -> Self::Scalar {
                val as $scalar
            }

            fn to_f32(val: Self::Scalar) -> f32 {
                val as f32
            }

            fn to_f64(val: Self::Scalar) -> f64 {
                val as f64
            }
        }
    };
}

/// Built-in adaptor for meshes that use 32-bit floating point numbers to
/// represent the geometry.
pub struct BuiltInAdaptorF32 {}

impl_glam_adaptor!(BuiltInAdaptorF32, glam::Vec3, f32);

/// Built-in adaptor for meshes that use 64-bit floating point numbers to
/// represent the geometry.
pub struct BuiltInAdaptorF64 {}

impl_glam_adaptor!(BuiltInAdaptorF64, glam::DVec3, f64);

/// Polygon mesh that uses 32 bit floating point numbers to represent the
/// geometry.
pub type PolyMeshF32 = PolyMeshT<3, BuiltInAdaptorF32>;

/// Polygon mesh that uses 64 bit floating point numbers to represent the
/// geometry.
pub type PolyMeshF64 = PolyMeshT<3, BuiltInAdaptorF64>;

/// Point cloud with 32 bit floating point positions.
pub type PointCloudF32 = PointCloudT<3, BuiltInAdaptorF32>;

/// Point cloud with 64 bit floating point positions.
pub type PointCloudF64 = PointCloudT<3, BuiltInAdaptorF64>;
