//! View-volume math built on top of `cgmath`.

pub mod aabb;
pub mod frustum;
pub mod plane;

pub mod prelude {
    pub use super::aabb::Aabb3;
    pub use super::frustum::{Frustum, Projection};
    pub use super::plane::{Plane, PlaneBound, PlaneRelation};
    pub use cgmath::prelude::{EuclideanSpace, InnerSpace, Matrix, One, Rotation3, SquareMatrix, Zero};
    pub use cgmath::{Deg, Euler, Matrix4, Point3, Quaternion, Rad, Vector3, Vector4};
}
