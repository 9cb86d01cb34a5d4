//! View frustum for visibility determination.

use cgmath::prelude::*;
use cgmath::{Matrix4, Rad};

use super::plane::{Plane, PlaneBound, PlaneRelation};

/// Projections, in left hand coordinates with depth mapped into [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Ortho {
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },

    Perspective {
        /// Field of view in vertical.
        fovy: Rad<f32>,
        /// The aspect of width / height.
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn ortho(width: f32, height: f32, near: f32, far: f32) -> Self {
        Projection::Ortho {
            width,
            height,
            near,
            far,
        }
    }

    pub fn perspective<T: Into<Rad<f32>>>(fovy: T, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fovy: fovy.into(),
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        match *self {
            Projection::Ortho {
                width,
                height,
                near,
                far,
            } => {
                let (hw, hh) = (width * 0.5, height * 0.5);
                Matrix4::new(
                    1.0 / hw, 0.0, 0.0, 0.0,
                    0.0, 1.0 / hh, 0.0, 0.0,
                    0.0, 0.0, 2.0 / (far - near), 0.0,
                    0.0, 0.0, (far + near) / (near - far), 1.0,
                )
            }
            Projection::Perspective {
                fovy,
                aspect,
                near,
                far,
            } => {
                let fc = Rad::cot(fovy * 0.5);
                Matrix4::new(
                    fc / aspect, 0.0, 0.0, 0.0,
                    0.0, fc, 0.0, 0.0,
                    0.0, 0.0, (far + near) / (far - near), 1.0,
                    0.0, 0.0, (2.0 * far * near) / (near - far), 0.0,
                )
            }
        }
    }
}

/// The view volume used by cull stage. A bound is visible unless it lies
/// completely behind one of the six planes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    pub left: Plane,
    pub right: Plane,
    pub bottom: Plane,
    pub top: Plane,
    pub near: Plane,
    pub far: Plane,
}

impl Frustum {
    /// Constructs a frustum from projection and the view matrix of camera.
    pub fn new(projection: Projection, view: Matrix4<f32>) -> Self {
        Self::from_matrix(projection.matrix() * view)
    }

    /// Extracts the planes of a combined view-projection matrix.
    pub fn from_matrix(m: Matrix4<f32>) -> Self {
        let plane = |v| {
            let p = Plane::from_vector4_alt(v);
            p.normalize().unwrap_or(p)
        };

        Frustum {
            left: plane(m.row(3) + m.row(0)),
            right: plane(m.row(3) - m.row(0)),
            bottom: plane(m.row(3) + m.row(1)),
            top: plane(m.row(3) - m.row(1)),
            near: plane(m.row(3) + m.row(2)),
            far: plane(m.row(3) - m.row(2)),
        }
    }

    /// A volume that contains everything.
    pub fn unbounded() -> Self {
        let p = Plane::new(cgmath::Vector3::zero(), ::std::f32::NEG_INFINITY);
        Frustum {
            left: p,
            right: p,
            bottom: p,
            top: p,
            near: p,
            far: p,
        }
    }

    /// Classifies the bound against all of the planes. The test is conservative: a
    /// bound is only reported as `Out` if it is completely behind a single plane.
    pub fn contains<B: PlaneBound>(&self, bound: &B) -> PlaneRelation {
        [
            self.left,
            self.right,
            self.top,
            self.bottom,
            self.near,
            self.far,
        ]
            .iter()
            .fold(PlaneRelation::In, |cur, p| {
                if cur == PlaneRelation::Out {
                    cur
                } else {
                    cur.max(bound.relate(p))
                }
            })
    }
}
