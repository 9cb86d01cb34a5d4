use std::fmt;

use cgmath::prelude::*;
use cgmath::{Point3, Vector3, Vector4};

use super::aabb::Aabb3;

/// A plane formed from the equation: `A*x + B*y + C*z - D = 0`. Points with
/// `n.dot(p) > d` lie in front of the plane.
#[derive(Copy, Clone, PartialEq)]
pub struct Plane {
    pub n: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    #[inline]
    pub fn new(n: Vector3<f32>, d: f32) -> Self {
        Plane { n, d }
    }

    /// Constructs a plane from the alternative representation `A*x + B*y + C*z + D = 0`,
    /// which is what a row combination of projection matrix gives us.
    #[inline]
    pub fn from_vector4_alt(v: Vector4<f32>) -> Self {
        Plane {
            n: Vector3::new(v.x, v.y, v.z),
            d: -v.w,
        }
    }

    /// Normalizes a plane, returns `None` if its normal is degenerated.
    pub fn normalize(&self) -> Option<Self> {
        let magnitude = self.n.magnitude();
        if magnitude <= ::std::f32::EPSILON {
            None
        } else {
            let denom = 1.0 / magnitude;
            Some(Plane::new(self.n * denom, self.d * denom))
        }
    }

    /// Signed distance from point to this plane, scaled by the length of normal.
    #[inline]
    pub fn distance(&self, p: Point3<f32>) -> f32 {
        p.to_vec().dot(self.n) - self.d
    }
}

impl fmt::Debug for Plane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?}x + {:?}y + {:?}z - {:?} = 0",
            self.n.x, self.n.y, self.n.z, self.d
        )
    }
}

/// Spatial relation between a bound and a plane (or a volume of planes).
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialOrd, PartialEq)]
pub enum PlaneRelation {
    /// Completely in front.
    In,
    /// Crosses the boundary.
    Cross,
    /// Completely behind.
    Out,
}

pub trait PlaneBound: fmt::Debug {
    fn relate(&self, plane: &Plane) -> PlaneRelation;
}

impl PlaneBound for Point3<f32> {
    fn relate(&self, plane: &Plane) -> PlaneRelation {
        let dist = plane.distance(*self);
        if dist > 0.0 {
            PlaneRelation::In
        } else if dist < 0.0 {
            PlaneRelation::Out
        } else {
            PlaneRelation::Cross
        }
    }
}

impl PlaneBound for Aabb3 {
    fn relate(&self, plane: &Plane) -> PlaneRelation {
        // The corners that are the farthest along and against the normal.
        let mut positive = self.min;
        let mut negative = self.max;

        if plane.n.x >= 0.0 {
            positive.x = self.max.x;
            negative.x = self.min.x;
        }

        if plane.n.y >= 0.0 {
            positive.y = self.max.y;
            negative.y = self.min.y;
        }

        if plane.n.z >= 0.0 {
            positive.z = self.max.z;
            negative.z = self.min.z;
        }

        if plane.distance(positive) < 0.0 {
            PlaneRelation::Out
        } else if plane.distance(negative) > 0.0 {
            PlaneRelation::In
        } else {
            PlaneRelation::Cross
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relate_aabb() {
        let plane = Plane::new(Vector3::new(1.0, 0.0, 0.0), 2.0);

        let a = Aabb3::new(Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 1.0, 1.0));
        assert_eq!(a.relate(&plane), PlaneRelation::In);

        let b = Aabb3::new(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0));
        assert_eq!(b.relate(&plane), PlaneRelation::Cross);

        let c = Aabb3::new(Point3::new(-4.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(c.relate(&plane), PlaneRelation::Out);
    }

    #[test]
    fn relate_point() {
        let plane = Plane::new(Vector3::new(0.0, 1.0, 0.0), 0.0);
        assert_eq!(Point3::new(0.0, 1.0, 0.0).relate(&plane), PlaneRelation::In);
        assert_eq!(Point3::new(5.0, 0.0, 0.0).relate(&plane), PlaneRelation::Cross);
        assert_eq!(Point3::new(0.0, -1.0, 0.0).relate(&plane), PlaneRelation::Out);
    }

    #[test]
    fn normalize() {
        let plane = Plane::new(Vector3::new(0.0, 2.0, 0.0), 4.0).normalize().unwrap();
        assert!((plane.n.y - 1.0).abs() < 1e-6);
        assert!((plane.d - 2.0).abs() < 1e-6);
        assert!(Plane::new(Vector3::new(0.0, 0.0, 0.0), 1.0).normalize().is_none());
    }
}
