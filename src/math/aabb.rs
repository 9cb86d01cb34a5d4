//! Axis-aligned bounding boxes.

use cgmath::prelude::*;
use cgmath::{Matrix4, Point3, Vector3};

/// A three-dimensional axis-aligned bounding box.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb3 {
    /// Constructs a new box from two opposite corners, in any order.
    #[inline]
    pub fn new(p1: Point3<f32>, p2: Point3<f32>) -> Self {
        Aabb3 {
            min: Point3::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z)),
            max: Point3::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z)),
        }
    }

    /// Constructs a box around `center` that extends `half` along each axis.
    #[inline]
    pub fn from_center(center: Point3<f32>, half: Vector3<f32>) -> Self {
        Aabb3::new(center - half, center + half)
    }

    #[inline]
    pub fn center(&self) -> Point3<f32> {
        self.min + (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn dim(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Returns a new box grown to include the point.
    #[inline]
    pub fn grow(&self, p: Point3<f32>) -> Self {
        Aabb3 {
            min: Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            max: Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        }
    }

    /// Returns the smallest box that encloses both.
    #[inline]
    pub fn union(&self, rhs: &Aabb3) -> Self {
        self.grow(rhs.min).grow(rhs.max)
    }

    /// Applies an arbitrary affine transform to the corners, and returns a new
    /// conservative bound of the result.
    pub fn transform(&self, m: &Matrix4<f32>) -> Self {
        let corners = self.corners();
        let first = m.transform_point(corners[0]);
        corners[1..]
            .iter()
            .fold(Aabb3::new(first, first), |acc, &v| {
                acc.grow(m.transform_point(v))
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn union() {
        let a = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb3::new(Point3::new(2.0, -1.0, 0.5), Point3::new(3.0, 0.0, 0.5));
        let c = a.union(&b);
        assert_eq!(c.min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(c.max, Point3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn transform() {
        let a = Aabb3::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let m = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);

        let b = a.transform(&m);
        assert_eq!(b.min, Point3::new(8.0, -1.0, -1.0));
        assert_eq!(b.max, Point3::new(12.0, 1.0, 1.0));
        assert_eq!(b.center(), Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn rotation_stays_conservative() {
        let a = Aabb3::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let m = Matrix4::from_angle_y(cgmath::Deg(45.0));
        let b = a.transform(&m);

        for v in a.corners().iter() {
            let p = m.transform_point(*v);
            assert!(p.x >= b.min.x - 1e-5 && p.x <= b.max.x + 1e-5);
            assert!(p.z >= b.min.z - 1e-5 && p.z <= b.max.z + 1e-5);
        }

        assert!(b.dim().x > 2.0);
    }
}
