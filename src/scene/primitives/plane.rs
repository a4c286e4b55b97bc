use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{
        EPSILON, FloatType, Ray, TexturePoint, WorldBox, WorldPoint, WorldVector, any_perpendicular,
    },
    scene::{Object, ShapeHit, in_range},
};

use super::disk_support;

/// Half size of the box used to bound infinite planes.
pub const PLANE_EXTENT: FloatType = 1e6;

/// Infinite plane through `point`.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub point: WorldPoint,
    pub normal: Unit<WorldVector>,
}

impl Plane {
    pub fn new(point: WorldPoint, normal: Unit<WorldVector>) -> Self {
        Plane { point, normal }
    }

    /// Signed distance of a point above the plane.
    pub fn signed_distance(&self, point: &WorldPoint) -> FloatType {
        (point - self.point).dot(self.normal.as_ref())
    }
}

impl Object for Plane {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let denom = ray.direction.dot(self.normal.as_ref());
        if denom.abs() < EPSILON {
            return None;
        }
        let t = (self.point - ray.origin).dot(self.normal.as_ref()) / denom;
        if !in_range(t, t_min, t_max) {
            return None;
        }

        let point = ray.point_at(t);
        let tangent = any_perpendicular(&self.normal);
        let bitangent = self.normal.cross(&tangent);
        let offset = point - self.point;
        Some(
            ShapeHit::new(t, point, self.normal.into_inner()).with_texture_coordinates(
                TexturePoint::new(offset.dot(&tangent), offset.dot(&bitangent)),
            ),
        )
    }

    /// Planes are bounded by a huge box, thin along axis aligned normals.
    fn get_bounding_box(&self) -> WorldBox {
        let half_extents = self.normal.map(|n| {
            if (1.0 - n.abs()) < EPSILON {
                EPSILON
            } else {
                PLANE_EXTENT
            }
        });
        WorldBox::from_center(self.point, half_extents)
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.point += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        self.normal = rotation * self.normal;
    }

    fn center(&self) -> WorldPoint {
        self.point
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        disk_support(&self.point, &self.normal, PLANE_EXTENT, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{assert, let_assert};

    fn floor() -> Plane {
        Plane::new(WorldPoint::new(0.0, -1.0, 0.0), WorldVector::y_axis())
    }

    #[test]
    fn hit_from_above() {
        let ray = Ray::new([3.0, 4.0, -2.0].into(), -WorldVector::y());
        let_assert!(Some(h) = floor().intersect(&ray, 0.0, f32::INFINITY));
        assert!((h.t - 5.0).abs() < 1e-5);
        assert!(h.normal == WorldVector::y());
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new([0.0, 4.0, 0.0].into(), WorldVector::x());
        assert!(floor().intersect(&ray, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn behind_origin_misses() {
        let ray = Ray::new([0.0, 4.0, 0.0].into(), WorldVector::y());
        assert!(floor().intersect(&ray, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn bounding_box_is_thin_along_normal() {
        let b = floor().get_bounding_box();
        assert!(b.size().y < 1e-3);
        assert!(b.size().x > 1e5);
    }

    #[test]
    fn signed_distance() {
        assert!(floor().signed_distance(&WorldPoint::new(7.0, 1.0, 3.0)) == 2.0);
    }
}
