use std::f32::consts::PI;

use nalgebra::Rotation3;

use crate::{
    geometry::{FloatType, Ray, TexturePoint, WorldBox, WorldPoint, WorldVector, normalize_or_self},
    scene::{Object, ShapeHit, in_range},
};

use super::solve_quadratic;

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType) -> Self {
        Sphere {
            center,
            radius: radius.abs(),
        }
    }

    /// Nearest hit in range whose point passes `accept`.
    /// Used by composite bodies to cut openings into a sphere.
    pub(crate) fn intersect_where(
        &self,
        ray: &Ray,
        t_min: FloatType,
        t_max: FloatType,
        accept: impl Fn(&WorldPoint) -> bool,
    ) -> Option<ShapeHit> {
        let oc = ray.origin - self.center;
        let (t1, t2) = solve_quadratic(
            ray.direction.dot(&ray.direction),
            2.0 * oc.dot(&ray.direction),
            oc.dot(&oc) - self.radius * self.radius,
        )?;

        [t1, t2]
            .into_iter()
            .filter(|t| in_range(*t, t_min, t_max))
            .map(|t| (t, ray.point_at(t)))
            .find(|(_, point)| accept(point))
            .map(|(t, point)| {
                let normal = (point - self.center) / self.radius;
                ShapeHit::new(t, point, normal).with_texture_coordinates(spherical_uv(&normal))
            })
    }
}

impl Object for Sphere {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        self.intersect_where(ray, t_min, t_max, |_| true)
    }

    fn get_bounding_box(&self) -> WorldBox {
        WorldBox::from_center(self.center, WorldVector::repeat(self.radius))
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.center += delta;
    }

    fn rotate(&mut self, _rotation: &Rotation3<FloatType>) {}

    fn center(&self) -> WorldPoint {
        self.center
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        self.center + normalize_or_self(*direction) * self.radius
    }
}

fn spherical_uv(normal: &WorldVector) -> TexturePoint {
    TexturePoint::new(
        0.5 + normal.z.atan2(normal.x) / (2.0 * PI),
        0.5 + normal.y.clamp(-1.0, 1.0).asin() / PI,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{assert, let_assert};

    fn sphere() -> Sphere {
        Sphere::new([1.0, 2.0, 3.0].into(), 1.0)
    }

    #[test]
    fn test_direct_hit_through_center() {
        let ray = Ray::new([1.0, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());
        let_assert!(Some(h) = sphere().intersect(&ray, 0.0, f32::INFINITY));
        assert!((h.t - 2.0).abs() < 1e-6);
        assert!((h.normal - WorldVector::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_near_grazing_hit() {
        let ray = Ray::new([1.99, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());
        let_assert!(Some(h) = sphere().intersect(&ray, 0.0, f32::INFINITY));
        assert!((h.t - 3.0).abs() < 0.2);
    }

    #[test]
    fn test_exact_grazing_counts_as_miss() {
        let ray = Ray::new([2.0, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());
        assert!(sphere().intersect(&ray, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_narrow_miss() {
        let ray = Ray::new([2.0, 2.01, 0.0].into(), [0.0, 0.0, 1.0].into());
        assert!(sphere().intersect(&ray, 0.0, f32::INFINITY).is_none());
    }

    #[test]
    fn test_inside_hits_far_side() {
        let ray = Ray::new([1.0, 2.0, 3.0].into(), [0.0, 0.0, 1.0].into());
        let_assert!(Some(h) = sphere().intersect(&ray, 0.0, f32::INFINITY));
        assert!((h.t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_t_max_is_inclusive_bound() {
        let ray = Ray::new([1.0, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());
        assert!(sphere().intersect(&ray, 0.0, 1.5).is_none());
        assert!(sphere().intersect(&ray, 2.5, 10.0).is_some_and(|h| (h.t - 4.0).abs() < 1e-5));
    }
}
