use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{EPSILON, FloatType, Ray, WorldBox, WorldPoint, WorldVector, normalize_or_self},
    scene::{Object, ShapeHit, in_range},
};

use super::{cylindrical_uv, disk_extents, disk_support, intersect_disk, solve_quadratic};

/// Solid cone standing on a disk of `radius` at `base`, apex `height` along `axis`.
/// The radius shrinks linearly from the base to the apex.
#[derive(Clone, Debug, PartialEq)]
pub struct Cone {
    pub base: WorldPoint,
    pub axis: Unit<WorldVector>,
    pub radius: FloatType,
    pub height: FloatType,
}

impl Cone {
    pub fn new(
        base: WorldPoint,
        axis: Unit<WorldVector>,
        radius: FloatType,
        height: FloatType,
    ) -> Self {
        Cone {
            base,
            axis,
            radius: radius.abs(),
            height: height.abs(),
        }
    }

    pub fn apex(&self) -> WorldPoint {
        self.base + self.axis.as_ref() * self.height
    }

    fn intersect_side(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        if self.height <= 0.0 {
            return None;
        }
        let axis = self.axis.as_ref();
        let k2 = (self.radius / self.height).powi(2);

        let w0 = ray.origin - self.apex();
        let d_axial = ray.direction.dot(axis);
        let w_axial = w0.dot(axis);
        let d_perp = ray.direction - axis * d_axial;
        let w_perp = w0 - axis * w_axial;

        let a = d_perp.dot(&d_perp) - k2 * d_axial * d_axial;
        let b = 2.0 * (d_perp.dot(&w_perp) - k2 * d_axial * w_axial);
        let c = w_perp.dot(&w_perp) - k2 * w_axial * w_axial;

        let roots = if a.abs() < EPSILON {
            // Ray parallel to a generator line, single crossing
            if b.abs() < EPSILON {
                return None;
            }
            let t = -c / b;
            (t, t)
        } else {
            solve_quadratic(a, b, c)?
        };

        [roots.0, roots.1]
            .into_iter()
            .filter(|t| in_range(*t, t_min, t_max))
            .find_map(|t| {
                let w = w0 + ray.direction * t;
                // Distance from the apex towards the base
                let s = -w.dot(axis);
                if !(0.0..=self.height).contains(&s) {
                    return None;
                }
                let w_perp = w - axis * w.dot(axis);
                let normal = normalize_or_self(w_perp + axis * (k2 * s));
                let point = ray.point_at(t);
                Some(ShapeHit::new(t, point, normal).with_texture_coordinates(
                    cylindrical_uv(&point, &self.base, axis, self.height),
                ))
            })
    }
}

impl Object for Cone {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let side = self.intersect_side(ray, t_min, t_max);
        let cap_max = side.as_ref().map_or(t_max, |hit| hit.t);
        let normal = -self.axis.into_inner();
        let cap = intersect_disk(ray, &self.base, &normal, self.radius, t_min, cap_max)
            .filter(|t| side.as_ref().is_none_or(|hit| *t < hit.t))
            .map(|t| {
                let point = ray.point_at(t);
                ShapeHit::new(t, point, normal).with_texture_coordinates(cylindrical_uv(
                    &point,
                    &self.base,
                    &self.axis,
                    self.height,
                ))
            });
        cap.or(side)
    }

    fn get_bounding_box(&self) -> WorldBox {
        let apex = self.apex();
        WorldBox::from_center(self.base, disk_extents(&self.axis, self.radius))
            .surrounding(&WorldBox::new(apex, apex))
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.base += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        let pivot = self.center();
        self.axis = rotation * self.axis;
        self.base = pivot - self.axis.as_ref() * (self.height / 2.0);
    }

    /// Midpoint of the axis, used as the rotation pivot.
    fn center(&self) -> WorldPoint {
        self.base + self.axis.as_ref() * (self.height / 2.0)
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        let apex = self.apex();
        let rim = disk_support(&self.base, &self.axis, self.radius, direction);
        if apex.coords.dot(direction) >= rim.coords.dot(direction) {
            apex
        } else {
            rim
        }
    }
}
