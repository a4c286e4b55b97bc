use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{FloatType, Ray, WorldBox, WorldPoint, WorldVector},
    scene::{Object, ShapeHit},
};

use super::{cylindrical_uv, disk_extents, disk_support, intersect_capped_cylinder};

/// Capped cylinder centered on `center`, extending `height / 2` along both directions of `axis`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    pub center: WorldPoint,
    pub axis: Unit<WorldVector>,
    pub radius: FloatType,
    pub height: FloatType,
}

impl Cylinder {
    pub fn new(
        center: WorldPoint,
        axis: Unit<WorldVector>,
        radius: FloatType,
        height: FloatType,
    ) -> Self {
        Cylinder {
            center,
            axis,
            radius: radius.abs(),
            height: height.abs(),
        }
    }

    fn base(&self) -> WorldPoint {
        self.center - self.axis.as_ref() * (self.height / 2.0)
    }
}

impl Object for Cylinder {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let base = self.base();
        let hit = intersect_capped_cylinder(
            ray,
            &base,
            &self.axis,
            self.radius,
            self.height,
            t_min,
            t_max,
        )?;
        let point = ray.point_at(hit.t);
        Some(
            ShapeHit::new(hit.t, point, hit.normal).with_texture_coordinates(cylindrical_uv(
                &point,
                &base,
                &self.axis,
                self.height,
            )),
        )
    }

    fn get_bounding_box(&self) -> WorldBox {
        let half_extents = self.axis.map(|a| a.abs() * self.height / 2.0)
            + disk_extents(&self.axis, self.radius);
        WorldBox::from_center(self.center, half_extents)
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.center += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        self.axis = rotation * self.axis;
    }

    fn center(&self) -> WorldPoint {
        self.center
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        let cap_offset = if direction.dot(self.axis.as_ref()) >= 0.0 {
            self.height / 2.0
        } else {
            -self.height / 2.0
        };
        let cap_center = self.center + self.axis.as_ref() * cap_offset;
        disk_support(&cap_center, &self.axis, self.radius, direction)
    }
}
