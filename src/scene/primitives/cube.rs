use nalgebra::Rotation3;

use crate::{
    geometry::{FloatType, Ray, TexturePoint, WorldBox, WorldPoint, WorldVector},
    scene::{Object, ShapeHit, in_range},
};

/// Box with its own orientation, intersected in its local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    pub center: WorldPoint,
    pub half_extents: WorldVector,
    pub orientation: Rotation3<FloatType>,
}

impl Cube {
    pub fn new(center: WorldPoint, size: FloatType) -> Self {
        Self::with_extents(center, WorldVector::repeat(size / 2.0))
    }

    pub fn with_extents(center: WorldPoint, half_extents: WorldVector) -> Self {
        Cube {
            center,
            half_extents: half_extents.abs(),
            orientation: Rotation3::identity(),
        }
    }

    fn to_local(&self, point: &WorldPoint) -> WorldVector {
        self.orientation.inverse_transform_vector(&(point - self.center))
    }
}

impl Object for Cube {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let origin = self.to_local(&ray.origin);
        let direction = self.orientation.inverse_transform_vector(&ray.direction);

        let mut near = FloatType::NEG_INFINITY;
        let mut far = FloatType::INFINITY;
        for axis in 0..3 {
            let h = self.half_extents[axis];
            if direction[axis] == 0.0 {
                // Parallel to the slab, either always inside or never
                if origin[axis].abs() > h {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction[axis];
            let t1 = (-h - origin[axis]) * inv;
            let t2 = (h - origin[axis]) * inv;
            near = near.max(t1.min(t2));
            far = far.min(t1.max(t2));
        }

        if near > far {
            return None;
        }
        let t = [near, far].into_iter().find(|t| in_range(*t, t_min, t_max))?;

        let local_point = origin + direction * t;
        let (axis, _) = local_point
            .component_div(&self.half_extents.map(|h| h.max(FloatType::EPSILON)))
            .abs()
            .argmax();
        let mut local_normal = WorldVector::zeros();
        local_normal[axis] = local_point[axis].signum();

        let (u_axis, v_axis) = ((axis + 1) % 3, (axis + 2) % 3);
        let uv = TexturePoint::new(
            face_coordinate(local_point[u_axis], self.half_extents[u_axis]),
            face_coordinate(local_point[v_axis], self.half_extents[v_axis]),
        );

        Some(
            ShapeHit::new(t, ray.point_at(t), self.orientation * local_normal)
                .with_texture_coordinates(uv),
        )
    }

    fn get_bounding_box(&self) -> WorldBox {
        let corners = WorldBox::from_center(WorldPoint::origin(), self.half_extents)
            .corners()
            .map(|corner| self.center + self.orientation * corner.coords);
        WorldBox::from_points(corners.iter())
            .unwrap_or_else(|| WorldBox::new(self.center, self.center))
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.center += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        self.orientation = rotation * self.orientation;
    }

    fn center(&self) -> WorldPoint {
        self.center
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        let local = self.orientation.inverse_transform_vector(direction);
        let corner = self
            .half_extents
            .zip_map(&local, |h, d| if d >= 0.0 { h } else { -h });
        self.center + self.orientation * corner
    }
}

fn face_coordinate(x: FloatType, half_extent: FloatType) -> FloatType {
    if half_extent > 0.0 {
        (x / half_extent + 1.0) / 2.0
    } else {
        0.0
    }
}
