use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{FloatType, WorldPoint, WorldVector, normalize_or_self},
    scene::{Object, primitives::PLANE_EXTENT},
};

use super::gjk::SupportMap;

/// Physics view of a surface.
#[derive(Copy, Clone, Debug)]
pub enum ColliderShape<'a> {
    Sphere {
        center: WorldPoint,
        radius: FloatType,
    },
    /// Two sided plane `normal . x = offset`.
    Plane {
        normal: Unit<WorldVector>,
        offset: FloatType,
    },
    Box {
        center: WorldPoint,
        half_extents: WorldVector,
        orientation: Rotation3<FloatType>,
    },
    /// Any other convex shape, only known through its support function.
    Convex(&'a dyn Object),
}

#[derive(Copy, Clone, Debug)]
pub struct Collider<'a> {
    pub shape: ColliderShape<'a>,
    /// Zero for immovable bodies. Kept for dynamics, resting contacts ignore it.
    pub inverse_mass: FloatType,
}

impl<'a> Collider<'a> {
    pub fn new(shape: ColliderShape<'a>) -> Self {
        Collider {
            shape,
            inverse_mass: 0.0,
        }
    }

    pub fn with_inverse_mass(self, inverse_mass: FloatType) -> Self {
        Collider {
            inverse_mass,
            ..self
        }
    }

    pub fn center(&self) -> WorldPoint {
        match &self.shape {
            ColliderShape::Sphere { center, .. } | ColliderShape::Box { center, .. } => *center,
            ColliderShape::Plane { normal, offset } => WorldPoint::from(normal.as_ref() * *offset),
            ColliderShape::Convex(object) => object.center(),
        }
    }
}

impl SupportMap for Collider<'_> {
    fn support(&self, direction: &WorldVector) -> WorldPoint {
        match &self.shape {
            ColliderShape::Sphere { center, radius } => {
                center + normalize_or_self(*direction) * *radius
            }
            ColliderShape::Box {
                center,
                half_extents,
                orientation,
            } => {
                let local = orientation.inverse_transform_vector(direction);
                let corner = half_extents.zip_map(&local, |h, d| if d >= 0.0 { h } else { -h });
                center + orientation * corner
            }
            // Planes are never fed to GJK, a far point keeps the map total
            ColliderShape::Plane { normal, offset } => {
                WorldPoint::from(normal.as_ref() * *offset)
                    + (direction - normal.as_ref() * direction.dot(normal.as_ref()))
                        * PLANE_EXTENT
            }
            ColliderShape::Convex(object) => object.support(direction),
        }
    }
}

/// Result of a narrow phase test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub hit: bool,
    /// Unit vector pointing from the first body towards the second.
    pub normal: WorldVector,
    /// Penetration depth, zero when only the fact of touching is known.
    pub depth: FloatType,
    pub point: WorldPoint,
}

impl Contact {
    pub fn none() -> Self {
        Contact {
            hit: false,
            normal: WorldVector::zeros(),
            depth: 0.0,
            point: WorldPoint::origin(),
        }
    }

    pub fn new(normal: WorldVector, depth: FloatType, point: WorldPoint) -> Self {
        Contact {
            hit: true,
            normal,
            depth,
            point,
        }
    }

    /// The same contact seen from the other body.
    pub fn flipped(self) -> Self {
        Contact {
            normal: -self.normal,
            ..self
        }
    }
}
