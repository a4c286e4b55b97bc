use bon::bon;
use nalgebra::Rotation3;

use crate::{
    collision::{Collider, ColliderShape},
    geometry::{FloatType, Ray, WorldBox, WorldPoint, WorldVector, axis_rotation},
    material::MaterialId,
    scene::{
        HitRecord, Object, ObjectId, ShapeHit,
        beam::{Beam, BeamSource, BeamTarget},
        primitives::{Cone, Cube, Cylinder, Plane, Sphere},
    },
};

/// Closed set of shapes a surface can have.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Cube(Cube),
    Cylinder(Cylinder),
    Cone(Cone),
    Plane(Plane),
    Beam(Beam),
    BeamSource(BeamSource),
    BeamTarget(BeamTarget),
}

impl Shape {
    pub fn as_object(&self) -> &dyn Object {
        match self {
            Shape::Sphere(s) => s,
            Shape::Cube(s) => s,
            Shape::Cylinder(s) => s,
            Shape::Cone(s) => s,
            Shape::Plane(s) => s,
            Shape::Beam(s) => s,
            Shape::BeamSource(s) => s,
            Shape::BeamTarget(s) => s,
        }
    }

    pub fn as_object_mut(&mut self) -> &mut dyn Object {
        match self {
            Shape::Sphere(s) => s,
            Shape::Cube(s) => s,
            Shape::Cylinder(s) => s,
            Shape::Cone(s) => s,
            Shape::Plane(s) => s,
            Shape::Beam(s) => s,
            Shape::BeamSource(s) => s,
            Shape::BeamTarget(s) => s,
        }
    }

    pub fn is_beam(&self) -> bool {
        matches!(self, Shape::Beam(_))
    }

    pub fn is_plane(&self) -> bool {
        matches!(self, Shape::Plane(_))
    }
}

impl Object for Shape {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        self.as_object().intersect(ray, t_min, t_max)
    }

    fn get_bounding_box(&self) -> WorldBox {
        self.as_object().get_bounding_box()
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.as_object_mut().translate(delta)
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        self.as_object_mut().rotate(rotation)
    }

    fn center(&self) -> WorldPoint {
        self.as_object().center()
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        self.as_object().support(direction)
    }
}

/// A shape placed in the scene, with its material and behavior flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub id: ObjectId,
    pub material: MaterialId,
    pub shape: Shape,
    pub movable: bool,
    pub rotatable: bool,
    pub casts_shadow: bool,
    /// Stops beams and shadows even when the material is transparent.
    pub blocks_light: bool,
}

#[bon]
impl Surface {
    #[builder]
    pub fn new(
        shape: Shape,
        material: MaterialId,
        #[builder(default = ObjectId::new(0))] id: ObjectId,
        #[builder(default)] movable: bool,
        #[builder(default)] rotatable: bool,
        #[builder(default = true)] casts_shadow: bool,
        #[builder(default)] blocks_light: bool,
    ) -> Self {
        Surface {
            id,
            material,
            shape,
            movable,
            rotatable,
            casts_shadow,
            blocks_light,
        }
    }
}

impl Surface {
    /// Intersection reported with this surface's id and material.
    pub fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<HitRecord> {
        let hit = self.shape.intersect(ray, t_min, t_max)?;
        Some(HitRecord::new(ray, hit, self.id, self.material))
    }

    pub fn translate(&mut self, delta: &WorldVector) {
        self.shape.translate(delta);
    }

    /// Rotates around the shape's center. Zero axes are ignored.
    pub fn rotate(&mut self, axis: &WorldVector, angle: FloatType) {
        if let Some(rotation) = axis_rotation(axis, angle) {
            self.shape.rotate(&rotation);
        }
    }

    /// Whether the surface can currently be hit by rays.
    pub fn is_visible(&self) -> bool {
        match &self.shape {
            Shape::Beam(beam) => beam.is_active(),
            _ => true,
        }
    }

    /// Whether the surface takes part in collisions. Beams are light, not matter.
    pub fn is_solid(&self) -> bool {
        !self.shape.is_beam()
    }

    /// Every material referenced by the surface.
    pub fn materials(&self) -> impl Iterator<Item = MaterialId> + '_ {
        let extra = match &self.shape {
            Shape::BeamSource(source) => vec![
                source.mid_material,
                source.inner_material,
                source.emission.material,
            ],
            Shape::BeamTarget(target) => vec![target.mid_material, target.inner_material],
            _ => Vec::new(),
        };
        std::iter::once(self.material).chain(extra)
    }

    /// Physics view of the surface.
    pub fn collider(&self) -> Collider<'_> {
        let shape = match &self.shape {
            Shape::Sphere(sphere) => ColliderShape::Sphere {
                center: sphere.center,
                radius: sphere.radius,
            },
            Shape::BeamSource(BeamSource { center, radius, .. })
            | Shape::BeamTarget(BeamTarget { center, radius, .. }) => ColliderShape::Sphere {
                center: *center,
                radius: *radius,
            },
            Shape::Plane(plane) => ColliderShape::Plane {
                normal: plane.normal,
                offset: plane.point.coords.dot(plane.normal.as_ref()),
            },
            Shape::Cube(cube) => ColliderShape::Box {
                center: cube.center,
                half_extents: cube.half_extents,
                orientation: cube.orientation,
            },
            other => ColliderShape::Convex(other.as_object()),
        };
        Collider::new(shape)
    }
}
