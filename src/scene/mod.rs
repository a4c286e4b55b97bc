pub mod beam;
pub mod bvh;
mod light;
mod movement;
pub mod primitives;
mod propagation;
mod surface;

pub use beam::{Beam, BeamEmission, BeamSource, BeamTarget, GoalState};
pub use light::{Ambient, LightId, PointLight, Spotlight};
pub use movement::CAMERA_SKIN;
pub use propagation::MAX_CHAIN_SEGMENTS;
pub use surface::{Shape, Surface};

use std::fmt;

use index_vec::IndexVec;
use nalgebra::{Rotation3, Unit};
use thiserror::Error;

use crate::{
    collision::{BroadPhase, narrow_phase},
    geometry::{FloatType, Ray, TexturePoint, WorldBox, WorldPoint, WorldVector},
    material::{MaterialId, MaterialTable},
};

use bvh::Bvh;

index_vec::define_index_type! {
    /// Index of a surface in the scene, stable for the lifetime of the scene.
    pub struct ObjectId = u32;
}

/// Geometric capability shared by every shape.
pub trait Object: fmt::Debug {
    /// Nearest intersection with `t` in `(t_min, t_max]`.
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit>;
    fn get_bounding_box(&self) -> WorldBox;

    fn translate(&mut self, delta: &WorldVector);
    /// Rotates around `center()`. Shapes without orientation ignore this.
    fn rotate(&mut self, rotation: &Rotation3<FloatType>);
    fn center(&self) -> WorldPoint;

    /// Farthest point of the shape in `direction`.
    fn support(&self, direction: &WorldVector) -> WorldPoint;
}

/// Intersection as reported by a single shape, before the scene attaches ids.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeHit {
    pub t: FloatType,
    pub point: WorldPoint,
    /// Outward facing unit normal.
    pub normal: WorldVector,
    pub texture_coordinates: TexturePoint,
    pub beam_ratio: FloatType,
    /// Composite bodies paint their layers with their own materials.
    pub material: Option<MaterialId>,
}

impl ShapeHit {
    pub fn new(t: FloatType, point: WorldPoint, normal: WorldVector) -> Self {
        ShapeHit {
            t,
            point,
            normal,
            texture_coordinates: TexturePoint::origin(),
            beam_ratio: 0.0,
            material: None,
        }
    }

    pub fn with_texture_coordinates(self, texture_coordinates: TexturePoint) -> Self {
        ShapeHit {
            texture_coordinates,
            ..self
        }
    }

    pub fn with_beam_ratio(self, beam_ratio: FloatType) -> Self {
        ShapeHit {
            beam_ratio: beam_ratio.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn with_material(self, material: MaterialId) -> Self {
        ShapeHit {
            material: Some(material),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub t: FloatType,
    pub point: WorldPoint,
    /// Unit normal facing against the incoming ray.
    pub normal: Unit<WorldVector>,
    /// Whether the ray hit the outside of the surface.
    pub front_face: bool,
    pub object: ObjectId,
    pub material: MaterialId,
    /// Position of the hit along a beam chain, 0 at the source and 1 at the end.
    pub beam_ratio: FloatType,
    pub texture_coordinates: TexturePoint,
}

impl HitRecord {
    pub fn new(ray: &Ray, hit: ShapeHit, object: ObjectId, material: MaterialId) -> Self {
        let front_face = ray.direction.dot(&hit.normal) <= 0.0;
        let outward = if front_face { hit.normal } else { -hit.normal };
        HitRecord {
            t: hit.t,
            point: hit.point,
            normal: Unit::new_normalize(outward),
            front_face,
            object,
            material: hit.material.unwrap_or(material),
            beam_ratio: hit.beam_ratio,
            texture_coordinates: hit.texture_coordinates,
        }
    }
}

/// Half open interval check used by all intersection routines.
pub(crate) fn in_range(t: FloatType, t_min: FloatType, t_max: FloatType) -> bool {
    t > t_min && t <= t_max
}

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("Object at index {index} claims id {id}")]
    ObjectIdMismatch { index: usize, id: usize },

    #[error("Object {object} uses material {material}, but only {count} materials exist")]
    UnknownMaterial {
        object: usize,
        material: usize,
        count: usize,
    },

    #[error("Light {light} is attached to object {object}, which does not exist")]
    UnknownAttachment { light: usize, object: usize },
}

/// Progress towards the level goal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreState {
    /// Number of targets that have to be lit at the same time.
    pub target_required: usize,
    /// Score the caller expects the player to reach, kept with the level data.
    pub minimal_score: u32,
    pub lit_targets: usize,
}

impl ScoreState {
    pub fn goal_reached(&self) -> bool {
        self.lit_targets >= self.target_required
    }
}

/// Acceleration structures, only valid while geometry stays unchanged.
#[derive(Clone, Debug)]
struct SpatialIndex {
    bvh: Option<Bvh>,
    planes: Vec<ObjectId>,
}

#[derive(Clone, Debug)]
pub struct Scene {
    objects: IndexVec<ObjectId, Surface>,
    lights: IndexVec<LightId, PointLight>,
    pub ambient: Ambient,
    pub score: ScoreState,

    index: Option<SpatialIndex>,
    broad_phase: BroadPhase,

    /// Lights coming from the scene description, generated beam lights follow them.
    static_light_count: usize,
}

impl Scene {
    pub fn new(ambient: Ambient) -> Self {
        Scene {
            objects: IndexVec::new(),
            lights: IndexVec::new(),
            ambient,
            score: ScoreState::default(),
            index: None,
            broad_phase: BroadPhase::default(),
            static_light_count: 0,
        }
    }

    /// Builds a scene from already parsed parts, checking that ids are dense and references valid.
    pub fn from_parts(
        objects: Vec<Surface>,
        lights: Vec<PointLight>,
        ambient: Ambient,
        materials: &MaterialTable,
    ) -> Result<Self, SceneError> {
        for (index, surface) in objects.iter().enumerate() {
            if surface.id.index() != index {
                return Err(SceneError::ObjectIdMismatch {
                    index,
                    id: surface.id.index(),
                });
            }
            check_materials(surface, materials)?;
        }
        for (index, light) in lights.iter().enumerate() {
            if let Some(object) = light.attached {
                if object.index() >= objects.len() {
                    return Err(SceneError::UnknownAttachment {
                        light: index,
                        object: object.index(),
                    });
                }
            }
        }

        let mut scene = Scene::new(ambient);
        scene.static_light_count = lights.len();
        scene.objects = IndexVec::from_vec(objects);
        scene.lights = IndexVec::from_vec(lights);
        scene.adopt_beam_segments();
        Ok(scene)
    }

    /// Appends a surface, assigning it the next free id.
    pub fn add_surface(
        &mut self,
        mut surface: Surface,
        materials: &MaterialTable,
    ) -> Result<ObjectId, SceneError> {
        surface.id = self.objects.next_idx();
        check_materials(&surface, materials)?;
        self.invalidate();
        Ok(self.objects.push(surface))
    }

    pub fn add_light(&mut self, light: PointLight) -> Result<LightId, SceneError> {
        if let Some(object) = light.attached {
            if object.index() >= self.objects.len() {
                return Err(SceneError::UnknownAttachment {
                    light: self.lights.len(),
                    object: object.index(),
                });
            }
        }
        // Generated beam lights always come last
        self.lights.truncate(self.static_light_count);
        self.static_light_count += 1;
        Ok(self.lights.push(light))
    }

    pub fn objects(&self) -> &IndexVec<ObjectId, Surface> {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&Surface> {
        self.objects.get(id)
    }

    pub fn lights(&self) -> &IndexVec<LightId, PointLight> {
        &self.lights
    }

    /// Rebuilds everything derived from geometry: beam chains, their lights and the
    /// acceleration structures. Call after mutating the scene and before rendering.
    pub fn refresh(&mut self, materials: &MaterialTable) {
        self.rebuild_index();
        self.rebuild_beams(materials);
        self.rebuild_index();
        self.broad_phase.invalidate();
    }

    /// Advances the flashing of lit targets.
    pub fn update_goals(&mut self, dt: FloatType, materials: &mut MaterialTable) {
        for surface in self.objects.iter_mut() {
            if let Shape::BeamTarget(target) = &mut surface.shape {
                target.update_goal(dt, materials);
            }
        }
    }

    /// Nearest hit along the ray within `(t_min, t_max]`.
    pub fn hit(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<HitRecord> {
        self.hit_filtered(ray, t_min, t_max, |_| true)
    }

    /// Nearest hit ignoring every surface rejected by `accept`.
    pub fn hit_filtered(
        &self,
        ray: &Ray,
        t_min: FloatType,
        t_max: FloatType,
        accept: impl Fn(&Surface) -> bool,
    ) -> Option<HitRecord> {
        if ray.is_degenerate() {
            return None;
        }

        let test = |id: ObjectId, t_max: FloatType| {
            let surface = &self.objects[id];
            if accept(surface) {
                surface.intersect(ray, t_min, t_max)
            } else {
                None
            }
        };

        let Some(index) = &self.index else {
            // Geometry changed since the last refresh, test everything
            return self.objects.indices().fold(None, |best, id| {
                let limit = best.as_ref().map_or(t_max, |h: &HitRecord| h.t);
                test(id, limit).or(best)
            });
        };

        let best = index
            .bvh
            .as_ref()
            .and_then(|bvh| bvh.nearest_hit(ray, t_min, t_max, |id, limit| test(id, limit)));

        index.planes.iter().fold(best, |best, id| {
            let limit = best.as_ref().map_or(t_max, |h| h.t);
            test(*id, limit).or(best)
        })
    }

    /// Tests the object against everything it could touch.
    pub fn collides(&mut self, id: ObjectId) -> bool {
        let Some(surface) = self.objects.get(id) else {
            return false;
        };
        if !surface.is_solid() {
            return false;
        }
        let collider = surface.collider();
        let bounding_box = surface.shape.get_bounding_box();

        let candidates = self.broad_phase.candidates(&self.objects, &bounding_box);
        let planes = self
            .objects
            .iter()
            .filter(|other| matches!(other.shape, Shape::Plane(_)))
            .map(|other| other.id);

        candidates
            .into_iter()
            .chain(planes)
            .filter(|other| *other != id)
            .any(|other| {
                narrow_phase::collide(&collider, &self.objects[other].collider()).hit
            })
    }

    /// Drops acceleration structures after a geometry change.
    fn invalidate(&mut self) {
        self.index = None;
        self.broad_phase.invalidate();
    }

    fn rebuild_index(&mut self) {
        let (bounded, planes): (Vec<_>, Vec<_>) = self
            .objects
            .iter()
            .filter(|surface| surface.is_visible())
            .map(|surface| surface.id)
            .partition(|id| !matches!(self.objects[*id].shape, Shape::Plane(_)));

        let bvh = Bvh::build(
            bounded
                .into_iter()
                .map(|id| (id, self.objects[id].shape.get_bounding_box()))
                .collect(),
        );
        if let Some(bvh) = &bvh {
            bvh.log_statistics();
        }
        self.index = Some(SpatialIndex { bvh, planes });
    }
}

fn check_materials(surface: &Surface, materials: &MaterialTable) -> Result<(), SceneError> {
    match surface
        .materials()
        .find(|material| material.index() >= materials.len())
    {
        Some(material) => Err(SceneError::UnknownMaterial {
            object: surface.id.index(),
            material: material.index(),
            count: materials.len(),
        }),
        None => Ok(()),
    }
}
