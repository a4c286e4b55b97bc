//! Beam segments and the composite bodies that emit and receive them.

use log::info;
use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{FloatType, Ray, WorldBox, WorldPoint, WorldVector},
    material::{MaterialId, MaterialTable},
    scene::{
        Object, ObjectId, ShapeHit,
        primitives::{Sphere, disk_extents, disk_support, intersect_capped_cylinder},
    },
    util::{Color, WHITE},
};

/// One straight piece of a beam chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    pub origin: WorldPoint,
    pub direction: Unit<WorldVector>,
    pub length: FloatType,
    pub radius: FloatType,
    /// Distance from the chain's source to the origin of this segment.
    pub start: FloatType,
    /// Length of the whole chain this segment belongs to.
    pub total_length: FloatType,
    pub source: Option<ObjectId>,
    pub chain_index: usize,
}

impl Beam {
    /// A standalone segment, forming a chain of its own.
    pub fn new(
        origin: WorldPoint,
        direction: Unit<WorldVector>,
        length: FloatType,
        radius: FloatType,
    ) -> Self {
        let length = length.max(0.0);
        Beam {
            origin,
            direction,
            length,
            radius: radius.abs(),
            start: 0.0,
            total_length: length,
            source: None,
            chain_index: 0,
        }
    }

    pub fn end(&self) -> WorldPoint {
        self.origin + self.direction.as_ref() * self.length
    }

    /// Segments left over from a longer chain have zero length and are never hit.
    pub fn is_active(&self) -> bool {
        self.length > 0.0
    }

    pub(crate) fn retire(&mut self) {
        self.length = 0.0;
    }
}

impl Object for Beam {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        if !self.is_active() {
            return None;
        }
        let hit = intersect_capped_cylinder(
            ray,
            &self.origin,
            &self.direction,
            self.radius,
            self.length,
            t_min,
            t_max,
        )?;
        let ratio = if self.total_length > 0.0 {
            (self.start + hit.axial) / self.total_length
        } else {
            0.0
        };
        Some(ShapeHit::new(hit.t, ray.point_at(hit.t), hit.normal).with_beam_ratio(ratio))
    }

    fn get_bounding_box(&self) -> WorldBox {
        let extents = disk_extents(&self.direction, self.radius);
        let end = self.end();
        WorldBox::new(self.origin.inf(&end) - extents, self.origin.sup(&end) + extents)
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.origin += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        let pivot = self.center();
        self.direction = rotation * self.direction;
        self.origin = pivot - self.direction.as_ref() * (self.length / 2.0);
    }

    fn center(&self) -> WorldPoint {
        self.origin + self.direction.as_ref() * (self.length / 2.0)
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        let cap = if direction.dot(self.direction.as_ref()) >= 0.0 {
            self.end()
        } else {
            self.origin
        };
        disk_support(&cap, &self.direction, self.radius, direction)
    }
}

/// What a source emits along its direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamEmission {
    /// Length budget of the whole chain.
    pub length: FloatType,
    pub radius: FloatType,
    pub material: MaterialId,
    /// Intensity of the lights following the chain.
    pub intensity: FloatType,
}

const SOURCE_MID_RATIO: FloatType = 0.75;
const SOURCE_INNER_RATIO: FloatType = 0.5;

/// Hits on the inner sphere closer than this to the beam direction fall into the hole.
const SOURCE_HOLE_COS: FloatType = 0.8;

/// Beam emitter: an outer sphere, a middle sphere and an inner sphere with a hole
/// facing the emission direction.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamSource {
    pub center: WorldPoint,
    pub radius: FloatType,
    pub direction: Unit<WorldVector>,
    pub mid_material: MaterialId,
    pub inner_material: MaterialId,
    pub emission: BeamEmission,

    /// Length of the chain walked by the last rebuild.
    pub chain_length: FloatType,
    /// Segment slots owned by this source, in chain order. Slots past
    /// `live_segments` are retired and wait for a longer chain.
    pub(crate) chain: Vec<ObjectId>,
    pub(crate) live_segments: usize,
}

impl BeamSource {
    pub fn new(
        center: WorldPoint,
        radius: FloatType,
        direction: Unit<WorldVector>,
        mid_material: MaterialId,
        inner_material: MaterialId,
        emission: BeamEmission,
    ) -> Self {
        BeamSource {
            center,
            radius: radius.abs(),
            direction,
            mid_material,
            inner_material,
            emission,
            chain_length: 0.0,
            chain: Vec::new(),
            live_segments: 0,
        }
    }

    /// Point where the chain leaves the source.
    pub fn emission_point(&self) -> WorldPoint {
        self.center + self.direction.as_ref() * self.radius
    }

    /// Live segments of the last rebuild, in chain order.
    pub fn chain(&self) -> &[ObjectId] {
        &self.chain[..self.live_segments.min(self.chain.len())]
    }

    fn outer(&self) -> Sphere {
        Sphere::new(self.center, self.radius)
    }
}

impl Object for BeamSource {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let mid = Sphere::new(self.center, self.radius * SOURCE_MID_RATIO);
        let inner = Sphere::new(self.center, self.radius * SOURCE_INNER_RATIO);
        let direction = self.direction;
        let center = self.center;

        let outer_hit = self.outer().intersect(ray, t_min, t_max);
        let mid_hit = mid
            .intersect(ray, t_min, t_max)
            .map(|hit| hit.with_material(self.mid_material));
        let inner_hit = inner
            .intersect_where(ray, t_min, t_max, |point| {
                (point - center).normalize().dot(direction.as_ref()) <= SOURCE_HOLE_COS
            })
            .map(|hit| hit.with_material(self.inner_material));

        closest([outer_hit, mid_hit, inner_hit])
    }

    fn get_bounding_box(&self) -> WorldBox {
        self.outer().get_bounding_box()
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.center += delta;
    }

    fn rotate(&mut self, rotation: &Rotation3<FloatType>) {
        self.direction = rotation * self.direction;
    }

    fn center(&self) -> WorldPoint {
        self.center
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        self.outer().support(direction)
    }
}

const TARGET_MID_RATIO: FloatType = 0.7;
const TARGET_INNER_RATIO: FloatType = 0.4;

/// Time each flash phase stays on, in seconds.
pub const FLASH_PERIOD: FloatType = 0.25;
const FLASH_PHASES: usize = 3;
const FLASH_BRIGHTEN: FloatType = 1.5;

/// Goal effect of a target.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum GoalState {
    #[default]
    Idle,
    Flashing {
        phase: usize,
        elapsed: FloatType,
    },
}

/// Beam receiver made of three concentric spheres, the middle one flashes while lit.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamTarget {
    pub center: WorldPoint,
    pub radius: FloatType,
    pub mid_material: MaterialId,
    pub inner_material: MaterialId,
    pub lit: bool,
    pub goal: GoalState,
}

impl BeamTarget {
    pub fn new(
        center: WorldPoint,
        radius: FloatType,
        mid_material: MaterialId,
        inner_material: MaterialId,
    ) -> Self {
        BeamTarget {
            center,
            radius: radius.abs(),
            mid_material,
            inner_material,
            lit: false,
            goal: GoalState::Idle,
        }
    }

    fn outer(&self) -> Sphere {
        Sphere::new(self.center, self.radius)
    }

    /// Steps the flashing effect, writing the current phase into the middle material's color.
    pub fn update_goal(&mut self, dt: FloatType, materials: &mut MaterialTable) {
        let Some(material) = materials.get_mut(self.mid_material) else {
            return;
        };

        self.goal = match (self.goal, self.lit) {
            (GoalState::Idle, false) => GoalState::Idle,
            (GoalState::Flashing { .. }, false) => {
                info!("Target at {:?} went dark", self.center);
                material.color = material.base_color;
                GoalState::Idle
            }
            (GoalState::Idle, true) => {
                info!("Target at {:?} lit", self.center);
                GoalState::Flashing {
                    phase: 0,
                    elapsed: 0.0,
                }
            }
            (GoalState::Flashing { phase, elapsed }, true) => {
                let elapsed = elapsed + dt.max(0.0);
                let steps = (elapsed / FLASH_PERIOD).floor();
                GoalState::Flashing {
                    phase: (phase + steps as usize) % FLASH_PHASES,
                    elapsed: elapsed - steps * FLASH_PERIOD,
                }
            }
        };

        if let GoalState::Flashing { phase, .. } = self.goal {
            material.color = flash_color(phase, material.base_color);
        }
    }
}

fn flash_color(phase: usize, base: Color) -> Color {
    match phase {
        0 => Color::new(
            (base.r * FLASH_BRIGHTEN).min(1.0),
            (base.g * FLASH_BRIGHTEN).min(1.0),
            (base.b * FLASH_BRIGHTEN).min(1.0),
        ),
        1 => WHITE,
        _ => base,
    }
}

impl Object for BeamTarget {
    fn intersect(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<ShapeHit> {
        let mid = Sphere::new(self.center, self.radius * TARGET_MID_RATIO);
        let inner = Sphere::new(self.center, self.radius * TARGET_INNER_RATIO);

        closest([
            self.outer().intersect(ray, t_min, t_max),
            mid.intersect(ray, t_min, t_max)
                .map(|hit| hit.with_material(self.mid_material)),
            inner
                .intersect(ray, t_min, t_max)
                .map(|hit| hit.with_material(self.inner_material)),
        ])
    }

    fn get_bounding_box(&self) -> WorldBox {
        self.outer().get_bounding_box()
    }

    fn translate(&mut self, delta: &WorldVector) {
        self.center += delta;
    }

    fn rotate(&mut self, _rotation: &Rotation3<FloatType>) {}

    fn center(&self) -> WorldPoint {
        self.center
    }

    fn support(&self, direction: &WorldVector) -> WorldPoint {
        self.outer().support(direction)
    }
}

fn closest<const N: usize>(hits: [Option<ShapeHit>; N]) -> Option<ShapeHit> {
    hits.into_iter()
        .flatten()
        .min_by(|a, b| a.t.total_cmp(&b.t))
}
