//! Re-walking beam chains after geometry changes.
//!
//! Every source owns a list of segment slots. A rebuild overwrites the slots in
//! chain order, appends new surfaces when the chain got longer and retires the
//! surplus when it got shorter, so segment ids never dangle.

use log::{debug, warn};
use nalgebra::Unit;

use crate::{
    geometry::{EPSILON, FloatType, Ray, WorldPoint, WorldVector, reflect},
    material::MaterialTable,
    scene::{
        HitRecord, ObjectId, Scene, Shape, Surface,
        beam::{Beam, BeamEmission},
        light::{PointLight, Spotlight},
    },
    util::WHITE,
};

/// Bounds the chain between parallel mirrors.
pub const MAX_CHAIN_SEGMENTS: usize = 64;

/// Opening of the spotlight following each segment.
const SEGMENT_LIGHT_CUTOFF_COS: FloatType = 0.9;

/// Straight piece found by the walk, before it is written into a slot.
#[derive(Copy, Clone, Debug)]
struct Segment {
    origin: WorldPoint,
    direction: Unit<WorldVector>,
    length: FloatType,
}

impl Scene {
    /// Links segments given with the scene to their sources.
    /// Segments without a valid source stay static geometry.
    pub(super) fn adopt_beam_segments(&mut self) {
        let mut adopted = Vec::new();
        for surface in self.objects.iter() {
            let Shape::Beam(beam) = &surface.shape else {
                continue;
            };
            let Some(source) = beam.source else {
                continue;
            };
            adopted.push((source, beam.chain_index, surface.id));
        }

        adopted.sort_by_key(|(source, chain_index, _)| (*source, *chain_index));
        for (source, _, segment) in adopted {
            if let Some(Shape::BeamSource(beam_source)) =
                self.objects.get_mut(source).map(|surface| &mut surface.shape)
            {
                beam_source.chain.push(segment);
                beam_source.live_segments = beam_source.chain.len();
                continue;
            }
            warn!("Beam segment {segment:?} refers to {source:?}, which is not a beam source");
            if let Shape::Beam(beam) = &mut self.objects[segment].shape {
                beam.source = None;
            }
        }
    }

    /// Walks every source again, rewriting its segments and regenerating their lights.
    pub(super) fn rebuild_beams(&mut self, materials: &MaterialTable) {
        for surface in self.objects.iter_mut() {
            if let Shape::BeamTarget(target) = &mut surface.shape {
                target.lit = false;
            }
        }
        self.lights.truncate(self.static_light_count);

        let sources: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|surface| matches!(surface.shape, Shape::BeamSource(_)))
            .map(|surface| surface.id)
            .collect();
        for source in sources {
            self.rebuild_chain(source, materials);
        }

        self.score.lit_targets = self
            .objects
            .iter()
            .filter(|surface| matches!(&surface.shape, Shape::BeamTarget(target) if target.lit))
            .count();
        debug!(
            "Rebuilt beams, {} lights, {} of {} targets lit",
            self.lights.len(),
            self.score.lit_targets,
            self.score.target_required
        );
    }

    fn rebuild_chain(&mut self, source_id: ObjectId, materials: &MaterialTable) {
        let Shape::BeamSource(source) = &self.objects[source_id].shape else {
            return;
        };
        let emission = source.emission;
        let slots = source.chain.clone();

        let (segments, lit_target) = self.walk(
            source_id,
            source.emission_point(),
            source.direction,
            emission.length,
            materials,
        );
        if let Some(target) = lit_target {
            if let Shape::BeamTarget(target) = &mut self.objects[target].shape {
                target.lit = true;
            }
        }

        let total_length: FloatType = segments.iter().map(|segment| segment.length).sum();
        let mut chain = Vec::with_capacity(slots.len().max(segments.len()));
        let mut start = 0.0;
        for (chain_index, segment) in segments.iter().enumerate() {
            let beam = Beam {
                origin: segment.origin,
                direction: segment.direction,
                length: segment.length,
                radius: emission.radius,
                start,
                total_length,
                source: Some(source_id),
                chain_index,
            };
            let id = self.write_slot(slots.get(chain_index).copied(), beam, &emission);
            self.push_segment_light(id, source_id, segment, chain_index, &emission, materials);
            chain.push(id);
            start += segment.length;
        }

        let live_segments = chain.len();
        for surplus in slots.iter().skip(live_segments) {
            if let Shape::Beam(beam) = &mut self.objects[*surplus].shape {
                beam.retire();
            }
            chain.push(*surplus);
        }
        self.reattach_static_lights(&chain, live_segments);

        if let Shape::BeamSource(source) = &mut self.objects[source_id].shape {
            source.chain = chain;
            source.live_segments = live_segments;
            source.chain_length = total_length;
        }
    }

    /// Marches from the source, bouncing on mirrors until the budget runs out or
    /// something opaque is hit.
    fn walk(
        &self,
        source_id: ObjectId,
        mut origin: WorldPoint,
        mut direction: Unit<WorldVector>,
        budget: FloatType,
        materials: &MaterialTable,
    ) -> (Vec<Segment>, Option<ObjectId>) {
        let mut segments = Vec::new();
        let mut remaining = budget;

        while remaining > EPSILON {
            if segments.len() == MAX_CHAIN_SEGMENTS {
                warn!("Beam chain of {source_id:?} truncated at {MAX_CHAIN_SEGMENTS} segments");
                break;
            }

            let ray = Ray::new(origin, direction.into_inner());
            let hit = self.hit_filtered(&ray, EPSILON, remaining, |surface| {
                stops_beam(surface, source_id, materials)
            });

            let Some(hit) = hit else {
                segments.push(Segment {
                    origin,
                    direction,
                    length: remaining,
                });
                break;
            };

            segments.push(Segment {
                origin,
                direction,
                length: hit.t,
            });
            remaining -= hit.t;

            if matches!(self.objects[hit.object].shape, Shape::BeamTarget(_)) {
                return (segments, Some(hit.object));
            }
            match bounce(&hit, &direction, materials) {
                Some(reflected) => {
                    origin = hit.point;
                    direction = reflected;
                }
                None => break,
            }
        }

        (segments, None)
    }

    fn write_slot(&mut self, slot: Option<ObjectId>, beam: Beam, emission: &BeamEmission) -> ObjectId {
        match slot {
            Some(id) => {
                let surface = &mut self.objects[id];
                surface.shape = Shape::Beam(beam);
                surface.material = emission.material;
                id
            }
            None => {
                let id = self.objects.next_idx();
                self.objects.push(
                    Surface::builder()
                        .id(id)
                        .shape(Shape::Beam(beam))
                        .material(emission.material)
                        .casts_shadow(false)
                        .build(),
                )
            }
        }
    }

    fn push_segment_light(
        &mut self,
        segment_id: ObjectId,
        source_id: ObjectId,
        segment: &Segment,
        chain_index: usize,
        emission: &BeamEmission,
        materials: &MaterialTable,
    ) {
        let color = materials
            .get(emission.material)
            .map_or(WHITE, |material| material.color);
        self.lights.push(
            PointLight::builder()
                .position(segment.origin)
                .color(color)
                .intensity(emission.intensity)
                .spotlight(Spotlight {
                    direction: segment.direction,
                    cutoff_cos: SEGMENT_LIGHT_CUTOFF_COS,
                    range: segment.length,
                })
                .attached(segment_id)
                .ignore(vec![segment_id, source_id])
                .reflected(chain_index > 0)
                .build(),
        );
    }

    /// Scene lights attached to a segment follow it. Lights on retired slots
    /// move to the last live segment.
    fn reattach_static_lights(&mut self, chain: &[ObjectId], live_segments: usize) {
        let Some(last) = chain[..live_segments].last().copied() else {
            return;
        };

        for light in self.lights.iter_mut().take(self.static_light_count) {
            let Some(attached) = light.attached else {
                continue;
            };
            let Some(position) = chain.iter().position(|id| *id == attached) else {
                continue;
            };
            let target = if position < live_segments {
                attached
            } else {
                last
            };
            let Shape::Beam(beam) = &self.objects[target].shape else {
                continue;
            };
            light.attached = Some(target);
            light.position = beam.origin;
            if let Some(spotlight) = &mut light.spotlight {
                spotlight.direction = beam.direction;
                spotlight.range = beam.length;
            }
        }
    }
}

/// Whether a beam walk stops (or bounces) at this surface.
fn stops_beam(surface: &Surface, source: ObjectId, materials: &MaterialTable) -> bool {
    if surface.shape.is_beam() || surface.id == source {
        return false;
    }
    if surface.blocks_light {
        return true;
    }
    materials.get(surface.material).is_some_and(|material| {
        material.mirror || (material.is_opaque() && surface.casts_shadow)
    })
}

/// Reflected direction when the hit material is a mirror.
fn bounce(
    hit: &HitRecord,
    direction: &Unit<WorldVector>,
    materials: &MaterialTable,
) -> Option<Unit<WorldVector>> {
    let mirror = materials
        .get(hit.material)
        .is_some_and(|material| material.mirror);
    if !mirror {
        return None;
    }
    Unit::try_new(reflect(direction.as_ref(), &hit.normal), EPSILON)
}
