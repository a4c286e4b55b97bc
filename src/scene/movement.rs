//! Discrete movement with collision response: translate, test, revert or slide.

use crate::{
    camera::Camera,
    geometry::{FloatType, Ray, WorldPoint, WorldVector, axis_rotation},
    material::MaterialTable,
    scene::{LightId, Object, ObjectId, PointLight, Scene, Surface},
};

/// Distance the camera keeps from opaque surfaces.
pub const CAMERA_SKIN: FloatType = 0.2;

/// State of a surface and its attached lights before a tentative change.
struct Snapshot {
    surface: Surface,
    lights: Vec<(LightId, PointLight)>,
}

impl Scene {
    /// Moves a movable surface by `delta` without entering other solids.
    ///
    /// The whole step is tried first. When it collides, every axis is retried on
    /// its own, so motion blocked along one axis still slides along the others.
    /// Returns the displacement actually applied.
    pub fn move_with_collision(&mut self, id: ObjectId, delta: &WorldVector) -> WorldVector {
        if !self.objects.get(id).is_some_and(|surface| surface.movable) {
            return WorldVector::zeros();
        }

        let applied = if self.try_change(id, |surface, lights| {
            surface.translate(delta);
            lights.for_each(|light| light.translate(delta));
        }) {
            *delta
        } else {
            let mut applied = WorldVector::zeros();
            for axis in 0..3 {
                if delta[axis] == 0.0 {
                    continue;
                }
                let mut step = WorldVector::zeros();
                step[axis] = delta[axis];
                if self.try_change(id, |surface, lights| {
                    surface.translate(&step);
                    lights.for_each(|light| light.translate(&step));
                }) {
                    applied += step;
                }
            }
            applied
        };

        if applied != WorldVector::zeros() {
            self.invalidate();
        }
        applied
    }

    /// Rotates a rotatable surface around its center, together with its lights.
    /// Returns false and leaves everything unchanged if the result collides.
    pub fn rotate_with_collision(&mut self, id: ObjectId, axis: &WorldVector, angle: FloatType) -> bool {
        if !self.objects.get(id).is_some_and(|surface| surface.rotatable) {
            return false;
        }
        let Some(rotation) = axis_rotation(axis, angle) else {
            return false;
        };

        let rotated = self.try_change(id, |surface, lights| {
            let pivot = surface.shape.center();
            surface.shape.rotate(&rotation);
            lights.for_each(|light| light.rotate_about(&pivot, &rotation));
        });
        if rotated {
            self.invalidate();
        }
        rotated
    }

    /// Moves the camera by `delta`, stopping short of opaque surfaces.
    ///
    /// The camera has no volume, a step is allowed when nothing opaque lies along
    /// it (plus `CAMERA_SKIN`). Axes are retried separately like for surfaces.
    pub fn move_camera(&self, camera: &mut Camera, delta: &WorldVector, materials: &MaterialTable) -> WorldVector {
        if self.camera_step_is_clear(&camera.position(), delta, materials) {
            camera.translate(delta);
            return *delta;
        }

        let mut applied = WorldVector::zeros();
        for axis in 0..3 {
            if delta[axis] == 0.0 {
                continue;
            }
            let mut step = WorldVector::zeros();
            step[axis] = delta[axis];
            if self.camera_step_is_clear(&camera.position(), &step, materials) {
                camera.translate(&step);
                applied += step;
            }
        }
        applied
    }

    fn camera_step_is_clear(&self, from: &WorldPoint, step: &WorldVector, materials: &MaterialTable) -> bool {
        let length = step.norm();
        if length == 0.0 {
            return true;
        }
        let ray = Ray::new(*from, *step);
        self.hit_filtered(&ray, 0.0, length + CAMERA_SKIN, |surface| {
            !surface.shape.is_beam()
                && materials
                    .get(surface.material)
                    .is_some_and(|material| material.is_opaque())
        })
        .is_none()
    }

    /// Applies `change`, keeping it only if the surface stays clear of everything else.
    fn try_change(
        &mut self,
        id: ObjectId,
        change: impl FnOnce(&mut Surface, &mut dyn Iterator<Item = &mut PointLight>),
    ) -> bool {
        let snapshot = self.snapshot(id);

        let mut lights = self
            .lights
            .iter_mut()
            .filter(|light| light.attached == Some(id));
        change(&mut self.objects[id], &mut lights);

        if self.collides(id) {
            self.restore(id, snapshot);
            false
        } else {
            true
        }
    }

    fn snapshot(&self, id: ObjectId) -> Snapshot {
        Snapshot {
            surface: self.objects[id].clone(),
            lights: self
                .lights
                .iter_enumerated()
                .filter(|(_, light)| light.attached == Some(id))
                .map(|(light_id, light)| (light_id, light.clone()))
                .collect(),
        }
    }

    fn restore(&mut self, id: ObjectId, snapshot: Snapshot) {
        self.objects[id] = snapshot.surface;
        for (light_id, light) in snapshot.lights {
            self.lights[light_id] = light;
        }
    }
}
