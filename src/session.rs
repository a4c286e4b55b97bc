//! Interactive mode: input driven movement between rendered frames.

use image::RgbaImage;
use log::info;

use crate::{
    camera::Camera,
    demo::Demo,
    geometry::{FloatType, WorldVector},
    material::MaterialTable,
    renderer::{RenderSettings, render},
    scene::{ObjectId, Scene},
};

#[derive(Copy, Clone, Debug)]
pub struct MovementSettings {
    /// Camera speed in world units per second.
    pub camera_speed: FloatType,
    /// Speed of the selected object in world units per second.
    pub object_speed: FloatType,
    /// Radians per second, for both the camera and the selected object.
    pub turn_rate: FloatType,
}

impl Default for MovementSettings {
    fn default() -> Self {
        MovementSettings {
            camera_speed: 4.0,
            object_speed: 2.0,
            turn_rate: 1.5,
        }
    }
}

/// Controls held during one frame. Axes are expected in `[-1, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InputState {
    /// Camera motion relative to the view: x right, y world up, z forward.
    pub camera_move: WorldVector,
    pub yaw: FloatType,
    pub pitch: FloatType,
    /// Motion of the selected object along world axes.
    pub object_move: WorldVector,
    /// Turn of the selected object around world up.
    pub object_turn: FloatType,
    /// Moves the selection to the next movable or rotatable surface.
    pub select_next: bool,
}

pub struct Session {
    scene: Scene,
    camera: Camera,
    materials: MaterialTable,
    pub render_settings: RenderSettings,
    pub movement: MovementSettings,

    selected: Option<ObjectId>,
    goal_reached: bool,
}

impl Session {
    pub fn new(
        mut scene: Scene,
        camera: Camera,
        materials: MaterialTable,
        render_settings: RenderSettings,
    ) -> Self {
        scene.refresh(&materials);
        let goal_reached = scene.score.goal_reached();
        Session {
            scene,
            camera,
            materials,
            render_settings,
            movement: MovementSettings::default(),
            selected: None,
            goal_reached,
        }
    }

    pub fn from_demo(demo: Demo, render_settings: RenderSettings) -> Self {
        Self::new(demo.scene, demo.camera, demo.materials, render_settings)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// Selects the next surface that can be moved or rotated, wrapping around.
    pub fn select_next(&mut self) -> Option<ObjectId> {
        let candidates: Vec<_> = self
            .scene
            .objects()
            .iter()
            .filter(|surface| surface.movable || surface.rotatable)
            .map(|surface| surface.id)
            .collect();
        let current = self.selected;
        self.selected = candidates
            .iter()
            .copied()
            .find(|id| current.is_none_or(|current| *id > current))
            .or_else(|| candidates.first().copied());
        self.selected
    }

    /// Applies one frame of input and renders the result.
    pub fn frame(&mut self, dt: FloatType, input: &InputState) -> anyhow::Result<RgbaImage> {
        self.update(dt, input);
        render(
            &self.scene,
            &self.camera,
            &self.materials,
            &self.render_settings,
            |_| {},
        )
    }

    /// Moves the camera and the selected surface, then rebuilds beams and goals.
    pub fn update(&mut self, dt: FloatType, input: &InputState) {
        let dt = dt.max(0.0);
        if input.select_next {
            self.select_next();
        }

        let turn = self.movement.turn_rate * dt;
        self.camera.rotate(input.yaw * turn, input.pitch * turn);

        let camera_delta = (self.camera.right().into_inner() * input.camera_move.x
            + self.camera.world_up().into_inner() * input.camera_move.y
            + self.camera.forward().into_inner() * input.camera_move.z)
            * (self.movement.camera_speed * dt);
        if camera_delta != WorldVector::zeros() {
            self.scene
                .move_camera(&mut self.camera, &camera_delta, &self.materials);
        }

        if let Some(id) = self.selected {
            let object_delta = input.object_move * (self.movement.object_speed * dt);
            if object_delta != WorldVector::zeros() {
                self.scene.move_with_collision(id, &object_delta);
            }
            if input.object_turn != 0.0 {
                self.scene
                    .rotate_with_collision(id, &self.camera.world_up(), input.object_turn * turn);
            }
        }

        self.scene.refresh(&self.materials);
        self.scene.update_goals(dt, &mut self.materials);

        let goal_reached = self.scene.score.goal_reached();
        if goal_reached != self.goal_reached {
            if goal_reached {
                info!("Goal reached");
            } else {
                info!("Goal lost");
            }
            self.goal_reached = goal_reached;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{demo, geometry::ScreenSize, renderer::WorkerCount, scene::Object as _};
    use assert2::{assert, let_assert};
    use std::num::NonZeroUsize;

    fn session() -> Session {
        let_assert!(Ok(demo) = demo::build(ScreenSize::new(16, 12)));
        let settings = RenderSettings {
            worker_count: WorkerCount::Manual(NonZeroUsize::new(2).unwrap()),
            ..RenderSettings::default()
        };
        Session::from_demo(demo, settings)
    }

    #[test]
    fn frame_has_camera_resolution() {
        let mut session = session();
        let image = session.frame(0.1, &InputState::default()).unwrap();
        assert!(image.dimensions() == (16, 12));
        assert!(session.goal_reached());
    }

    #[test]
    fn forward_input_moves_the_camera() {
        let mut session = session();
        let before = session.camera().position();
        let input = InputState {
            camera_move: WorldVector::z(),
            ..InputState::default()
        };
        session.update(0.5, &input);
        let moved = session.camera().position() - before;
        assert!((moved.norm() - 2.0).abs() < 1e-4);
        assert!(moved.dot(session.camera().forward().as_ref()) > 0.0);
    }

    #[test]
    fn selection_cycles_through_movable_surfaces() {
        let mut session = session();
        let sequence: Vec<_> = (0..5)
            .map(|_| session.select_next().map(|id| id.index()))
            .collect();
        assert!(sequence == [Some(1), Some(2), Some(4), Some(5), Some(1)]);
    }

    #[test]
    fn selected_surface_follows_input() {
        let mut session = session();
        while session.select_next() != Some(ObjectId::new(4)) {}
        let input = InputState {
            object_move: WorldVector::z(),
            ..InputState::default()
        };
        session.update(0.5, &input);

        let_assert!(Some(sphere) = session.scene().object(ObjectId::new(4)));
        let center = sphere.shape.center();
        assert!((center.z - -2.0).abs() < 1e-5);
    }

    #[test]
    fn turning_the_source_away_loses_the_goal() {
        let mut session = session();
        assert!(session.goal_reached());
        assert!(session.select_next() == Some(ObjectId::new(1)));
        let input = InputState {
            object_turn: 1.0,
            ..InputState::default()
        };
        session.update(1.0, &input);
        assert!(!session.goal_reached());
        assert!(session.scene().score.lit_targets == 0);
    }
}
