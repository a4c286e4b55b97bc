use bon::bon;
use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{FloatType, WorldPoint, WorldVector, rotate_about},
    scene::ObjectId,
    util::{Color, WHITE},
};

index_vec::define_index_type! {
    pub struct LightId = u32;
}

/// Uniform light added to every surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ambient {
    pub color: Color,
    pub intensity: FloatType,
}

impl Ambient {
    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }
}

impl Default for Ambient {
    fn default() -> Self {
        Ambient {
            color: WHITE,
            intensity: 0.1,
        }
    }
}

/// Restricts a light to a cone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spotlight {
    pub direction: Unit<WorldVector>,
    /// Cosine of the half angle of the cone.
    pub cutoff_cos: FloatType,
    pub range: FloatType,
}

impl Spotlight {
    /// Whether a point at `offset` from the light is inside the cone and within range.
    pub fn illuminates(&self, offset: &WorldVector) -> bool {
        let distance = offset.norm();
        if distance > self.range {
            return false;
        }
        distance == 0.0 || offset.dot(self.direction.as_ref()) / distance >= self.cutoff_cos
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: WorldPoint,
    pub color: Color,
    pub intensity: FloatType,
    pub spotlight: Option<Spotlight>,
    /// Surface the light moves and rotates with.
    pub attached: Option<ObjectId>,
    /// Surfaces that never shadow this light.
    pub ignore: Vec<ObjectId>,
    /// Set for lights following a beam after a mirror bounce.
    pub reflected: bool,
}

#[bon]
impl PointLight {
    #[builder]
    pub fn new(
        position: WorldPoint,
        #[builder(default = WHITE)] color: Color,
        #[builder(default = 1.0)] intensity: FloatType,
        spotlight: Option<Spotlight>,
        attached: Option<ObjectId>,
        #[builder(default)] ignore: Vec<ObjectId>,
        #[builder(default)] reflected: bool,
    ) -> Self {
        PointLight {
            position,
            color,
            intensity: intensity.max(0.0),
            spotlight,
            attached,
            ignore,
            reflected,
        }
    }
}

impl PointLight {
    pub fn radiance(&self) -> Color {
        self.color * self.intensity
    }

    pub fn ignores(&self, object: ObjectId) -> bool {
        self.ignore.contains(&object)
    }

    pub(crate) fn translate(&mut self, delta: &WorldVector) {
        self.position += delta;
    }

    pub(crate) fn rotate_about(&mut self, pivot: &WorldPoint, rotation: &Rotation3<FloatType>) {
        self.position = rotate_about(&self.position, pivot, rotation);
        if let Some(spotlight) = &mut self.spotlight {
            spotlight.direction = rotation * spotlight.direction;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use std::f32::consts::FRAC_PI_2;

    fn spot() -> Spotlight {
        Spotlight {
            direction: WorldVector::z_axis(),
            cutoff_cos: 0.9,
            range: 10.0,
        }
    }

    #[test]
    fn spotlight_cone() {
        assert!(spot().illuminates(&WorldVector::new(0.1, 0.0, 5.0)));
        assert!(!spot().illuminates(&WorldVector::new(5.0, 0.0, 5.0)));
        assert!(!spot().illuminates(&WorldVector::new(0.0, 0.0, 11.0)));
    }

    #[test]
    fn builder_defaults() {
        let light = PointLight::builder().position(WorldPoint::origin()).build();
        assert!(light.color == WHITE);
        assert!(light.intensity == 1.0);
        assert!(light.spotlight.is_none());
        assert!(!light.reflected);
    }

    #[test]
    fn rotation_moves_position_and_cone() {
        let mut light = PointLight::builder()
            .position(WorldPoint::new(1.0, 0.0, 0.0))
            .spotlight(spot())
            .build();
        let rotation = Rotation3::from_axis_angle(&WorldVector::y_axis(), FRAC_PI_2);
        light.rotate_about(&WorldPoint::origin(), &rotation);

        assert!((light.position - WorldPoint::new(0.0, 0.0, -1.0)).norm() < 1e-5);
        let direction = light.spotlight.unwrap().direction;
        assert!((direction.into_inner() - WorldVector::x()).norm() < 1e-5);
    }
}
