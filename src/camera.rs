use bon::bon;
use nalgebra::{Rotation3, Unit};
use thiserror::Error;

use crate::geometry::{EPSILON, FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

/// Pitch stops this far (in cosine) from looking straight along the up vector.
const MAX_PITCH_COS: FloatType = 0.99;

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("Resolution must be non-zero in both directions, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },
    #[error("Forward and up vectors must be non-zero and linearly independent")]
    DegenerateBasis,
    #[error("Vertical field of view must be between 0 and 180 degrees, got {0}")]
    InvalidFieldOfView(FloatType),
}

/// Pinhole camera.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    position: WorldPoint,

    resolution: ScreenSize,

    world_up: Unit<WorldVector>,
    forward: Unit<WorldVector>,
    up: Unit<WorldVector>,
    right: Unit<WorldVector>,
    /// Direction through the center of the top left pixel
    film_origin_offset: WorldVector,

    /// Distance between pixels on a film at unit distance
    pixel_pitch: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        position: WorldPoint,
        forward: WorldVector,
        up: WorldVector,
        resolution: ScreenSize,
        /// Vertical field of view in degrees.
        #[builder(default = 60.0)]
        vertical_fov: FloatType,
    ) -> Result<Self, CameraError> {
        if resolution.x == 0 || resolution.y == 0 {
            return Err(CameraError::ZeroResolution {
                width: resolution.x,
                height: resolution.y,
            });
        }
        if !(vertical_fov > 0.0 && vertical_fov < 180.0) {
            return Err(CameraError::InvalidFieldOfView(vertical_fov));
        }
        let forward = Unit::try_new(forward, EPSILON).ok_or(CameraError::DegenerateBasis)?;
        let world_up = Unit::try_new(up, EPSILON).ok_or(CameraError::DegenerateBasis)?;
        Unit::try_new(forward.cross(world_up.as_ref()), EPSILON).ok_or(CameraError::DegenerateBasis)?;

        let half_height = (vertical_fov.to_radians() / 2.0).tan();
        let mut camera = Camera {
            position,
            resolution,
            world_up,
            forward,
            up: world_up,
            right: forward,
            film_origin_offset: WorldVector::zeros(),
            pixel_pitch: 2.0 * half_height / resolution.y as FloatType,
        };
        camera.update_basis();
        Ok(camera)
    }
}

impl Camera {
    pub fn get_resolution(&self) -> ScreenSize {
        self.resolution
    }

    pub fn position(&self) -> WorldPoint {
        self.position
    }

    pub fn forward(&self) -> Unit<WorldVector> {
        self.forward
    }

    pub fn right(&self) -> Unit<WorldVector> {
        self.right
    }

    pub fn world_up(&self) -> Unit<WorldVector> {
        self.world_up
    }

    /// Ray through the center of the given pixel.
    pub fn ray_for_pixel(&self, point: &ScreenPoint) -> Ray {
        let direction = self.film_origin_offset
            + self.right.as_ref() * (point.x as FloatType * self.pixel_pitch)
            - self.up.as_ref() * (point.y as FloatType * self.pixel_pitch);
        Ray::new(self.position, direction)
    }

    pub fn translate(&mut self, delta: &WorldVector) {
        self.position += delta;
    }

    /// Turns by `yaw` around the world up vector and by `pitch` around the right vector.
    /// Pitch is refused when it would tip the view over the pole.
    pub fn rotate(&mut self, yaw: FloatType, pitch: FloatType) {
        let yaw = Rotation3::from_axis_angle(&self.world_up, yaw);
        let yawed = yaw * self.forward;
        let right = yaw * self.right;
        let pitched = Rotation3::from_axis_angle(&right, pitch) * yawed;

        self.forward = if pitched.dot(self.world_up.as_ref()).abs() < MAX_PITCH_COS {
            pitched
        } else {
            yawed
        };
        self.update_basis();
    }

    fn update_basis(&mut self) {
        // Forward is kept away from world up, so the cross product is non-zero
        self.right = Unit::new_normalize(self.forward.cross(self.world_up.as_ref()));
        self.up = Unit::new_normalize(self.right.cross(self.forward.as_ref()));

        let resolution_minus_one = ScreenSize::new(self.resolution.x - 1, self.resolution.y - 1);
        let film_origin_uv = resolution_minus_one.cast::<FloatType>() * self.pixel_pitch / 2.0;
        self.film_origin_offset = self.forward.as_ref() - self.right.as_ref() * film_origin_uv.x
            + self.up.as_ref() * film_origin_uv.y;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{assert, let_assert};
    use test_case::test_case;

    fn camera() -> Camera {
        // X goes right, Y goes away, Z goes up
        Camera::builder()
            .position(WorldPoint::new(0.0, 0.0, 0.0))
            .forward(WorldVector::new(0.0, 1.0, 0.0))
            .up(WorldVector::new(0.0, 0.0, 1.0))
            .resolution(ScreenSize::new(801, 601))
            .vertical_fov(90.0)
            .build()
            .unwrap()
    }

    #[test]
    fn left_right_up_down() {
        let camera = camera();

        let ray_center = camera.ray_for_pixel(&ScreenPoint::new(400, 300));
        let ray_left = camera.ray_for_pixel(&ScreenPoint::new(0, 300));
        let ray_right = camera.ray_for_pixel(&ScreenPoint::new(800, 300));
        let ray_up = camera.ray_for_pixel(&ScreenPoint::new(400, 0));
        let ray_down = camera.ray_for_pixel(&ScreenPoint::new(400, 600));

        assert!(ray_center.direction.x.abs() < 1e-5);
        assert!(ray_center.direction.z.abs() < 1e-5);
        assert!(ray_left.direction.x < ray_center.direction.x);
        assert!(ray_right.direction.x > ray_center.direction.x);
        assert!(ray_up.direction.z > ray_center.direction.z);
        assert!(ray_down.direction.z < ray_center.direction.z);
    }

    #[test]
    fn field_of_view_spans_the_rows() {
        let camera = camera();
        // Pixel centers of the outer rows sit half a pixel inside the 45 degree edge
        let top = camera.ray_for_pixel(&ScreenPoint::new(400, 0));
        let angle = top.direction.z.atan2(top.direction.y).to_degrees();
        assert!(angle < 45.0);
        assert!(angle > 44.8);
    }

    #[test]
    fn yaw_turns_around_world_up() {
        let mut camera = camera();
        camera.rotate(std::f32::consts::FRAC_PI_2, 0.0);
        assert!((camera.forward().into_inner() - WorldVector::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
        let ray = camera.ray_for_pixel(&ScreenPoint::new(400, 300));
        assert!((ray.direction - WorldVector::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn pitch_stops_before_the_pole() {
        let mut camera = camera();
        camera.rotate(0.0, 1.0);
        let pitched = camera.forward();
        assert!(pitched.z > 0.8);
        camera.rotate(0.0, 0.6);
        assert!(camera.forward() == pitched);
    }

    #[test]
    fn translate_moves_ray_origin() {
        let mut camera = camera();
        camera.translate(&WorldVector::new(1.0, 2.0, 3.0));
        assert!(camera.ray_for_pixel(&ScreenPoint::new(0, 0)).origin == WorldPoint::new(1.0, 2.0, 3.0));
    }

    #[test_case(WorldVector::zeros(), WorldVector::z(); "zero forward")]
    #[test_case(WorldVector::z(), WorldVector::z() * 2.0; "parallel up")]
    fn degenerate_basis(forward: WorldVector, up: WorldVector) {
        let result = Camera::builder()
            .position(WorldPoint::origin())
            .forward(forward)
            .up(up)
            .resolution(ScreenSize::new(4, 4))
            .build();
        let_assert!(Err(CameraError::DegenerateBasis) = result);
    }

    #[test]
    fn zero_resolution() {
        let result = Camera::builder()
            .position(WorldPoint::origin())
            .forward(WorldVector::y())
            .up(WorldVector::z())
            .resolution(ScreenSize::new(0, 4))
            .build();
        let_assert!(Err(CameraError::ZeroResolution { width: 0, height: 4 }) = result);
    }
}
