mod aabb;
mod ray_box_intersection;

pub use aabb::AABB;
pub use ray_box_intersection::RayIntersectionExt;

use nalgebra::{Point2, Point3, Rotation3, Unit, Vector2, Vector3};

pub type FloatType = f32;

pub type ScreenPoint = Point2<u32>;
pub type ScreenSize = Vector2<u32>;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

pub type TexturePoint = Point2<FloatType>;

/// Tolerance used for degenerate configurations and for offsetting secondary rays.
pub const EPSILON: FloatType = 1e-4;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Normalized direction of the ray, zero if the ray was constructed from a zero vector.
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction
    /// Zeros in direction get turned into positive infinity regardless of the sign of the zero
    pub inv_direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let direction = normalize_or_self(direction);
        let inv_direction = direction.map(|x| if x == 0.0 { FloatType::INFINITY } else { 1.0 / x });

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }

    /// Rays built from a zero vector never intersect anything.
    pub fn is_degenerate(&self) -> bool {
        self.direction.norm_squared() == 0.0
    }
}

/// Normalizes a vector, zero (or nearly zero) vectors are returned unchanged.
pub fn normalize_or_self(v: WorldVector) -> WorldVector {
    let norm = v.norm();
    if norm > FloatType::EPSILON { v / norm } else { v }
}

/// Mirrors `direction` around `normal`. Normal is expected to be unit length.
pub fn reflect(direction: &WorldVector, normal: &WorldVector) -> WorldVector {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Rotation around an arbitrary axis, `None` for a zero axis.
pub fn axis_rotation(axis: &WorldVector, angle: FloatType) -> Option<Rotation3<FloatType>> {
    Unit::try_new(*axis, FloatType::EPSILON).map(|axis| Rotation3::from_axis_angle(&axis, angle))
}

/// Rotates a point around a pivot.
pub fn rotate_about(
    point: &WorldPoint,
    pivot: &WorldPoint,
    rotation: &Rotation3<FloatType>,
) -> WorldPoint {
    pivot + rotation * (point - pivot)
}

/// Any unit vector perpendicular to `v`.
pub fn any_perpendicular(v: &WorldVector) -> WorldVector {
    let helper = if v.x.abs() < 0.9 {
        WorldVector::x()
    } else {
        WorldVector::y()
    };
    normalize_or_self(v.cross(&helper))
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;
    use test_strategy::proptest;
    /// Wraps a type in a newtype that implements `Deref` and `Arbitrary`.
    /// Helper macro that creates a wrapper arnound a type that implemetns Deref and Arbitary
    macro_rules! arbitrary_wrapper {
        ( $wrapper_name:ident ( $type:ty ) -> $block:block ) => {
            #[derive(Copy, Clone, Debug)]
            pub struct $wrapper_name(pub $type);

            impl std::ops::Deref for $wrapper_name {
                type Target = $type;
                fn deref(&self) -> &$type {
                    &self.0
                }
            }

            impl Arbitrary for $wrapper_name {
                type Parameters = ();
                type Strategy = proptest::strategy::BoxedStrategy<Self>;
                fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
                    $block.prop_map(|x| $wrapper_name(x)).boxed()
                }
            }
        };
    }

    fn simple_float() -> BoxedStrategy<f32> {
        (-100_000i32..100_000).prop_map(|n| n as f32 * 1e-3).boxed()
    }

    arbitrary_wrapper! {
        NonzeroWorldVectorWrapper(WorldVector) -> {
            (simple_float(), simple_float(), simple_float())
                .prop_filter_map(
                    "vector is zero",
                    |coords| {
                        let vector = WorldVector::new(coords.0, coords.1, coords.2);
                        if vector.norm() < 1e-2 {
                            None
                        } else {
                            Some(vector)
                        }
                    })
        }
    }

    arbitrary_wrapper! {
        WorldPointWrapper(WorldPoint) -> {
            (simple_float(), simple_float(), simple_float())
                .prop_map(|coords| {
                    WorldPoint::new(coords.0, coords.1, coords.2)
                })
        }
    }

    #[test]
    fn zero_vector_normalizes_to_itself() {
        assert!(normalize_or_self(WorldVector::zeros()) == WorldVector::zeros());
    }

    #[test]
    fn zero_direction_ray_is_degenerate() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::zeros());
        assert!(ray.is_degenerate());
        assert!(ray.inv_direction.iter().all(|x| x.is_infinite()));
    }

    #[test]
    fn reflect_flips_normal_component() {
        let r = reflect(&WorldVector::new(1.0, -1.0, 0.0), &WorldVector::y());
        assert!(r == WorldVector::new(1.0, 1.0, 0.0));
    }

    #[proptest]
    fn ray_direction_is_unit(origin: WorldPointWrapper, direction: NonzeroWorldVectorWrapper) {
        let ray = Ray::new(*origin, *direction);
        prop_assert!((ray.direction.norm() - 1.0).abs() < 1e-5);
    }

    #[proptest]
    fn perpendicular_is_perpendicular(v: NonzeroWorldVectorWrapper) {
        let p = any_perpendicular(&v.normalize());
        prop_assert!(p.dot(&v.normalize()).abs() < 1e-4);
        prop_assert!((p.norm() - 1.0).abs() < 1e-4);
    }
}
