mod cone;
mod cube;
mod cylinder;
mod plane;
mod sphere;

pub use cone::Cone;
pub use cube::Cube;
pub use cylinder::Cylinder;
pub use plane::{PLANE_EXTENT, Plane};
pub use sphere::Sphere;

use std::f32::consts::PI;

use crate::geometry::{EPSILON, FloatType, Ray, TexturePoint, WorldPoint, WorldVector, any_perpendicular};

use super::in_range;

/// Real roots of `a t^2 + b t + c`, in ascending order.
/// Degenerate equations (vanishing `a`, non-positive discriminant) have no roots.
pub(crate) fn solve_quadratic(
    a: FloatType,
    b: FloatType,
    c: FloatType,
) -> Option<(FloatType, FloatType)> {
    if a.abs() < FloatType::EPSILON {
        return None;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant <= 0.0 {
        return None;
    }
    let sqrt_disc = discriminant.sqrt();
    // Numerically stable form, avoids cancellation when b is large
    let q = -0.5 * (b + b.signum() * sqrt_disc);
    let (t1, t2) = (q / a, c / q);
    Some((t1.min(t2), t1.max(t2)))
}

/// Hit of a ray with a capped cylinder spanning `[0, length]` along `axis` from `base`.
pub(crate) struct CappedCylinderHit {
    pub t: FloatType,
    pub normal: WorldVector,
    /// Distance of the hit point from the base, along the axis.
    pub axial: FloatType,
}

/// Side quadric of a cylinder plus its two capping disks.
/// `axis` must be unit length.
pub(crate) fn intersect_capped_cylinder(
    ray: &Ray,
    base: &WorldPoint,
    axis: &WorldVector,
    radius: FloatType,
    length: FloatType,
    t_min: FloatType,
    t_max: FloatType,
) -> Option<CappedCylinderHit> {
    let co = ray.origin - base;
    let d_axial = ray.direction.dot(axis);
    let co_axial = co.dot(axis);
    let d_perp = ray.direction - axis * d_axial;
    let co_perp = co - axis * co_axial;

    let mut best: Option<CappedCylinderHit> = None;
    let mut consider = |hit: CappedCylinderHit| {
        if best.as_ref().is_none_or(|b| hit.t < b.t) {
            best = Some(hit);
        }
    };

    if let Some((t1, t2)) = solve_quadratic(
        d_perp.dot(&d_perp),
        2.0 * d_perp.dot(&co_perp),
        co_perp.dot(&co_perp) - radius * radius,
    ) {
        for t in [t1, t2] {
            if !in_range(t, t_min, t_max) {
                continue;
            }
            let axial = co_axial + t * d_axial;
            if (0.0..=length).contains(&axial) {
                consider(CappedCylinderHit {
                    t,
                    normal: (co_perp + d_perp * t) / radius,
                    axial,
                });
                break;
            }
        }
    }

    for (axial, normal) in [(0.0, -axis), (length, *axis)] {
        if let Some(t) = intersect_disk(ray, &(base + axis * axial), &normal, radius, t_min, t_max) {
            consider(CappedCylinderHit { t, normal, axial });
        }
    }

    best
}

/// Ray parameter of the hit with a disk, `None` for parallel rays.
pub(crate) fn intersect_disk(
    ray: &Ray,
    center: &WorldPoint,
    normal: &WorldVector,
    radius: FloatType,
    t_min: FloatType,
    t_max: FloatType,
) -> Option<FloatType> {
    let denom = ray.direction.dot(normal);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (center - ray.origin).dot(normal) / denom;
    if !in_range(t, t_min, t_max) {
        return None;
    }
    let offset = ray.point_at(t) - center;
    (offset.norm_squared() <= radius * radius).then_some(t)
}

/// Cylindrical texture coordinates: angle around the axis and relative height.
pub(crate) fn cylindrical_uv(
    point: &WorldPoint,
    base: &WorldPoint,
    axis: &WorldVector,
    height: FloatType,
) -> TexturePoint {
    let offset = point - base;
    let axial = offset.dot(axis);
    let radial = offset - axis * axial;
    let reference = any_perpendicular(axis);
    let binormal = axis.cross(&reference);
    let angle = radial.dot(&binormal).atan2(radial.dot(&reference));
    let v = if height > 0.0 { axial / height } else { 0.0 };
    TexturePoint::new(0.5 + angle / (2.0 * PI), v)
}

/// Extents of a disk perpendicular to a unit `axis` along each world axis.
pub(crate) fn disk_extents(axis: &WorldVector, radius: FloatType) -> WorldVector {
    axis.map(|a| radius * (1.0 - a * a).max(0.0).sqrt())
}

/// Farthest point of a disk in `direction`.
pub(crate) fn disk_support(
    center: &WorldPoint,
    axis: &WorldVector,
    radius: FloatType,
    direction: &WorldVector,
) -> WorldPoint {
    let radial = direction - axis * direction.dot(axis);
    let norm = radial.norm();
    if norm > FloatType::EPSILON {
        center + radial * (radius / norm)
    } else {
        *center
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{assert, let_assert};
    use test_case::test_case;

    #[test_case(1.0, -3.0, 2.0, 1.0, 2.0 ; "two_positive")]
    #[test_case(1.0, 0.0, -4.0, -2.0, 2.0 ; "symmetric")]
    #[test_case(-1.0, 0.0, 4.0, -2.0, 2.0 ; "negative_leading")]
    fn quadratic_roots(a: f32, b: f32, c: f32, r1: f32, r2: f32) {
        let_assert!(Some((t1, t2)) = solve_quadratic(a, b, c));
        assert!((t1 - r1).abs() < 1e-5);
        assert!((t2 - r2).abs() < 1e-5);
    }

    #[test]
    fn quadratic_zero_discriminant_has_no_roots() {
        assert!(solve_quadratic(1.0, -2.0, 1.0).is_none());
    }

    #[test]
    fn quadratic_degenerate_leading_term() {
        assert!(solve_quadratic(0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn disk_parallel_ray_misses() {
        let ray = Ray::new(WorldPoint::new(0.0, 1.0, 0.0), WorldVector::x());
        let t = intersect_disk(&ray, &WorldPoint::origin(), &WorldVector::y(), 5.0, 0.0, 100.0);
        assert!(t.is_none());
    }

    #[test]
    fn capped_cylinder_hits_cap_end_on() {
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, -5.0), WorldVector::z());
        let_assert!(
            Some(hit) = intersect_capped_cylinder(
                &ray,
                &WorldPoint::origin(),
                &WorldVector::z(),
                1.0,
                2.0,
                0.0,
                100.0
            )
        );
        assert!((hit.t - 5.0).abs() < 1e-5);
        assert!(hit.axial == 0.0);
        assert!(hit.normal == -WorldVector::z());
    }
}
