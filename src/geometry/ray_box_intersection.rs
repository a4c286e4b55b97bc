use crate::geometry::{FloatType, Ray, WorldBox};

pub trait RayIntersectionExt {
    /// Calculate first and last ray intersection with the box
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType);

    /// True if the ray enters the box anywhere within `[t_min, t_max]`.
    fn hit_in_range(&self, ray: &Ray, t_min: FloatType, t_max: FloatType) -> bool {
        let (t1, t2) = self.intersect(ray);
        t1.max(t_min) <= t2.min(t_max)
    }
}

impl RayIntersectionExt for WorldBox {
    /// Calculates ray intersection with the box.
    /// Returns minimum and maximum distance along the ray, ray intersects if min <= max.
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType) {
        let mut min_t = FloatType::NEG_INFINITY;
        let mut max_t = FloatType::INFINITY;

        for axis in 0..3 {
            // The multiplication is NAN if the ray is starting inside the slab bounding plane
            // and is parallel to it. In this case we blend to +-infinity, so that the range becomes infinite
            let to_min = (self.min[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            let to_max = (self.max[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            let to_min = if to_min.is_nan() { FloatType::NEG_INFINITY } else { to_min };
            let to_max = if to_max.is_nan() { FloatType::INFINITY } else { to_max };

            min_t = min_t.max(to_min.min(to_max));
            max_t = max_t.min(to_min.max(to_max));
        }

        (min_t, max_t)
    }
}

#[cfg(test)]
mod test {
    use assert2::assert;
    use test_case::{test_case, test_matrix};

    use super::*;
    use crate::geometry::{WorldPoint, WorldVector};

    fn unit_box() -> WorldBox {
        WorldBox::new([-1.0, -1.0, -1.0].into(), [1.0, 1.0, 1.0].into())
    }

    fn on_surface(p: &WorldPoint, b: &WorldBox) -> bool {
        const TOLERANCE: f32 = 1e-3;
        b.contains(p, TOLERANCE)
            && (0..3).any(|axis| {
                (p[axis] - b.min[axis]).abs() <= TOLERANCE
                    || (p[axis] - b.max[axis]).abs() <= TOLERANCE
            })
    }

    /// Rays aimed at a point inside the box, starting before, inside and past it.
    #[test_matrix(
        [-0.5, 0.0, 0.9],
        [-0.5, 0.3],
        [-1.0, 0.5, 3.0],
        [-4.0, 0.0, 4.0]
    )]
    fn entry_and_exit_lie_on_the_box(px: f32, py: f32, dx: f32, start: f32) {
        let b = unit_box();
        let direction = WorldVector::new(dx, 1.0, -0.5);
        let through = WorldPoint::new(px, py, 0.2);
        let ray = Ray::new(through, direction);
        let ray = Ray::new(ray.point_at(start), direction);

        let (t1, t2) = b.intersect(&ray);
        assert!(t1 <= t2);
        assert!(on_surface(&ray.point_at(t1), &b));
        assert!(on_surface(&ray.point_at(t2), &b));
    }

    #[test]
    fn range_check_respects_the_interval() {
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, -5.0), WorldVector::z());
        assert!(unit_box().hit_in_range(&ray, 0.0, f32::INFINITY));
        assert!(unit_box().hit_in_range(&ray, 0.0, 4.5));
        assert!(!unit_box().hit_in_range(&ray, 0.0, 3.5));
        assert!(!unit_box().hit_in_range(&ray, 6.5, 10.0));
    }

    #[test]
    fn box_behind_the_ray() {
        let ray = Ray::new(WorldPoint::new(0.0, 0.0, 5.0), WorldVector::z());
        assert!(!unit_box().hit_in_range(&ray, 0.0, f32::INFINITY));
    }

    /// Rays parallel to a slab and outside of it never enter the box.
    #[test_case(-2.0, 0.0, 0.0, 0.0, 1.0, 1.0 ; "outside x")]
    #[test_case(0.0, 1.5, 0.0, 1.0, 0.0, -1.0 ; "outside y")]
    #[test_case(0.0, 0.0, -3.0, 1.0, 1.0, 0.0 ; "outside z")]
    #[test_case(-2.0, 1.0, 0.0, 1.0, 0.0, 0.0 ; "grazing the top face")]
    fn parallel_rays_miss_or_graze(px: f32, py: f32, pz: f32, dx: f32, dy: f32, dz: f32) {
        let ray = Ray::new(
            WorldPoint::new(px, py, pz) - WorldVector::new(dx, dy, dz) * 10.0,
            WorldVector::new(dx, dy, dz),
        );
        let (t1, t2) = unit_box().intersect(&ray);
        let grazing = t1 <= t2 && on_surface(&ray.point_at(t1), &unit_box());
        assert!(t1 > t2 || grazing);
    }

    #[test]
    fn origin_on_a_face_parallel_to_it() {
        // inf * 0 must not poison the interval
        let ray = Ray::new(WorldPoint::new(1.0, -3.0, 0.0), WorldVector::y());
        let (t1, t2) = unit_box().intersect(&ray);
        assert!(t1 <= t2);
        assert!((t1 - 2.0).abs() < 1e-5);
        assert!((t2 - 4.0).abs() < 1e-5);
    }
}
