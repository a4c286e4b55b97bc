//! Boolean GJK intersection test on support mapped convex shapes.

use arrayvec::ArrayVec;

use crate::geometry::{FloatType, WorldPoint, WorldVector};

const MAX_ITERATIONS: usize = 64;

/// Convex shape known through its farthest point in any direction.
pub trait SupportMap {
    fn support(&self, direction: &WorldVector) -> WorldPoint;
}

/// Newest vertex is always at index 0.
type Simplex = ArrayVec<WorldVector, 4>;

fn minkowski_support(a: &impl SupportMap, b: &impl SupportMap, direction: &WorldVector) -> WorldVector {
    a.support(direction) - b.support(&-direction)
}

/// Whether the two shapes overlap. Touching shapes count as overlapping.
pub fn intersects(a: &impl SupportMap, b: &impl SupportMap, initial_direction: WorldVector) -> bool {
    let mut direction = if initial_direction.norm_squared() > 0.0 {
        initial_direction
    } else {
        WorldVector::x()
    };

    let mut simplex = Simplex::new();
    let first = minkowski_support(a, b, &direction);
    simplex.push(first);
    direction = -first;

    for _ in 0..MAX_ITERATIONS {
        if direction.norm_squared() <= FloatType::EPSILON * FloatType::EPSILON {
            // Origin lies on the simplex
            return true;
        }

        let point = minkowski_support(a, b, &direction);
        if point.dot(&direction) <= 0.0 {
            return false;
        }
        simplex.insert(0, point);

        if let Some(next) = next_simplex(&mut simplex) {
            direction = next;
        } else {
            return true;
        }
    }

    false
}

/// Reduces the simplex to the feature closest to the origin and returns the
/// next search direction, `None` once the origin is enclosed.
fn next_simplex(simplex: &mut Simplex) -> Option<WorldVector> {
    match simplex.len() {
        2 => Some(line(simplex)),
        3 => Some(triangle(simplex)),
        4 => tetrahedron(simplex),
        _ => unreachable!("simplex always has between two and four points here"),
    }
}

fn same_direction(a: &WorldVector, b: &WorldVector) -> bool {
    a.dot(b) > 0.0
}

fn line(simplex: &mut Simplex) -> WorldVector {
    let (a, b) = (simplex[0], simplex[1]);
    let ab = b - a;
    let ao = -a;

    if same_direction(&ab, &ao) {
        ab.cross(&ao).cross(&ab)
    } else {
        simplex.truncate(1);
        ao
    }
}

fn triangle(simplex: &mut Simplex) -> WorldVector {
    let (a, b, c) = (simplex[0], simplex[1], simplex[2]);
    let ab = b - a;
    let ac = c - a;
    let ao = -a;
    let abc = ab.cross(&ac);

    if same_direction(&abc.cross(&ac), &ao) {
        if same_direction(&ac, &ao) {
            *simplex = [a, c].into_iter().collect();
            ac.cross(&ao).cross(&ac)
        } else {
            *simplex = [a, b].into_iter().collect();
            line(simplex)
        }
    } else if same_direction(&ab.cross(&abc), &ao) {
        *simplex = [a, b].into_iter().collect();
        line(simplex)
    } else if same_direction(&abc, &ao) {
        abc
    } else {
        *simplex = [a, c, b].into_iter().collect();
        -abc
    }
}

fn tetrahedron(simplex: &mut Simplex) -> Option<WorldVector> {
    let (a, b, c, d) = (simplex[0], simplex[1], simplex[2], simplex[3]);
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let ao = -a;

    let abc = ab.cross(&ac);
    let acd = ac.cross(&ad);
    let adb = ad.cross(&ab);

    if same_direction(&abc, &ao) {
        *simplex = [a, b, c].into_iter().collect();
        return Some(triangle(simplex));
    }
    if same_direction(&acd, &ao) {
        *simplex = [a, c, d].into_iter().collect();
        return Some(triangle(simplex));
    }
    if same_direction(&adb, &ao) {
        *simplex = [a, d, b].into_iter().collect();
        return Some(triangle(simplex));
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[derive(Debug)]
    struct Ball(WorldPoint, FloatType);

    impl SupportMap for Ball {
        fn support(&self, direction: &WorldVector) -> WorldPoint {
            let norm = direction.norm();
            if norm == 0.0 {
                self.0
            } else {
                self.0 + direction * (self.1 / norm)
            }
        }
    }

    #[derive(Debug)]
    struct Cuboid(WorldPoint, FloatType);

    impl SupportMap for Cuboid {
        fn support(&self, direction: &WorldVector) -> WorldPoint {
            self.0 + direction.map(|d| if d >= 0.0 { self.1 } else { -self.1 })
        }
    }

    #[test_case(1.5, true; "overlapping")]
    #[test_case(2.5, false; "apart")]
    fn balls(distance: FloatType, expected: bool) {
        let a = Ball(WorldPoint::origin(), 1.0);
        let b = Ball(WorldPoint::new(distance, 0.3, -0.2), 1.0);
        assert!(intersects(&a, &b, WorldVector::x()) == expected);
    }

    #[test]
    fn cuboid_corner_against_ball() {
        let cube = Cuboid(WorldPoint::origin(), 1.0);
        // Corner at distance sqrt(3) - 1 from the cube surface along the diagonal
        let near = Ball(WorldPoint::new(1.5, 1.5, 1.5), 1.0);
        let far = Ball(WorldPoint::new(1.7, 1.7, 1.7), 1.0);
        assert!(intersects(&cube, &near, WorldVector::x()));
        assert!(!intersects(&cube, &far, WorldVector::x()));
    }

    #[test]
    fn zero_initial_direction_is_replaced() {
        let a = Cuboid(WorldPoint::origin(), 1.0);
        let b = Cuboid(WorldPoint::new(0.5, 0.5, 0.5), 1.0);
        assert!(intersects(&a, &b, WorldVector::zeros()));
    }

    #[proptest]
    fn agrees_with_ball_distance(
        #[strategy(-4.0f32..4.0)] x: f32,
        #[strategy(-4.0f32..4.0)] y: f32,
        #[strategy(-4.0f32..4.0)] z: f32,
    ) {
        let center = WorldPoint::new(x, y, z);
        let distance = center.coords.norm();
        // Stay clear of the boundary where rounding decides
        prop_assume!((distance - 2.0).abs() > 1e-2);
        let a = Ball(WorldPoint::origin(), 1.0);
        let b = Ball(center, 1.0);
        prop_assert!(intersects(&a, &b, center.coords) == (distance < 2.0));
    }
}
