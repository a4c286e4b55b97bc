use std::ops::Sub;

use nalgebra::{ClosedAddAssign, ClosedDivAssign, Point, Scalar};
use num_traits::One;

use super::{FloatType, WorldBox, WorldPoint, WorldVector};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T: Scalar + ClosedAddAssign + ClosedDivAssign + One, const D: usize> AABB<Point<T, D>> {
    pub fn center(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        let avg_coords = (&self.min.coords + &self.max.coords) / two;
        Point::from(avg_coords)
    }
}

impl<Point> From<[Point; 2]> for AABB<Point> {
    fn from(value: [Point; 2]) -> Self {
        let [min, max] = value;
        AABB { min, max }
    }
}

impl<Point> From<(Point, Point)> for AABB<Point> {
    fn from(value: (Point, Point)) -> Self {
        let (min, max) = value;
        AABB { min, max }
    }
}

impl WorldBox {
    /// Box around a center with the given (non-negative) half extents.
    pub fn from_center(center: WorldPoint, half_extents: WorldVector) -> WorldBox {
        let half_extents = half_extents.abs();
        WorldBox::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing all points, `None` if the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Option<WorldBox> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(WorldBox::new(first, first), |b, p| {
            WorldBox::new(b.min.inf(p), b.max.sup(p))
        }))
    }

    /// Smallest box containing both boxes.
    pub fn surrounding(&self, other: &WorldBox) -> WorldBox {
        WorldBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Closed overlap test, touching boxes overlap.
    pub fn overlaps(&self, other: &WorldBox) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn contains(&self, point: &WorldPoint, tolerance: FloatType) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min[axis] - tolerance && point[axis] <= self.max[axis] + tolerance
        })
    }

    pub fn translated(&self, delta: &WorldVector) -> WorldBox {
        WorldBox::new(self.min + delta, self.max + delta)
    }

    /// Box grown by `margin` in every direction.
    pub fn inflated(&self, margin: FloatType) -> WorldBox {
        let margin = WorldVector::repeat(margin);
        WorldBox::new(self.min - margin, self.max + margin)
    }

    pub fn diagonal(&self) -> FloatType {
        self.size().norm()
    }

    pub fn corners(&self) -> [WorldPoint; 8] {
        std::array::from_fn(|i| {
            WorldPoint::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    fn unit_box() -> WorldBox {
        WorldBox::new([0.0, 0.0, 0.0].into(), [1.0, 1.0, 1.0].into())
    }

    #[test]
    fn surrounding_contains_both() {
        let a = unit_box();
        let b = WorldBox::new([2.0, -1.0, 0.5].into(), [3.0, 0.0, 4.0].into());
        let s = a.surrounding(&b);
        assert!(s.min == WorldPoint::new(0.0, -1.0, 0.0));
        assert!(s.max == WorldPoint::new(3.0, 1.0, 4.0));
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = unit_box();
        let b = a.translated(&WorldVector::new(1.0, 0.0, 0.0));
        let c = a.translated(&WorldVector::new(1.01, 0.0, 0.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn from_points_empty() {
        assert!(WorldBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn corners_span_box() {
        let b = unit_box();
        let rebuilt = WorldBox::from_points(b.corners().iter()).unwrap();
        assert!(rebuilt == b);
    }

    #[test]
    fn center_and_size() {
        let b = WorldBox::from_center([1.0, 2.0, 3.0].into(), WorldVector::new(1.0, -2.0, 0.5));
        assert!(b.center() == WorldPoint::new(1.0, 2.0, 3.0));
        assert!(b.size() == WorldVector::new(2.0, 4.0, 1.0));
    }
}
