//! Exact pairwise tests. Closed forms for the common pairs, GJK for the rest.

use nalgebra::{Rotation3, Unit};

use crate::geometry::{EPSILON, FloatType, WorldPoint, WorldVector, normalize_or_self};

use super::{
    Collider, ColliderShape, Contact,
    gjk::{self, SupportMap},
};

/// Contact between two colliders, normal pointing from `a` to `b`.
pub fn collide(a: &Collider, b: &Collider) -> Contact {
    use ColliderShape::*;

    match (&a.shape, &b.shape) {
        (Plane { .. }, Plane { .. }) => Contact::none(),

        (Sphere { center: ca, radius: ra }, Sphere { center: cb, radius: rb }) => {
            sphere_sphere(ca, *ra, cb, *rb)
        }

        (Sphere { center, radius }, Plane { normal, offset }) => {
            sphere_plane(center, *radius, normal, *offset)
        }
        (Plane { normal, offset }, Sphere { center, radius }) => {
            sphere_plane(center, *radius, normal, *offset).flipped()
        }

        (
            Sphere { center, radius },
            Box {
                center: box_center,
                half_extents,
                orientation,
            },
        ) => sphere_box(center, *radius, box_center, half_extents, orientation),
        (
            Box {
                center: box_center,
                half_extents,
                orientation,
            },
            Sphere { center, radius },
        ) => sphere_box(center, *radius, box_center, half_extents, orientation).flipped(),

        (_, Plane { normal, offset }) => support_plane(a, normal, *offset),
        (Plane { normal, offset }, _) => support_plane(b, normal, *offset).flipped(),

        _ => convex_convex(a, b),
    }
}

fn sphere_sphere(ca: &WorldPoint, ra: FloatType, cb: &WorldPoint, rb: FloatType) -> Contact {
    let offset = cb - ca;
    let distance = offset.norm();
    let depth = ra + rb - distance;
    if depth <= 0.0 {
        return Contact::none();
    }
    let normal = if distance > EPSILON {
        offset / distance
    } else {
        WorldVector::x()
    };
    Contact::new(normal, depth, ca + normal * (ra - depth / 2.0))
}

fn sphere_plane(
    center: &WorldPoint,
    radius: FloatType,
    normal: &Unit<WorldVector>,
    offset: FloatType,
) -> Contact {
    let distance = center.coords.dot(normal.as_ref()) - offset;
    if distance.abs() >= radius {
        return Contact::none();
    }
    // Planes are two sided, the contact normal points from the sphere's side to the plane
    let towards_plane = if distance >= 0.0 {
        -normal.into_inner()
    } else {
        normal.into_inner()
    };
    Contact::new(
        towards_plane,
        radius - distance.abs(),
        center - normal.as_ref() * distance,
    )
}

fn sphere_box(
    center: &WorldPoint,
    radius: FloatType,
    box_center: &WorldPoint,
    half_extents: &WorldVector,
    orientation: &Rotation3<FloatType>,
) -> Contact {
    let local = orientation.inverse_transform_vector(&(center - box_center));
    let closest = local.zip_map(half_extents, |p, h| p.clamp(-h, h));
    let delta = local - closest;
    let distance = delta.norm();

    if distance > EPSILON {
        if distance >= radius {
            return Contact::none();
        }
        // Sphere center outside the box, normal points from the sphere into the box
        let normal = -(orientation * (delta / distance));
        let point = box_center + orientation * closest;
        return Contact::new(normal, radius - distance, point);
    }

    // Center inside, push out through the nearest face
    let gaps = half_extents - local.abs();
    let axis = gaps.imin();
    let mut face = WorldVector::zeros();
    face[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
    let mut surface_point = local;
    surface_point[axis] = face[axis] * half_extents[axis];

    Contact::new(
        -(orientation * face),
        radius + gaps[axis],
        box_center + orientation * surface_point,
    )
}

/// Any support mapped shape against a two sided plane.
/// Overlaps when the body has points strictly on both sides of the plane.
fn support_plane(body: &Collider, normal: &Unit<WorldVector>, offset: FloatType) -> Contact {
    let n = normal.into_inner();
    let lowest = body.support(&-n);
    let highest = body.support(&n);
    let below = lowest.coords.dot(&n) - offset;
    let above = highest.coords.dot(&n) - offset;
    if below >= 0.0 || above <= 0.0 {
        return Contact::none();
    }
    if body.center().coords.dot(&n) >= offset {
        Contact::new(-n, -below, lowest)
    } else {
        Contact::new(n, above, highest)
    }
}

fn convex_convex(a: &Collider, b: &Collider) -> Contact {
    let ca = a.center();
    let cb = b.center();
    if !gjk::intersects(a, b, cb - ca) {
        return Contact::none();
    }
    let normal = normalize_or_self(cb - ca);
    let normal = if normal.norm_squared() > 0.0 {
        normal
    } else {
        WorldVector::x()
    };
    Contact::new(normal, 0.0, nalgebra::center(&ca, &cb))
}
