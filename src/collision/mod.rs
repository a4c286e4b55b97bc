//! Discrete collision detection for movable surfaces.
//!
//! A broad phase shortlists candidates by bounding boxes, the narrow phase then
//! decides with closed forms where they exist and GJK everywhere else.

mod broad_phase;
mod collider;
pub mod gjk;
pub mod narrow_phase;

pub use broad_phase::BroadPhase;
pub use collider::{Collider, ColliderShape, Contact};
