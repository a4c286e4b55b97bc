use index_vec::IndexVec;

use crate::{
    geometry::WorldBox,
    scene::{Object, ObjectId, Surface, bvh::Bvh},
};

/// Bounding box prefilter over solid, bounded surfaces.
///
/// Planes are unbounded and always need a narrow phase test, so they stay out
/// of the tree. The tree is rebuilt lazily on the first query after `invalidate`.
#[derive(Clone, Debug)]
pub struct BroadPhase {
    bvh: Option<Bvh>,
    dirty: bool,
}

impl Default for BroadPhase {
    fn default() -> Self {
        BroadPhase {
            bvh: None,
            dirty: true,
        }
    }
}

impl BroadPhase {
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Ids of bounded surfaces whose box overlaps `bounding_box`, as of the last rebuild.
    pub fn candidates(
        &mut self,
        objects: &IndexVec<ObjectId, Surface>,
        bounding_box: &WorldBox,
    ) -> Vec<ObjectId> {
        if self.dirty {
            self.rebuild(objects);
        }
        self.bvh
            .as_ref()
            .map(|bvh| bvh.overlapping(bounding_box))
            .unwrap_or_default()
    }

    fn rebuild(&mut self, objects: &IndexVec<ObjectId, Surface>) {
        let items = objects
            .iter()
            .filter(|surface| surface.is_solid() && !surface.shape.is_plane())
            .map(|surface| (surface.id, surface.shape.get_bounding_box()))
            .collect();
        self.bvh = Bvh::build(items);
        self.dirty = false;
    }
}
