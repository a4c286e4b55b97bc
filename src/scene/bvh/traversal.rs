use arrayvec::ArrayVec;

use crate::{
    geometry::{FloatType, Ray, RayIntersectionExt as _, WorldBox},
    scene::{HitRecord, ObjectId, in_range},
};

use super::{Bvh, MAX_DEPTH, Node, NodeIdx};

impl Bvh {
    /// Nearest hit within `(t_min, t_max]`.
    ///
    /// `hit_leaf` tests a single object against an upper bound that shrinks
    /// as closer hits are found.
    pub fn nearest_hit(
        &self,
        ray: &Ray,
        t_min: FloatType,
        t_max: FloatType,
        mut hit_leaf: impl FnMut(ObjectId, FloatType) -> Option<HitRecord>,
    ) -> Option<HitRecord> {
        let mut best: Option<HitRecord> = None;
        let mut stack = ArrayVec::<(NodeIdx, FloatType), MAX_DEPTH>::new();

        if let Some(entry) = self.enter(self.root, ray, t_min, t_max) {
            stack.push((self.root, entry));
        }

        while let Some((node, entry)) = stack.pop() {
            let limit = best.as_ref().map_or(t_max, |hit| hit.t);
            if entry > limit {
                // Box starts behind the closest hit found so far
                continue;
            }

            match &self.nodes[node] {
                Node::Leaf { object, .. } => {
                    if let Some(hit) = hit_leaf(*object, limit) {
                        if in_range(hit.t, t_min, limit) {
                            best = Some(hit);
                        }
                    }
                }
                Node::Inner { left, right, .. } => {
                    let left_entry = self.enter(*left, ray, t_min, limit);
                    let right_entry = self.enter(*right, ray, t_min, limit);

                    // Push the farther child first so the nearer one is popped next
                    match (left_entry, right_entry) {
                        (Some(l), Some(r)) if l <= r => {
                            stack.push((*right, r));
                            stack.push((*left, l));
                        }
                        (Some(l), Some(r)) => {
                            stack.push((*left, l));
                            stack.push((*right, r));
                        }
                        (Some(l), None) => stack.push((*left, l)),
                        (None, Some(r)) => stack.push((*right, r)),
                        (None, None) => {}
                    }
                }
            }
        }

        best
    }

    /// Every object whose box overlaps `target`.
    pub fn overlapping(&self, target: &WorldBox) -> Vec<ObjectId> {
        let mut found = Vec::new();
        let mut stack = ArrayVec::<NodeIdx, MAX_DEPTH>::new();
        stack.push(self.root);

        while let Some(node) = stack.pop() {
            let node = &self.nodes[node];
            if !node.bounding_box().overlaps(target) {
                continue;
            }
            match node {
                Node::Leaf { object, .. } => found.push(*object),
                Node::Inner { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        found
    }

    /// Parameter where the ray enters the node's box, if it does so within the interval.
    fn enter(&self, node: NodeIdx, ray: &Ray, t_min: FloatType, t_max: FloatType) -> Option<FloatType> {
        let (t1, t2) = self.nodes[node].bounding_box().intersect(ray);
        (t1 <= t2 && t2 >= t_min && t1 <= t_max).then(|| t1.max(t_min))
    }
}
