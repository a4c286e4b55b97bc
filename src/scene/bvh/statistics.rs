use log::debug;

use crate::util::Stats;

use super::{Bvh, Node, NodeIdx};

impl Bvh {
    pub fn log_statistics(&self) {
        debug!(
            "BVH over {} objects, bounds {:?} - {:?}",
            self.len(),
            self.bounding_box().min,
            self.bounding_box().max
        );
        debug!("Leaf depth: {}", self.depth_statistics());
        debug!("Inner node count: {}", self.nodes.len() - self.len());
    }

    /// Depth of every leaf, root being depth 1.
    pub fn depth_statistics(&self) -> Stats {
        let mut depths = Vec::new();
        self.collect_depths(self.root, 1, &mut depths);
        Stats::from_samples(depths)
    }

    fn collect_depths(&self, node: NodeIdx, depth: usize, depths: &mut Vec<usize>) {
        match &self.nodes[node] {
            Node::Leaf { .. } => depths.push(depth),
            Node::Inner { left, right, .. } => {
                self.collect_depths(*left, depth + 1, depths);
                self.collect_depths(*right, depth + 1, depths);
            }
        }
    }
}
