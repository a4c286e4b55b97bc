//! Median split bounding volume hierarchy over scene objects.
//!
//! Used both for the nearest hit query of the renderer and as the broad phase of
//! collision detection. The tree is immutable, geometry changes rebuild it.

mod building;
mod statistics;
mod traversal;

use index_vec::IndexVec;

use crate::{geometry::WorldBox, scene::ObjectId};

/// Traversal stack size, enough for any tree built by median splits.
const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug)]
pub struct Bvh {
    root: NodeIdx,
    nodes: IndexVec<NodeIdx, Node>,
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Inner {
        bounding_box: WorldBox,
        left: NodeIdx,
        right: NodeIdx,
    },
    Leaf {
        bounding_box: WorldBox,
        object: ObjectId,
    },
}

impl Node {
    fn bounding_box(&self) -> &WorldBox {
        match self {
            Node::Inner { bounding_box, .. } | Node::Leaf { bounding_box, .. } => bounding_box,
        }
    }
}

index_vec::define_index_type! {
    struct NodeIdx = u32;
}

impl Bvh {
    pub fn bounding_box(&self) -> &WorldBox {
        self.nodes[self.root].bounding_box()
    }

    pub fn len(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}
