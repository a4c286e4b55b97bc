use index_vec::IndexVec;
use itertools::Itertools as _;
use ordered_float::OrderedFloat;

use crate::{
    geometry::{FloatType, WorldBox, WorldVector},
    scene::ObjectId,
};

use super::{Bvh, Node, NodeIdx};

impl Bvh {
    /// Builds the tree, `None` when there is nothing to partition.
    pub fn build(mut items: Vec<(ObjectId, WorldBox)>) -> Option<Bvh> {
        if items.is_empty() {
            return None;
        }

        let mut bvh = Bvh {
            root: NodeIdx::new(0),
            nodes: IndexVec::with_capacity(2 * items.len()),
        };
        bvh.root = bvh.build_recursive(&mut items);
        Some(bvh)
    }

    fn build_recursive(&mut self, items: &mut [(ObjectId, WorldBox)]) -> NodeIdx {
        if let [(object, bounding_box)] = items {
            return self.nodes.push(Node::Leaf {
                bounding_box: bounding_box.clone(),
                object: *object,
            });
        }

        let axis = split_axis(items);
        items.sort_unstable_by_key(|(_, bounding_box)| OrderedFloat(bounding_box.center()[axis]));

        // Create placeholder node that will be overwritten once the children exist
        let node_index = self.nodes.push(Node::Leaf {
            bounding_box: WorldBox::default(),
            object: ObjectId::new(0),
        });

        let (left_items, right_items) = items.split_at_mut(items.len() / 2);
        let left = self.build_recursive(left_items);
        let right = self.build_recursive(right_items);

        let bounding_box = self.nodes[left]
            .bounding_box()
            .surrounding(self.nodes[right].bounding_box());
        self.nodes[node_index] = Node::Inner {
            bounding_box,
            left,
            right,
        };

        node_index
    }
}

/// Axis along which the centers of the boxes are spread the most.
fn split_axis(items: &[(ObjectId, WorldBox)]) -> usize {
    let count = items.len() as FloatType;
    let centers = items
        .iter()
        .map(|(_, bounding_box)| bounding_box.center().coords)
        .collect_vec();
    let mean = centers.iter().sum::<WorldVector>() / count;
    let variance = centers
        .iter()
        .map(|center| (center - mean).component_mul(&(center - mean)))
        .sum::<WorldVector>();

    variance.imax()
}
