//! K-Bucket trie implementation.

use crate::domain::{xor_distance, NodeId};

#[derive(Debug, Clone)]
enum Node {
    Leaf(Leaf),
    Internal { left: Box<Node>, right: Box<Node> },
}

#[derive(Debug, Clone)]
struct Leaf {
    ids: Vec<NodeId>,
    splittable: bool,
}

impl Leaf {
    fn new(ids: Vec<NodeId>, splittable: bool) -> Self {
        Self { ids, splittable }
    }
}

/// Kademlia k-bucket trie anchored at `target`.
///
/// Operations are total: inserting into a full, unsplittable leaf and
/// removing an unknown id are silent no-ops reported through the `bool`
/// return value.
#[derive(Debug, Clone)]
pub struct KBucket {
    target: NodeId,
    capacity: usize,
    root: Node,
    len: usize,
}

impl KBucket {
    /// Create an empty trie anchored at `target` with leaf capacity `capacity`.
    pub fn new(target: NodeId, capacity: usize) -> Self {
        Self {
            target,
            capacity,
            root: Node::Leaf(Leaf::new(Vec::new(), true)),
            len: 0,
        }
    }

    /// Anchor identifier.
    pub fn target(&self) -> &NodeId {
        &self.target
    }

    /// Leaf capacity `k`.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored identifiers.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the trie is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `id`; returns `true` only if it was not present and found room.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if id.len() != self.target.len() || self.capacity == 0 {
            return false;
        }
        let added = insert_at(&mut self.root, &self.target, self.capacity, id, 0);
        if added {
            self.len += 1;
        }
        added
    }

    /// Remove `id`; returns `true` if it was present. Leaves never merge.
    pub fn remove(&mut self, id: &NodeId) -> bool {
        let leaf = leaf_for_mut(&mut self.root, id, 0);
        match leaf.ids.iter().position(|n| n == id) {
            Some(pos) => {
                leaf.ids.swap_remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Membership test.
    pub fn has(&self, id: &NodeId) -> bool {
        leaf_for(&self.root, id, 0).ids.contains(id)
    }

    /// Up to `count` stored ids ordered by increasing XOR distance to `target`.
    pub fn closest(&self, target: &NodeId, count: usize) -> Vec<NodeId> {
        if count == 0 {
            return Vec::new();
        }
        let mut found = Vec::with_capacity(count);
        collect_near_first(&self.root, target, count, 0, &mut found);
        found.sort_by_cached_key(|id| xor_distance(id, target));
        found.truncate(count);
        found
    }

    /// Every stored id, in trie order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        collect_all(&self.root, &mut out);
        out
    }
}

fn insert_at(
    node: &mut Node,
    target: &NodeId,
    capacity: usize,
    id: NodeId,
    depth: usize,
) -> bool {
    match node {
        Node::Internal { left, right } => {
            let child = if id.bit(depth) { right } else { left };
            insert_at(child, target, capacity, id, depth + 1)
        }
        Node::Leaf(leaf) => {
            if leaf.ids.contains(&id) {
                return false;
            }
            if leaf.ids.len() < capacity {
                leaf.ids.push(id);
                return true;
            }
            if !leaf.splittable || depth >= id.bit_len() {
                return false;
            }
            let (ones, zeros): (Vec<NodeId>, Vec<NodeId>) =
                std::mem::take(&mut leaf.ids).into_iter().partition(|n| n.bit(depth));
            let target_bit = target.bit(depth);
            *node = Node::Internal {
                left: Box::new(Node::Leaf(Leaf::new(zeros, !target_bit))),
                right: Box::new(Node::Leaf(Leaf::new(ones, target_bit))),
            };
            insert_at(node, target, capacity, id, depth)
        }
    }
}

fn leaf_for<'a>(node: &'a Node, id: &NodeId, depth: usize) -> &'a Leaf {
    match node {
        Node::Leaf(leaf) => leaf,
        Node::Internal { left, right } => {
            let child = if id.bit(depth) { right } else { left };
            leaf_for(child, id, depth + 1)
        }
    }
}

fn leaf_for_mut<'a>(node: &'a mut Node, id: &NodeId, depth: usize) -> &'a mut Leaf {
    match node {
        Node::Leaf(leaf) => leaf,
        Node::Internal { left, right } => {
            let child = if id.bit(depth) { right } else { left };
            leaf_for_mut(child, id, depth + 1)
        }
    }
}

fn collect_near_first(
    node: &Node,
    target: &NodeId,
    count: usize,
    depth: usize,
    out: &mut Vec<NodeId>,
) {
    if out.len() >= count {
        return;
    }
    match node {
        Node::Leaf(leaf) => out.extend(leaf.ids.iter().cloned()),
        Node::Internal { left, right } => {
            let (near, far) = if target.bit(depth) {
                (right, left)
            } else {
                (left, right)
            };
            collect_near_first(near, target, count, depth + 1, out);
            collect_near_first(far, target, count, depth + 1, out);
        }
    }
}

fn collect_all(node: &Node, out: &mut Vec<NodeId>) {
    match node {
        Node::Leaf(leaf) => out.extend(leaf.ids.iter().cloned()),
        Node::Internal { left, right } => {
            collect_all(left, out);
            collect_all(right, out);
        }
    }
}
