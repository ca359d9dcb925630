//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices.

use crate::node::{MctsNode, NodeId};
use engine_core::{EngineError, Move, Position};

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Root node index (always 0 after initialization)
    root: NodeId,

    /// Agent whose value every node stores.
    agent: usize,
}

impl MctsTree {
    /// Create a new tree searching `root` on behalf of `agent`.
    pub fn new(root: Position, agent: usize) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(root)],
            root: NodeId(0),
            agent,
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position at `id`, building it from the parent's position on first
    /// use.
    pub fn position(&mut self, id: NodeId) -> Result<&Position, EngineError> {
        if self.get(id).position.is_none() {
            let node = self.get(id);
            let (parent, mv) = match (node.parent, node.mv) {
                (parent, Some(mv)) if parent.is_some() => (parent, mv),
                _ => {
                    return Err(EngineError::StateInvariantViolation(
                        "tree node without position or parent move".into(),
                    ))
                }
            };
            let parent_pos = self.get(parent).position.as_ref().ok_or_else(|| {
                EngineError::StateInvariantViolation("expanded node without position".into())
            })?;
            let child = parent_pos.apply(mv)?;
            let node = self.get_mut(id);
            node.is_terminal = child.is_terminal();
            node.position = Some(child);
        }
        self.get(id)
            .position
            .as_ref()
            .ok_or_else(|| EngineError::StateInvariantViolation("node position missing".into()))
    }

    /// Select the best child of a node by PUCT. The node's mover maximizes
    /// the root agent's value if it is the root agent and minimizes it
    /// otherwise. Ties go to the earliest child.
    pub fn select_child(&self, node_id: NodeId, c_puct: f32) -> Option<NodeId> {
        let node = self.get(node_id);
        let maximizing = node
            .position
            .as_ref()
            .map_or(true, |pos| pos.to_move() == self.agent);
        let sign = if maximizing { 1.0 } else { -1.0 };
        // Pre-compute sqrt once instead of per-child comparison
        let parent_visits_sqrt = (node.visit_count.max(1) as f32).sqrt();

        let mut best: Option<(NodeId, f32)> = None;
        for &(_, id) in &node.children {
            let score = self.get(id).puct_score(parent_visits_sqrt, c_puct, sign);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Add a child to a parent node.
    /// Returns the new child's NodeId.
    pub fn add_child(&mut self, parent_id: NodeId, mv: Move, prior: f32) -> NodeId {
        let child_id = self.allocate(MctsNode::new_child(parent_id, mv, prior));
        self.get_mut(parent_id).children.push((mv, child_id));
        child_id
    }

    /// Backpropagate a value from a leaf to the root, taking back `loss`
    /// of virtual loss on the way.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32, loss: f32) {
        let mut current_id = leaf_id;
        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += value;
            node.virtual_loss = (node.virtual_loss - loss).max(0.0);
            current_id = node.parent;
        }
    }

    /// Apply virtual loss to nodes along a path (for parallel MCTS).
    pub fn apply_virtual_loss(&mut self, path: &[NodeId], loss: f32) {
        for &node_id in path {
            self.get_mut(node_id).virtual_loss += loss;
        }
    }

    /// Best root move: most visits, then higher mean value, then the
    /// smallest move.
    pub fn best_move(&self) -> Option<(Move, u32)> {
        let root = self.get(self.root);
        let mut best: Option<(Move, &MctsNode)> = None;
        for &(mv, id) in &root.children {
            let node = self.get(id);
            let better = match best {
                None => true,
                Some((best_mv, b)) => {
                    node.visit_count > b.visit_count
                        || (node.visit_count == b.visit_count
                            && (node.mean_value() > b.mean_value()
                                || (node.mean_value() == b.mean_value() && mv < best_mv)))
                }
            };
            if better {
                best = Some((mv, node));
            }
        }
        best.map(|(mv, node)| (mv, node.visit_count))
    }

    /// Root visit shares per move, in generation order. Empty before the
    /// first visit.
    pub fn visit_distribution(&self) -> Vec<(Move, f32)> {
        let root = self.get(self.root);
        let total: u32 = root
            .children
            .iter()
            .map(|(_, id)| self.get(*id).visit_count)
            .sum();
        if total == 0 {
            return Vec::new();
        }
        root.children
            .iter()
            .map(|&(mv, id)| (mv, self.get(id).visit_count as f32 / total as f32))
            .collect()
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(),
        }
    }

    fn compute_max_depth(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.get(id).children.iter().map(|&(_, c)| (c, depth + 1)));
        }
        max_depth
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}
