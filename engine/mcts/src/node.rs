//! MCTS tree node representation.
//!
//! Each node is the position reached by playing `mv` from the parent. All
//! values are stored from the searching (root) agent's perspective, so a
//! node whose mover is an opponent selects children by the negated value.

use engine_core::{Move, Position};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Move that led here from the parent (None for root)
    pub mv: Option<Move>,

    /// Position at this node. Children are created without one and get
    /// their position the first time a simulation reaches them.
    pub position: Option<Position>,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of backed-up values, root agent perspective, each in [-1, 1].
    pub value_sum: f32,

    /// Prior probability of choosing this node's move at the parent.
    pub prior: f32,

    pub is_terminal: bool,

    /// Settled value for terminal nodes and nodes resolved by the endgame
    /// solver. Such nodes are never expanded.
    pub exact_value: Option<f32>,

    /// Children as (move, node) pairs in move generation order.
    /// Empty until node is expanded.
    pub children: Vec<(Move, NodeId)>,

    /// Outstanding virtual loss from in-flight simulations.
    pub virtual_loss: f32,
}

impl MctsNode {
    /// Create a new root node.
    pub fn new_root(position: Position) -> Self {
        Self {
            parent: NodeId::NONE,
            mv: None,
            is_terminal: position.is_terminal(),
            position: Some(position),
            visit_count: 0,
            value_sum: 0.0,
            prior: 1.0,
            exact_value: None,
            children: Vec::new(),
            virtual_loss: 0.0,
        }
    }

    /// Create a new child node.
    pub fn new_child(parent: NodeId, mv: Move, prior: f32) -> Self {
        Self {
            parent,
            mv: Some(mv),
            position: None,
            visit_count: 0,
            value_sum: 0.0,
            prior,
            is_terminal: false,
            exact_value: None,
            children: Vec::new(),
            virtual_loss: 0.0,
        }
    }

    /// Mean value Q = value_sum / visit_count, 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    /// PUCT score for child selection:
    /// `sign * Q - virtual_loss + c_puct * P * sqrt(N_parent) / (1 + N)`.
    ///
    /// `sign` is +1 when the parent's mover is the root agent and -1 when it
    /// is an opponent minimizing the root agent's value.
    #[inline]
    pub fn puct_score(&self, parent_visits_sqrt: f32, c_puct: f32, sign: f32) -> f32 {
        let q = sign * self.mean_value() - self.virtual_loss;
        let u = c_puct * self.prior * parent_visits_sqrt / (1.0 + self.visit_count as f32);
        q + u
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this is a leaf node (unexpanded or settled).
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.exact_value.is_some() || !self.is_expanded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Color, DraftSource, Placement};

    fn some_move() -> Move {
        Move::new(DraftSource::Factory(0), Color::Blue, Placement::Row(0))
    }

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_new_root() {
        let node = MctsNode::new_root(Position::new(2, 1).unwrap());
        assert!(node.parent.is_none());
        assert!(node.mv.is_none());
        assert!(node.position.is_some());
        assert!((node.prior - 1.0).abs() < 1e-6);
        assert!(!node.is_terminal);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_mean_value() {
        let mut node = MctsNode::new_child(NodeId(0), some_move(), 0.5);
        assert!(node.mean_value().abs() < 1e-6);
        node.visit_count = 4;
        node.value_sum = 2.0;
        assert!((node.mean_value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_puct_score_sign() {
        let mut node = MctsNode::new_child(NodeId(0), some_move(), 0.5);
        node.visit_count = 10;
        node.value_sum = 5.0;

        // Q = 0.5, U = 1.0 * 0.5 * 10 / 11
        let u = 0.5 * 10.0 / 11.0;
        assert!((node.puct_score(10.0, 1.0, 1.0) - (0.5 + u)).abs() < 1e-5);
        assert!((node.puct_score(10.0, 1.0, -1.0) - (-0.5 + u)).abs() < 1e-5);

        node.virtual_loss = 1.0;
        assert!((node.puct_score(10.0, 1.0, 1.0) - (-0.5 + u)).abs() < 1e-5);
    }

    #[test]
    fn test_is_leaf() {
        let mut node = MctsNode::new_child(NodeId(0), some_move(), 1.0);
        assert!(node.is_leaf());
        node.children.push((some_move(), NodeId(2)));
        assert!(!node.is_leaf());
        node.exact_value = Some(0.25);
        assert!(node.is_leaf());
    }
}
