//! Tree node representation.
//!
//! Each node caches statistics from every simulation whose backpropagation
//! path has touched it. Nodes are stored in a contiguous arena and referenced
//! by `NodeId` indices; the parent link is a non-owning back-reference used
//! only for the upward walk during backpropagation.

use crate::search::SearchError;

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
///
/// Every stored evaluation is from the perspective of the side to move at
/// this node's position. A child's equity, viewed from its parent, must
/// therefore be negated.
#[derive(Debug, Clone)]
pub struct Node<G> {
    /// Immutable game position. Set at construction, never mutated.
    pub(crate) state: G,

    /// Back-reference to the parent; `None` at the root or after the node
    /// was orphaned at promotion time, which is what terminates a climbing
    /// backpropagation.
    pub(crate) parent: Option<NodeId>,

    /// Ordered child nodes. Insertion order matches the order of
    /// `GamePosition::legal_moves` and is the identity of a child by index.
    pub(crate) children: Vec<NodeId>,

    /// Whether `children` has been materialized yet. A terminal position
    /// expands to an empty list.
    pub(crate) expanded: bool,

    /// Per-child prior probabilities; empty when the evaluator provides
    /// none, otherwise exactly `children.len()` long.
    pub(crate) eval_probs: Vec<f64>,

    /// Stored evaluation in [-1, +1]; `None` until the node's first (and
    /// only) evaluation.
    pub(crate) eval_q: Option<f64>,

    /// Signed sum of backpropagated equities, from this node's perspective.
    pub(crate) q_sum: f64,

    /// Number of backpropagation events this node has participated in,
    /// including its own self-backprop after evaluation.
    pub(crate) visit_count: usize,

    /// Monotone flag separating the "unexplored first" selection regime from
    /// UCT/PUCT scoring. Once set it stays set.
    pub(crate) all_children_evaluated: bool,
}

impl<G> Node<G> {
    /// Create a fresh root node.
    pub(crate) fn new_root(state: G) -> Self {
        Self {
            state,
            parent: None,
            children: Vec::new(),
            expanded: false,
            eval_probs: Vec::new(),
            eval_q: None,
            q_sum: 0.0,
            visit_count: 0,
            all_children_evaluated: false,
        }
    }

    /// Create a child node below `parent`.
    pub(crate) fn new_child(state: G, parent: NodeId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new_root(state)
        }
    }

    /// The game position at this node.
    #[inline]
    pub fn state(&self) -> &G {
        &self.state
    }

    /// Whether the node has received its evaluation.
    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.eval_q.is_some()
    }

    /// Number of backpropagation events that touched this node.
    #[inline]
    pub fn visit_count(&self) -> usize {
        self.visit_count
    }

    /// Equity in [-1, +1] from this node's side-to-move perspective: the
    /// mean of backpropagated values once visited, the raw evaluation
    /// before that.
    ///
    /// Fails with [`SearchError::NotEvaluated`] before the first evaluation
    /// and with [`SearchError::InvariantBroken`] if the stored statistics
    /// have left the legal range.
    pub fn equity(&self) -> Result<f64, SearchError> {
        let eval_q = self.eval_q.ok_or(SearchError::NotEvaluated)?;
        let equity = if self.visit_count > 0 {
            self.q_sum / self.visit_count as f64
        } else {
            eval_q
        };
        if !(-1.0..=1.0).contains(&equity) {
            return Err(SearchError::InvariantBroken(format!(
                "equity {} outside [-1, 1] (q_sum {}, visit_count {}, eval_q {})",
                equity, self.q_sum, self.visit_count, eval_q
            )));
        }
        Ok(equity)
    }
}
