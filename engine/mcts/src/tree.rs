//! Tree storage with arena allocation.
//!
//! Nodes live in a contiguous `Vec` and reference each other by `NodeId`
//! indices, which sidesteps ownership cycles entirely: the arena owns every
//! node, children hold no view of their parent except an index, and
//! promotion clears that index before compacting the discarded part of the
//! tree away.

use crate::game::GamePosition;
use crate::node::{Node, NodeId};
use crate::search::SearchError;

/// Game tree over positions of type `G`, rooted at the current position.
///
/// The tree is strictly single-threaded; concurrent use is provided by
/// [`ThreadedSearch`](crate::ThreadedSearch), which serializes every call.
#[derive(Debug)]
pub struct SearchTree<G> {
    nodes: Vec<Node<G>>,
    root: NodeId,
}

impl<G: GamePosition> SearchTree<G> {
    /// Create a tree rooted at `state`. The root starts unevaluated with no
    /// materialized children.
    pub fn new(state: G) -> Self {
        Self {
            nodes: vec![Node::new_root(state)],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<G> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<G> {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes currently in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The position at the root.
    pub fn root_state(&self) -> &G {
        &self.get(self.root).state
    }

    /// Visit count of the root.
    pub fn visit_count(&self) -> usize {
        self.get(self.root).visit_count()
    }

    /// Whether the root has been evaluated.
    pub fn is_evaluated(&self) -> bool {
        self.get(self.root).is_evaluated()
    }

    /// Root equity; fails with `NotEvaluated` before the first evaluation.
    pub fn equity(&self) -> Result<f64, SearchError> {
        self.get(self.root).equity()
    }

    /// Whether the root has an exact non-terminal evaluation.
    pub fn has_exact_eval(&self) -> bool {
        self.root_state().non_terminal_eval().is_some()
    }

    /// Number of legal moves at the root, materializing children if needed.
    pub fn child_count(&mut self) -> usize {
        self.expand(self.root);
        self.get(self.root).children.len()
    }

    /// Lazily materialize the children of `id` from the position's legal
    /// moves. Memoization of a conceptually infinite game tree: the move
    /// generator runs at most once per node.
    pub(crate) fn expand(&mut self, id: NodeId) {
        if self.get(id).expanded {
            return;
        }
        let mut states = Vec::new();
        self.get(id).state.legal_moves(&mut states);
        let ids: Vec<NodeId> = states
            .into_iter()
            .map(|state| {
                let child_id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Node::new_child(state, id));
                child_id
            })
            .collect();
        let node = self.get_mut(id);
        node.children = ids;
        node.expanded = true;
    }

    /// Walk from `leaf` to the root via parent back-references, adding the
    /// leaf's evaluation to each `q_sum` with alternating sign (positive at
    /// the leaf) and incrementing visit counts. Stops at the first node with
    /// no parent, which is the current root.
    pub(crate) fn backpropagate(&mut self, leaf: NodeId) -> Result<(), SearchError> {
        let leaf_node = self.get(leaf);
        let eval_q = leaf_node.eval_q.ok_or_else(|| {
            SearchError::InvariantBroken("backpropagation from an unevaluated node".into())
        })?;
        if leaf_node.visit_count > 0
            && !leaf_node.state.is_terminal()
            && leaf_node.state.non_terminal_eval().is_none()
        {
            return Err(SearchError::InvariantBroken(
                "backpropagation revisited a node that is neither terminal nor exactly evaluated"
                    .into(),
            ));
        }

        let mut sign = 1.0;
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let node = self.get_mut(id);
            node.q_sum += sign * eval_q;
            node.visit_count += 1;
            cursor = node.parent;
            sign = -sign;
        }
        Ok(())
    }

    /// Descend to the child at `choice`, making it the new root. The child
    /// is orphaned so backpropagation from within its subtree can no longer
    /// reach the discarded ancestors, and the arena is compacted so the old
    /// root, its other subtrees, and their statistics are freed.
    pub fn make_move(&mut self, choice: usize) -> Result<(), SearchError> {
        self.expand(self.root);
        let children = &self.get(self.root).children;
        if choice >= children.len() {
            return Err(SearchError::IllegalMove(format!(
                "child index {} out of range ({} children)",
                choice,
                children.len()
            )));
        }
        let target = children[choice];
        self.promote(target);
        Ok(())
    }

    /// Descend to the child whose action text (rendered with `flip`) matches
    /// `action_text`.
    pub fn make_move_by_text(&mut self, action_text: &str, flip: bool) -> Result<(), SearchError> {
        self.expand(self.root);
        let children = self.get(self.root).children.clone();
        for (choice, &child) in children.iter().enumerate() {
            if self.get(child).state.action_text(flip) == action_text {
                return self.make_move(choice);
            }
        }
        Err(SearchError::IllegalMove(action_text.to_string()))
    }

    /// Re-root the tree at `state`: a no-op when it already is the root
    /// position, a `make_move` when it matches a child, an error otherwise.
    pub fn set_state(&mut self, state: &G) -> Result<(), SearchError> {
        if *state == self.get(self.root).state {
            return Ok(());
        }
        self.expand(self.root);
        let children = self.get(self.root).children.clone();
        for (choice, &child) in children.iter().enumerate() {
            if self.get(child).state == *state {
                return self.make_move(choice);
            }
        }
        Err(SearchError::IllegalMove(
            "position is not reachable from the current root".into(),
        ))
    }

    /// Orphan `new_root` and compact the arena down to its subtree.
    fn promote(&mut self, new_root: NodeId) {
        self.get_mut(new_root).parent = None;

        // Collect the retained subtree in breadth-first order; index 0 is
        // the new root.
        let mut order = vec![new_root];
        let mut cursor = 0;
        while cursor < order.len() {
            let id = order[cursor];
            order.extend_from_slice(&self.get(id).children);
            cursor += 1;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new_index, old_id) in order.iter().enumerate() {
            remap[old_id.index()] = Some(NodeId(new_index as u32));
        }

        let mut slots: Vec<Option<Node<G>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old_id in order {
            let mut node = slots[old_id.index()]
                .take()
                .expect("retained node vacated during compaction");
            node.parent = node.parent.and_then(|p| remap[p.index()]);
            for child in &mut node.children {
                *child = remap[child.index()].expect("child dropped during compaction");
            }
            nodes.push(node);
        }
        self.nodes = nodes;
        self.root = NodeId(0);
    }
}
