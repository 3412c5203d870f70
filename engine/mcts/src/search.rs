//! Search operations over the tree.
//!
//! Implements the simulation cycle:
//!
//! 1. **Selection**: descend from the root, first visiting unexplored
//!    children uniformly at random, then scoring with UCT or PUCT
//! 2. **Evaluation**: resolve the leaf's value from terminal state, exact
//!    non-terminal evaluation, random rollout, or the game's evaluator
//! 3. **Backpropagation**: climb the parent links adding the value with
//!    alternating sign
//!
//! plus the epsilon-greedy action choice and the sorted-actions report.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::trace;

use crate::config::SearchConfig;
use crate::game::GamePosition;
use crate::node::NodeId;
use crate::rollout::{rollout, MAX_ROLLOUT_ITERS};
use crate::tree::SearchTree;

/// Errors that can occur during search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Requested action text or child index does not match any child.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// `simulate` called on a terminal root or one with no legal moves.
    #[error("cannot simulate from a terminal position")]
    IllegalSimulation,

    /// Equity requested from a node that was never evaluated.
    #[error("cannot get equity without an evaluation")]
    NotEvaluated,

    /// A node was evaluated twice (internal bug).
    #[error("node evaluated twice")]
    DoubleEval,

    /// A numeric or structural invariant failed to hold.
    #[error("invariant broken: {0}")]
    InvariantBroken(String),

    /// A rollout hit the iteration cap without reaching a terminal state.
    #[error("rollout reached {MAX_ROLLOUT_ITERS} steps without ending the game")]
    RolloutDiverged,

    /// Action choice invoked with zero children.
    #[error("no legal moves")]
    NoLegalMoves,
}

impl<G: GamePosition> SearchTree<G> {
    /// Run `simulations` playouts from the current root.
    ///
    /// The root must be non-terminal with at least one legal move. If it has
    /// never been evaluated it is evaluated first and self-backpropagated,
    /// so after `simulate(n)` from a fresh root the root's visit count is
    /// `n + 1`.
    ///
    /// `simulate(0)` is a no-op that neither evaluates nor alters counts.
    pub fn simulate(
        &mut self,
        simulations: usize,
        rng: &mut ChaCha20Rng,
        config: &SearchConfig,
    ) -> Result<(), SearchError> {
        if simulations == 0 {
            return Ok(());
        }

        self.expand(self.root());
        let root = self.get(self.root());
        if root.children.is_empty() || root.state().is_terminal() {
            return Err(SearchError::IllegalSimulation);
        }
        if !root.is_evaluated() {
            self.evaluate_node(self.root(), rng, config, config.eval_children)?;
            self.backpropagate(self.root())?;
        }

        for iteration in 0..simulations {
            let leaf = self.select(rng, config)?;

            if !self.get(leaf).is_evaluated() {
                self.evaluate_node(leaf, rng, config, config.eval_children)?;
            } else {
                let node = self.get(leaf);
                if !node.state().is_terminal() && node.state().non_terminal_eval().is_none() {
                    return Err(SearchError::InvariantBroken(
                        "selected a previously evaluated leaf that is neither terminal nor \
                         exactly evaluated"
                            .into(),
                    ));
                }
            }

            self.backpropagate(leaf)?;
            trace!(iteration, leaf = leaf.0, "simulation complete");
        }
        Ok(())
    }

    /// Descend from the root to a leaf suitable for evaluation.
    ///
    /// At each node, children that were never evaluated are visited first
    /// (one picked uniformly at random); once all are evaluated the children
    /// are scored and the best score wins, ties broken uniformly. Descent
    /// stops at a node that is unevaluated, terminal, or exactly evaluated.
    fn select(
        &mut self,
        rng: &mut ChaCha20Rng,
        config: &SearchConfig,
    ) -> Result<NodeId, SearchError> {
        let mut current = self.root();
        loop {
            self.expand(current);
            let children = self.get(current).children.clone();
            if children.is_empty() {
                return Err(SearchError::InvariantBroken(
                    "selection reached a node with no children".into(),
                ));
            }

            let mut choice = None;
            if !self.get(current).all_children_evaluated {
                let unexplored: Vec<usize> = children
                    .iter()
                    .enumerate()
                    .filter(|(_, &child)| !self.get(child).is_evaluated())
                    .map(|(i, _)| i)
                    .collect();
                if unexplored.is_empty() {
                    self.get_mut(current).all_children_evaluated = true;
                } else {
                    choice = Some(pick_uniform(&unexplored, rng));
                }
            }

            if choice.is_none() {
                // Parent visits minus one: the first increment came from the
                // parent's own self-backprop after evaluation, which the
                // UCT/PUCT formulas must not count as a sibling visit.
                let parent_visits = self.get(current).visit_count() as f64 - 1.0;
                let mut max_score = f64::NEG_INFINITY;
                let mut ties: Vec<usize> = Vec::new();
                for (i, &child_id) in children.iter().enumerate() {
                    let child = self.get(child_id);
                    // Child evaluations are from the villain's perspective,
                    // so the sign flips.
                    let q = -child.equity()?;
                    let n = child.visit_count() as f64;
                    let mut u = if parent_visits <= 0.0 {
                        0.0
                    } else if config.use_puct {
                        parent_visits.sqrt() / (1.0 + n)
                    } else {
                        (parent_visits.ln() / n.max(1.0)).sqrt()
                    };
                    if config.use_probs {
                        let probs = &self.get(current).eval_probs;
                        if !probs.is_empty() {
                            u *= probs[i];
                        }
                    }
                    let score = q + config.exploration * u;
                    if score >= max_score {
                        if score > max_score {
                            ties.clear();
                            max_score = score;
                        }
                        ties.push(i);
                    }
                }
                if ties.is_empty() {
                    return Err(SearchError::InvariantBroken(
                        "failed to select a child".into(),
                    ));
                }
                choice = Some(pick_uniform(&ties, rng));
            }

            let Some(index) = choice else {
                return Err(SearchError::InvariantBroken(
                    "selection produced no choice".into(),
                ));
            };
            current = children[index];

            let node = self.get(current);
            if !node.is_evaluated()
                || node.state().is_terminal()
                || node.state().non_terminal_eval().is_some()
            {
                return Ok(current);
            }
        }
    }

    /// Resolve a node's first evaluation, in priority order: terminal value,
    /// exact non-terminal evaluation, rollout, bespoke evaluator. Terminal
    /// and exactly evaluated nodes are *truncated*: the `descend` pass does
    /// not expand below them.
    fn evaluate_node(
        &mut self,
        id: NodeId,
        rng: &mut ChaCha20Rng,
        config: &SearchConfig,
        descend: bool,
    ) -> Result<(), SearchError> {
        if self.get(id).is_evaluated() {
            return Err(SearchError::DoubleEval);
        }

        let state = self.get(id).state().clone();
        let mut probs = Vec::new();
        let mut truncated = false;
        let eval_q = if state.is_terminal() {
            truncated = true;
            state.terminal_eval()
        } else if let Some(exact) = state.non_terminal_eval() {
            truncated = true;
            exact
        } else if config.use_rollout {
            rollout(&state, rng)?
        } else {
            self.expand(id);
            let children: Vec<G> = self
                .get(id)
                .children
                .iter()
                .map(|&child| self.get(child).state().clone())
                .collect();
            let (q, p) = state.eval(&children);
            if !p.is_empty() && p.len() != children.len() {
                return Err(SearchError::InvariantBroken(format!(
                    "evaluator returned {} priors for {} children",
                    p.len(),
                    children.len()
                )));
            }
            probs = p;
            q
        };

        if !(-1.0..=1.0).contains(&eval_q) {
            return Err(SearchError::InvariantBroken(format!(
                "evaluation {eval_q} outside [-1, 1]"
            )));
        }

        {
            let node = self.get_mut(id);
            node.eval_q = Some(eval_q);
            node.eval_probs = probs;
        }

        if descend && !truncated {
            self.expand(id);
            let children = self.get(id).children.clone();
            for child in children {
                if !self.get(child).is_evaluated() {
                    self.evaluate_node(child, rng, config, false)?;
                }
            }
            self.get_mut(id).all_children_evaluated = true;
        }
        Ok(())
    }

    /// Choose a move from the root with the epsilon-greedy policy and
    /// descend to it. The policy is a strict priority list:
    ///
    /// 1. a winning terminal child, if any (uniform among several);
    /// 2. when the root has an exact evaluation, the child with the lowest
    ///    non-terminal rank (the tree is no longer needed);
    /// 3. with probability `epsilon`, a uniformly random child;
    /// 4. otherwise the greedy pick over visits or equity, uniform among
    ///    exact ties.
    pub fn choose_best_action(
        &mut self,
        rng: &mut ChaCha20Rng,
        epsilon: f64,
        decide_using_visits: bool,
    ) -> Result<(), SearchError> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(SearchError::InvariantBroken(format!(
                "epsilon {epsilon} outside [0, 1]"
            )));
        }
        self.expand(self.root());
        let children = self.get(self.root()).children.clone();
        if children.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        // A terminal child with negative equity is a win for the side to
        // move here: the stored value is from the loser's perspective.
        let mut winning: Vec<usize> = Vec::new();
        for (i, &child_id) in children.iter().enumerate() {
            let child = self.get(child_id);
            if !child.state().is_terminal() {
                continue;
            }
            let equity = if child.is_evaluated() {
                child.equity()?
            } else {
                child.state().terminal_eval()
            };
            if equity < 0.0 {
                winning.push(i);
            }
        }

        let choice = if !winning.is_empty() {
            pick_uniform(&winning, rng)
        } else if self.has_exact_eval() {
            // Heuristic-decided territory: rank is from the villain's
            // perspective, so minimize.
            let mut best_rank = i32::MAX;
            let mut choice = 0;
            for (i, &child_id) in children.iter().enumerate() {
                let rank = self.get(child_id).state().non_terminal_rank();
                if rank < best_rank {
                    best_rank = rank;
                    choice = i;
                }
            }
            choice
        } else if epsilon > 0.0 && rng.gen::<f64>() < epsilon {
            rng.gen_range(0..children.len())
        } else if decide_using_visits {
            let mut max_visits = 0usize;
            let mut ties: Vec<usize> = Vec::new();
            for (i, &child_id) in children.iter().enumerate() {
                let visits = self.get(child_id).visit_count();
                if visits >= max_visits {
                    if visits > max_visits {
                        ties.clear();
                        max_visits = visits;
                    }
                    ties.push(i);
                }
            }
            pick_uniform(&ties, rng)
        } else {
            let mut max_q = f64::NEG_INFINITY;
            let mut ties: Vec<usize> = Vec::new();
            for (i, &child_id) in children.iter().enumerate() {
                let q = -self.get(child_id).equity()?;
                if q >= max_q {
                    if q > max_q {
                        ties.clear();
                        max_q = q;
                    }
                    ties.push(i);
                }
            }
            pick_uniform(&ties, rng)
        };

        self.make_move(choice)?;

        self.expand(self.root());
        let root = self.get(self.root());
        if root.children.is_empty() && !root.state().is_terminal() {
            return Err(SearchError::InvariantBroken(
                "position is not marked terminal but has no children".into(),
            ));
        }
        Ok(())
    }

    /// Report every child as `(visit_count, equity, action_text)`, best
    /// first.
    ///
    /// Equity is `-child.equity()`, i.e. from the caller's perspective; an
    /// unevaluated child reports `f64::MIN`. Sorting is descending over the
    /// four keys `(equity, non_terminal_rank, visit_count, action_text)` —
    /// the rank key breaks "everything is won" degenerate positions that
    /// would otherwise cycle.
    pub fn sorted_actions(
        &mut self,
        flip: bool,
    ) -> Result<Vec<(usize, f64, String)>, SearchError> {
        self.expand(self.root());
        let children = self.get(self.root()).children.clone();

        let mut moves: Vec<(f64, i32, usize, String)> = Vec::with_capacity(children.len());
        for &child_id in &children {
            let child = self.get(child_id);
            let equity = if child.is_evaluated() {
                -child.equity()?
            } else {
                f64::MIN
            };
            moves.push((
                equity,
                child.state().non_terminal_rank(),
                child.visit_count(),
                child.state().action_text(flip),
            ));
        }

        moves.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| b.3.cmp(&a.3))
        });

        Ok(moves
            .into_iter()
            .map(|(equity, _, visits, text)| (visits, equity, text))
            .collect())
    }

    /// Textual summary of the root's action statistics, best move first.
    pub fn display(&mut self, flip: bool) -> Result<String, SearchError> {
        let moves = self.sorted_actions(flip)?;
        let mut out = format!("Total Visits: {}\n", self.visit_count());
        for (visits, equity, text) in &moves {
            let shown = if *equity > f64::MIN {
                format!("{equity:.3}")
            } else {
                "NA".to_string()
            };
            out.push_str(&format!("Visit Count: {visits} Equity: {shown} {text}\n"));
        }
        out.push('\n');
        Ok(out)
    }
}

/// Uniform draw from a non-empty index list; skips the generator entirely
/// for a single candidate so tie-free paths stay deterministic.
fn pick_uniform(candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
    if candidates.len() > 1 {
        candidates[rng.gen_range(0..candidates.len())]
    } else {
        candidates[0]
    }
}
