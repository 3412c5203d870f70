//! Monte Carlo Tree Search for two-player, zero-sum, perfect-information
//! games.
//!
//! The engine is generic over a position type implementing
//! [`GamePosition`]; the crate ships no game of its own. Two layers compose:
//!
//! 1. [`SearchTree`] — the single-threaded tree engine. It owns the nodes
//!    (arena storage, `NodeId` indices), descends with UCT or
//!    AlphaZero-style PUCT selection, evaluates leaves by rollout or the
//!    game's own evaluator, and backpropagates equities up parent links.
//! 2. [`ThreadedSearch`] — a mutex-protected shell around one tree and one
//!    seeded random generator. A single worker thread runs simulations in
//!    increments toward a target counter while host threads query sorted
//!    actions, advance the root, or ask for more simulations.
//!
//! # Perspective convention
//!
//! Every stored evaluation is from the point of view of the player whose
//! turn it is at that node, in [-1, +1] with +1 a certain win. A child's
//! equity viewed from its parent is therefore negated; getting this wrong
//! flips the search into self-defeating behaviour, so the engine checks the
//! range of every equity it hands out.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcts::{SearchConfig, ThreadedSearch};
//!
//! let driver: ThreadedSearch<MyGame> = ThreadedSearch::new(SearchConfig::default());
//! driver.ensure_sims(1_000);
//! for (visits, equity, action) in driver.sorted_actions(false)? {
//!     println!("{action}: {visits} visits, {equity:.3}");
//! }
//! let best = driver.choose_best_action(0.0)?;
//! ```

pub mod config;
pub mod driver;
pub mod game;
pub mod node;
pub mod rollout;
pub mod search;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use config::SearchConfig;
pub use driver::ThreadedSearch;
pub use game::GamePosition;
pub use node::{Node, NodeId};
pub use rollout::MAX_ROLLOUT_ITERS;
pub use search::SearchError;
pub use tree::SearchTree;
