//! Search configuration parameters.

use serde::{Deserialize, Serialize};

/// Configuration for the tree search and the threaded driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration constant (`c` in the UCT/PUCT formulas). Higher values
    /// favour exploration over exploitation.
    pub exploration: f64,

    /// Seed for the driver's random generator. All randomness (rollouts,
    /// tie-breaks, epsilon draws) flows through one generator per driver, so
    /// identical seed + identical call sequence reproduces the search.
    pub seed: u64,

    /// Simulations `set_state_and_make_best_move` drives before choosing.
    pub min_simulations: usize,

    /// Advisory upper bound on simulations. Tracked but never enforced.
    pub max_simulations: usize,

    /// How many simulations the worker runs per lock-release cycle. Zero
    /// leaves the worker dormant.
    pub sim_increment: usize,

    /// Evaluate leaves with a random rollout instead of the game's bespoke
    /// evaluator.
    pub use_rollout: bool,

    /// When evaluating a leaf, also evaluate every child immediately (one
    /// ply of lookahead priors).
    pub eval_children: bool,

    /// Use the AlphaZero-style PUCT exploration term instead of classical
    /// UCT.
    pub use_puct: bool,

    /// Multiply the exploration term by the prior probability of each child,
    /// when priors are present.
    pub use_probs: bool,

    /// Greedy action choice picks the most-visited child rather than the
    /// highest-equity child.
    pub decide_using_visits: bool,

    /// An equity of exactly +/-1.0 at the root is treated as a false
    /// terminal when more than this many legal moves remain, and
    /// `evaluation` reports `None` instead. The default of 80 suits
    /// Corridors' early-game fan-out.
    pub false_terminal_move_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: 1.4,
            seed: 42,
            min_simulations: 100,
            max_simulations: 10_000,
            sim_increment: 50,
            use_rollout: true,
            eval_children: false,
            use_puct: false,
            use_probs: false,
            decide_using_visits: true,
            false_terminal_move_threshold: 80,
        }
    }
}

impl SearchConfig {
    /// Fast configuration for tests: tiny pacing numbers, rollout leaves.
    pub fn for_testing() -> Self {
        Self {
            min_simulations: 20,
            sim_increment: 10,
            ..Self::default()
        }
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: set driver pacing (min simulations and increment).
    pub fn with_pacing(mut self, min_simulations: usize, sim_increment: usize) -> Self {
        self.min_simulations = min_simulations;
        self.sim_increment = sim_increment;
        self
    }

    /// Builder pattern: toggle rollout evaluation.
    pub fn with_rollout(mut self, use_rollout: bool) -> Self {
        self.use_rollout = use_rollout;
        self
    }

    /// Builder pattern: toggle PUCT selection.
    pub fn with_puct(mut self, use_puct: bool) -> Self {
        self.use_puct = use_puct;
        self
    }

    /// Builder pattern: set the false-terminal masking threshold.
    pub fn with_false_terminal_move_threshold(mut self, threshold: usize) -> Self {
        self.false_terminal_move_threshold = threshold;
        self
    }
}
