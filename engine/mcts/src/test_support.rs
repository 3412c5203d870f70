//! Small deterministic games used by the engine's own tests.

use crate::game::GamePosition;

/// Subtraction game: take 1..=`take_max` stones, taking the last stone wins.
/// The side to move at zero stones has lost.
///
/// With `exact_below > 0` the game also exposes an exact oracle once
/// `stones <= exact_below`: the mover wins iff the stone count is not a
/// multiple of `take_max + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NimGame {
    pub stones: u32,
    pub take_max: u32,
    /// Number of stones the previous mover took; identifies the move.
    pub label: u32,
    pub exact_below: u32,
}

impl NimGame {
    pub fn new(stones: u32, take_max: u32) -> Self {
        Self {
            stones,
            take_max,
            label: 0,
            exact_below: 0,
        }
    }

    pub fn with_oracle(stones: u32, take_max: u32, exact_below: u32) -> Self {
        Self {
            exact_below,
            ..Self::new(stones, take_max)
        }
    }

    fn mover_wins(&self) -> bool {
        self.stones % (self.take_max + 1) != 0
    }
}

impl Default for NimGame {
    fn default() -> Self {
        Self::new(15, 3)
    }
}

impl GamePosition for NimGame {
    fn is_terminal(&self) -> bool {
        self.stones == 0
    }

    fn terminal_eval(&self) -> f64 {
        -1.0
    }

    fn non_terminal_eval(&self) -> Option<f64> {
        if self.exact_below > 0 && self.stones <= self.exact_below {
            Some(if self.mover_wins() { 1.0 } else { -1.0 })
        } else {
            None
        }
    }

    fn non_terminal_rank(&self) -> i32 {
        // villain's perspective: a losing count for the mover here is good
        // for the parent's mover, so it ranks low
        if self.mover_wins() {
            1000 + self.stones as i32
        } else {
            self.stones as i32
        }
    }

    fn legal_moves(&self, out: &mut Vec<Self>) {
        if self.is_terminal() {
            return;
        }
        for take in 1..=self.take_max.min(self.stones) {
            out.push(Self {
                stones: self.stones - take,
                take_max: self.take_max,
                label: take,
                exact_below: self.exact_below,
            });
        }
    }

    fn eval(&self, children: &[Self]) -> (f64, Vec<f64>) {
        let q = if self.mover_wins() { 0.9 } else { -0.9 };
        let probs = if children.is_empty() {
            Vec::new()
        } else {
            vec![1.0 / children.len() as f64; children.len()]
        };
        (q, probs)
    }

    fn action_text(&self, _flip: bool) -> String {
        format!("take{}", self.label)
    }

    fn flipped(&self) -> Self {
        self.clone()
    }

    fn render(&self) -> String {
        format!("{} stones remain", self.stones)
    }
}

/// One-shot game: every legal move ends the game at a fixed value.
///
/// `options[i]` is the terminal value of move `i`, from the perspective of
/// the side to move *after* it (so `-1.0` is a win for the chooser).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MenuGame {
    pub options: Vec<f64>,
    pub outcome: Option<f64>,
    pub label: usize,
}

impl MenuGame {
    pub fn new(options: Vec<f64>) -> Self {
        Self {
            options,
            outcome: None,
            label: 0,
        }
    }
}

impl Default for MenuGame {
    fn default() -> Self {
        Self::new(vec![-1.0, -1.0, -1.0])
    }
}

impl GamePosition for MenuGame {
    fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    fn terminal_eval(&self) -> f64 {
        self.outcome.unwrap_or(0.0)
    }

    fn non_terminal_eval(&self) -> Option<f64> {
        None
    }

    fn non_terminal_rank(&self) -> i32 {
        self.label as i32
    }

    fn legal_moves(&self, out: &mut Vec<Self>) {
        if self.is_terminal() {
            return;
        }
        for (label, &value) in self.options.iter().enumerate() {
            out.push(Self {
                options: Vec::new(),
                outcome: Some(value),
                label,
            });
        }
    }

    fn eval(&self, children: &[Self]) -> (f64, Vec<f64>) {
        let probs = if children.is_empty() {
            Vec::new()
        } else {
            vec![1.0 / children.len() as f64; children.len()]
        };
        (0.0, probs)
    }

    fn action_text(&self, _flip: bool) -> String {
        format!("m{}", self.label)
    }

    fn flipped(&self) -> Self {
        self.clone()
    }

    fn render(&self) -> String {
        format!("menu of {} moves", self.options.len())
    }
}

/// A game that never ends: one legal move leading to an identical position.
/// Exists to exercise the rollout divergence cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EndlessGame;

impl GamePosition for EndlessGame {
    fn is_terminal(&self) -> bool {
        false
    }

    fn terminal_eval(&self) -> f64 {
        0.0
    }

    fn non_terminal_eval(&self) -> Option<f64> {
        None
    }

    fn non_terminal_rank(&self) -> i32 {
        0
    }

    fn legal_moves(&self, out: &mut Vec<Self>) {
        out.push(Self);
    }

    fn eval(&self, _children: &[Self]) -> (f64, Vec<f64>) {
        (0.0, Vec::new())
    }

    fn action_text(&self, _flip: bool) -> String {
        "loop".into()
    }

    fn flipped(&self) -> Self {
        Self
    }

    fn render(&self) -> String {
        "endless".into()
    }
}
