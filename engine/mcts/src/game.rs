//! Game-state capability trait.
//!
//! The tree engine is generic over a position type implementing
//! [`GamePosition`]. Positions are plain values: making a move produces a new
//! position, and every stored position is expressed from the perspective of
//! the side to move at that position. Successor states returned by
//! [`legal_moves`](GamePosition::legal_moves) must already be
//! perspective-flipped so that the mover of the *next* ply is "hero" again.
//!
//! All equities are scalars in [-1, +1] from the side-to-move's point of
//! view, +1 meaning a certain win for the player whose turn it is.

/// Capability trait for a two-player, zero-sum, perfect-information game
/// position.
pub trait GamePosition: Clone + PartialEq + Send + 'static {
    /// Whether the game is over at this position.
    fn is_terminal(&self) -> bool;

    /// Final value of a terminal position, in [-1, +1] from the
    /// side-to-move's perspective. Only meaningful when
    /// [`is_terminal`](GamePosition::is_terminal) returns true.
    fn terminal_eval(&self) -> f64;

    /// Exact evaluation of a non-terminal position when one is available
    /// (e.g. a provably won race). `Some(eval)` is from the side-to-move's
    /// perspective and makes the engine treat the position as a leaf.
    fn non_terminal_eval(&self) -> Option<f64>;

    /// Tie-breaker ranking from the villain's (next-to-move-after-us)
    /// perspective: smaller is better for the side to move at the *parent*
    /// position. Used to break cycles in provably-won positions.
    fn non_terminal_rank(&self) -> i32;

    /// Append every legal successor position to `out`, in a stable order.
    /// The order is the identity of a move: the engine indexes children by
    /// it. Successors are from the next mover's perspective (flipped).
    fn legal_moves(&self, out: &mut Vec<Self>);

    /// Bespoke evaluator: returns the position's equity plus optional prior
    /// probabilities over `children` (the successor positions, in
    /// `legal_moves` order). The prior vector is either empty or exactly
    /// `children.len()` long.
    fn eval(&self, children: &[Self]) -> (f64, Vec<f64>);

    /// Canonical textual identifier of the move that produced this position.
    /// `flip` reports it from the opposite perspective, which is usually the
    /// perspective of the player who made the move.
    fn action_text(&self, flip: bool) -> String;

    /// The same position seen from the other player's perspective.
    fn flipped(&self) -> Self;

    /// Human-readable rendering of the position.
    fn render(&self) -> String;
}
