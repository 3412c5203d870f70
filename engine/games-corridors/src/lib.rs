//! Corridors game implementation for the MCTS engine.
//!
//! Corridors is a Quoridor variant on a 9x9 board: each player races their
//! pawn to the far row while placing walls (10 per side) to lengthen the
//! opponent's path. A wall placement is legal only if both players can
//! still reach their goal rows.
//!
//! The [`Board`] type implements [`mcts::GamePosition`], so the generic
//! engine consumes it without knowing anything about walls or pawns:
//!
//! ```rust
//! use games_corridors::Board;
//! use mcts::{SearchConfig, ThreadedSearch};
//!
//! let driver: ThreadedSearch<Board> = ThreadedSearch::new(SearchConfig::for_testing());
//! driver.ensure_sims(50);
//! let actions = driver.sorted_actions(false).unwrap();
//! assert_eq!(actions.len(), 131); // 3 pawn steps + 128 wall placements
//! ```
//!
//! Positions follow the engine's rotating frame: every `Board` is stored
//! from the side-to-move's perspective and successor states come out
//! flipped. [`BoardSnapshot`] is the flat record hosts use to hand a
//! position across the embedding boundary.

pub mod bitset;
pub mod board;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use board::{Action, Board, BOARD_SIZE, STARTING_WALLS};
pub use snapshot::{BoardSnapshot, SnapshotError};
