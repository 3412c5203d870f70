//! Wire-format board record.
//!
//! Hosts describe a position as a flat record of pawn coordinates, wall
//! stocks, and three bit-lists; the engine treats the fields opaquely.
//! Conversion validates lengths and ranges, builds the board, and applies
//! `flip` last — so a host tracking the game from the other player's seat
//! hands over the same record with `flip` set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitset::WallSet;
use crate::board::{Board, BOARD_SIZE, MIDDLES, SEGMENTS};

/// Errors from converting a snapshot into a [`Board`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("{field} must have {expected} entries, got {actual}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u16 },
}

/// A host-side description of a Corridors position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Reflect the position after building it; set by hosts that track the
    /// game from the other player's perspective.
    pub flip: bool,
    pub hero_x: u16,
    pub hero_y: u16,
    pub villain_x: u16,
    pub villain_y: u16,
    pub hero_walls_remaining: u16,
    pub villain_walls_remaining: u16,
    /// Occupied wall anchors, `(BOARD_SIZE - 1)^2` entries.
    pub wall_middles: Vec<bool>,
    /// Horizontal wall segments, `(BOARD_SIZE - 1) * BOARD_SIZE` entries.
    pub horizontal_walls: Vec<bool>,
    /// Vertical wall segments, `(BOARD_SIZE - 1) * BOARD_SIZE` entries.
    pub vertical_walls: Vec<bool>,
}

impl BoardSnapshot {
    /// Capture `board` into a snapshot, with `flip` recorded for the
    /// round trip.
    pub fn from_board(board: &Board, flip: bool) -> Self {
        let source = if flip { board.flipped() } else { board.clone() };
        Self {
            flip,
            hero_x: source.hero_x,
            hero_y: source.hero_y,
            villain_x: source.villain_x,
            villain_y: source.villain_y,
            hero_walls_remaining: source.hero_walls_remaining,
            villain_walls_remaining: source.villain_walls_remaining,
            wall_middles: (0..MIDDLES).map(|i| source.wall_middles.test(i)).collect(),
            horizontal_walls: (0..SEGMENTS)
                .map(|i| source.horizontal_walls.test(i))
                .collect(),
            vertical_walls: (0..SEGMENTS)
                .map(|i| source.vertical_walls.test(i))
                .collect(),
        }
    }

    /// Validate and build the described [`Board`], applying `flip` last.
    pub fn to_board(&self) -> Result<Board, SnapshotError> {
        check_coord("hero_x", self.hero_x)?;
        check_coord("hero_y", self.hero_y)?;
        check_coord("villain_x", self.villain_x)?;
        check_coord("villain_y", self.villain_y)?;
        check_len("wall_middles", &self.wall_middles, MIDDLES)?;
        check_len("horizontal_walls", &self.horizontal_walls, SEGMENTS)?;
        check_len("vertical_walls", &self.vertical_walls, SEGMENTS)?;

        let mut wall_middles = WallSet::new();
        for (i, &set) in self.wall_middles.iter().enumerate() {
            wall_middles.assign(i, set);
        }
        let mut horizontal_walls = WallSet::new();
        for (i, &set) in self.horizontal_walls.iter().enumerate() {
            horizontal_walls.assign(i, set);
        }
        let mut vertical_walls = WallSet::new();
        for (i, &set) in self.vertical_walls.iter().enumerate() {
            vertical_walls.assign(i, set);
        }

        let board = Board {
            hero_x: self.hero_x,
            hero_y: self.hero_y,
            villain_x: self.villain_x,
            villain_y: self.villain_y,
            hero_walls_remaining: self.hero_walls_remaining,
            villain_walls_remaining: self.villain_walls_remaining,
            wall_middles,
            horizontal_walls,
            vertical_walls,
            last_action: None,
        };

        Ok(if self.flip { board.flipped() } else { board })
    }
}

fn check_coord(field: &'static str, value: u16) -> Result<(), SnapshotError> {
    if value as usize >= BOARD_SIZE {
        return Err(SnapshotError::OutOfRange { field, value });
    }
    Ok(())
}

fn check_len(
    field: &'static str,
    values: &[bool],
    expected: usize,
) -> Result<(), SnapshotError> {
    if values.len() != expected {
        return Err(SnapshotError::WrongLength {
            field,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}
